use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::warn;

use common::error::ApiResult;
use common::request::warranty::{ReqCreateWarrantyLog, WarrantyLogPatch, WarrantyLogStatus};
use common::response::warranty::ResWarrantyLog;

const COLUMNS: &str = "id,warranty_id,status,diagnosis,resolution,tracking_code,labor_cost,\
parts_cost,attachments,created_by,created_at,updated_at";

#[derive(Debug, Clone, PartialEq)]
pub struct WarrantyLog {
    pub id: i64,
    pub warranty_id: i64,
    pub status: WarrantyLogStatus,
    pub diagnosis: Option<String>,
    pub resolution: Option<String>,
    pub tracking_code: Option<String>,
    pub labor_cost: Option<i64>,
    pub parts_cost: Option<i64>,
    pub attachments: Vec<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PgRow> for WarrantyLog {
    fn from(row: PgRow) -> Self {
        let status = row.get::<String, &str>("status");
        WarrantyLog {
            id: row.get::<i64, &str>("id"),
            warranty_id: row.get::<i64, &str>("warranty_id"),
            status: WarrantyLogStatus::from_str(&status).unwrap_or_else(|e| {
                warn!("warranty log status: {}", e);
                WarrantyLogStatus::default()
            }),
            diagnosis: row.get::<Option<String>, &str>("diagnosis"),
            resolution: row.get::<Option<String>, &str>("resolution"),
            tracking_code: row.get::<Option<String>, &str>("tracking_code"),
            labor_cost: row.get::<Option<i64>, &str>("labor_cost"),
            parts_cost: row.get::<Option<i64>, &str>("parts_cost"),
            attachments: row.get::<Vec<String>, &str>("attachments"),
            created_by: row.get::<i64, &str>("created_by"),
            created_at: row.get::<DateTime<Utc>, &str>("created_at"),
            updated_at: row.get::<DateTime<Utc>, &str>("updated_at"),
        }
    }
}

impl From<WarrantyLog> for ResWarrantyLog {
    fn from(log: WarrantyLog) -> Self {
        ResWarrantyLog {
            is_terminal: log.status.is_terminal(),
            id: log.id,
            warranty_id: log.warranty_id,
            status: log.status,
            diagnosis: log.diagnosis,
            resolution: log.resolution,
            tracking_code: log.tracking_code,
            labor_cost: log.labor_cost,
            parts_cost: log.parts_cost,
            attachments: log.attachments,
            created_by: log.created_by,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

/// 空白字符串按没有填写处理
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl WarrantyLog {
    /// 按更新请求修改记录, 返回是否有字段变化
    pub fn apply(&mut self, patch: WarrantyLogPatch) -> bool {
        let before = self.clone();

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(diagnosis) = patch.diagnosis {
            self.diagnosis = non_blank(diagnosis);
        }
        if let Some(resolution) = patch.resolution {
            self.resolution = non_blank(resolution);
        }
        if let Some(tracking_code) = patch.tracking_code {
            self.tracking_code = non_blank(tracking_code);
        }
        if let Some(labor_cost) = patch.labor_cost {
            self.labor_cost = labor_cost;
        }
        if let Some(parts_cost) = patch.parts_cost {
            self.parts_cost = parts_cost;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments.unwrap_or_default();
        }

        *self != before
    }

    pub async fn get(id: i64) -> ApiResult<Option<WarrantyLog>> {
        Ok(sqlx::query(&format!("SELECT {} FROM warranty_logs WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(common::pgsql::db().await)
            .await?
            .map(WarrantyLog::from))
    }

    /// 保修的维修记录, 最新的在前
    pub async fn list(warranty_id: i64) -> ApiResult<Vec<WarrantyLog>> {
        Ok(sqlx::query(&format!(
            "SELECT {} FROM warranty_logs WHERE warranty_id = $1 ORDER BY created_at DESC, id DESC",
            COLUMNS
        ))
        .bind(warranty_id)
        .fetch_all(common::pgsql::db().await)
        .await?
        .into_iter()
        .map(WarrantyLog::from)
        .collect::<Vec<WarrantyLog>>())
    }

    pub async fn create(
        warranty_id: i64,
        created_by: i64,
        info: ReqCreateWarrantyLog,
    ) -> ApiResult<WarrantyLog> {
        Ok(sqlx::query(&format!(
            "INSERT INTO warranty_logs (warranty_id,status,diagnosis,resolution,tracking_code,labor_cost,\
        parts_cost,attachments,created_by,created_at,updated_at) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) \
        RETURNING {}",
            COLUMNS
        ))
        .bind(warranty_id)
        .bind(info.status.unwrap_or_default().as_str())
        .bind(non_blank(info.diagnosis))
        .bind(non_blank(info.resolution))
        .bind(non_blank(info.tracking_code))
        .bind(info.labor_cost)
        .bind(info.parts_cost)
        .bind(info.attachments.unwrap_or_default())
        .bind(created_by)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(common::pgsql::db().await)
        .await
        .map(WarrantyLog::from)?)
    }

    /// 保存全部可修改字段
    pub async fn save(&mut self) -> ApiResult<()> {
        self.updated_at = Utc::now();
        sqlx::query(
            "UPDATE warranty_logs SET status=$1,diagnosis=$2,resolution=$3,tracking_code=$4,labor_cost=$5,\
        parts_cost=$6,attachments=$7,updated_at=$8 WHERE id = $9",
        )
        .bind(self.status.as_str())
        .bind(&self.diagnosis)
        .bind(&self.resolution)
        .bind(&self.tracking_code)
        .bind(self.labor_cost)
        .bind(self.parts_cost)
        .bind(self.attachments.as_slice())
        .bind(self.updated_at)
        .bind(self.id)
        .execute(common::pgsql::db().await)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn log() -> WarrantyLog {
        WarrantyLog {
            id: 1,
            warranty_id: 9,
            status: WarrantyLogStatus::Open,
            diagnosis: Some("Không lên nguồn".to_string()),
            resolution: None,
            tracking_code: Some("GHN123".to_string()),
            labor_cost: Some(100_000),
            parts_cost: None,
            attachments: vec!["https://cdn.example.vn/1.jpg".to_string()],
            created_by: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn patch(json: &str) -> WarrantyLogPatch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn absent_fields_are_kept() {
        let mut log = log();
        assert!(log.apply(patch(r#"{"status":"REPAIRING"}"#)));

        assert_eq!(log.status, WarrantyLogStatus::Repairing);
        assert_eq!(log.diagnosis.as_deref(), Some("Không lên nguồn"));
        assert_eq!(log.tracking_code.as_deref(), Some("GHN123"));
        assert_eq!(log.labor_cost, Some(100_000));
        assert_eq!(log.attachments.len(), 1);
    }

    #[test]
    fn null_fields_are_cleared() {
        let mut log = log();
        assert!(log.apply(patch(
            r#"{"tracking_code":null,"labor_cost":null,"attachments":null,"diagnosis":"  "}"#
        )));

        assert_eq!(log.tracking_code, None);
        assert_eq!(log.labor_cost, None);
        assert_eq!(log.diagnosis, None);
        assert!(log.attachments.is_empty());
        assert_eq!(log.status, WarrantyLogStatus::Open);
    }

    #[test]
    fn terminal_status_can_be_reopened() {
        let mut log = log();
        log.apply(patch(r#"{"status":"CLOSED","resolution":"Đã thay mainboard"}"#));
        assert!(log.status.is_terminal());

        log.apply(patch(r#"{"status":"DIAGNOSING"}"#));
        assert_eq!(log.status, WarrantyLogStatus::Diagnosing);
        assert_eq!(log.resolution.as_deref(), Some("Đã thay mainboard"));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut log = log();
        assert!(!log.apply(patch("{}")));
        assert!(!log.apply(patch(r#"{"status":"OPEN","parts_cost":null}"#)));
    }
}
