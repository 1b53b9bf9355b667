use std::collections::HashSet;

use chrono::{DateTime, Months, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::info;

use common::error::{ApiError, ApiResult};
use common::response::warranty::ResWarranty;

#[derive(Debug, Clone)]
pub struct Warranty {
    pub id: i64,
    pub serial_number: String,
    pub order_id: i64,
    pub order_item_id: i64,
    pub warranty_months: i32,
    pub started_at: NaiveDate,
    pub expired_at: NaiveDate,
    pub activated_by: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PgRow> for Warranty {
    fn from(row: PgRow) -> Self {
        Warranty {
            id: row.get::<i64, &str>("id"),
            serial_number: row.get("serial_number"),
            order_id: row.get::<i64, &str>("order_id"),
            order_item_id: row.get::<i64, &str>("order_item_id"),
            warranty_months: row.get::<i32, &str>("warranty_months"),
            started_at: row.get::<NaiveDate, &str>("started_at"),
            expired_at: row.get::<NaiveDate, &str>("expired_at"),
            activated_by: row.get::<i64, &str>("activated_by"),
            created_at: row.get::<DateTime<Utc>, &str>("created_at"),
        }
    }
}

impl From<Warranty> for ResWarranty {
    fn from(info: Warranty) -> Self {
        ResWarranty {
            is_expired: info.expired_at < Utc::now().date_naive(),
            id: info.id,
            serial_number: info.serial_number,
            order_id: info.order_id,
            order_item_id: info.order_item_id,
            warranty_months: info.warranty_months,
            started_at: info.started_at,
            expired_at: info.expired_at,
            created_at: info.created_at,
        }
    }
}

/// 保修到期日, 月末按目标月份最后一天计算
pub fn expiry_date(started_at: NaiveDate, months: u32) -> ApiResult<NaiveDate> {
    started_at
        .checked_add_months(Months::new(months))
        .ok_or_else(|| ApiError::Error(format!("invalid warranty period: {} months", months)))
}

/// 整理待分配的序列号: 去掉空白, 拒绝重复, 总数不能超过商品数量
pub fn check_serials(serials: &[String], assigned: i64, quantity: i64) -> ApiResult<Vec<String>> {
    let mut seen = HashSet::with_capacity(serials.len());
    let mut result = Vec::with_capacity(serials.len());

    for serial in serials {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(ApiError::Validation("serial number cannot be empty".to_string()));
        }
        if !seen.insert(serial.to_string()) {
            return Err(ApiError::Validation(format!("duplicate serial number {}", serial)));
        }
        result.push(serial.to_string());
    }

    if assigned + result.len() as i64 > quantity {
        return Err(ApiError::Validation(format!(
            "order item quantity is {}, {} serial numbers already assigned",
            quantity, assigned
        )));
    }

    Ok(result)
}

impl Warranty {
    pub async fn get(id: i64) -> ApiResult<Option<Warranty>> {
        Ok(sqlx::query(
            "SELECT id,serial_number,order_id,order_item_id,warranty_months,started_at,expired_at,\
        activated_by,created_at FROM warranties WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(common::pgsql::db().await)
        .await?
        .map(Warranty::from))
    }

    /// 给订单商品分配序列号, 返回本次分配的序列号
    pub async fn assign_serials(
        order_id: i64,
        order_item_id: i64,
        serials: &[String],
        warranty_months: u32,
    ) -> ApiResult<Vec<String>> {
        let mut tx = common::pgsql::db().await.begin().await?;

        let quantity = match sqlx::query(
            "SELECT quantity FROM order_items WHERE id = $1 AND order_id = $2 FOR UPDATE",
        )
        .bind(order_item_id)
        .bind(order_id)
        .fetch_optional(&mut tx)
        .await?
        {
            Some(row) => row.get::<i32, &str>("quantity") as i64,
            None => {
                return Err(ApiError::NotFound(format!(
                    "order item {} not found in order {}",
                    order_item_id, order_id
                )))
            }
        };

        let assigned = sqlx::query(
            "SELECT COUNT(id) AS count FROM order_item_serials WHERE order_item_id = $1",
        )
        .bind(order_item_id)
        .fetch_one(&mut tx)
        .await?
        .get::<i64, &str>("count");

        let serials = check_serials(serials, assigned, quantity)?;

        let taken = sqlx::query(
            "SELECT serial_number FROM order_item_serials WHERE serial_number = ANY($1)",
        )
        .bind(serials.as_slice())
        .fetch_all(&mut tx)
        .await?
        .into_iter()
        .map(|row| row.get::<String, &str>("serial_number"))
        .collect::<Vec<String>>();
        if !taken.is_empty() {
            return Err(ApiError::Validation(format!(
                "serial numbers already assigned: {}",
                taken.join(", ")
            )));
        }

        for serial in &serials {
            sqlx::query(
                "INSERT INTO order_item_serials (order_id,order_item_id,serial_number,warranty_months,created_at) \
            VALUES ($1,$2,$3,$4,$5)",
            )
            .bind(order_id)
            .bind(order_item_id)
            .bind(serial)
            .bind(warranty_months as i32)
            .bind(Utc::now())
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "{} serial numbers assigned to order item {}",
            serials.len(),
            order_item_id
        );
        Ok(serials)
    }

    /// 按序列号激活保修, 从今天开始计算
    pub async fn activate(serial_number: &str, activated_by: i64) -> ApiResult<Warranty> {
        let serial_number = serial_number.trim();
        let mut tx = common::pgsql::db().await.begin().await?;

        let row = sqlx::query(
            "SELECT order_id,order_item_id,warranty_months FROM order_item_serials WHERE serial_number = $1",
        )
        .bind(serial_number)
        .fetch_optional(&mut tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("serial number {} not found", serial_number)))?;
        let order_id = row.get::<i64, &str>("order_id");
        let order_item_id = row.get::<i64, &str>("order_item_id");
        let warranty_months = row.get::<i32, &str>("warranty_months");

        let activated = sqlx::query("SELECT id FROM warranties WHERE serial_number = $1")
            .bind(serial_number)
            .fetch_optional(&mut tx)
            .await?;
        if activated.is_some() {
            return Err(ApiError::Error(format!(
                "warranty for {} is already activated",
                serial_number
            )));
        }

        let started_at = Utc::now().date_naive();
        let expired_at = expiry_date(started_at, warranty_months as u32)?;
        let warranty = sqlx::query(
            "INSERT INTO warranties (serial_number,order_id,order_item_id,warranty_months,started_at,\
        expired_at,activated_by,created_at) VALUES ($1,$2,$3,$4,$5,$6,$7,$8) RETURNING id,serial_number,\
        order_id,order_item_id,warranty_months,started_at,expired_at,activated_by,created_at",
        )
        .bind(serial_number)
        .bind(order_id)
        .bind(order_item_id)
        .bind(warranty_months)
        .bind(started_at)
        .bind(expired_at)
        .bind(activated_by)
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await
        .map(Warranty::from)?;

        tx.commit().await?;
        info!("warranty {} activated until {}", serial_number, expired_at);
        Ok(warranty)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expiry_clamps_to_month_end() {
        assert_eq!(expiry_date(date(2024, 3, 15), 12).unwrap(), date(2025, 3, 15));
        assert_eq!(expiry_date(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(expiry_date(date(2023, 8, 31), 6).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn serials_are_trimmed_and_unique() {
        let serials = vec![" SN-001 ".to_string(), "SN-002".to_string()];
        assert_eq!(
            check_serials(&serials, 0, 2).unwrap(),
            vec!["SN-001".to_string(), "SN-002".to_string()]
        );

        let duplicated = vec!["SN-001".to_string(), "SN-001 ".to_string()];
        assert!(matches!(
            check_serials(&duplicated, 0, 5),
            Err(ApiError::Validation(_))
        ));

        let blank = vec!["  ".to_string()];
        assert!(check_serials(&blank, 0, 5).is_err());
    }

    #[test]
    fn serials_cannot_exceed_quantity() {
        let serials = vec!["SN-003".to_string(), "SN-004".to_string()];
        assert!(check_serials(&serials, 1, 3).is_ok());

        let err = check_serials(&serials, 2, 3).unwrap_err();
        assert!(err.to_string().contains("quantity is 3"));
    }
}
