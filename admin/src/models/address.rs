use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use common::error::{ApiError, ApiResult};
use common::request::address::ReqStoreAddress;
use common::response::address::ResStoreAddress;

/// 每个门店最多保存的发货地址数量
const MAX_ADDRESS: i64 = 10;

const COLUMNS: &str = "id,store_id,contact_name,contact_phone,address,province_id,district_id,\
ward_code,is_default,created_at,updated_at";

#[derive(Debug, Default, Clone)]
pub struct StoreAddress {
    pub id: i64,
    pub store_id: i64,
    pub contact_name: String,
    pub contact_phone: String,
    pub address: String,
    pub province_id: Option<i64>,
    pub district_id: Option<i64>,
    pub ward_code: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PgRow> for StoreAddress {
    fn from(row: PgRow) -> Self {
        StoreAddress {
            id: row.get::<i64, &str>("id"),
            store_id: row.get::<i64, &str>("store_id"),
            contact_name: row.get("contact_name"),
            contact_phone: row.get("contact_phone"),
            address: row.get("address"),
            province_id: row.get::<Option<i64>, &str>("province_id"),
            district_id: row.get::<Option<i64>, &str>("district_id"),
            ward_code: row.get::<Option<String>, &str>("ward_code"),
            is_default: row.get::<bool, &str>("is_default"),
            created_at: row.get::<DateTime<Utc>, &str>("created_at"),
            updated_at: row.get::<DateTime<Utc>, &str>("updated_at"),
        }
    }
}

impl From<StoreAddress> for ResStoreAddress {
    fn from(info: StoreAddress) -> Self {
        ResStoreAddress {
            id: info.id,
            store_id: info.store_id,
            contact_name: info.contact_name,
            contact_phone: info.contact_phone,
            address: info.address,
            province_id: info.province_id,
            district_id: info.district_id,
            ward_code: info.ward_code,
            is_default: info.is_default,
            updated_at: common::time_ymd_his(info.updated_at),
        }
    }
}

impl StoreAddress {
    /// 门店发货地址列表, 默认地址排在最前
    pub async fn list(store_id: i64) -> ApiResult<Vec<StoreAddress>> {
        Ok(sqlx::query(&format!(
            "SELECT {} FROM store_address WHERE store_id = $1 ORDER BY is_default DESC, updated_at DESC",
            COLUMNS
        ))
        .bind(store_id)
        .fetch_all(common::pgsql::db().await)
        .await?
        .into_iter()
        .map(StoreAddress::from)
        .collect::<Vec<StoreAddress>>())
    }

    /// 门店默认发货地址, 转运时补全发件人信息
    pub async fn default_address(store_id: i64) -> ApiResult<Option<StoreAddress>> {
        Ok(sqlx::query(&format!(
            "SELECT {} FROM store_address WHERE store_id = $1 ORDER BY is_default DESC, updated_at DESC LIMIT 1",
            COLUMNS
        ))
        .bind(store_id)
        .fetch_optional(common::pgsql::db().await)
        .await?
        .map(StoreAddress::from))
    }

    /// 创建发货地址, 设为默认时取消其它默认地址
    pub async fn create(store_id: i64, info: &ReqStoreAddress) -> ApiResult<i64> {
        let mut tx = common::pgsql::db().await.begin().await?;

        let count = sqlx::query("SELECT COUNT(id) AS count FROM store_address WHERE store_id = $1")
            .bind(store_id)
            .fetch_one(&mut tx)
            .await?
            .get::<i64, &str>("count");
        if count >= MAX_ADDRESS {
            return Err(ApiError::Error(format!(
                "a store can keep at most {} sender addresses",
                MAX_ADDRESS
            )));
        }

        // 第一个地址自动成为默认地址
        let is_default = info.is_default.unwrap_or(false) || count == 0;
        if is_default {
            Self::clear_default(&mut tx, store_id).await?;
        }

        let id = sqlx::query(
            "INSERT INTO store_address (store_id,contact_name,contact_phone,address,province_id,\
        district_id,ward_code,is_default,created_at,updated_at) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) RETURNING id",
        )
        .bind(store_id)
        .bind(&info.contact_name)
        .bind(&info.contact_phone)
        .bind(&info.address)
        .bind(info.province_id)
        .bind(info.district_id)
        .bind(&info.ward_code)
        .bind(is_default)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await?
        .get::<i64, &str>("id");

        tx.commit().await?;
        Ok(id)
    }

    pub async fn update(id: i64, store_id: i64, info: &ReqStoreAddress) -> ApiResult<bool> {
        let mut tx = common::pgsql::db().await.begin().await?;

        let is_default = info.is_default.unwrap_or(false);
        if is_default {
            Self::clear_default(&mut tx, store_id).await?;
        }

        let rows_num = sqlx::query(
            "UPDATE store_address SET contact_name=$1,contact_phone=$2,address=$3,province_id=$4,\
        district_id=$5,ward_code=$6,is_default=(is_default OR $7),updated_at=$8 WHERE id = $9 AND store_id = $10",
        )
        .bind(&info.contact_name)
        .bind(&info.contact_phone)
        .bind(&info.address)
        .bind(info.province_id)
        .bind(info.district_id)
        .bind(&info.ward_code)
        .bind(is_default)
        .bind(Utc::now())
        .bind(id)
        .bind(store_id)
        .execute(&mut tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(rows_num > 0)
    }

    pub async fn delete(id: i64, store_id: i64) -> ApiResult<bool> {
        let rows_num = sqlx::query("DELETE FROM store_address WHERE id = $1 AND store_id = $2")
            .bind(id)
            .bind(store_id)
            .execute(common::pgsql::db().await)
            .await?
            .rows_affected();

        Ok(rows_num > 0)
    }

    async fn clear_default(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        store_id: i64,
    ) -> ApiResult<()> {
        sqlx::query("UPDATE store_address SET is_default = FALSE WHERE store_id = $1 AND is_default")
            .bind(store_id)
            .execute(tx)
            .await?;

        Ok(())
    }
}
