use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use common::error::{ApiError, ApiResult};
use common::response::ghn::ResGhnOrder;
use ghn::shipment::{ShipmentLedger, ShipmentRecord};

/// 已转运到 GHN 的订单
#[derive(Debug, Clone)]
pub struct GhnOrder {
    pub order_id: i64,
    pub order_code: String,
    pub expected_delivery_time: Option<DateTime<Utc>>,
    pub total_fee: i64,
    pub created_at: DateTime<Utc>,
}

impl From<GhnOrder> for ResGhnOrder {
    fn from(info: GhnOrder) -> Self {
        ResGhnOrder {
            order_id: info.order_id,
            order_code: info.order_code,
            expected_delivery_time: info.expected_delivery_time,
            total_fee: info.total_fee,
            created_at: common::time_ymd_his(info.created_at),
        }
    }
}

impl GhnOrder {
    /// 订单还没有转运时返回 None
    pub async fn get(order_id: i64) -> ApiResult<Option<GhnOrder>> {
        Ok(sqlx::query(
            "SELECT order_id,order_code,expected_delivery_time,total_fee,created_at FROM ghn_orders WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(common::pgsql::db().await)
        .await?
        .map(|row| GhnOrder {
            order_id: row.get::<i64, &str>("order_id"),
            order_code: row.get("order_code"),
            expected_delivery_time: row.get::<Option<DateTime<Utc>>, &str>("expected_delivery_time"),
            total_fee: row.get::<i64, &str>("total_fee"),
            created_at: row.get::<DateTime<Utc>, &str>("created_at"),
        }))
    }

    pub async fn save(record: &ShipmentRecord) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO ghn_orders (order_id,order_code,expected_delivery_time,total_fee,created_at) \
        VALUES ($1,$2,$3,$4,$5) ON CONFLICT (order_id) DO UPDATE SET order_code = EXCLUDED.order_code, \
        expected_delivery_time = EXCLUDED.expected_delivery_time, total_fee = EXCLUDED.total_fee",
        )
        .bind(record.order_id)
        .bind(&record.order_code)
        .bind(record.expected_delivery_time)
        .bind(record.total_fee)
        .bind(Utc::now())
        .execute(common::pgsql::db().await)
        .await?;

        Ok(())
    }
}

/// 运单记录保存到 ghn_orders 表
pub struct GhnOrderLedger;

#[async_trait]
impl ShipmentLedger for GhnOrderLedger {
    type Error = ApiError;

    async fn save(&self, record: &ShipmentRecord) -> Result<(), Self::Error> {
        GhnOrder::save(record).await
    }
}
