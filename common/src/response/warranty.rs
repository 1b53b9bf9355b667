use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::request::warranty::WarrantyLogStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResWarranty {
    pub id: i64,
    pub serial_number: String,
    pub order_id: i64,
    pub order_item_id: i64,
    pub warranty_months: i32,
    pub started_at: NaiveDate,
    pub expired_at: NaiveDate,
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResWarrantyLog {
    pub id: i64,
    pub warranty_id: i64,
    pub status: WarrantyLogStatus,
    pub is_terminal: bool,
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
