use serde::{Deserialize, Serialize};

/// 门店发货地址
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ResStoreAddress {
    pub id: i64,
    pub store_id: i64,
    pub contact_name: String,
    pub contact_phone: String,
    pub address: String,
    pub province_id: Option<i64>,
    pub district_id: Option<i64>,
    pub ward_code: Option<String>,
    pub is_default: bool,
    pub updated_at: String,
}
