use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 订单已关联的 GHN 运单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResGhnOrder {
    pub order_id: i64,
    pub order_code: String,
    pub expected_delivery_time: Option<DateTime<Utc>>,
    pub total_fee: i64,
    pub created_at: String,
}

/// 转运结果, warning 不为空时运单已创建但本地保存失败
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResTransfer {
    pub order_code: String,
    pub sort_code: Option<String>,
    pub expected_delivery_time: Option<DateTime<Utc>>,
    pub total_fee: i64,
    pub warning: Option<String>,
}

/// 地址字符串匹配出的行政区划
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResResolvedAddress {
    pub province_id: Option<i64>,
    pub district_id: Option<i64>,
    pub ward_code: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    /// 某一级数据拉取失败时的提示
    pub notice: Option<String>,
}
