use serde::Deserialize;
use validator::Validate;

use crate::utils::validate_phone;

/// 门店发货地址. 省/区县/坊社 没有传时按地址文本自动匹配 GHN 基础数据
#[derive(Debug, Clone, Validate, Deserialize)]
pub struct ReqStoreAddress {
    #[validate(required, length(min = 1, max = 100, message = "contact name must be 1-100 characters"))]
    pub contact_name: Option<String>,
    #[validate(required, custom = "validate_phone")]
    pub contact_phone: Option<String>,
    #[validate(required, length(min = 3, max = 255, message = "address must be 3-255 characters"))]
    pub address: Option<String>,
    #[validate(range(min = 1, message = "invalid province"))]
    pub province_id: Option<i64>,
    #[validate(range(min = 1, message = "invalid district"))]
    pub district_id: Option<i64>,
    #[validate(length(min = 1, max = 20, message = "invalid ward"))]
    pub ward_code: Option<String>,
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate_store_address() {
        let mut req = ReqStoreAddress {
            contact_name: Some("Shop Minh Anh".to_string()),
            contact_phone: Some("0909123456".to_string()),
            address: Some("12 Lê Lợi, Phường Bến Nghé, Quận 1, TP HCM".to_string()),
            province_id: None,
            district_id: None,
            ward_code: None,
            is_default: Some(true),
        };
        assert!(req.validate().is_ok());

        req.contact_phone = Some("12345".to_string());
        req.province_id = Some(0);
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("contact_phone"));
        assert!(fields.contains_key("province_id"));
    }
}
