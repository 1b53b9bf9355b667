use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

pub mod jwt;
pub mod pgsql;

lazy_static! {
    // 越南手机号: 0 或 +84 开头, 运营商号段 3/5/7/8/9
    static ref VN_PHONE: Regex = Regex::new(r"^(0|\+84)[35789][0-9]{8}$").unwrap();
}

/// 去掉空格和点号后校验手机号
pub fn is_vn_phone(phone: &str) -> bool {
    let phone = phone.replace([' ', '.'], "");
    VN_PHONE.is_match(&phone)
}

/// validator 自定义手机号校验
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_vn_phone(phone) {
        return Ok(());
    }

    let mut err = ValidationError::new("phone");
    err.message = Some("invalid phone number".into());
    Err(err)
}

pub fn time_ymd_his(time: chrono::DateTime<chrono::Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert!(is_vn_phone("0909123456"));
        assert!(is_vn_phone("+84 912 345 678"));
        assert!(is_vn_phone("0386.123.456"));
        assert!(!is_vn_phone("0209123456"));
        assert!(!is_vn_phone("090912345"));
        assert!(validate_phone("12345").is_err());
    }
}
