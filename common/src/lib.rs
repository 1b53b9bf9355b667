pub use application::*;
pub use request::AppExtractor;
pub use response::ApiResponse;
pub use utils::*;

pub mod application;
pub mod error;
pub mod request;
pub mod response;
pub mod utils;

/// 检测是否为null
pub trait IsEmpty {
    fn is_empty(&self) -> bool;
}

impl IsEmpty for Option<String> {
    /// 检测字符串是否为空
    fn is_empty(&self) -> bool {
        match self {
            Some(s) => s.trim().is_empty(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_option_is_empty() {
        assert!(IsEmpty::is_empty(&None::<String>));
        assert!(IsEmpty::is_empty(&Some("  ".to_string())));
        assert!(!IsEmpty::is_empty(&Some("Quận 1".to_string())));
    }
}
