use serde::{Deserialize, Serialize};

/// 从地址文本尾部拆出的省/区县/坊社猜测值, 不持久化
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddressSegments {
    pub province: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
}

impl ParsedAddressSegments {
    pub fn is_empty(&self) -> bool {
        self.province.is_none() && self.district.is_none() && self.ward.is_none()
    }
}

/// 越南地址从小到大书写, 最后三段依次是 坊社, 区县, 省
pub fn parse_segments(address: &str) -> ParsedAddressSegments {
    let tokens = address
        .split(|c: char| c == ',' || c == ';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<&str>>();

    let mut tail = tokens.iter().rev().map(|token| token.to_string());

    ParsedAddressSegments {
        province: tail.next(),
        district: tail.next(),
        ward: tail.next(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn full_address() {
        let segments = parse_segments("12 Lê Lợi, Phường Bến Nghé, Quận 1, TP HCM");
        assert_eq!(segments.ward.as_deref(), Some("Phường Bến Nghé"));
        assert_eq!(segments.district.as_deref(), Some("Quận 1"));
        assert_eq!(segments.province.as_deref(), Some("TP HCM"));
    }

    #[test]
    fn short_addresses_fill_from_province() {
        let segments = parse_segments("Quận Cầu Giấy; Hà Nội");
        assert_eq!(segments.province.as_deref(), Some("Hà Nội"));
        assert_eq!(segments.district.as_deref(), Some("Quận Cầu Giấy"));
        assert_eq!(segments.ward, None);

        let segments = parse_segments("Đà Nẵng");
        assert_eq!(segments.province.as_deref(), Some("Đà Nẵng"));
        assert_eq!(segments.district, None);
    }

    #[test]
    fn blank_tokens_are_skipped() {
        let segments = parse_segments(" , Phường 4, , Quận 5 ,Hồ Chí Minh,, ");
        assert_eq!(segments.ward.as_deref(), Some("Phường 4"));
        assert_eq!(segments.district.as_deref(), Some("Quận 5"));
        assert_eq!(segments.province.as_deref(), Some("Hồ Chí Minh"));

        assert!(parse_segments(" ,, ").is_empty());
    }
}
