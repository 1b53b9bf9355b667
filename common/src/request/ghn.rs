use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Validate, Deserialize)]
pub struct ReqResolveAddress {
    #[validate(required, length(min = 1, max = 500, message = "address is required"))]
    pub address: Option<String>,
}
