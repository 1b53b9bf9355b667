use std::fmt::{Display, Formatter};

pub use client::GhnClient;
pub use location::{LocationSelector, LocationSource, LocationState};
pub use matcher::{find_unit, is_administrative_match, normalize, Level};
pub use segments::{parse_segments, ParsedAddressSegments};
pub use shipment::{submit_shipment, Carrier, ShipmentDraft, ShipmentError, ShipmentLedger};

pub mod client;
pub mod location;
pub mod matcher;
pub mod segments;
pub mod shipment;
pub mod types;

pub type GhnResult<T> = Result<T, GhnError>;

#[derive(Debug, Clone)]
pub enum GhnError {
    Err(String),
    /// GHN 接口返回的业务错误
    Api { code: i32, message: String },
    Http(String),
}

impl GhnError {
    pub fn new(err: &str) -> Self {
        GhnError::Err(err.to_string())
    }
}

impl Display for GhnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GhnError::Err(err) => write!(f, "{}", err),
            GhnError::Api { code, message } => write!(f, "ghn [{}]: {}", code, message),
            GhnError::Http(err) => write!(f, "ghn request failed: {}", err),
        }
    }
}

impl std::error::Error for GhnError {}

impl From<reqwest::Error> for GhnError {
    fn from(value: reqwest::Error) -> Self {
        GhnError::Http(value.to_string())
    }
}

impl From<serde_json::Error> for GhnError {
    fn from(value: serde_json::Error) -> Self {
        GhnError::Err(value.to_string())
    }
}
