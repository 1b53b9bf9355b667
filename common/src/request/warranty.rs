use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// 保修维修进度. 状态之间没有强制的先后顺序, 任意状态都可以改成其它状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarrantyLogStatus {
    Open,
    Diagnosing,
    WaitingParts,
    Repairing,
    ReadyForPickup,
    ShipBack,
    Completed,
    Closed,
}

impl WarrantyLogStatus {
    pub const ALL: [WarrantyLogStatus; 8] = [
        WarrantyLogStatus::Open,
        WarrantyLogStatus::Diagnosing,
        WarrantyLogStatus::WaitingParts,
        WarrantyLogStatus::Repairing,
        WarrantyLogStatus::ReadyForPickup,
        WarrantyLogStatus::ShipBack,
        WarrantyLogStatus::Completed,
        WarrantyLogStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WarrantyLogStatus::Open => "OPEN",
            WarrantyLogStatus::Diagnosing => "DIAGNOSING",
            WarrantyLogStatus::WaitingParts => "WAITING_PARTS",
            WarrantyLogStatus::Repairing => "REPAIRING",
            WarrantyLogStatus::ReadyForPickup => "READY_FOR_PICKUP",
            WarrantyLogStatus::ShipBack => "SHIP_BACK",
            WarrantyLogStatus::Completed => "COMPLETED",
            WarrantyLogStatus::Closed => "CLOSED",
        }
    }

    /// 终态, 仅用于展示
    pub fn is_terminal(&self) -> bool {
        matches!(self, WarrantyLogStatus::Completed | WarrantyLogStatus::Closed)
    }
}

impl Default for WarrantyLogStatus {
    fn default() -> Self {
        WarrantyLogStatus::Open
    }
}

impl Display for WarrantyLogStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WarrantyLogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WarrantyLogStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown warranty log status {}", s))
    }
}

/// 字段出现即为 Some, 包括显式的 null
fn deserialize_some<'de, T, D>(de: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(de).map(Some)
}

fn validate_attachments(urls: &Vec<String>) -> Result<(), ValidationError> {
    if urls.len() > 20 {
        return Err(ValidationError::new("too_many_attachments"));
    }
    if urls
        .iter()
        .any(|url| !(url.starts_with("http://") || url.starts_with("https://")))
    {
        return Err(ValidationError::new("attachment_url"));
    }

    Ok(())
}

#[derive(Debug, Clone, Validate, Deserialize)]
pub struct ReqAssignSerials {
    #[validate(required, length(min = 1, max = 100, message = "1-100 serial numbers per request"))]
    pub serials: Option<Vec<String>>,
    #[validate(required, range(min = 1, max = 120, message = "warranty must be 1-120 months"))]
    pub warranty_months: Option<u32>,
}

#[derive(Debug, Clone, Validate, Deserialize)]
pub struct ReqActivateWarranty {
    #[validate(required, length(min = 3, max = 64, message = "invalid serial number"))]
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, Default, Validate, Deserialize)]
pub struct ReqCreateWarrantyLog {
    pub status: Option<WarrantyLogStatus>,
    #[validate(length(max = 2000))]
    pub diagnosis: Option<String>,
    #[validate(length(max = 2000))]
    pub resolution: Option<String>,
    #[validate(length(max = 64))]
    pub tracking_code: Option<String>,
    #[validate(range(min = 0, message = "labor cost cannot be negative"))]
    pub labor_cost: Option<i64>,
    #[validate(range(min = 0, message = "parts cost cannot be negative"))]
    pub parts_cost: Option<i64>,
    #[validate(custom = "validate_attachments")]
    pub attachments: Option<Vec<String>>,
}

/// 维修记录更新: 字段缺省表示不修改, 显式 null 表示清空
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarrantyLogPatch {
    pub status: Option<WarrantyLogStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub diagnosis: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub resolution: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub tracking_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub labor_cost: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parts_cost: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub attachments: Option<Option<Vec<String>>>,
}

impl Validate for WarrantyLogPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, cost) in [("labor_cost", self.labor_cost), ("parts_cost", self.parts_cost)] {
            if let Some(Some(value)) = cost {
                if value < 0 {
                    errors.add(field, ValidationError::new("range"));
                }
            }
        }
        if let Some(Some(urls)) = &self.attachments {
            if let Err(err) = validate_attachments(urls) {
                errors.add("attachments", err);
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        Err(errors)
    }
}
