use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{GhnError, GhnResult};

/// GHN 成功编码
pub const GHN_SUCCESS: i32 = 200;

/// GHN 所有接口统一的返回结构
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct GhnEnvelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code_message_value: Option<String>,
    pub data: Option<T>,
}

impl<T: DeserializeOwned> GhnEnvelope<T> {
    pub fn into_result(self) -> GhnResult<T> {
        if self.code != GHN_SUCCESS {
            let message = match self.code_message_value {
                Some(value) if !value.is_empty() => value,
                _ => self.message,
            };
            return Err(GhnError::Api {
                code: self.code,
                message,
            });
        }

        self.data.ok_or(GhnError::Api {
            code: self.code,
            message: "response carries no data".to_string(),
        })
    }
}

/// NameExtension 可能为 null
fn null_as_empty<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(de)?.unwrap_or_default())
}

/// 行政区划: 省 / 区县 / 坊社
pub trait AdministrativeUnit {
    type Id: Clone + PartialEq + std::fmt::Debug;

    fn unit_id(&self) -> Self::Id;
    fn name(&self) -> &str;
    fn name_extension(&self) -> &[String];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Province {
    #[serde(rename = "ProvinceID")]
    pub province_id: i64,
    #[serde(rename = "ProvinceName")]
    pub province_name: String,
    #[serde(rename = "NameExtension", default, deserialize_with = "null_as_empty")]
    pub name_extension: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct District {
    #[serde(rename = "DistrictID")]
    pub district_id: i64,
    #[serde(rename = "ProvinceID")]
    pub province_id: i64,
    #[serde(rename = "DistrictName")]
    pub district_name: String,
    #[serde(rename = "NameExtension", default, deserialize_with = "null_as_empty")]
    pub name_extension: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ward {
    #[serde(rename = "WardCode")]
    pub ward_code: String,
    #[serde(rename = "DistrictID")]
    pub district_id: i64,
    #[serde(rename = "WardName")]
    pub ward_name: String,
    #[serde(rename = "NameExtension", default, deserialize_with = "null_as_empty")]
    pub name_extension: Vec<String>,
}

impl AdministrativeUnit for Province {
    type Id = i64;

    fn unit_id(&self) -> i64 {
        self.province_id
    }

    fn name(&self) -> &str {
        &self.province_name
    }

    fn name_extension(&self) -> &[String] {
        &self.name_extension
    }
}

impl AdministrativeUnit for District {
    type Id = i64;

    fn unit_id(&self) -> i64 {
        self.district_id
    }

    fn name(&self) -> &str {
        &self.district_name
    }

    fn name_extension(&self) -> &[String] {
        &self.name_extension
    }
}

impl AdministrativeUnit for Ward {
    type Id = String;

    fn unit_id(&self) -> String {
        self.ward_code.clone()
    }

    fn name(&self) -> &str {
        &self.ward_name
    }

    fn name_extension(&self) -> &[String] {
        &self.name_extension
    }
}

/// 上门取件时间段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupShift {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub from_time: i64,
    #[serde(default)]
    pub to_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredNote {
    /// 允许试用
    Chothuhang,
    /// 允许查看不允许试用
    Choxemhangkhongthu,
    /// 不允许查看
    Khongchoxemhang,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCategory {
    pub level1: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub quantity: u32,
    pub price: i64,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub weight: u32,
    pub category: ItemCategory,
}

/// 创建运单请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    pub payment_type_id: u8,
    pub service_type_id: u8,
    pub required_note: RequiredNote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub from_name: String,
    pub from_phone: String,
    pub from_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_ward_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_district_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_province_name: Option<String>,
    pub to_name: String,
    pub to_phone: String,
    pub to_address: String,
    pub to_ward_code: String,
    pub to_district_id: i64,
    pub cod_amount: i64,
    pub insurance_value: i64,
    pub weight: u32,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub pick_shift: Vec<i64>,
    pub items: Vec<OrderItem>,
}

/// 创建运单返回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order_code: String,
    #[serde(default)]
    pub sort_code: Option<String>,
    #[serde(default)]
    pub expected_delivery_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_fee: i64,
}
