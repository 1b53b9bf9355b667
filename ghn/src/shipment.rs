use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{CreateOrderRequest, CreatedOrder, ItemCategory, OrderItem, RequiredNote};
use crate::{GhnError, GhnResult};

/// 承运商下单
#[async_trait]
pub trait Carrier: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest) -> GhnResult<CreatedOrder>;
}

/// 本地运单记录
#[async_trait]
pub trait ShipmentLedger: Send + Sync {
    type Error: Display + Send;

    async fn save(&self, record: &ShipmentRecord) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sender {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub ward_name: Option<String>,
    pub district_name: Option<String>,
    pub province_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receiver {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub ward_code: Option<String>,
    pub district_id: Option<i64>,
}

/// 包裹尺寸: 重量(克), 长宽高(厘米)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Package {
    pub weight: u32,
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub quantity: u32,
    pub price: i64,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub category: Option<String>,
}

/// 转单表单: 订单数据 + 门店数据 + 用户调整过的包裹尺寸
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentDraft {
    pub payment_type_id: Option<u8>,
    pub service_type_id: Option<u8>,
    pub required_note: Option<RequiredNote>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub receiver: Receiver,
    #[serde(default)]
    pub package: Package,
    #[serde(default)]
    pub cod_amount: i64,
    #[serde(default)]
    pub insurance_value: i64,
    pub pick_shift: Option<i64>,
    #[serde(default)]
    pub items: Vec<ShipmentItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Weight,
    Length,
    Width,
    Height,
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Weight => write!(f, "weight"),
            Dimension::Length => write!(f, "length"),
            Dimension::Width => write!(f, "width"),
            Dimension::Height => write!(f, "height"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentError {
    MissingPaymentType,
    MissingServiceType,
    MissingRequiredNote,
    MissingSenderName,
    MissingSenderPhone,
    MissingSenderAddress,
    MissingReceiverName,
    MissingReceiverPhone,
    MissingReceiverAddress,
    MissingReceiverWard,
    MissingReceiverDistrict,
    NoItems,
    /// 包裹申报尺寸小于商品合计
    PackageTooSmall {
        dimension: Dimension,
        declared: u64,
        required: u64,
    },
    NegativeItemPrice {
        index: usize,
        name: String,
    },
    NegativeCodAmount,
    NegativeInsuranceValue,
    /// 商品总价超出 i64 范围
    GoodsValueOverflow,
    CodExceedsValue {
        cod_amount: i64,
        goods_value: i64,
    },
    InvalidItemDimension {
        index: usize,
        name: String,
        dimension: Dimension,
    },
    MissingItemCategory {
        index: usize,
        name: String,
    },
    MissingPickShift,
}

impl Display for ShipmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipmentError::MissingPaymentType => write!(f, "payment type is required"),
            ShipmentError::MissingServiceType => write!(f, "service type is required"),
            ShipmentError::MissingRequiredNote => write!(f, "delivery instruction is required"),
            ShipmentError::MissingSenderName => write!(f, "sender name is required"),
            ShipmentError::MissingSenderPhone => write!(f, "sender phone is required"),
            ShipmentError::MissingSenderAddress => write!(f, "sender address is required"),
            ShipmentError::MissingReceiverName => write!(f, "receiver name is required"),
            ShipmentError::MissingReceiverPhone => write!(f, "receiver phone is required"),
            ShipmentError::MissingReceiverAddress => write!(f, "receiver address is required"),
            ShipmentError::MissingReceiverWard => write!(f, "receiver ward is required"),
            ShipmentError::MissingReceiverDistrict => write!(f, "receiver district is required"),
            ShipmentError::NoItems => write!(f, "shipment has no items"),
            ShipmentError::PackageTooSmall {
                dimension,
                declared,
                required,
            } => write!(
                f,
                "package {} {} is less than the items total {}",
                dimension, declared, required
            ),
            ShipmentError::NegativeItemPrice { index, name } => {
                write!(f, "item #{} {} has a negative price", index + 1, name)
            }
            ShipmentError::NegativeCodAmount => write!(f, "cod amount cannot be negative"),
            ShipmentError::NegativeInsuranceValue => {
                write!(f, "insurance value cannot be negative")
            }
            ShipmentError::GoodsValueOverflow => write!(f, "goods value is too large"),
            ShipmentError::CodExceedsValue {
                cod_amount,
                goods_value,
            } => write!(
                f,
                "cod amount {} exceeds goods value {}",
                cod_amount, goods_value
            ),
            ShipmentError::InvalidItemDimension {
                index,
                name,
                dimension,
            } => write!(f, "item #{} {} must have a positive {}", index + 1, name, dimension),
            ShipmentError::MissingItemCategory { index, name } => {
                write!(f, "item #{} {} has no category", index + 1, name)
            }
            ShipmentError::MissingPickShift => write!(f, "pickup shift is required"),
        }
    }
}

impl std::error::Error for ShipmentError {}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn required(value: &Option<String>, err: ShipmentError) -> Result<(), ShipmentError> {
    if blank(value) {
        return Err(err);
    }
    Ok(())
}

impl ShipmentItem {
    fn dimension(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Weight => self.weight,
            Dimension::Length => self.length,
            Dimension::Width => self.width,
            Dimension::Height => self.height,
        }
    }
}

impl Package {
    fn dimension(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Weight => self.weight,
            Dimension::Length => self.length,
            Dimension::Width => self.width,
            Dimension::Height => self.height,
        }
    }
}

impl ShipmentDraft {
    /// 任何一项不满足都不会发起网络请求
    pub fn validate(&self) -> Result<(), ShipmentError> {
        if self.payment_type_id.is_none() {
            return Err(ShipmentError::MissingPaymentType);
        }
        if self.service_type_id.is_none() {
            return Err(ShipmentError::MissingServiceType);
        }
        if self.required_note.is_none() {
            return Err(ShipmentError::MissingRequiredNote);
        }

        required(&self.sender.name, ShipmentError::MissingSenderName)?;
        required(&self.sender.phone, ShipmentError::MissingSenderPhone)?;
        required(&self.sender.address, ShipmentError::MissingSenderAddress)?;

        required(&self.receiver.name, ShipmentError::MissingReceiverName)?;
        required(&self.receiver.phone, ShipmentError::MissingReceiverPhone)?;
        required(&self.receiver.address, ShipmentError::MissingReceiverAddress)?;
        required(&self.receiver.ward_code, ShipmentError::MissingReceiverWard)?;
        if self.receiver.district_id.is_none() {
            return Err(ShipmentError::MissingReceiverDistrict);
        }

        if self.items.is_empty() {
            return Err(ShipmentError::NoItems);
        }

        for dimension in [
            Dimension::Weight,
            Dimension::Length,
            Dimension::Width,
            Dimension::Height,
        ] {
            let required = self
                .items
                .iter()
                .map(|item| item.dimension(dimension) as u64)
                .sum::<u64>();
            let declared = self.package.dimension(dimension) as u64;
            if declared < required {
                return Err(ShipmentError::PackageTooSmall {
                    dimension,
                    declared,
                    required,
                });
            }
        }

        if let Some(index) = self.items.iter().position(|item| item.price < 0) {
            return Err(ShipmentError::NegativeItemPrice {
                index,
                name: self.items[index].name.clone(),
            });
        }
        if self.cod_amount < 0 {
            return Err(ShipmentError::NegativeCodAmount);
        }
        if self.insurance_value < 0 {
            return Err(ShipmentError::NegativeInsuranceValue);
        }

        let goods_value = self.goods_value().ok_or(ShipmentError::GoodsValueOverflow)?;
        if self.cod_amount > goods_value {
            return Err(ShipmentError::CodExceedsValue {
                cod_amount: self.cod_amount,
                goods_value,
            });
        }

        for (index, item) in self.items.iter().enumerate() {
            for dimension in [
                Dimension::Length,
                Dimension::Width,
                Dimension::Height,
                Dimension::Weight,
            ] {
                if item.dimension(dimension) == 0 {
                    return Err(ShipmentError::InvalidItemDimension {
                        index,
                        name: item.name.clone(),
                        dimension,
                    });
                }
            }
            if blank(&item.category) {
                return Err(ShipmentError::MissingItemCategory {
                    index,
                    name: item.name.clone(),
                });
            }
        }

        if self.pick_shift.is_none() {
            return Err(ShipmentError::MissingPickShift);
        }

        Ok(())
    }

    /// 商品总价 = Σ 单价 × 数量, 溢出时返回 None
    pub fn goods_value(&self) -> Option<i64> {
        self.items.iter().try_fold(0i64, |total, item| {
            item.price
                .checked_mul(item.quantity as i64)
                .and_then(|value| total.checked_add(value))
        })
    }

    /// 转换成 GHN 下单请求体, 需先通过 [`ShipmentDraft::validate`]
    pub fn to_request(&self) -> CreateOrderRequest {
        let trimmed = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();

        CreateOrderRequest {
            payment_type_id: self.payment_type_id.unwrap_or_default(),
            service_type_id: self.service_type_id.unwrap_or_default(),
            required_note: self.required_note.unwrap_or(RequiredNote::Khongchoxemhang),
            note: self.note.clone(),
            content: self.content.clone(),
            from_name: trimmed(&self.sender.name),
            from_phone: trimmed(&self.sender.phone),
            from_address: trimmed(&self.sender.address),
            from_ward_name: self.sender.ward_name.clone(),
            from_district_name: self.sender.district_name.clone(),
            from_province_name: self.sender.province_name.clone(),
            to_name: trimmed(&self.receiver.name),
            to_phone: trimmed(&self.receiver.phone),
            to_address: trimmed(&self.receiver.address),
            to_ward_code: trimmed(&self.receiver.ward_code),
            to_district_id: self.receiver.district_id.unwrap_or_default(),
            cod_amount: self.cod_amount,
            insurance_value: self.insurance_value,
            weight: self.package.weight,
            length: self.package.length,
            width: self.package.width,
            height: self.package.height,
            pick_shift: self.pick_shift.into_iter().collect(),
            items: self
                .items
                .iter()
                .map(|item| OrderItem {
                    name: item.name.clone(),
                    code: item.code.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    length: item.length,
                    width: item.width,
                    height: item.height,
                    weight: item.weight,
                    category: ItemCategory {
                        level1: trimmed(&item.category),
                    },
                })
                .collect(),
        }
    }
}

/// 内部订单与 GHN 运单的关联
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub order_id: i64,
    pub order_code: String,
    pub expected_delivery_time: Option<DateTime<Utc>>,
    pub total_fee: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub order: CreatedOrder,
    /// 运单已创建但本地记录保存失败
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ShipmentFailure {
    Invalid(ShipmentError),
    Carrier(GhnError),
}

impl Display for ShipmentFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipmentFailure::Invalid(err) => write!(f, "{}", err),
            ShipmentFailure::Carrier(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ShipmentFailure {}

/// 校验 -> GHN 下单 -> 保存本地记录. 本地记录失败不回滚运单, 只返回警告
pub async fn submit_shipment<C, L>(
    carrier: &C,
    ledger: &L,
    order_id: i64,
    draft: &ShipmentDraft,
) -> Result<SubmitOutcome, ShipmentFailure>
where
    C: Carrier + ?Sized,
    L: ShipmentLedger + ?Sized,
{
    draft.validate().map_err(ShipmentFailure::Invalid)?;

    let order = carrier
        .create_order(&draft.to_request())
        .await
        .map_err(ShipmentFailure::Carrier)?;
    info!("order {} transferred to ghn: {}", order_id, order.order_code);

    let record = ShipmentRecord {
        order_id,
        order_code: order.order_code.clone(),
        expected_delivery_time: order.expected_delivery_time,
        total_fee: order.total_fee,
    };
    let warning = match ledger.save(&record).await {
        Ok(()) => None,
        Err(e) => {
            warn!(
                "ghn order {} created but saving record for order {} failed: {}",
                order.order_code, order_id, e
            );
            Some(format!(
                "shipment {} was created but saving it locally failed: {}",
                order.order_code, e
            ))
        }
    };

    Ok(SubmitOutcome { order, warning })
}
