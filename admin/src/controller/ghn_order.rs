use std::sync::Arc;

use axum::extract::Path;
use axum::response::Response;
use axum::Extension;
use tracing::{info, warn};

use common::error::{ApiError, ApiResult};
use common::jwt::Claims;
use common::response::ghn::{ResGhnOrder, ResTransfer};
use common::{ApiResponse, AppExtractor, IsEmpty};
use ghn::shipment::{Sender, ShipmentFailure, SubmitOutcome};
use ghn::{submit_shipment, ShipmentDraft};

use crate::controller::{ensure_staff, upstream};
use crate::models::address::StoreAddress;
use crate::models::ghn_orders::{GhnOrder, GhnOrderLedger};
use crate::AppState;

pub struct GhnOrderController;

impl GhnOrderController {
    /// 订单转运到 GHN
    pub async fn transfer(
        Extension(state): Extension<Arc<AppState>>,
        Path(order_id): Path<i64>,
        params: AppExtractor<ShipmentDraft>,
    ) -> ApiResult<Response> {
        ensure_staff(&params.claims)?;

        if let Some(record) = GhnOrder::get(order_id).await? {
            return Err(ApiError::Error(format!(
                "order {} is already transferred as {}",
                order_id, record.order_code
            )));
        }

        let mut draft = params.inner;
        if let Some(store_id) = params.claims.store_id {
            if let Some(store) = StoreAddress::default_address(store_id).await? {
                if fill_sender(&mut draft.sender, &store) {
                    info!("sender of order {} filled from store {}", order_id, store_id);
                }
            }
        }

        let outcome = submit_shipment(&state.ghn(), &GhnOrderLedger, order_id, &draft)
            .await
            .map_err(failure)?;

        Ok(ApiResponse::response(Some(transfer_result(outcome))).json())
    }

    /// 订单的 GHN 运单, 还没有转运时 data 为 null
    pub async fn record(
        Extension(claims): Extension<Claims>,
        Path(order_id): Path<i64>,
    ) -> ApiResult<Response> {
        ensure_staff(&claims)?;

        let record = GhnOrder::get(order_id).await?.map(ResGhnOrder::from);
        Ok(ApiResponse::response(record).json())
    }
}

/// 表单没有填写的发件人信息用门店发货地址补全, 返回是否有补全
fn fill_sender(sender: &mut Sender, store: &StoreAddress) -> bool {
    let mut filled = false;
    for (field, value) in [
        (&mut sender.name, &store.contact_name),
        (&mut sender.phone, &store.contact_phone),
        (&mut sender.address, &store.address),
    ] {
        if field.is_empty() && !value.trim().is_empty() {
            *field = Some(value.clone());
            filled = true;
        }
    }

    filled
}

fn failure(err: ShipmentFailure) -> ApiError {
    match err {
        ShipmentFailure::Invalid(e) => ApiError::Validation(e.to_string()),
        ShipmentFailure::Carrier(e) => {
            warn!("ghn create order: {}", e);
            upstream(e)
        }
    }
}

fn transfer_result(outcome: SubmitOutcome) -> ResTransfer {
    ResTransfer {
        order_code: outcome.order.order_code,
        sort_code: outcome.order.sort_code,
        expected_delivery_time: outcome.order.expected_delivery_time,
        total_fee: outcome.order.total_fee,
        warning: outcome.warning,
    }
}

#[cfg(test)]
mod test {
    use common::jwt::{UserRole, JWT};
    use ghn::types::CreatedOrder;
    use ghn::{GhnError, ShipmentError};

    use super::*;

    fn store() -> StoreAddress {
        StoreAddress {
            id: 3,
            store_id: 5,
            contact_name: "Shop Minh Anh".to_string(),
            contact_phone: "0909123456".to_string(),
            address: "12 Lê Lợi, Phường Bến Nghé, Quận 1, TP HCM".to_string(),
            is_default: true,
            ..StoreAddress::default()
        }
    }

    #[test]
    fn missing_sender_fields_come_from_store() {
        let mut sender = Sender {
            name: Some("Kho Thủ Đức".to_string()),
            phone: Some("  ".to_string()),
            ..Sender::default()
        };

        assert!(fill_sender(&mut sender, &store()));
        assert_eq!(sender.name.as_deref(), Some("Kho Thủ Đức"));
        assert_eq!(sender.phone.as_deref(), Some("0909123456"));
        assert_eq!(
            sender.address.as_deref(),
            Some("12 Lê Lợi, Phường Bến Nghé, Quận 1, TP HCM")
        );

        assert!(!fill_sender(&mut sender, &store()));
    }

    #[tokio::test]
    async fn customers_cannot_read_records() {
        let claims = JWT::new("secret".to_string(), 60, "storefront".to_string()).new_claims(
            9,
            "khach".to_string(),
            UserRole::Customer,
            None,
        );

        let result = GhnOrderController::record(Extension(claims), Path(1)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn failures_map_to_api_errors() {
        let err = failure(ShipmentFailure::Invalid(ShipmentError::MissingSenderName));
        assert_eq!(err.code(), common::response::VALIDATE_FAIL);

        let err = failure(ShipmentFailure::Carrier(GhnError::Api {
            code: 400,
            message: "Phường không hợp lệ".to_string(),
        }));
        assert!(matches!(err, ApiError::Upstream { code: 400, .. }));
    }

    #[test]
    fn warning_is_passed_through() {
        let result = transfer_result(SubmitOutcome {
            order: CreatedOrder {
                order_code: "LBK7D8".to_string(),
                sort_code: None,
                expected_delivery_time: None,
                total_fee: 33_000,
            },
            warning: Some("saving it locally failed".to_string()),
        });

        assert_eq!(result.order_code, "LBK7D8");
        assert_eq!(result.total_fee, 33_000);
        assert!(result.warning.is_some());
    }
}
