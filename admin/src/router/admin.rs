use axum::routing::{get, patch, post, put};
use axum::{middleware, Router};

use crate::controller::address::AddressController;
use crate::controller::ghn_order::GhnOrderController;
use crate::controller::location::LocationController;
use crate::controller::warranty::WarrantyController;
use crate::controller::CommController;
use crate::middleware::auth_guard;

pub fn admin() -> Router {
    Router::new()
        .route("/refresh_token", post(CommController::refresh_token))
        // GHN 基础数据
        .route("/ghn/provinces", get(LocationController::provinces))
        .route(
            "/ghn/provinces/:id/districts",
            get(LocationController::districts),
        )
        .route("/ghn/districts/:id/wards", get(LocationController::wards))
        .route("/ghn/pickup-shifts", get(LocationController::pickup_shifts))
        .route(
            "/ghn/resolve-address",
            post(LocationController::resolve_address),
        )
        // 订单转运
        .route(
            "/orders/:id/ghn",
            post(GhnOrderController::transfer).get(GhnOrderController::record),
        )
        .route(
            "/orders/:id/items/:item_id/serials",
            post(WarrantyController::assign_serials),
        )
        // 门店发货地址
        .route(
            "/stores/:store_id/address",
            get(AddressController::list_address).post(AddressController::create_address),
        )
        .route(
            "/stores/:store_id/address/:id",
            put(AddressController::update_address).delete(AddressController::delete_address),
        )
        // 保修
        .route("/warranties/activate", post(WarrantyController::activate))
        .route("/warranties/:id", get(WarrantyController::detail))
        .route(
            "/warranties/:id/logs",
            get(WarrantyController::list_logs).post(WarrantyController::create_log),
        )
        .route("/warranty-logs/:id", patch(WarrantyController::patch_log))
        .route_layer(middleware::from_fn(auth_guard))
}
