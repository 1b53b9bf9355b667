use std::sync::Arc;

use axum::extract::Path;
use axum::response::Response;
use axum::Extension;
use serde_json::json;
use tracing::warn;
use validator::Validate;

use common::error::{ApiError, ApiResult};
use common::jwt::Claims;
use common::request::address::ReqStoreAddress;
use common::response::address::ResStoreAddress;
use common::{ApiResponse, AppExtractor};

use crate::controller::location::resolve;
use crate::controller::{ensure_store, invalid};
use crate::models::address::StoreAddress;
use crate::AppState;

pub struct AddressController;

impl AddressController {
    /// 门店发货地址列表
    pub async fn list_address(
        Extension(claims): Extension<Claims>,
        Path(store_id): Path<i64>,
    ) -> ApiResult<Response> {
        ensure_store(&claims, store_id)?;

        let data = StoreAddress::list(store_id)
            .await?
            .into_iter()
            .map(ResStoreAddress::from)
            .collect::<Vec<ResStoreAddress>>();
        Ok(ApiResponse::response(Some(data)).json())
    }

    pub async fn create_address(
        Extension(state): Extension<Arc<AppState>>,
        Path(store_id): Path<i64>,
        mut params: AppExtractor<ReqStoreAddress>,
    ) -> ApiResult<Response> {
        ensure_store(&params.claims, store_id)?;
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        complete_location(&state, &mut params.inner).await;
        let id = StoreAddress::create(store_id, &params.inner).await?;
        Ok(ApiResponse::response(Some(json!({ "id": id }))).json())
    }

    pub async fn update_address(
        Extension(state): Extension<Arc<AppState>>,
        Path((store_id, id)): Path<(i64, i64)>,
        mut params: AppExtractor<ReqStoreAddress>,
    ) -> ApiResult<Response> {
        ensure_store(&params.claims, store_id)?;
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        complete_location(&state, &mut params.inner).await;
        if !StoreAddress::update(id, store_id, &params.inner).await? {
            return Err(ApiError::NotFound(format!("store address {} not found", id)));
        }
        Ok(ApiResponse::response(Some(json!({ "status": true }))).json())
    }

    pub async fn delete_address(
        Extension(claims): Extension<Claims>,
        Path((store_id, id)): Path<(i64, i64)>,
    ) -> ApiResult<Response> {
        ensure_store(&claims, store_id)?;

        let status = StoreAddress::delete(id, store_id).await?;
        Ok(ApiResponse::response(Some(json!({ "status": status }))).json())
    }
}

/// 没有选择省/区县/坊社时, 按地址文本匹配 GHN 基础数据补全
async fn complete_location(state: &AppState, info: &mut ReqStoreAddress) {
    if info.province_id.is_some() && info.district_id.is_some() && info.ward_code.is_some() {
        return;
    }

    let address = info.address.clone().unwrap_or_default();
    let resolved = resolve(state.ghn(), &address).await;
    if let Some(notice) = &resolved.notice {
        warn!("store address location incomplete: {}", notice);
    }

    // 手动选择的层级优先, 下级只在上级一致时才采用自动匹配结果
    if info.province_id.is_none() {
        info.province_id = resolved.province_id;
    }
    if info.province_id != resolved.province_id {
        return;
    }
    if info.district_id.is_none() {
        info.district_id = resolved.district_id;
    }
    if info.district_id != resolved.district_id {
        return;
    }
    if info.ward_code.is_none() {
        info.ward_code = resolved.ward_code;
    }
}
