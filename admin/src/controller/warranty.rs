use axum::extract::Path;
use axum::response::Response;
use axum::Extension;
use serde_json::json;
use tracing::info;
use validator::Validate;

use common::error::{ApiError, ApiResult};
use common::jwt::Claims;
use common::request::warranty::{
    ReqActivateWarranty, ReqAssignSerials, ReqCreateWarrantyLog, WarrantyLogPatch,
};
use common::response::warranty::{ResWarranty, ResWarrantyLog};
use common::{ApiResponse, AppExtractor};

use crate::controller::{ensure_staff, invalid};
use crate::models::warranties::Warranty;
use crate::models::warranty_logs::WarrantyLog;

pub struct WarrantyController;

impl WarrantyController {
    /// 给订单商品分配序列号
    pub async fn assign_serials(
        Path((order_id, item_id)): Path<(i64, i64)>,
        params: AppExtractor<ReqAssignSerials>,
    ) -> ApiResult<Response> {
        ensure_staff(&params.claims)?;
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        let serials = params.inner.serials.unwrap_or_default();
        let months = params.inner.warranty_months.unwrap_or_default();
        let assigned = Warranty::assign_serials(order_id, item_id, &serials, months).await?;

        Ok(ApiResponse::response(Some(json!({ "serials": assigned }))).json())
    }

    /// 激活保修
    pub async fn activate(params: AppExtractor<ReqActivateWarranty>) -> ApiResult<Response> {
        ensure_staff(&params.claims)?;
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        let serial_number = params.inner.serial_number.unwrap_or_default();
        let warranty = Warranty::activate(&serial_number, params.claims.id).await?;

        Ok(ApiResponse::response(Some(ResWarranty::from(warranty))).json())
    }

    pub async fn detail(
        Extension(claims): Extension<Claims>,
        Path(id): Path<i64>,
    ) -> ApiResult<Response> {
        ensure_staff(&claims)?;

        let warranty = Warranty::get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("warranty {} not found", id)))?;
        Ok(ApiResponse::response(Some(ResWarranty::from(warranty))).json())
    }

    /// 维修记录列表
    pub async fn list_logs(
        Extension(claims): Extension<Claims>,
        Path(warranty_id): Path<i64>,
    ) -> ApiResult<Response> {
        ensure_staff(&claims)?;

        let data = WarrantyLog::list(warranty_id)
            .await?
            .into_iter()
            .map(ResWarrantyLog::from)
            .collect::<Vec<ResWarrantyLog>>();
        Ok(ApiResponse::response(Some(data)).json())
    }

    pub async fn create_log(
        Path(warranty_id): Path<i64>,
        params: AppExtractor<ReqCreateWarrantyLog>,
    ) -> ApiResult<Response> {
        ensure_staff(&params.claims)?;
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        if Warranty::get(warranty_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("warranty {} not found", warranty_id)));
        }

        let log = WarrantyLog::create(warranty_id, params.claims.id, params.inner).await?;
        info!("warranty {} log {} created: {}", warranty_id, log.id, log.status);
        Ok(ApiResponse::response(Some(ResWarrantyLog::from(log))).json())
    }

    /// 更新维修记录: 缺省字段不变, null 清空
    pub async fn patch_log(
        Path(id): Path<i64>,
        params: AppExtractor<WarrantyLogPatch>,
    ) -> ApiResult<Response> {
        ensure_staff(&params.claims)?;
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        let mut log = WarrantyLog::get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("warranty log {} not found", id)))?;
        if log.apply(params.inner) {
            log.save().await?;
        }

        Ok(ApiResponse::response(Some(ResWarrantyLog::from(log))).json())
    }
}
