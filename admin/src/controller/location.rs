use std::sync::Arc;

use axum::extract::Path;
use axum::response::Response;
use axum::Extension;
use validator::Validate;

use common::error::ApiResult;
use common::request::ghn::ReqResolveAddress;
use common::response::ghn::ResResolvedAddress;
use common::{ApiResponse, AppExtractor};
use ghn::{LocationSelector, LocationSource};

use crate::controller::{invalid, upstream};
use crate::AppState;

pub struct LocationController;

impl LocationController {
    /// GHN 省/直辖市列表
    pub async fn provinces(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Response> {
        let data = state.ghn().provinces().await.map_err(upstream)?;
        Ok(ApiResponse::response(Some(data)).json())
    }

    pub async fn districts(
        Extension(state): Extension<Arc<AppState>>,
        Path(province_id): Path<i64>,
    ) -> ApiResult<Response> {
        let data = state.ghn().districts(province_id).await.map_err(upstream)?;
        Ok(ApiResponse::response(Some(data)).json())
    }

    pub async fn wards(
        Extension(state): Extension<Arc<AppState>>,
        Path(district_id): Path<i64>,
    ) -> ApiResult<Response> {
        let data = state.ghn().wards(district_id).await.map_err(upstream)?;
        Ok(ApiResponse::response(Some(data)).json())
    }

    /// 上门取件时间段
    pub async fn pickup_shifts(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Response> {
        let data = state.ghn().pickup_shifts().await.map_err(upstream)?;
        Ok(ApiResponse::response(Some(data)).json())
    }

    /// 按地址文本自动匹配省/区县/坊社
    pub async fn resolve_address(
        Extension(state): Extension<Arc<AppState>>,
        params: AppExtractor<ReqResolveAddress>,
    ) -> ApiResult<Response> {
        if let Err(e) = params.inner.validate() {
            return Ok(invalid(e));
        }

        let address = params.inner.address.unwrap_or_default();
        Ok(ApiResponse::response(Some(resolve(state.ghn(), &address).await)).json())
    }
}

/// 解析地址并记录匹配结果, 拉取失败时只返回提示不报错
pub(crate) async fn resolve<S: LocationSource>(source: S, address: &str) -> ResResolvedAddress {
    let mut selector = LocationSelector::new(source);
    let segments = selector.resolve(address).await;
    let state = selector.state();

    ResResolvedAddress {
        province_id: state.selected_province(),
        district_id: state.selected_district(),
        ward_code: state.selected_ward().map(str::to_string),
        province: segments.province,
        district: segments.district,
        ward: segments.ward,
        notice: state.notice().map(|notice| notice.message.clone()),
    }
}

#[cfg(test)]
mod test {
    use axum::async_trait;
    use ghn::types::{District, Province, Ward};
    use ghn::{GhnError, GhnResult};

    use super::*;

    struct Fixture {
        wards_down: bool,
    }

    #[async_trait]
    impl LocationSource for Fixture {
        async fn provinces(&self) -> GhnResult<Vec<Province>> {
            Ok(vec![Province {
                province_id: 202,
                province_name: "Hồ Chí Minh".to_string(),
                name_extension: vec!["TP.HCM".to_string()],
            }])
        }

        async fn districts(&self, province_id: i64) -> GhnResult<Vec<District>> {
            Ok(vec![
                District {
                    district_id: 1442,
                    province_id,
                    district_name: "Quận 1".to_string(),
                    name_extension: vec![],
                },
                District {
                    district_id: 1452,
                    province_id,
                    district_name: "Quận 10".to_string(),
                    name_extension: vec![],
                },
            ])
        }

        async fn wards(&self, district_id: i64) -> GhnResult<Vec<Ward>> {
            if self.wards_down {
                return Err(GhnError::Http("timeout".to_string()));
            }
            Ok(vec![Ward {
                ward_code: "20107".to_string(),
                district_id,
                ward_name: "Phường Bến Nghé".to_string(),
                name_extension: vec![],
            }])
        }
    }

    #[tokio::test]
    async fn resolves_every_level() {
        let result = resolve(
            Fixture { wards_down: false },
            "12 Lê Lợi, P. Bến Nghé, Quận 1, TP HCM",
        )
        .await;

        assert_eq!(result.province_id, Some(202));
        assert_eq!(result.district_id, Some(1442));
        assert_eq!(result.ward_code.as_deref(), Some("20107"));
        assert_eq!(result.district.as_deref(), Some("Quận 1"));
        assert!(result.notice.is_none());
    }

    #[tokio::test]
    async fn failed_level_is_reported() {
        let result = resolve(Fixture { wards_down: true }, "Bến Nghé, Quận 10, Hồ Chí Minh").await;

        assert_eq!(result.district_id, Some(1452));
        assert_eq!(result.ward_code, None);
        assert!(result.notice.is_some());
    }
}
