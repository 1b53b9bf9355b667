use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde_json::json;
use validator::ValidationErrors;

use common::error::{format_errors, ApiError, ApiResult};
use common::jwt::{Claims, UserRole, JWT};
use common::ApiResponse;
use ghn::GhnError;

pub mod address;
pub mod ghn_order;
pub mod location;
pub mod warranty;

pub struct CommController;

impl CommController {
    /// 刷新token
    pub async fn refresh_token(Extension(mut claims): Extension<Claims>) -> impl IntoResponse {
        if !JWT::is_refresh_token(&claims) {
            return ApiError::Unauthorized("refresh_token required".to_string()).into_response();
        }

        let jwt = JWT::from(&common::application_config().await.jwt);
        match jwt.token_info(&mut claims) {
            Ok((access_token, refresh_token)) => ApiResponse::response(Some(json!({
                "access_token": access_token,
                "refresh_token": refresh_token,
            })))
            .json(),
            Err(e) => ApiResponse::<()>::fail_msg(e.to_string()).json(),
        }
    }
}

/// 表单校验失败, 返回每个字段的错误信息
pub(crate) fn invalid(errors: ValidationErrors) -> Response {
    ApiResponse::success_code_data(common::response::FAIL, Some(json!(format_errors(errors)))).json()
}

/// GHN 返回的业务错误原样透传给前端
pub(crate) fn upstream(err: GhnError) -> ApiError {
    match err {
        GhnError::Api { code, message } => ApiError::Upstream { code, message },
        GhnError::Err(message) | GhnError::Http(message) => ApiError::Error(message),
    }
}

/// 管理员和商家可以处理订单与保修
pub(crate) fn ensure_staff(claims: &Claims) -> ApiResult<()> {
    match claims.role {
        UserRole::Admin | UserRole::Seller => Ok(()),
        UserRole::Customer => Err(ApiError::Unauthorized("permission denied".to_string())),
    }
}

pub(crate) fn ensure_store(claims: &Claims, store_id: i64) -> ApiResult<()> {
    if claims.can_manage_store(store_id) {
        return Ok(());
    }

    Err(ApiError::Unauthorized(format!(
        "no permission for store {}",
        store_id
    )))
}

#[cfg(test)]
mod test {
    use super::*;

    fn claims(role: UserRole, store_id: Option<i64>) -> Claims {
        JWT::new("secret".to_string(), 60, "storefront".to_string()).new_claims(
            1,
            "staff".to_string(),
            role,
            store_id,
        )
    }

    #[test]
    fn upstream_keeps_carrier_message() {
        let err = upstream(GhnError::Api {
            code: 400,
            message: "Số điện thoại không hợp lệ".to_string(),
        });
        assert_eq!(err.code(), common::response::UPSTREAM_FAIL);
        assert!(err.to_string().contains("Số điện thoại không hợp lệ"));

        let err = upstream(GhnError::Http("connection refused".to_string()));
        assert!(matches!(err, ApiError::Error(_)));
    }

    #[test]
    fn roles() {
        assert!(ensure_staff(&claims(UserRole::Admin, None)).is_ok());
        assert!(ensure_staff(&claims(UserRole::Customer, None)).is_err());

        let seller = claims(UserRole::Seller, Some(5));
        assert!(ensure_store(&seller, 5).is_ok());
        assert!(ensure_store(&seller, 6).is_err());
        assert!(ensure_store(&claims(UserRole::Admin, None), 6).is_ok());
    }
}
