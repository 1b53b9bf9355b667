use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::TypedHeader;
use tracing::debug;

use common::error::{ApiError, ApiResult};
use common::jwt::JWT;

/// 登录守卫
pub async fn auth_guard<B>(
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut req: Request<B>,
    next: Next<B>,
) -> ApiResult<Response> {
    let jwt = JWT::from(&common::application_config().await.jwt);
    let claims = jwt.verify(auth.token()).map_err(|e| {
        debug!("token verify failed: {}", e);
        ApiError::Unauthorized("not logged in".to_string())
    })?;

    // refresh_token 只能用来换取新的 token
    if !JWT::is_access_token(&claims) && !req.uri().path().ends_with("/refresh_token") {
        return Err(ApiError::Unauthorized("invalid token".to_string()));
    }

    // 携带用户信息到下游去
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
