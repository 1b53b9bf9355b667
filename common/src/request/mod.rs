use axum::extract::FromRequest;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Form, Json, RequestExt};

use crate::jwt::Claims;
use crate::ApiResponse;

pub mod address;
pub mod ghn;
pub mod warranty;

/// 存储HTTPBody数据, 当前登录用户信息
#[derive(Debug)]
pub struct AppExtractor<T> {
    pub inner: T,
    pub claims: Claims,
}

fn reject(code: StatusCode, message: &str) -> Response {
    ApiResponse::<()>::fail_msg_code(code.as_u16(), message.to_string()).response_body()
}

#[async_trait]
impl<S, B, T> FromRequest<S, B> for AppExtractor<T>
where
    B: Send + 'static,
    S: Send + Sync,
    T: 'static,
    Json<T>: FromRequest<(), B>,
    Form<T>: FromRequest<(), B>,
{
    type Rejection = Response;

    async fn from_request(req: Request<B>, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = match req.extensions().get::<Claims>() {
            Some(value) => value.clone(),
            None => return Err(reject(StatusCode::UNAUTHORIZED, "not logged in")),
        };

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        if content_type.starts_with("application/json") {
            let Json(inner) = req
                .extract::<Json<T>, _>()
                .await
                .map_err(|_err| reject(StatusCode::PRECONDITION_FAILED, "invalid json body"))?;

            return Ok(Self { inner, claims });
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(inner) = req.extract::<Form<T>, _>().await.map_err(|_err| {
                reject(
                    StatusCode::PRECONDITION_FAILED,
                    "invalid x-www-form-urlencoded body",
                )
            })?;

            return Ok(Self { inner, claims });
        }

        Err(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response())
    }
}
