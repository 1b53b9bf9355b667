use std::fmt::{Display, Formatter};

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

pub mod address;
pub mod ghn;
pub mod warranty;

/// 全局通用成功编码
pub const SUCCESS: u16 = 0;
/// 全局通用错误编码
pub const FAIL: u16 = 10000;
/// 参数校验错误
pub const VALIDATE_FAIL: u16 = 10001;
/// 承运商接口错误
pub const UPSTREAM_FAIL: u16 = 10002;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> Display for ApiResponse<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(body) => write!(f, "{}", body),
            Err(err) => {
                error!("response serialize err: {}", err);
                write!(f, "")
            }
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn response(data: Option<T>) -> Self {
        Self {
            code: SUCCESS,
            message: "success".to_string(),
            data,
        }
    }

    pub fn success_code_data(code: u16, data: Option<T>) -> Self {
        Self {
            code,
            message: "success".to_string(),
            data,
        }
    }

    pub fn fail_msg(message: String) -> Self {
        Self::fail_msg_code(FAIL, message)
    }

    pub fn fail_msg_code(code: u16, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
        }
    }

    /// 这里必须返回一个 [`IntoResponse`] 才能符合第三方接口的需求
    pub fn json(&self) -> Response {
        self.response_body()
    }

    pub fn response_body(&self) -> Response {
        axum::http::Response::builder()
            .header("Access-Control-Allow-Origin", "*")
            .header("Content-Type", "application/json; charset=UTF-8")
            .header("Cache-Control", "no-cache")
            .body(Body::from(self.to_string()))
            .map(IntoResponse::into_response)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn body_shape() {
        let body = ApiResponse::response(Some(vec![1, 2])).to_string();
        assert_eq!(body, r#"{"code":0,"message":"success","data":[1,2]}"#);

        let body = ApiResponse::<()>::fail_msg("sender name is required".to_string()).to_string();
        assert_eq!(
            body,
            r#"{"code":10000,"message":"sender name is required","data":null}"#
        );
    }
}
