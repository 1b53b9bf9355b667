use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io::Error;
use std::num::ParseIntError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use validator::ValidationErrors;

use crate::response::{ApiResponse, FAIL, UPSTREAM_FAIL, VALIDATE_FAIL};

/// 返回资源类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 系统定义错误
#[derive(Debug, Clone, Serialize)]
pub enum ApiError {
    Error(String),
    /// 表单校验失败, 不会发起任何网络请求
    Validation(String),
    /// 上游接口(GHN)返回的错误
    Upstream { code: i32, message: String },
    NotFound(String),
    Unauthorized(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Error(err)
            | ApiError::Validation(err)
            | ApiError::NotFound(err)
            | ApiError::Unauthorized(err) => write!(f, "{}", err),
            ApiError::Upstream { code, message } => write!(f, "[{}] {}", code, message),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            ApiError::Error(_) => FAIL,
            ApiError::Validation(_) => VALIDATE_FAIL,
            ApiError::Upstream { .. } => UPSTREAM_FAIL,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND.as_u16(),
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED.as_u16(),
        }
    }
}

impl From<tokio::io::Error> for ApiError {
    fn from(_e: Error) -> Self {
        ApiError::Error(_e.to_string())
    }
}

/// 字段 -> 错误信息
pub fn format_errors(errors: ValidationErrors) -> Vec<HashMap<String, String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, err)| {
            let message = err
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect::<Vec<String>>()
                .join(",");

            let mut map_data = HashMap::new();
            map_data.insert(field.to_owned(), message);
            map_data
        })
        .collect::<Vec<HashMap<String, String>>>()
}

impl From<ValidationErrors> for ApiError {
    fn from(value: ValidationErrors) -> Self {
        let mut message = format_errors(value)
            .into_iter()
            .flat_map(|item| item.into_iter())
            .map(|(field, err)| format!("{}: {}", field, err))
            .collect::<Vec<String>>();
        message.sort();

        ApiError::Validation(message.join("; "))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(_e: sqlx::Error) -> Self {
        match _e {
            sqlx::Error::RowNotFound => ApiError::NotFound("record not found".to_string()),
            _ => ApiError::Error(_e.to_string()),
        }
    }
}

impl From<&str> for ApiError {
    fn from(_e: &str) -> Self {
        ApiError::Error(_e.to_string())
    }
}

impl From<String> for ApiError {
    fn from(_e: String) -> Self {
        ApiError::Error(_e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::OK,
        };

        let mut response = ApiResponse::<()>::fail_msg_code(self.code(), self.to_string()).response_body();
        *response.status_mut() = status;
        response
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        ApiError::Unauthorized(value.to_string())
    }
}

impl From<ParseIntError> for ApiError {
    fn from(value: ParseIntError) -> Self {
        ApiError::Error(value.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::Error(value.to_string())
    }
}

impl From<serde_yaml::Error> for ApiError {
    fn from(value: serde_yaml::Error) -> Self {
        ApiError::Error(value.to_string())
    }
}

#[cfg(test)]
mod test {
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[test]
    fn validation_errors_are_flattened() {
        let err = Form {
            name: String::new(),
            quantity: 0,
        }
        .validate()
        .unwrap_err();

        match ApiError::from(err) {
            ApiError::Validation(message) => {
                assert_eq!(message, "name: name is required; quantity: range");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn row_not_found_is_not_found() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), 404);
    }
}
