//! API 에러 응답 타입.
//!
//! `AuthError`를 HTTP 상태 코드와 JSON 본문으로 변환하는 유일한 경계입니다.
//!
//! | AuthError | 상태 코드 |
//! |-----------|-----------|
//! | Unauthorized, AccessTokenExpired, ReLoginRequired | 401 (+ `WWW-Authenticate: Bearer`) |
//! | Forbidden | 403 |
//! | NotFound | 404 |
//! | Conflict | 409 |
//! | InactiveAccount, InvalidInput | 400 |
//! | Storage, Cache, Internal | 500 |

use auth_core::{AuthError, StoreError};
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "ACCESS_TOKEN_EXPIRED",
///   "message": "Access Token이 만료되었습니다",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "UNAUTHORIZED", "CONFLICT")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    pub timestamp: i64,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// 상세 정보를 추가합니다.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// 핸들러와 추출기가 반환하는 에러.
#[derive(Debug)]
pub struct ApiError {
    error: AuthError,
    details: Option<Value>,
}

impl ApiError {
    /// 내부 `AuthError`.
    pub fn kind(&self) -> &AuthError {
        &self.error
    }

    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match &self.error {
            AuthError::Unauthorized | AuthError::AccessTokenExpired | AuthError::ReLoginRequired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::InactiveAccount | AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Storage(_) | AuthError::Cache(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        AuthError::from(error).into()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
                })
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            error: AuthError::InvalidInput(message),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.error.is_infrastructure() {
            error!(code = self.error.code(), error = %self.error, "Request failed");
            "내부 서버 오류가 발생했습니다".to_string()
        } else {
            self.error.to_string()
        };

        let mut body = ApiErrorResponse::new(self.error.code(), message);
        if let Some(details) = self.details {
            body = body.with_details(details);
        }

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::AccessTokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::ReLoginRequired, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::NotFound("role".into()), StatusCode::NOT_FOUND),
            (AuthError::Conflict("email".into()), StatusCode::CONFLICT),
            (AuthError::InactiveAccount, StatusCode::BAD_REQUEST),
            (AuthError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                AuthError::Cache("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ApiError::from(AuthError::AccessTokenExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

        let response = ApiError::from(AuthError::Forbidden).into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_duplicate_store_error_is_conflict() {
        let err = ApiError::from(StoreError::Duplicate("email".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.kind().code(), "CONFLICT");
    }

    #[test]
    fn test_json_serialization() {
        let error = ApiErrorResponse::new("NOT_FOUND", "Resource not found");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"NOT_FOUND\""));
        assert!(json.contains("\"timestamp\""));
        assert!(!json.contains("details"));
    }
}
