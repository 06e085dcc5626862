//! 인증 endpoint.
//!
//! - `POST /api/v1/auth/signup` - 회원가입
//! - `POST /api/v1/auth/login` - 로그인 (Access Token 발급)
//! - `POST /api/v1/auth/logout` - 로그아웃 (Access Token 폐기)
//! - `POST /api/v1/auth/refresh` - 만료되었거나 유효한 토큰으로 재발급

use auth_core::{validate_password_strength, AuthError, NewUser, User};
use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::{hash_password_blocking, AuthSession, BearerToken, IssuedToken};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::metrics::record_login;
use crate::state::AppState;

/// 로그인 이력에 저장할 User-Agent 최대 길이.
const MAX_SOURCE_LEN: usize = 255;

// ==================== 요청/응답 타입 ====================

/// 비밀번호 규칙 검증 (8-50자, 영문+숫자).
pub(crate) fn validate_password(value: &str) -> Result<(), ValidationError> {
    validate_password_strength(value)
        .map_err(|msg| ValidationError::new("weak_password").with_message(msg.into()))
}

/// 회원가입 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(length(min = 3, max = 50, message = "이름은 3-50자여야 합니다"))]
    pub first_name: String,
    #[validate(length(min = 3, max = 50, message = "성은 3-50자여야 합니다"))]
    pub last_name: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub password: String,
}

/// 사용자 응답 (비밀번호 해시 제외).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            disabled: user.disabled,
            created_at: user.created_at,
        }
    }
}

/// 토큰 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// 항상 "bearer"
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: "bearer".to_string(),
            expires_at: issued.expires_at,
        }
    }
}

// ==================== 핸들러 ====================

/// 회원가입.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "가입 성공", body = UserResponse),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse),
        (status = 409, description = "이미 사용 중인 이메일", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let password_hash = hash_password_blocking(request.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            email: request.email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            disabled: false,
        })
        .await?;

    info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// 로그인.
///
/// 성공하면 로그인 이력에 User-Agent를 기록합니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = TokenResponse),
        (status = 400, description = "비활성 계정", body = ApiErrorResponse),
        (status = 401, description = "이메일 또는 비밀번호 불일치", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    request.validate()?;

    let Some(user) = state
        .access
        .authenticate(&request.email, &request.password)
        .await?
    else {
        record_login("invalid_credentials");
        return Err(AuthError::Unauthorized.into());
    };

    let user = state.access.require_active(user).inspect_err(|_| {
        record_login("inactive");
    })?;

    // 이력 기록이 실패하면 refresh 매핑이 캐시에 남지 않도록 발급보다 먼저 기록
    let source = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(MAX_SOURCE_LEN).collect::<String>());
    state.store.record_login(user.id, source).await?;

    let issued = state.tokens.issue(&user.id.to_string()).await?;

    record_login("success");
    info!(user_id = %user.id, "User logged in");
    Ok(Json(issued.into()))
}

/// 로그아웃.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "토큰 폐기됨"),
        (status = 401, description = "유효하지 않은 토큰", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> ApiResult<StatusCode> {
    state.tokens.revoke(&session.token.access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 토큰 재발급.
///
/// 제시한 Access Token은 만료되어 있어도 됩니다. 같은 토큰으로는 한 번만
/// 재발급할 수 있습니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "재발급 성공", body = TokenResponse),
        (status = 401, description = "다시 로그인 필요", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<TokenResponse>> {
    let issued = state.tokens.refresh(&token).await?;
    Ok(Json(issued.into()))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}
