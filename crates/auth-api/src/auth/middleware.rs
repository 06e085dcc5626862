//! Axum용 인증 추출기.
//!
//! - [`BearerToken`]: `Authorization: Bearer <token>` 원본 문자열 (검증 없음)
//! - [`AuthSession`]: 검증된 토큰 + 활성 상태의 현재 사용자
//! - [`AdminSession`]: `AuthSession` + 관리자 권한

use auth_core::{AuthError, User};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::tokens::TokenInfo;
use crate::error::ApiError;
use crate::state::AppState;

/// Authorization 헤더의 Bearer 토큰.
///
/// 만료된 토큰도 그대로 추출하므로 refresh 엔드포인트에서 사용합니다.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        Ok(BearerToken(token.to_string()))
    }
}

/// 인증된 세션.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn me(session: AuthSession) -> Json<UserResponse> {
///     Json(session.user.into())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: TokenInfo,
    pub user: User,
}

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(raw) = BearerToken::from_request_parts(parts, state).await?;

        let token = state.tokens.validate(&raw).await?;
        let user = state.access.current_user(&raw).await?;
        let user = state.access.require_active(user)?;

        Ok(AuthSession { token, user })
    }
}

/// 관리자 권한을 요구하는 세션.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AuthSession);

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = AuthSession::from_request_parts(parts, state).await?;
        state.access.require_admin(session.user.id).await?;
        Ok(AdminSession(session))
    }
}
