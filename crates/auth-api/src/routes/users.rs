//! 사용자 endpoint.
//!
//! - `GET /api/v1/users/me` - 현재 사용자 정보
//! - `PATCH /api/v1/users/me/credentials` - 이메일/비밀번호 변경
//! - `GET /api/v1/users/me/history` - 로그인 이력
//! - `POST /api/v1/users/roles` - 역할 부여 (관리자)
//! - `DELETE /api/v1/users/roles` - 역할 회수 (관리자)
//! - `GET /api/v1/users/{id}/roles` - 사용자 역할 목록 (관리자)

use auth_core::{AuthError, LoginHistory, Role, UserRole};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::auth::{validate_password, UserResponse};
use crate::auth::{hash_password_blocking, verify_password_blocking, AdminSession, AuthSession};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

// ==================== 요청 타입 ====================

/// 자격증명 변경 요청.
///
/// 현재 비밀번호 확인이 필요하며, 생략한 필드는 유지됩니다.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeCredentialsRequest {
    #[validate(length(min = 1, max = 50))]
    pub current_password: String,
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_password"))]
    pub new_password: Option<String>,
}

/// 사용자-역할 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserRoleRequest {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

/// 로그인 이력 조회 파라미터.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// 최대 개수 (기본 20, 최대 100)
    pub limit: Option<i64>,
}

// ==================== 핸들러 ====================

/// 현재 사용자 정보.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "현재 사용자", body = UserResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me(session: AuthSession) -> Json<UserResponse> {
    Json(session.user.into())
}

/// 이메일/비밀번호 변경.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me/credentials",
    request_body = ChangeCredentialsRequest,
    responses(
        (status = 200, description = "변경 완료", body = UserResponse),
        (status = 401, description = "현재 비밀번호 불일치", body = ApiErrorResponse),
        (status = 409, description = "이미 사용 중인 이메일", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_credentials(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(request): Json<ChangeCredentialsRequest>,
) -> ApiResult<Json<UserResponse>> {
    request.validate()?;

    let user = session.user;
    verify_password_blocking(request.current_password, user.password_hash.clone())
        .await?
        .map_err(|_| AuthError::Unauthorized)?;

    let email = request.email.unwrap_or_else(|| user.email.clone());
    let password_hash = match request.new_password {
        Some(password) => hash_password_blocking(password).await?,
        None => user.password_hash.clone(),
    };

    let updated = state
        .store
        .update_credentials(user.id, &email, &password_hash)
        .await?;

    info!(user_id = %user.id, "Credentials changed");
    Ok(Json(updated.into()))
}

/// 로그인 이력 (최신순).
#[utoipa::path(
    get,
    path = "/api/v1/users/me/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "로그인 이력", body = Vec<LoginHistory>),
        (status = 401, description = "인증 필요", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn login_history(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<LoginHistory>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let history = state.store.login_history(session.user.id, limit).await?;
    Ok(Json(history))
}

/// 사용자에게 역할 부여.
#[utoipa::path(
    post,
    path = "/api/v1/users/roles",
    request_body = UserRoleRequest,
    responses(
        (status = 201, description = "역할 부여됨", body = UserRole),
        (status = 403, description = "권한 부족", body = ApiErrorResponse),
        (status = 404, description = "사용자 또는 역할 없음", body = ApiErrorResponse),
        (status = 409, description = "이미 보유한 역할", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn grant_role(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    Json(request): Json<UserRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .find_user(request.user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {}", request.user_id)))?;
    state
        .store
        .find_role(request.role_id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("role {}", request.role_id)))?;

    let link = state
        .store
        .grant_role(request.user_id, request.role_id)
        .await?;

    info!(
        admin_id = %admin.user.id,
        user_id = %request.user_id,
        role_id = %request.role_id,
        "Role granted"
    );
    Ok((StatusCode::CREATED, Json(link)))
}

/// 사용자 역할 회수.
#[utoipa::path(
    delete,
    path = "/api/v1/users/roles",
    request_body = UserRoleRequest,
    responses(
        (status = 204, description = "역할 회수됨"),
        (status = 403, description = "권한 부족", body = ApiErrorResponse),
        (status = 404, description = "보유하지 않은 역할", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn revoke_role(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    Json(request): Json<UserRoleRequest>,
) -> ApiResult<StatusCode> {
    let removed = state
        .store
        .revoke_role(request.user_id, request.role_id)
        .await?;

    if !removed {
        return Err(AuthError::NotFound(format!(
            "user {} does not hold role {}",
            request.user_id, request.role_id
        ))
        .into());
    }

    info!(
        admin_id = %admin.user.id,
        user_id = %request.user_id,
        role_id = %request.role_id,
        "Role revoked"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// 사용자가 보유한 역할 목록.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/roles",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    responses(
        (status = 200, description = "역할 목록", body = Vec<Role>),
        (status = 403, description = "권한 부족", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn user_roles(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Role>>> {
    state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {}", user_id)))?;

    let roles = state.access.roles_for_user(user_id).await?;
    Ok(Json(roles))
}

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me))
        .route("/me/credentials", patch(change_credentials))
        .route("/me/history", get(login_history))
        .route("/roles", post(grant_role).delete(revoke_role))
        .route("/{id}/roles", get(user_roles))
}
