//! 역할 관리 endpoint (관리자 전용).
//!
//! - `GET /api/v1/roles` - 역할 목록
//! - `POST /api/v1/roles` - 역할 생성
//! - `PATCH /api/v1/roles/{id}` - 역할 수정
//! - `DELETE /api/v1/roles/{id}` - 역할 삭제

use auth_core::{AuthError, NewRole, Role, RoleUpdate};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminSession;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 역할 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "역할 제목은 1-255자여야 합니다"))]
    pub title: String,
    #[validate(range(min = 0, message = "권한 레벨은 0 이상이어야 합니다"))]
    pub permissions: i32,
}

/// 역할 수정 요청. 생략한 필드는 유지됩니다.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "역할 제목은 1-255자여야 합니다"))]
    pub title: Option<String>,
    #[validate(range(min = 0, message = "권한 레벨은 0 이상이어야 합니다"))]
    pub permissions: Option<i32>,
}

/// 역할 목록 (제목순).
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses(
        (status = 200, description = "역할 목록", body = Vec<Role>),
        (status = 403, description = "권한 부족", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.store.list_roles().await?))
}

/// 역할 생성.
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "역할 생성됨", body = Role),
        (status = 403, description = "권한 부족", body = ApiErrorResponse),
        (status = 409, description = "이미 존재하는 제목", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    Json(request): Json<CreateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let role = state
        .store
        .create_role(NewRole {
            title: request.title,
            permissions: request.permissions,
        })
        .await?;

    info!(admin_id = %admin.user.id, role_id = %role.id, title = %role.title, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// 역할 수정.
#[utoipa::path(
    patch,
    path = "/api/v1/roles/{id}",
    params(("id" = Uuid, Path, description = "역할 ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "수정된 역할", body = Role),
        (status = 404, description = "역할 없음", body = ApiErrorResponse),
        (status = 409, description = "이미 존재하는 제목", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Role>> {
    request.validate()?;

    let role = state
        .store
        .update_role(
            id,
            RoleUpdate {
                title: request.title,
                permissions: request.permissions,
            },
        )
        .await?;

    info!(admin_id = %admin.user.id, role_id = %role.id, "Role updated");
    Ok(Json(role))
}

/// 역할 삭제. 사용자-역할 연결도 함께 삭제됩니다.
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    params(("id" = Uuid, Path, description = "역할 ID")),
    responses(
        (status = 204, description = "삭제됨"),
        (status = 404, description = "역할 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_role(id).await? {
        return Err(AuthError::NotFound(format!("role {}", id)).into());
    }

    info!(admin_id = %admin.user.id, role_id = %id, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 역할 라우터 생성.
pub fn roles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/{id}", patch(update_role).delete(delete_role))
}
