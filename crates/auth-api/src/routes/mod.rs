//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/auth` - 회원가입, 로그인, 로그아웃, 토큰 재발급
//! - `/api/v1/users` - 현재 사용자, 자격증명 변경, 역할 부여/회수
//! - `/api/v1/roles` - 역할 관리 (관리자)

pub mod auth;
pub mod health;
pub mod roles;
pub mod users;

pub use auth::{auth_router, LoginRequest, SignupRequest, TokenResponse, UserResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use roles::{roles_router, CreateRoleRequest, UpdateRoleRequest};
pub use users::{users_router, ChangeCredentialsRequest, HistoryQuery, UserRoleRequest};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/users", users_router())
        .nest("/api/v1/roles", roles_router())
}
