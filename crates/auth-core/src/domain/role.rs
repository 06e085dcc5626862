//! 역할 기반 접근 제어 (RBAC) 모델.
//!
//! 권한은 단일 서수 정수이며 높을수록 더 많은 권한을 가집니다.
//! 사용자의 유효 권한은 보유한 역할 중 최댓값입니다 (합산하지 않음).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 역할.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Role {
    pub id: Uuid,
    /// 역할 제목 (고유)
    pub title: String,
    /// 권한 레벨
    pub permissions: i32,
    pub created_at: DateTime<Utc>,
}

/// 새 역할 입력.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub title: String,
    pub permissions: i32,
}

/// 역할 수정 입력. `None` 필드는 유지됩니다.
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub title: Option<String>,
    pub permissions: Option<i32>,
}

/// 사용자-역할 연결.
///
/// (user_id, role_id) 쌍당 최대 1개 행만 존재합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
}

/// 역할 목록에서 유효 권한 레벨을 계산합니다.
///
/// 역할이 없으면 0.
pub fn effective_permission<'a>(roles: impl IntoIterator<Item = &'a Role>) -> i32 {
    roles
        .into_iter()
        .map(|role| role.permissions)
        .max()
        .unwrap_or(0)
        .max(0)
}
