//! 외부 협력자 추상화.
//!
//! Token Service와 Authorization Service는 구체 백엔드(PostgreSQL, Redis)가
//! 아니라 이 모듈의 trait에만 의존합니다. 구현체는 `auth-data` 크레이트에
//! 있습니다.

use async_trait::async_trait;
use uuid::Uuid;

use super::{LoginHistory, NewRole, NewUser, Role, RoleUpdate, User, UserRole};
use crate::error::StoreResult;

// =============================================================================
// CredentialStore Trait
// =============================================================================

/// 사용자, 역할, 사용자-역할 관계를 영속화하는 저장소.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct PgCredentialStore {
///     pool: PgPool,
/// }
///
/// #[async_trait]
/// impl CredentialStore for PgCredentialStore {
///     async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
///         // SELECT ... FROM users WHERE id = $1
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// ID로 사용자 조회.
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// 이메일로 사용자 조회.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// 사용자 생성. 이메일이 이미 존재하면 `StoreError::Duplicate`.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// 이메일/비밀번호 해시 변경.
    ///
    /// 다른 사용자가 이미 사용 중인 이메일이면 `StoreError::Duplicate`,
    /// 사용자가 없으면 `StoreError::NotFound`.
    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User>;

    /// ID로 역할 조회.
    async fn find_role(&self, id: Uuid) -> StoreResult<Option<Role>>;

    /// 제목으로 역할 조회.
    async fn find_role_by_title(&self, title: &str) -> StoreResult<Option<Role>>;

    /// 전체 역할 목록 (제목순).
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    /// 역할 생성. 제목이 이미 존재하면 `StoreError::Duplicate`.
    async fn create_role(&self, role: NewRole) -> StoreResult<Role>;

    /// 역할 수정.
    async fn update_role(&self, id: Uuid, update: RoleUpdate) -> StoreResult<Role>;

    /// 역할 삭제. 사용자-역할 연결도 함께 삭제됩니다.
    async fn delete_role(&self, id: Uuid) -> StoreResult<bool>;

    /// 사용자에게 연결된 모든 역할.
    async fn find_roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Role>>;

    /// 역할 부여. (user_id, role_id) 쌍이 이미 있으면 `StoreError::Duplicate`.
    async fn grant_role(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<UserRole>;

    /// 역할 회수. 삭제된 행이 있으면 true.
    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<bool>;

    /// 역할을 가진 사용자 수.
    async fn count_role_holders(&self, role_id: Uuid) -> StoreResult<i64>;

    /// 로그인 이력 기록.
    async fn record_login(&self, user_id: Uuid, source: Option<String>)
        -> StoreResult<LoginHistory>;

    /// 최근 로그인 이력 (최신순).
    async fn login_history(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<LoginHistory>>;

    /// 저장소 상태 확인.
    async fn health_check(&self) -> StoreResult<bool>;
}

// =============================================================================
// TokenCache Trait
// =============================================================================

/// 키별 만료를 지원하는 키-값 캐시.
///
/// 단일 키 get/put/delete 외의 원자성은 보장하지 않습니다.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// 값 저장. `ttl_secs` 후 만료됩니다.
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    /// 값 조회. 없거나 만료되었으면 `None`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// 키 삭제. 삭제된 키가 있으면 true.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// 캐시 상태 확인.
    async fn health_check(&self) -> StoreResult<bool>;
}
