//! 메모리 기반 저장소/캐시.
//!
//! 통합 테스트와 PostgreSQL/Redis 없이 실행하는 개발 모드에서 사용합니다.
//! 고유 제약 조건(이메일, 역할 제목, (user_id, role_id))은 PostgreSQL
//! 스키마와 동일하게 적용됩니다. 프로세스가 종료되면 데이터는 사라집니다.

use async_trait::async_trait;
use auth_core::{
    CredentialStore, LoginHistory, NewRole, NewUser, Role, RoleUpdate, StoreError, StoreResult,
    TokenCache, User, UserRole,
};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

// =============================================================================
// MemoryCredentialStore
// =============================================================================

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    users_roles: Vec<UserRole>,
    login_history: Vec<LoginHistory>,
}

/// 메모리 기반 [`CredentialStore`].
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            disabled: user.disabled,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email == email && u.id != user_id)
        {
            return Err(StoreError::Duplicate(format!("email {}", email)));
        }

        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;
        user.email = email.to_string();
        user.password_hash = password_hash.to_string();
        Ok(user.clone())
    }

    async fn find_role(&self, id: Uuid) -> StoreResult<Option<Role>> {
        Ok(self.tables.read().await.roles.get(&id).cloned())
    }

    async fn find_role_by_title(&self, title: &str) -> StoreResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.values().find(|r| r.title == title).cloned())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(roles)
    }

    async fn create_role(&self, role: NewRole) -> StoreResult<Role> {
        let mut tables = self.tables.write().await;
        if tables.roles.values().any(|r| r.title == role.title) {
            return Err(StoreError::Duplicate(format!("role {}", role.title)));
        }

        let created = Role {
            id: Uuid::new_v4(),
            title: role.title,
            permissions: role.permissions,
            created_at: Utc::now(),
        };
        tables.roles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_role(&self, id: Uuid, update: RoleUpdate) -> StoreResult<Role> {
        let mut tables = self.tables.write().await;
        if let Some(title) = &update.title {
            if tables.roles.values().any(|r| &r.title == title && r.id != id) {
                return Err(StoreError::Duplicate(format!("role {}", title)));
            }
        }

        let role = tables
            .roles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("role {}", id)))?;
        if let Some(title) = update.title {
            role.title = title;
        }
        if let Some(permissions) = update.permissions {
            role.permissions = permissions;
        }
        Ok(role.clone())
    }

    async fn delete_role(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.roles.remove(&id).is_some();
        tables.users_roles.retain(|ur| ur.role_id != id);
        Ok(removed)
    }

    async fn find_roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Role>> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables
            .users_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .filter_map(|ur| tables.roles.get(&ur.role_id).cloned())
            .collect();
        roles.sort_by(|a, b| {
            b.permissions
                .cmp(&a.permissions)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(roles)
    }

    async fn grant_role(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<UserRole> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }
        if !tables.roles.contains_key(&role_id) {
            return Err(StoreError::NotFound(format!("role {}", role_id)));
        }
        if tables
            .users_roles
            .iter()
            .any(|ur| ur.user_id == user_id && ur.role_id == role_id)
        {
            return Err(StoreError::Duplicate(format!(
                "user {} already has role {}",
                user_id, role_id
            )));
        }

        let link = UserRole {
            id: Uuid::new_v4(),
            user_id,
            role_id,
        };
        tables.users_roles.push(link.clone());
        Ok(link)
    }

    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users_roles.len();
        tables
            .users_roles
            .retain(|ur| !(ur.user_id == user_id && ur.role_id == role_id));
        Ok(tables.users_roles.len() < before)
    }

    async fn count_role_holders(&self, role_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .users_roles
            .iter()
            .filter(|ur| ur.role_id == role_id)
            .count() as i64)
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        source: Option<String>,
    ) -> StoreResult<LoginHistory> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }

        let entry = LoginHistory {
            id: Uuid::new_v4(),
            user_id,
            source,
            login_time: Utc::now(),
        };
        tables.login_history.push(entry.clone());
        Ok(entry)
    }

    async fn login_history(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<LoginHistory>> {
        let tables = self.tables.read().await;
        // 삽입 순서가 시간 순서이므로 역순이 최신순
        Ok(tables
            .login_history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

// =============================================================================
// MemoryTokenCache
// =============================================================================

/// 메모리 기반 [`TokenCache`].
///
/// 만료는 `tokio::time::Instant` 기준으로 조회 시점에 판정하므로
/// 테스트에서 `tokio::time::pause()`로 시간을 제어할 수 있습니다.
#[derive(Default)]
pub struct MemoryTokenCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 만료된 항목을 제거하고 남은 항목 수를 반환합니다.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, deadline)| *deadline > now);
        entries.len()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs.max(1));
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, deadline)| *deadline > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        Ok(match entries.remove(key) {
            Some((_, deadline)) => deadline > Instant::now(),
            None => false,
        })
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
