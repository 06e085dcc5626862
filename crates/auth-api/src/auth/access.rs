//! 인증 및 역할 기반 권한 판정.
//!
//! 유효 권한은 사용자가 보유한 역할의 `permissions` 중 최댓값입니다.
//! 관리자 판정은 `admin_threshold <= effective` 이므로 관리자 역할과
//! 같은 레벨의 역할만 가져도 통과합니다.

use auth_core::{
    effective_permission, hash_password, verify_password, AuthError, AuthResult,
    CredentialStore, PasswordError, Role, User,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::tokens::TokenService;

/// 사용자 인증과 권한 판정.
pub struct AuthorizationService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    admin_role_title: String,
}

impl AuthorizationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        admin_role_title: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            admin_role_title: admin_role_title.into(),
        }
    }

    /// 관리자 역할 제목.
    pub fn admin_role_title(&self) -> &str {
        &self.admin_role_title
    }

    /// 이메일/비밀번호로 사용자를 인증합니다.
    ///
    /// 사용자가 없거나 비밀번호가 틀리면 에러가 아닌 `None`을 반환합니다.
    pub async fn authenticate(&self, email: &str, password: &str) -> AuthResult<Option<User>> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            debug!("Login attempt for unknown email");
            return Ok(None);
        };

        match verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            Ok(()) => Ok(Some(user)),
            Err(PasswordError::InvalidHashFormat) => {
                warn!(user_id = %user.id, "Stored password hash is malformed");
                Ok(None)
            }
            Err(_) => Ok(None),
        }
    }

    /// Access Token의 subject로 현재 사용자를 조회합니다.
    ///
    /// 해독 실패, subject 형식 오류, 존재하지 않는 사용자는 모두 `Unauthorized`.
    pub async fn current_user(&self, access_token: &str) -> AuthResult<User> {
        let claims = self
            .tokens
            .decode_access(access_token)
            .map_err(|_| AuthError::Unauthorized)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthorized)?;

        self.store
            .find_user(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    /// 비활성 계정이면 `InactiveAccount`.
    pub fn require_active(&self, user: User) -> AuthResult<User> {
        if user.is_active() {
            Ok(user)
        } else {
            Err(AuthError::InactiveAccount)
        }
    }

    /// 사용자가 보유한 역할 목록.
    pub async fn roles_for_user(&self, user_id: Uuid) -> AuthResult<Vec<Role>> {
        Ok(self.store.find_roles_for_user(user_id).await?)
    }

    /// 유효 권한 레벨 (역할 중 최댓값, 역할이 없으면 0).
    pub async fn effective_permission(&self, user_id: Uuid) -> AuthResult<i32> {
        let roles = self.roles_for_user(user_id).await?;
        Ok(effective_permission(&roles))
    }

    /// 관리자 권한을 요구합니다.
    ///
    /// - 관리자 역할이 존재하지 않으면 `NotFound`
    /// - 유효 권한이 관리자 레벨보다 낮으면 `Forbidden`
    pub async fn require_admin(&self, user_id: Uuid) -> AuthResult<bool> {
        let admin = self
            .store
            .find_role_by_title(&self.admin_role_title)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("role {}", self.admin_role_title)))?;

        let effective = self.effective_permission(user_id).await?;
        if admin.permissions <= effective {
            Ok(true)
        } else {
            warn!(
                user_id = %user_id,
                effective,
                required = admin.permissions,
                "Admin permission denied"
            );
            Err(AuthError::Forbidden)
        }
    }
}

/// Argon2 해싱을 blocking 스레드에서 수행합니다.
pub async fn hash_password_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

/// Argon2 검증을 blocking 스레드에서 수행합니다.
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> AuthResult<Result<(), PasswordError>> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_core::{NewRole, NewUser, TokenSettings};
    use auth_data::{MemoryCredentialStore, MemoryTokenCache};

    struct Fixture {
        store: Arc<MemoryCredentialStore>,
        tokens: Arc<TokenService>,
        access: AuthorizationService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryCredentialStore::new());
        let tokens = Arc::new(
            TokenService::new(
                &TokenSettings::new("access-secret", "refresh-secret"),
                Arc::new(MemoryTokenCache::new()),
            )
            .unwrap(),
        );
        let access = AuthorizationService::new(store.clone(), tokens.clone(), "admin");
        Fixture {
            store,
            tokens,
            access,
        }
    }

    async fn create_user(store: &MemoryCredentialStore, email: &str, password: &str) -> User {
        store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: hash_password(password).unwrap(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                disabled: false,
            })
            .await
            .unwrap()
    }

    async fn create_role(store: &MemoryCredentialStore, title: &str, permissions: i32) -> Role {
        store
            .create_role(NewRole {
                title: title.to_string(),
                permissions,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate() {
        let f = fixture();
        let user = create_user(&f.store, "a@example.com", "Secret123").await;

        let found = f
            .access
            .authenticate("a@example.com", "Secret123")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        assert!(f
            .access
            .authenticate("a@example.com", "Secret124")
            .await
            .unwrap()
            .is_none());
        assert!(f
            .access
            .authenticate("b@example.com", "Secret123")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_current_user() {
        let f = fixture();
        let user = create_user(&f.store, "a@example.com", "Secret123").await;
        let issued = f.tokens.issue(&user.id.to_string()).await.unwrap();

        let current = f.access.current_user(&issued.access_token).await.unwrap();
        assert_eq!(current.id, user.id);

        assert!(matches!(
            f.access.current_user("garbage").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_current_user_unknown_subject() {
        let f = fixture();
        let issued = f.tokens.issue(&Uuid::new_v4().to_string()).await.unwrap();
        assert!(matches!(
            f.access.current_user(&issued.access_token).await,
            Err(AuthError::Unauthorized)
        ));

        let issued = f.tokens.issue("not-a-uuid").await.unwrap();
        assert!(matches!(
            f.access.current_user(&issued.access_token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_require_active() {
        let f = fixture();
        let mut user = create_user(&f.store, "a@example.com", "Secret123").await;
        assert!(f.access.require_active(user.clone()).is_ok());

        user.disabled = true;
        assert!(matches!(
            f.access.require_active(user),
            Err(AuthError::InactiveAccount)
        ));
    }

    #[tokio::test]
    async fn test_effective_permission_is_max_not_sum() {
        let f = fixture();
        let user = create_user(&f.store, "a@example.com", "Secret123").await;
        assert_eq!(f.access.effective_permission(user.id).await.unwrap(), 0);

        let editor = create_role(&f.store, "editor", 3).await;
        let admin = create_role(&f.store, "admin", 7).await;
        f.store.grant_role(user.id, editor.id).await.unwrap();
        f.store.grant_role(user.id, admin.id).await.unwrap();

        assert_eq!(f.access.effective_permission(user.id).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_require_admin_without_admin_role() {
        let f = fixture();
        let user = create_user(&f.store, "a@example.com", "Secret123").await;

        assert!(matches!(
            f.access.require_admin(user.id).await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_require_admin_boundary() {
        let f = fixture();
        create_role(&f.store, "admin", 7).await;
        let peer = create_role(&f.store, "superuser", 7).await;
        let editor = create_role(&f.store, "editor", 6).await;

        let user = create_user(&f.store, "a@example.com", "Secret123").await;
        f.store.grant_role(user.id, editor.id).await.unwrap();
        assert!(matches!(
            f.access.require_admin(user.id).await,
            Err(AuthError::Forbidden)
        ));

        // 관리자와 같은 레벨이면 통과
        f.store.grant_role(user.id, peer.id).await.unwrap();
        assert!(f.access.require_admin(user.id).await.unwrap());
    }
}
