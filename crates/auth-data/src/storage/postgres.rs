//! PostgreSQL 자격증명 저장소.
//!
//! 사용자, 역할, 사용자-역할 연결, 로그인 이력을 관리합니다.

use async_trait::async_trait;
use auth_core::{
    CredentialStore, DatabaseConfig, LoginHistory, NewRole, NewUser, Role, RoleUpdate, StoreError,
    StoreResult, User, UserRole,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::from_sqlx;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, disabled, created_at";

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 Database 인스턴스를 생성합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 연결 풀을 닫습니다.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// PgCredentialStore
// =============================================================================

/// PostgreSQL 기반 [`CredentialStore`].
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, disabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.disabled)
            .fetch_one(&self.pool)
            .await
            .map_err(from_sqlx)?;

        debug!(user_id = %created.id, "User created");
        Ok(created)
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET email = $2, password_hash = $3
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(email)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn find_role(&self, id: Uuid) -> StoreResult<Option<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT id, title, permissions, created_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn find_role_by_title(&self, title: &str) -> StoreResult<Option<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT id, title, permissions, created_at FROM roles WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT id, title, permissions, created_at FROM roles ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn create_role(&self, role: NewRole) -> StoreResult<Role> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, title, permissions)
            VALUES ($1, $2, $3)
            RETURNING id, title, permissions, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&role.title)
        .bind(role.permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn update_role(&self, id: Uuid, update: RoleUpdate) -> StoreResult<Role> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET
                title = COALESCE($2, title),
                permissions = COALESCE($3, permissions)
            WHERE id = $1
            RETURNING id, title, permissions, created_at
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.permissions)
        .fetch_optional(&self.pool)
        .await
        .map_err(from_sqlx)?
        .ok_or_else(|| StoreError::NotFound(format!("role {}", id)))
    }

    async fn delete_role(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.title, r.permissions, r.created_at
            FROM roles r
            JOIN users_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.permissions DESC, r.title
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn grant_role(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<UserRole> {
        sqlx::query_as::<_, UserRole>(
            r#"
            INSERT INTO users_roles (id, user_id, role_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, role_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_role_holders(&self, role_id: Uuid) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users_roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        source: Option<String>,
    ) -> StoreResult<LoginHistory> {
        sqlx::query_as::<_, LoginHistory>(
            r#"
            INSERT INTO login_history (id, user_id, source)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, source, login_time
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn login_history(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<LoginHistory>> {
        sqlx::query_as::<_, LoginHistory>(
            r#"
            SELECT id, user_id, source, login_time
            FROM login_history
            WHERE user_id = $1
            ORDER BY login_time DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(from_sqlx)?;
        Ok(true)
    }
}
