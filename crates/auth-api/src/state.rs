//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 시작 시 명시적으로 생성되어 `Arc`로 핸들러에 주입됩니다.
//! 전역 연결 핸들은 사용하지 않습니다.

use auth_core::{AppConfig, AuthResult, CredentialStore, TokenCache};
use auth_data::Database;
use std::sync::Arc;

use crate::auth::{AuthorizationService, TokenService};

/// 사용 중인 백엔드 이름.
#[derive(Debug, Clone, Copy)]
pub struct Backends {
    /// "postgres" | "memory"
    pub store: &'static str,
    /// "redis" | "memory"
    pub cache: &'static str,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            store: "memory",
            cache: "memory",
        }
    }
}

/// 애플리케이션 공유 상태.
pub struct AppState {
    /// 사용자/역할 저장소
    pub store: Arc<dyn CredentialStore>,

    /// 토큰 캐시 (denylist, refresh 매핑)
    pub cache: Arc<dyn TokenCache>,

    /// 토큰 발급/검증/갱신/폐기
    pub tokens: Arc<TokenService>,

    /// 인증 및 권한 판정
    pub access: AuthorizationService,

    /// PostgreSQL 연결 풀 (종료 시 정리용)
    pub database: Option<Database>,

    /// 백엔드 종류
    pub backends: Backends,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// 토큰 설정이 유효하지 않으면 (서명 키 누락 또는 동일) 실패합니다.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cache: Arc<dyn TokenCache>,
        config: &AppConfig,
    ) -> AuthResult<Self> {
        let tokens = Arc::new(TokenService::new(&config.tokens, cache.clone())?);
        let access = AuthorizationService::new(
            store.clone(),
            tokens.clone(),
            config.authorization.admin_role_title.clone(),
        );

        Ok(Self {
            store,
            cache,
            tokens,
            access,
            database: None,
            backends: Backends::default(),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 데이터베이스 연결 설정.
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// 백엔드 종류 설정.
    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }

    /// 캐시 연결 상태 확인.
    pub async fn is_cache_healthy(&self) -> bool {
        self.cache.health_check().await.unwrap_or(false)
    }
}

/// 테스트용 AppState 생성 (메모리 백엔드).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use auth_core::TokenSettings;
    use auth_data::{MemoryCredentialStore, MemoryTokenCache};

    let config = AppConfig {
        tokens: TokenSettings::new("test-access-secret", "test-refresh-secret"),
        ..Default::default()
    };

    AppState::new(
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(MemoryTokenCache::new()),
        &config,
    )
    .expect("valid test token settings")
}
