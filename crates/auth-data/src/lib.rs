//! # Auth Data
//!
//! `auth-core`에 정의된 협력자 trait의 구체 구현을 제공합니다.
//!
//! - [`PgCredentialStore`]: PostgreSQL 기반 사용자/역할 저장소 (sqlx)
//! - [`RedisTokenCache`]: Redis 기반 토큰 캐시 (denylist, refresh 매핑)
//! - [`MemoryCredentialStore`], [`MemoryTokenCache`]: 테스트 및 인프라 없는
//!   개발 모드를 위한 메모리 구현

pub mod error;
pub mod memory;
pub mod storage;

pub use memory::{MemoryCredentialStore, MemoryTokenCache};
pub use storage::postgres::{Database, PgCredentialStore};
pub use storage::redis::RedisTokenCache;
