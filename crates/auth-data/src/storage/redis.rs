//! Redis 토큰 캐시.
//!
//! Access Token denylist와 access → refresh 매핑을 저장합니다.
//! 값은 JSON이 아닌 원본 문자열로 저장됩니다.

use async_trait::async_trait;
use auth_core::{StoreResult, TokenCache};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::info;

use crate::error::from_redis;

/// Redis 연결 래퍼.
///
/// `ConnectionManager`는 복제 비용이 낮고 연결이 끊기면 자동으로 재연결합니다.
#[derive(Clone)]
pub struct RedisTokenCache {
    connection: ConnectionManager,
}

impl RedisTokenCache {
    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(from_redis)?;
        let connection = client.get_connection_manager().await.map_err(from_redis)?;

        info!("Redis connection established");

        Ok(Self { connection })
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        // SETEX는 0초를 허용하지 않음
        let _: () = conn
            .set_ex(key, value, ttl_secs.max(1))
            .await
            .map_err(from_redis)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(from_redis)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection.clone();
        let deleted: i64 = conn.del(key).await.map_err(from_redis)?;
        Ok(deleted > 0)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.connection.clone();
        let result: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(from_redis)?;

        Ok(result == "PONG")
    }
}
