//! 백엔드 에러를 `StoreError`로 변환합니다.

use auth_core::StoreError;

/// PostgreSQL 고유 제약 조건 위반
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL 외래 키 제약 조건 위반
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// sqlx 에러 변환.
pub fn from_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().unwrap_or_default();
            if code == UNIQUE_VIOLATION {
                StoreError::Duplicate(db_err.message().to_string())
            } else if code == FOREIGN_KEY_VIOLATION {
                StoreError::NotFound(db_err.message().to_string())
            } else {
                StoreError::Database(db_err.message().to_string())
            }
        }
        _ => StoreError::Database(err.to_string()),
    }
}

/// Redis 에러 변환.
pub fn from_redis(err: redis::RedisError) -> StoreError {
    StoreError::Cache(err.to_string())
}
