//! 인증 서비스의 에러 타입.
//!
//! 토큰 수명주기, 권한 검사, 저장소 접근에서 발생하는 모든 실패를
//! 하나의 분류 체계로 표현합니다. HTTP 상태 코드로의 변환은
//! API 경계(`auth-api::error`)에서만 수행합니다.

use thiserror::Error;

/// 핵심 인증 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 잘못되었거나 누락/변조된 자격증명 또는 토큰
    #[error("자격증명을 확인할 수 없습니다")]
    Unauthorized,

    /// Access Token 만료 (refresh로 재발급 가능)
    #[error("Access Token이 만료되었습니다")]
    AccessTokenExpired,

    /// Refresh 가능 기간 경과, 다시 로그인 필요
    #[error("다시 로그인해야 합니다")]
    ReLoginRequired,

    /// 인증되었으나 권한 부족
    #[error("이 작업을 수행할 권한이 없습니다")]
    Forbidden,

    /// 참조한 엔티티가 존재하지 않음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 중복 이메일, 중복 역할 제목 등
    #[error("이미 존재합니다: {0}")]
    Conflict(String),

    /// 비활성화된 계정
    #[error("비활성화된 계정입니다")]
    InactiveAccount,

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 자격증명 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 토큰 캐시 에러
    #[error("캐시 에러: {0}")]
    Cache(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// 클라이언트가 분기할 수 있는 안정적인 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::AccessTokenExpired => "ACCESS_TOKEN_EXPIRED",
            AuthError::ReLoginRequired => "RE_LOGIN_REQUIRED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::NotFound(_) => "NOT_FOUND",
            AuthError::Conflict(_) => "CONFLICT",
            AuthError::InactiveAccount => "INACTIVE_ACCOUNT",
            AuthError::InvalidInput(_) => "INVALID_INPUT",
            AuthError::Storage(_) => "STORAGE_ERROR",
            AuthError::Cache(_) => "CACHE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 저장소/캐시/내부 장애인지 확인합니다.
    ///
    /// 이 경우 상세 메시지는 로그에만 남기고 클라이언트에는 노출하지 않습니다.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AuthError::Storage(_) | AuthError::Cache(_) | AuthError::Internal(_)
        )
    }
}

/// 저장소 어댑터 에러.
///
/// `CredentialStore`와 `TokenCache` 구현체가 반환합니다.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 고유 제약 조건 위반
    #[error("중복 레코드: {0}")]
    Duplicate(String),

    /// 레코드를 찾을 수 없음
    #[error("레코드를 찾을 수 없음: {0}")]
    NotFound(String),

    /// 데이터베이스 백엔드 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 캐시 백엔드 에러
    #[error("캐시 에러: {0}")]
    Cache(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => AuthError::Conflict(msg),
            StoreError::NotFound(msg) => AuthError::NotFound(msg),
            StoreError::Database(msg) => AuthError::Storage(msg),
            StoreError::Cache(msg) => AuthError::Cache(msg),
        }
    }
}
