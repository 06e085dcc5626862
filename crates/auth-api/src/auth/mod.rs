//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`TokenService`]: Access/Refresh 토큰 발급, 검증, 갱신, 폐기
//! - [`AuthorizationService`]: 자격증명 인증, 현재 사용자 조회, 관리자 판정
//! - [`AuthSession`], [`AdminSession`], [`BearerToken`]: Axum 추출기

mod access;
mod jwt;
mod middleware;
mod tokens;

pub use access::{hash_password_blocking, verify_password_blocking, AuthorizationService};
pub use jwt::{Claims, JwtError, SigningKey, TokenKind};
pub use middleware::{AdminSession, AuthSession, BearerToken};
pub use tokens::{denylist_key, IssuedToken, TokenInfo, TokenService};
