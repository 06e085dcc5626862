//! # Auth Core
//!
//! 인증 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자, 역할, 사용자-역할 연결, 로그인 이력 모델
//! - 자격증명 저장소(`CredentialStore`) 및 토큰 캐시(`TokenCache`) 추상화
//! - 인증 에러 분류 체계
//! - 비밀번호 해싱
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod password;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
