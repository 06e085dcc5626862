//! 인증 서비스 운영 CLI.
//!
//! - 데이터베이스 마이그레이션
//! - 관리자 역할 및 관리자 계정 부트스트랩

pub mod commands;
