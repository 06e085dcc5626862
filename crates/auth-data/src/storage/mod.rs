//! 영속 백엔드 어댑터.

pub mod postgres;
pub mod redis;
