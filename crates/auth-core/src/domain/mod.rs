//! 도메인 모델 및 협력자 추상화.

mod role;
mod store;
mod user;

pub use role::*;
pub use store::*;
pub use user::*;
