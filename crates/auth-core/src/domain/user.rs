//! 사용자 및 로그인 이력 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 사용자 계정.
///
/// `password_hash`는 파생 값이며 평문 비밀번호는 저장하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// true면 비활성 계정
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 계정이 활성 상태인지 확인.
    pub fn is_active(&self) -> bool {
        !self.disabled
    }
}

/// 새 사용자 입력.
///
/// 비밀번호는 이미 해싱된 상태로 전달되어야 합니다.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub disabled: bool,
}

/// 로그인 이력 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct LoginHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    /// 로그인 출처 (User-Agent 등)
    pub source: Option<String>,
    pub login_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            disabled: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(user.is_active());
    }
}
