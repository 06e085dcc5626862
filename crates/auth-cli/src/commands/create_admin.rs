//! 관리자 부트스트랩 명령어.
//!
//! 관리자 역할과 그 역할을 가진 관리자 계정을 생성합니다.
//! 관리자 역할을 가진 사용자가 이미 있으면 아무것도 하지 않습니다.
//! 중간에 실패한 부트스트랩은 다시 실행하면 남은 단계부터 이어서 완료합니다.
//!
//! ```bash
//! authctl create-admin --email admin@example.com --password Secret123
//! ```

use anyhow::{anyhow, Result};
use auth_core::{
    hash_password, validate_password_strength, CredentialStore, NewRole, NewUser, StoreError,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use uuid::Uuid;

/// 관리자 부트스트랩 입력.
#[derive(Debug)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: SecretString,
    /// 관리자 역할 제목 (authorization.admin_role_title)
    pub role_title: String,
    /// 관리자 역할 권한 레벨
    pub permissions: i32,
}

/// 부트스트랩 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// 관리자 계정에 역할을 연결했음
    Created { user_id: Uuid, role_id: Uuid },
    /// 관리자 역할을 가진 사용자가 이미 존재함
    AlreadyExists { role_id: Uuid },
}

/// 관리자 역할과 계정을 생성합니다.
///
/// 각 단계는 기존 행을 재사용합니다. 역할만 남은 상태에서는 그 역할을 그대로
/// 쓰고, 같은 이메일의 사용자가 있으면 새로 만들지 않고 역할만 연결합니다.
pub async fn create_admin(
    store: &dyn CredentialStore,
    bootstrap: AdminBootstrap,
) -> Result<BootstrapOutcome> {
    let existing_role = store.find_role_by_title(&bootstrap.role_title).await?;
    if let Some(role) = &existing_role {
        if store.count_role_holders(role.id).await? > 0 {
            info!(role_id = %role.id, title = %role.title, "Admin role already assigned, nothing to do");
            return Ok(BootstrapOutcome::AlreadyExists { role_id: role.id });
        }
        warn!(role_id = %role.id, "Admin role has no holder, resuming bootstrap");
    }

    let password = bootstrap.password.expose_secret();
    validate_password_strength(password).map_err(|msg| anyhow!(msg))?;

    let role = match existing_role {
        Some(role) => role,
        None => {
            let role = store
                .create_role(NewRole {
                    title: bootstrap.role_title.clone(),
                    permissions: bootstrap.permissions,
                })
                .await?;
            info!(role_id = %role.id, permissions = role.permissions, "Admin role created");
            role
        }
    };

    let user = match store.find_user_by_email(&bootstrap.email).await? {
        Some(user) => {
            info!(user_id = %user.id, "Reusing existing user as admin");
            user
        }
        None => {
            let password_hash = hash_password(password)?;
            let user = store
                .create_user(NewUser {
                    email: bootstrap.email.clone(),
                    password_hash,
                    first_name: "Admin".to_string(),
                    last_name: "Admin".to_string(),
                    disabled: false,
                })
                .await?;
            info!(user_id = %user.id, "Admin user created");
            user
        }
    };

    match store.grant_role(user.id, role.id).await {
        Ok(_) | Err(StoreError::Duplicate(_)) => {}
        Err(e) => return Err(e.into()),
    }
    info!(user_id = %user.id, role_id = %role.id, "Admin role granted");

    Ok(BootstrapOutcome::Created {
        user_id: user.id,
        role_id: role.id,
    })
}
