//! 인증 서비스 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 마이그레이션 적용
//! authctl migrate
//!
//! # 관리자 역할 및 계정 생성 (설정값 기본)
//! authctl create-admin
//! authctl create-admin --email ops@example.com --password Secret123
//! ```

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing::{error, info};

use auth_cli::commands::create_admin::{create_admin, AdminBootstrap, BootstrapOutcome};
use auth_cli::commands::migrate::run_migrations;
use auth_core::{init_logging, AppConfig, LogConfig};
use auth_data::{Database, PgCredentialStore};

#[derive(Parser)]
#[command(name = "authctl")]
#[command(about = "Auth service CLI - 마이그레이션 및 관리자 부트스트랩", long_about = None)]
#[command(version)]
struct Cli {
    /// 데이터베이스 URL (기본: 설정 또는 DATABASE_URL 환경변수)
    #[arg(long, global = true)]
    db_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SQL 마이그레이션 적용
    Migrate,

    /// 관리자 역할과 관리자 계정 생성 (관리자가 이미 있으면 무시)
    CreateAdmin {
        /// 관리자 이메일 (기본: admin.email 설정)
        #[arg(long)]
        email: Option<String>,

        /// 관리자 비밀번호 (기본: admin.password 설정)
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging)).map_err(|e| anyhow!(e.to_string()))?;

    let db_url = cli
        .db_url
        .clone()
        .or_else(|| config.database.url.clone())
        .ok_or_else(|| {
            anyhow!("DATABASE_URL not found. Set DATABASE_URL environment variable or use --db-url flag")
        })?;

    match cli.command {
        Commands::Migrate => {
            if let Err(e) = run_migrations(&db_url, &config.database).await {
                error!("Migration failed: {}", e);
                return Err(e);
            }
        }

        Commands::CreateAdmin { email, password } => {
            let database = Database::connect(&db_url, &config.database).await?;
            let store = PgCredentialStore::new(&database);

            let admin = config.admin;
            let bootstrap = AdminBootstrap {
                email: email.unwrap_or(admin.email),
                password: password
                    .map(|p| SecretString::new(p.into()))
                    .unwrap_or(admin.password),
                role_title: config.authorization.admin_role_title.clone(),
                permissions: admin.permissions,
            };

            let outcome = create_admin(&store, bootstrap).await;
            database.close().await;

            match outcome? {
                BootstrapOutcome::Created { user_id, role_id } => {
                    info!(%user_id, %role_id, "Admin bootstrap completed");
                    println!("관리자 계정 생성 완료: user_id={}", user_id);
                }
                BootstrapOutcome::AlreadyExists { role_id } => {
                    println!("관리자 역할을 가진 계정이 이미 존재합니다: role_id={}", role_id);
                }
            }
        }
    }

    Ok(())
}
