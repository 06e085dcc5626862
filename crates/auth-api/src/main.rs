//! 인증 서비스 API 서버.
//!
//! 설정을 로드하고 저장소/캐시 백엔드를 선택한 뒤 Axum 서버를 시작합니다.
//! `DATABASE_URL`/`REDIS_URL`이 없으면 메모리 백엔드로 동작합니다 (개발용).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use auth_api::metrics::setup_metrics_recorder;
use auth_api::middleware::metrics_layer;
use auth_api::openapi::swagger_ui_router;
use auth_api::routes::create_api_router;
use auth_api::state::{AppState, Backends};
use auth_core::{init_logging, AppConfig, CredentialStore, LogConfig, TokenCache};
use auth_data::{
    Database, MemoryCredentialStore, MemoryTokenCache, PgCredentialStore, RedisTokenCache,
};

/// 메모리 캐시 만료 항목 정리 주기.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// CORS 레이어 생성.
///
/// # 환경변수
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록. 없으면 모든 origin 허용 (개발 모드)
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> Result<(), Box<dyn std::error::Error>> {
    use auth_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

/// 자격증명 저장소 선택.
async fn connect_store(
    config: &AppConfig,
) -> Result<(Arc<dyn CredentialStore>, Option<Database>, &'static str), Box<dyn std::error::Error>>
{
    match config.database.url.as_deref() {
        Some(url) => {
            let database = Database::connect(url, &config.database).await?;
            info!("Connected to PostgreSQL");
            let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(&database));
            Ok((store, Some(database), "postgres"))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory credential store (data is lost on restart)");
            let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
            Ok((store, None, "memory"))
        }
    }
}

/// 토큰 캐시 선택.
///
/// 메모리 캐시를 사용하면 만료 항목 정리 태스크를 함께 시작합니다.
async fn connect_cache(
    config: &AppConfig,
    shutdown_token: CancellationToken,
) -> Result<(Arc<dyn TokenCache>, &'static str), Box<dyn std::error::Error>> {
    if let Some(url) = config.redis.url.as_deref() {
        let cache: Arc<dyn TokenCache> = Arc::new(RedisTokenCache::connect(url).await?);
        info!("Connected to Redis");
        return Ok((cache, "redis"));
    }

    warn!("REDIS_URL not set, using in-memory token cache (single instance only)");
    let memory_cache = Arc::new(MemoryTokenCache::new());

    let purge_target = memory_cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => break,
                _ = interval.tick() => {
                    let purged = purge_target.purge_expired().await;
                    if purged > 0 {
                        tracing::debug!(purged, "Expired cache entries purged");
                    }
                }
            }
        }
    });

    let cache: Arc<dyn TokenCache> = memory_cache;
    Ok((cache, "memory"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // OpenAPI 내보내기 처리 (서버 시작 전)
    handle_export_openapi()?;

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))?;

    info!("Starting Auth API server...");

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let addr = config.server.bind_address().parse::<SocketAddr>().map_err(|e| {
        error!(
            address = %config.server.bind_address(),
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. AUTH__SERVER__HOST, AUTH__SERVER__PORT를 확인하세요."
        );
        e
    })?;

    // 백그라운드 태스크 종료용 토큰
    let shutdown_token = CancellationToken::new();

    let (store, database, store_backend) = connect_store(&config).await?;
    let (cache, cache_backend) = connect_cache(&config, shutdown_token.clone()).await?;

    let mut state = AppState::new(store, cache, &config)
        .map_err(|e| {
            error!(error = %e, "토큰 설정이 유효하지 않습니다");
            e
        })?
        .with_backends(Backends {
            store: store_backend,
            cache: cache_backend,
        });
    if let Some(database) = database {
        state = state.with_database(database);
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        store = state.backends.store,
        cache = state.backends.cache,
        admin_role = %state.access.admin_role_title(),
        "Application state initialized"
    );

    let app = create_router(
        state.clone(),
        metrics_handle,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    if let Some(database) = &state.database {
        database.close().await;
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
/// 시그널 핸들러 설치에 실패하면 해당 시그널은 무시합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
