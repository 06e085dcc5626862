//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use auth_core::{LoginHistory, Role, UserRole};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    ChangeCredentialsRequest, ComponentHealth, ComponentStatus, CreateRoleRequest,
    HealthResponse, LoginRequest, SignupRequest, TokenResponse, UpdateRoleRequest,
    UserResponse, UserRoleRequest,
};

/// `bearer_auth` 보안 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Auth API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Auth Service API",
        description = r#"
# 인증 서비스 REST API

회원가입, 로그인, JWT 토큰 수명주기, 역할 기반 관리자 권한을 제공합니다.

## 인증

보호된 엔드포인트는 `Authorization: Bearer <access_token>` 헤더가 필요합니다.
Access Token이 만료되면 `ACCESS_TOKEN_EXPIRED` 코드가 반환되며,
같은 토큰으로 `POST /api/v1/auth/refresh`를 한 번 호출해 재발급받을 수 있습니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "로컬 개발 서버"),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 회원가입, 로그인, 토큰 관리"),
        (name = "users", description = "사용자 - 계정 정보 및 역할 부여"),
        (name = "roles", description = "역할 - 관리자 전용 역할 관리")
    ),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,

            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Auth =====
            SignupRequest,
            LoginRequest,
            TokenResponse,
            UserResponse,

            // ===== Users =====
            ChangeCredentialsRequest,
            UserRoleRequest,
            UserRole,
            LoginHistory,

            // ===== Roles =====
            Role,
            CreateRoleRequest,
            UpdateRoleRequest,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::refresh,

        // ===== Users =====
        crate::routes::users::me,
        crate::routes::users::change_credentials,
        crate::routes::users::login_history,
        crate::routes::users::grant_role,
        crate::routes::users::revoke_role,
        crate::routes::users::user_roles,

        // ===== Roles =====
        crate::routes::roles::list_roles,
        crate::routes::roles::create_role,
        crate::routes::roles::update_role,
        crate::routes::roles::delete_role,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
