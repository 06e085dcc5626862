//! 토큰 수명주기 관리.
//!
//! # 상태 전이
//!
//! ```text
//! Issued → Valid → { Expired | Revoked }
//! ```
//!
//! Expired와 Revoked는 종료 상태입니다. Expired 토큰은 refresh로 새 토큰을
//! 발급받을 수 있지만 원래 토큰이 다시 Valid가 되지는 않습니다.
//!
//! # 캐시 키
//!
//! - `invalid-access-token:{token}` → subject (TTL: 토큰의 남은 수명 + 1초)
//! - `{access_token}` → refresh_token (TTL: refresh 수명)
//!
//! Refresh Token은 클라이언트에 반환하지 않고 캐시에만 보관합니다.

use auth_core::{AuthError, AuthResult, TokenCache, TokenSettings};
use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::jwt::{Claims, JwtError, SigningKey, TokenKind};
use crate::metrics::{record_refresh, record_token_issued, record_token_revoked};

/// 누락된 토큰을 그대로 문자열화한 클라이언트 버그 방어용 값.
const UNDEFINED_TOKEN: &str = "undefined";

const DENYLIST_PREFIX: &str = "invalid-access-token:";

/// denylist 캐시 키.
pub fn denylist_key(token: &str) -> String {
    format!("{}{}", DENYLIST_PREFIX, token)
}

/// 발급된 Access Token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// 검증된 Access Token 정보.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenInfo {
    pub access_token: String,
    /// 항상 "bearer"
    pub token_type: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// Access/Refresh 토큰 발급, 검증, 갱신, 폐기.
pub struct TokenService {
    cache: Arc<dyn TokenCache>,
    access_key: SigningKey,
    refresh_key: SigningKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    revoke_refresh_on_logout: bool,
}

impl TokenService {
    /// 설정을 검증하고 서비스를 생성합니다.
    pub fn new(settings: &TokenSettings, cache: Arc<dyn TokenCache>) -> AuthResult<Self> {
        settings.validate()?;

        let access_ttl = lifetime(
            Duration::try_minutes(settings.access_ttl_minutes),
            "access_ttl_minutes",
        )?;
        let refresh_ttl = lifetime(
            Duration::try_days(settings.refresh_ttl_days),
            "refresh_ttl_days",
        )?;

        Ok(Self {
            cache,
            access_key: SigningKey::from_secret(settings.access_secret.expose_secret().as_bytes()),
            refresh_key: SigningKey::from_secret(
                settings.refresh_secret.expose_secret().as_bytes(),
            ),
            access_ttl,
            refresh_ttl,
            revoke_refresh_on_logout: settings.revoke_refresh_on_logout,
        })
    }

    /// Access Token 수명.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// 새 토큰 쌍을 발급합니다.
    ///
    /// Refresh Token은 `access_token → refresh_token` 캐시 항목으로만 남고
    /// 호출자에게는 Access Token과 만료 시각만 반환됩니다.
    pub async fn issue(&self, subject: &str) -> AuthResult<IssuedToken> {
        let access_claims = Claims::new(subject, TokenKind::Access, self.access_ttl);
        let refresh_claims = Claims::new(subject, TokenKind::Refresh, self.refresh_ttl);

        let access_token = self.access_key.encode(&access_claims).map_err(internal)?;
        let refresh_token = self.refresh_key.encode(&refresh_claims).map_err(internal)?;

        let refresh_ttl_secs = self.refresh_ttl.num_seconds().max(1) as u64;
        self.cache
            .put(&access_token, &refresh_token, refresh_ttl_secs)
            .await?;

        record_token_issued();
        info!(user_id = %subject, "Token pair issued");

        Ok(IssuedToken {
            access_token,
            expires_at: access_claims.expires_at(),
        })
    }

    /// Access Token을 검증합니다.
    ///
    /// - denylist에 있거나 `"undefined"`이면 `Unauthorized`
    /// - 만료되었으면 `AccessTokenExpired`
    /// - 서명/형식/종류가 잘못되었으면 `Unauthorized`
    pub async fn validate(&self, access_token: &str) -> AuthResult<TokenInfo> {
        if access_token == UNDEFINED_TOKEN {
            return Err(AuthError::Unauthorized);
        }

        if self.cache.get(&denylist_key(access_token)).await?.is_some() {
            warn!("Revoked access token presented");
            return Err(AuthError::Unauthorized);
        }

        let claims = self.decode_access(access_token)?;

        Ok(TokenInfo {
            access_token: access_token.to_string(),
            token_type: "bearer".to_string(),
            subject: claims.sub.clone(),
            expires_at: claims.expires_at(),
        })
    }

    /// Access Token을 서명 키로만 해독합니다 (denylist 확인 없음).
    pub fn decode_access(&self, access_token: &str) -> AuthResult<Claims> {
        self.access_key
            .decode(access_token, TokenKind::Access)
            .map_err(|e| match e {
                JwtError::Expired => AuthError::AccessTokenExpired,
                _ => AuthError::Unauthorized,
            })
    }

    /// 만료되었거나 유효한 Access Token으로 새 토큰을 발급합니다.
    ///
    /// 캐시 매핑은 일회용입니다. 같은 토큰으로 두 번째 호출하면
    /// `ReLoginRequired`로 실패합니다.
    pub async fn refresh(&self, access_token: &str) -> AuthResult<IssuedToken> {
        let Some(refresh_token) = self.cache.get(access_token).await? else {
            record_refresh("relogin_required");
            info!("Refresh mapping missing, re-login required");
            return Err(AuthError::ReLoginRequired);
        };

        self.cache.delete(access_token).await?;

        let claims = match self.refresh_key.decode(&refresh_token, TokenKind::Refresh) {
            Ok(claims) => claims,
            Err(e) => {
                record_refresh("invalid");
                warn!(error = %e, "Cached refresh token rejected");
                return Err(AuthError::Unauthorized);
            }
        };

        let issued = self.issue(&claims.sub).await?;
        record_refresh("success");
        Ok(issued)
    }

    /// Access Token을 폐기합니다.
    ///
    /// denylist 항목은 토큰이 서명 검증을 통과하는 마지막 초까지 유지되고
    /// 그 직후 만료됩니다. 이미 만료된 토큰은 종료 상태이므로 아무것도 하지 않습니다.
    pub async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        let claims = match self.access_key.decode(access_token, TokenKind::Access) {
            Ok(claims) => claims,
            Err(JwtError::Expired) => {
                debug!("Revoke of expired token ignored");
                return Ok(());
            }
            Err(_) => return Err(AuthError::Unauthorized),
        };

        let ttl_secs = claims.denylist_ttl_secs();
        self.cache
            .put(&denylist_key(access_token), &claims.sub, ttl_secs)
            .await?;

        if self.revoke_refresh_on_logout {
            self.cache.delete(access_token).await?;
        }

        record_token_revoked();
        info!(user_id = %claims.sub, ttl_secs, "Access token revoked");
        Ok(())
    }
}

/// 토큰 수명을 검증합니다. 만료 시각이 표현 가능한 범위를 넘으면 설정 에러.
fn lifetime(ttl: Option<Duration>, field: &str) -> AuthResult<Duration> {
    ttl.filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| AuthError::InvalidInput(format!("tokens.{} 값이 너무 큽니다", field)))
}

fn internal(err: JwtError) -> AuthError {
    AuthError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_data::MemoryTokenCache;

    fn service_with(settings: TokenSettings) -> (TokenService, Arc<MemoryTokenCache>) {
        let cache = Arc::new(MemoryTokenCache::new());
        let service = TokenService::new(&settings, cache.clone()).unwrap();
        (service, cache)
    }

    fn service() -> (TokenService, Arc<MemoryTokenCache>) {
        service_with(TokenSettings::new("access-secret", "refresh-secret"))
    }

    #[tokio::test]
    async fn test_issue_then_validate() {
        let (tokens, cache) = service();
        let issued = tokens.issue("user-1").await.unwrap();

        let info = tokens.validate(&issued.access_token).await.unwrap();
        assert_eq!(info.subject, "user-1");
        assert_eq!(info.token_type, "bearer");
        assert_eq!(info.expires_at, issued.expires_at);

        let remaining = issued.expires_at - Utc::now();
        assert!(remaining <= Duration::minutes(15));
        assert!(remaining > Duration::minutes(14));

        // refresh 매핑이 캐시에 남음
        assert!(cache.get(&issued.access_token).await.unwrap().is_some());
    }

    #[test]
    fn test_rejects_shared_signing_key() {
        let cache = Arc::new(MemoryTokenCache::new());
        let result = TokenService::new(&TokenSettings::new("same", "same"), cache);
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_out_of_range_lifetimes() {
        let mut settings = TokenSettings::new("access-secret", "refresh-secret");
        settings.access_ttl_minutes = i64::MAX;
        let result = TokenService::new(&settings, Arc::new(MemoryTokenCache::new()));
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));

        let mut settings = TokenSettings::new("access-secret", "refresh-secret");
        settings.refresh_ttl_days = i64::MAX / 86_400;
        let result = TokenService::new(&settings, Arc::new(MemoryTokenCache::new()));
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_validate_rejects_undefined_sentinel() {
        let (tokens, _) = service();
        assert!(matches!(
            tokens.validate("undefined").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_validate_rejects_tampered_token() {
        let (tokens, _) = service();
        let issued = tokens.issue("user-1").await.unwrap();
        let tampered = format!("{}x", issued.access_token);

        assert!(matches!(
            tokens.validate(&tampered).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_validate_reports_expiry() {
        let (tokens, _) = service();
        let expired = tokens
            .access_key
            .encode(&Claims::new("user-1", TokenKind::Access, Duration::seconds(-1)))
            .unwrap();

        assert!(matches!(
            tokens.validate(&expired).await,
            Err(AuthError::AccessTokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let (tokens, cache) = service();
        let issued = tokens.issue("user-1").await.unwrap();
        let refresh_token = cache.get(&issued.access_token).await.unwrap().unwrap();

        assert!(matches!(
            tokens.validate(&refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_revoke_then_validate_fails() {
        let (tokens, cache) = service();
        let issued = tokens.issue("user-1").await.unwrap();

        tokens.revoke(&issued.access_token).await.unwrap();

        assert!(matches!(
            tokens.validate(&issued.access_token).await,
            Err(AuthError::Unauthorized)
        ));
        assert_eq!(
            cache
                .get(&denylist_key(&issued.access_token))
                .await
                .unwrap()
                .as_deref(),
            Some("user-1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_denylist_entry_expires_with_token() {
        let (tokens, cache) = service();
        let issued = tokens.issue("user-1").await.unwrap();
        tokens.revoke(&issued.access_token).await.unwrap();

        tokio::time::advance(std::time::Duration::from_secs(16 * 60)).await;

        assert!(cache
            .get(&denylist_key(&issued.access_token))
            .await
            .unwrap()
            .is_none());
    }

    /// 실제 시계 기준: denylist 항목이 만료 직전의 마지막 유효 초보다 먼저 사라지면 안 됨.
    #[tokio::test]
    async fn test_revoked_token_stays_rejected_until_natural_expiry() {
        use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

        let (tokens, cache) = service();

        // 초 경계 0.1초 뒤로 정렬
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_millis() as u64;
        let wait = if millis <= 100 { 100 - millis } else { 1100 - millis };
        tokio::time::sleep(StdDuration::from_millis(wait)).await;

        let token = tokens
            .access_key
            .encode(&Claims::new("user-1", TokenKind::Access, Duration::seconds(2)))
            .unwrap();
        tokens.revoke(&token).await.unwrap();

        // exp 초 안: 서명상 아직 유효하지만 denylist가 막아야 함
        tokio::time::sleep(StdDuration::from_millis(2300)).await;
        assert!(matches!(
            tokens.validate(&token).await,
            Err(AuthError::Unauthorized)
        ));

        // 자연 만료 이후에는 denylist 항목도 사라짐
        tokio::time::sleep(StdDuration::from_millis(1000)).await;
        assert!(matches!(
            tokens.validate(&token).await,
            Err(AuthError::AccessTokenExpired)
        ));
        assert!(cache.get(&denylist_key(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_is_single_use() {
        let (tokens, _) = service();
        let issued = tokens.issue("user-1").await.unwrap();

        let renewed = tokens.refresh(&issued.access_token).await.unwrap();
        assert_ne!(renewed.access_token, issued.access_token);
        assert_eq!(
            tokens.validate(&renewed.access_token).await.unwrap().subject,
            "user-1"
        );

        assert!(matches!(
            tokens.refresh(&issued.access_token).await,
            Err(AuthError::ReLoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let (tokens, _) = service();
        assert!(matches!(
            tokens.refresh("never-issued").await,
            Err(AuthError::ReLoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_refresh_with_corrupt_mapping() {
        let (tokens, cache) = service();
        cache.put("some-access", "not-a-jwt", 60).await.unwrap();

        assert!(matches!(
            tokens.refresh("some-access").await,
            Err(AuthError::Unauthorized)
        ));
        // 실패해도 매핑은 소비됨
        assert!(cache.get("some-access").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_survives_revoke_by_default() {
        let (tokens, _) = service();
        let issued = tokens.issue("user-1").await.unwrap();
        tokens.revoke(&issued.access_token).await.unwrap();

        assert!(tokens.refresh(&issued.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_can_drop_refresh_mapping() {
        let mut settings = TokenSettings::new("access-secret", "refresh-secret");
        settings.revoke_refresh_on_logout = true;
        let (tokens, _) = service_with(settings);

        let issued = tokens.issue("user-1").await.unwrap();
        tokens.revoke(&issued.access_token).await.unwrap();

        assert!(matches!(
            tokens.refresh(&issued.access_token).await,
            Err(AuthError::ReLoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_revoke_expired_token_is_noop() {
        let (tokens, cache) = service();
        let expired = tokens
            .access_key
            .encode(&Claims::new("user-1", TokenKind::Access, Duration::seconds(-1)))
            .unwrap();

        tokens.revoke(&expired).await.unwrap();
        assert!(cache.get(&denylist_key(&expired)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_garbage_token() {
        let (tokens, _) = service();
        assert!(matches!(
            tokens.revoke("garbage").await,
            Err(AuthError::Unauthorized)
        ));
    }
}
