//! JWT 토큰 처리.
//!
//! Access Token과 Refresh Token은 서로 다른 키로 서명됩니다.
//! 한쪽 서명 키가 유출되어도 다른 종류의 토큰은 위조할 수 없습니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// 만료 검증 허용 오차 (초).
pub const VALIDATION_LEEWAY_SECS: u64 = 0;

/// 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 같은 초에 발급된 토큰도 서로 다르게 만듭니다
    pub jti: String,
    /// 토큰 종류
    pub token_type: TokenKind,
}

impl Claims {
    /// 현재 시각 기준으로 `lifetime` 뒤에 만료되는 Claims 생성.
    pub fn new(subject: impl Into<String>, kind: TokenKind, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: kind,
        }
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// 남은 수명 (초). 이미 만료되었으면 0 이하.
    pub fn remaining_secs(&self) -> i64 {
        self.exp - Utc::now().timestamp()
    }

    /// 이 토큰이 `decode`를 통과하는 동안 denylist 항목이 유지되어야 하는 시간 (초).
    ///
    /// 만료 검사는 `exp < now - leeway`일 때만 실패하므로 토큰은
    /// `exp + leeway` 초가 끝날 때까지 유효합니다. 현재 초의 남은 부분과
    /// 그 마지막 초를 덮도록 1초를 더합니다.
    pub fn denylist_ttl_secs(&self) -> u64 {
        (self.remaining_secs() + 1 + VALIDATION_LEEWAY_SECS as i64).max(1) as u64
    }
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("유효하지 않은 토큰")]
    Invalid,
}

/// HS256 서명/검증 키 쌍.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Claims를 서명하여 JWT 문자열로 인코딩합니다.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(JwtError::from)
    }

    /// JWT를 검증하고 Claims를 반환합니다.
    ///
    /// 서명, 만료(leeway 0), 토큰 종류를 모두 확인합니다.
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = VALIDATION_LEEWAY_SECS;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            }
        })?;

        if data.claims.token_type != expected || data.claims.sub.is_empty() {
            return Err(JwtError::Invalid);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &[u8] = b"access-secret-key-for-jwt-testing";
    const REFRESH_SECRET: &[u8] = b"refresh-secret-key-for-jwt-testing";

    #[test]
    fn test_encode_and_decode() {
        let key = SigningKey::from_secret(ACCESS_SECRET);
        let claims = Claims::new("user-1", TokenKind::Access, Duration::minutes(15));

        let token = key.encode(&claims).unwrap();
        let decoded = key.decode(&token, TokenKind::Access).unwrap();

        assert_eq!(decoded.sub, "user-1");
        assert_eq!(decoded.jti, claims.jti);
        assert!(decoded.remaining_secs() > 14 * 60);
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let key = SigningKey::from_secret(ACCESS_SECRET);
        let a = key
            .encode(&Claims::new("user-1", TokenKind::Access, Duration::minutes(15)))
            .unwrap();
        let b = key
            .encode(&Claims::new("user-1", TokenKind::Access, Duration::minutes(15)))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let access = SigningKey::from_secret(ACCESS_SECRET);
        let refresh = SigningKey::from_secret(REFRESH_SECRET);

        let token = refresh
            .encode(&Claims::new("user-1", TokenKind::Refresh, Duration::days(7)))
            .unwrap();

        assert!(matches!(
            access.decode(&token, TokenKind::Refresh),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_kind_is_invalid() {
        let key = SigningKey::from_secret(ACCESS_SECRET);
        let token = key
            .encode(&Claims::new("user-1", TokenKind::Refresh, Duration::days(7)))
            .unwrap();

        assert!(matches!(
            key.decode(&token, TokenKind::Access),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token() {
        let key = SigningKey::from_secret(ACCESS_SECRET);
        let token = key
            .encode(&Claims::new("user-1", TokenKind::Access, Duration::seconds(-5)))
            .unwrap();

        assert!(matches!(
            key.decode(&token, TokenKind::Access),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_denylist_ttl_covers_last_valid_second() {
        // exp == now인 토큰은 아직 decode를 통과하므로 1초는 막아야 함
        let mut claims = Claims::new("user-1", TokenKind::Access, Duration::zero());
        claims.exp = Utc::now().timestamp();
        assert_eq!(claims.denylist_ttl_secs(), 1);

        let claims = Claims::new("user-1", TokenKind::Access, Duration::minutes(15));
        assert!(claims.denylist_ttl_secs() > 15 * 60 - 1);

        let expired = Claims::new("user-1", TokenKind::Access, Duration::seconds(-5));
        assert_eq!(expired.denylist_ttl_secs(), 1);
    }

    #[test]
    fn test_garbage_token() {
        let key = SigningKey::from_secret(ACCESS_SECRET);
        assert!(matches!(
            key.decode("invalid.token.here", TokenKind::Access),
            Err(JwtError::Invalid)
        ));
    }
}
