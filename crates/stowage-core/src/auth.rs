//! HMAC request authorization.
//!
//! Requests carry a short-lived token of three string parameters: `uuid` (an
//! opaque identity), `expiration` (Unix seconds), and `hmac` (a lowercase hex
//! HMAC-SHA1 over `uuid ++ expiration`, keyed by the tenant's secret).
//!
//! A tenant without a secret key performs no authorization at all; every
//! request passes. Signature comparison is constant-time.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::header::{HeaderName, HeaderValue};
use http::{Response, StatusCode};
use serde_json::{Map, Value};
use sha1::Sha1;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Request-scoped authorization parameters, as extracted from query or form
/// parameters. Any of the three may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthParams {
    pub uuid: Option<String>,
    pub hmac: Option<String>,
    pub expiration: Option<String>,
}

impl AuthParams {
    /// Extract `uuid`, `hmac` and `expiration` from a string-keyed parameter
    /// map. Numeric expirations are accepted and rendered as decimal.
    pub fn from_map(params: &Map<String, Value>) -> Self {
        Self {
            uuid: param_string(params, "uuid"),
            hmac: param_string(params, "hmac"),
            expiration: param_string(params, "expiration"),
        }
    }
}

fn param_string(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Per-tenant authorization guard.
#[derive(Debug, Clone, Default)]
pub struct AuthGuard {
    secret_key: Option<String>,
}

impl AuthGuard {
    /// A blank or absent secret disables authorization entirely.
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            secret_key: secret_key.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Deterministic lowercase hex HMAC-SHA1 of `content`, keyed by the
    /// tenant secret. Only meaningful when a secret is configured; without
    /// one the signature is keyed by the empty string and never consulted.
    pub fn hmac_for(&self, content: &str) -> String {
        let key = self.secret_key.as_deref().unwrap_or_default();
        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
        mac.update(content.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Token validity at a given instant: all three parameters present,
    /// expiration strictly in the future, signature matches.
    pub fn hmac_valid_at(&self, params: &AuthParams, now: DateTime<Utc>) -> bool {
        let (Some(uuid), Some(hmac), Some(expiration)) = (
            params.uuid.as_deref(),
            params.hmac.as_deref(),
            params.expiration.as_deref(),
        ) else {
            return false;
        };
        let Ok(expires_at) = expiration.parse::<i64>() else {
            return false;
        };
        if expires_at <= now.timestamp() {
            return false;
        }
        let expected = self.hmac_for(&format!("{uuid}{expiration}"));
        constant_time_eq(hmac, &expected)
    }

    pub fn hmac_valid(&self, params: &AuthParams) -> bool {
        self.hmac_valid_at(params, Utc::now())
    }

    pub fn authorized_at(&self, params: &AuthParams, now: DateTime<Utc>) -> bool {
        !self.requires_auth() || self.hmac_valid_at(params, now)
    }

    pub fn authorized(&self, params: &AuthParams) -> bool {
        self.authorized_at(params, Utc::now())
    }
}

/// Compare two signature strings in constant time.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The canonical authorization-failure response: 401, the tenant's CORS
/// header map plus `X-Exception`, empty body. No other component fabricates
/// 401s.
pub fn unauthorized(cors_headers: &BTreeMap<String, String>) -> Response<()> {
    let mut response = Response::new(());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    let headers = response.headers_mut();
    for (name, value) in cors_headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "skipping invalid configured header on 401"),
        }
    }
    headers.insert(
        HeaderName::from_static("x-exception"),
        HeaderValue::from_static("Authorization failed"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    fn signed_params(guard: &AuthGuard, uuid: &str, expiration: i64) -> AuthParams {
        let expiration = expiration.to_string();
        AuthParams {
            hmac: Some(guard.hmac_for(&format!("{uuid}{expiration}"))),
            uuid: Some(uuid.to_string()),
            expiration: Some(expiration),
        }
    }

    #[test]
    fn valid_token_is_authorized() {
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let params = signed_params(&guard, "abc", now().timestamp() + 3600);
        assert!(guard.authorized_at(&params, now()));
    }

    #[test]
    fn expired_token_is_rejected() {
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let params = signed_params(&guard, "abc", now().timestamp() - 10);
        assert!(!guard.authorized_at(&params, now()));
    }

    #[test]
    fn expiration_equal_to_now_is_rejected() {
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let params = signed_params(&guard, "abc", now().timestamp());
        assert!(!guard.authorized_at(&params, now()));
    }

    #[test]
    fn missing_hmac_is_rejected() {
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let mut params = signed_params(&guard, "abc", now().timestamp() + 3600);
        params.hmac = None;
        assert!(!guard.authorized_at(&params, now()));
    }

    #[test]
    fn tampered_hmac_is_rejected() {
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let mut params = signed_params(&guard, "abc", now().timestamp() + 3600);
        params.hmac = Some(params.hmac.unwrap().replace('a', "b"));
        assert!(!guard.authorized_at(&params, now()));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = AuthGuard::new(Some("other".to_string()));
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let params = signed_params(&signer, "abc", now().timestamp() + 3600);
        assert!(!guard.authorized_at(&params, now()));
    }

    #[test]
    fn blank_secret_authorizes_everything() {
        for secret in [None, Some("".to_string()), Some("  ".to_string())] {
            let guard = AuthGuard::new(secret);
            assert!(guard.authorized_at(&AuthParams::default(), now()));
        }
    }

    #[test]
    fn hmac_is_deterministic() {
        let guard = AuthGuard::new(Some("s3cr3t".to_string()));
        let a = guard.hmac_for("abc1756555200");
        let b = guard.hmac_for("abc1756555200");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40); // SHA-1 digest, hex
        assert_eq!(a, a.to_lowercase());
    }

    #[test]
    fn params_from_map_accepts_numeric_expiration() {
        let map = serde_json::json!({"uuid": "abc", "hmac": "00", "expiration": 1756555200});
        let params = AuthParams::from_map(map.as_object().unwrap());
        assert_eq!(params.expiration.as_deref(), Some("1756555200"));
        assert_eq!(params.uuid.as_deref(), Some("abc"));
    }

    #[test]
    fn unauthorized_response_shape() {
        let response = unauthorized(&headers::cors_defaults());
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("X-Exception").unwrap(),
            "Authorization failed"
        );
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }
}
