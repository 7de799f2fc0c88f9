use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use lambda_http::http::HeaderMap;
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Identity of the authenticated caller, extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
}

/// Sign a bearer token: `{user_id}.{expiry_unix}.{base64url(hmac)}`.
///
/// Token issuance lives in the external auth service; this is exported for it
/// and for tests.
pub fn sign_token(secret: &str, user_id: &str, expires_at: i64) -> String {
    let payload = format!("{}.{}", user_id, expires_at);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}", payload, sig)
}

/// Verify a bearer token and return the caller identity.
pub fn verify_token(secret: &str, token: &str) -> Result<AuthContext, ApiError> {
    let mut parts = token.rsplitn(3, '.');
    let sig = parts.next().ok_or(ApiError::Unauthorized)?;
    let expiry = parts.next().ok_or(ApiError::Unauthorized)?;
    let user_id = parts.next().ok_or(ApiError::Unauthorized)?;
    if user_id.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let expires_at: i64 = expiry.parse().map_err(|_| ApiError::Unauthorized)?;
    if expires_at <= chrono::Utc::now().timestamp() {
        return Err(ApiError::Unauthorized);
    }

    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig)
        .map_err(|_| ApiError::Unauthorized)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(format!("{}.{}", user_id, expiry).as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(AuthContext {
        user_id: user_id.to_string(),
    })
}

/// Extract and verify the `Authorization: Bearer ...` header.
pub fn authenticate_request(headers: &HeaderMap, secret: &str) -> Result<AuthContext, ApiError> {
    let header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
    verify_token(secret, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn round_trip() {
        let token = sign_token(SECRET, "user-1", future());
        let ctx = verify_token(SECRET, &token).unwrap();
        assert_eq!(ctx.user_id, "user-1");
    }

    #[test]
    fn expired_token_rejected() {
        let token = sign_token(SECRET, "user-1", chrono::Utc::now().timestamp() - 10);
        assert!(matches!(
            verify_token(SECRET, &token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn tampered_user_rejected() {
        let token = sign_token(SECRET, "user-1", future());
        let forged = token.replacen("user-1", "user-2", 1);
        assert!(verify_token(SECRET, &forged).is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign_token(SECRET, "user-1", future());
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(verify_token(SECRET, "not-a-token").is_err());
        assert!(verify_token(SECRET, "..").is_err());
    }

    #[test]
    fn bearer_header_parsed() {
        let mut headers = HeaderMap::new();
        let token = sign_token(SECRET, "user-9", future());
        headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let ctx = authenticate_request(&headers, SECRET).unwrap();
        assert_eq!(ctx.user_id, "user-9");

        headers.insert("Authorization", token.parse().unwrap());
        assert!(authenticate_request(&headers, SECRET).is_err());
    }
}
