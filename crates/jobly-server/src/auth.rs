//! Signed bearer tokens and the principals extracted from them.
//!
//! A token is `base64url(claims JSON)` and the hex HMAC-SHA256 of that
//! payload, joined by a dot. There is no expiry: tokens are minted by an
//! operator with `jobly issue-token` and stay valid until the secret changes.

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Admin privileges required")]
    NotAdmin,
    #[error("Invalid signing key")]
    InvalidKey,
}

/// Signs and verifies tokens with one secret.
#[derive(Clone)]
pub struct TokenKey {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

impl TokenKey {
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidKey);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| AuthError::InvalidKey)?;
        Ok(Self { mac })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let json = serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Check the signature in constant time, then decode the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)
    }
}

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub is_admin: bool,
}

/// A [`Principal`] that is known to be an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal(pub Principal);

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::Malformed)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Malformed)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    TokenKey: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = TokenKey::from_ref(state);
        let claims = key.verify(bearer_token(parts)?)?;
        Ok(Principal {
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
    TokenKey: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if !principal.is_admin {
            tracing::info!(username = %principal.username, "non-admin denied");
            return Err(AuthError::NotAdmin.into());
        }
        Ok(AdminPrincipal(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(secret: &str) -> TokenKey {
        TokenKey::new(secret.as_bytes()).unwrap()
    }

    fn admin() -> Claims {
        Claims {
            username: "u1".into(),
            is_admin: true,
        }
    }

    #[test]
    fn signed_token_verifies() {
        let k = key("test_secret");
        let token = k.sign(&admin()).unwrap();
        assert_eq!(k.verify(&token).unwrap(), admin());
    }

    #[test]
    fn signing_is_deterministic() {
        let k = key("test_secret");
        assert_eq!(k.sign(&admin()).unwrap(), k.sign(&admin()).unwrap());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = key("secret1").sign(&admin()).unwrap();
        assert_eq!(key("secret2").verify(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let k = key("test_secret");
        let token = k
            .sign(&Claims {
                username: "u1".into(),
                is_admin: false,
            })
            .unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"username":"u1","isAdmin":true}"#);

        assert_eq!(
            k.verify(&format!("{forged}.{signature}")),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let k = key("test_secret");
        assert_eq!(k.verify("no-dot-here"), Err(AuthError::Malformed));
        assert_eq!(k.verify("abc.not-hex"), Err(AuthError::Malformed));
    }

    #[test]
    fn missing_admin_flag_defaults_to_false() {
        let claims: Claims = serde_json::from_str(r#"{"username": "u2"}"#).unwrap();
        assert!(!claims.is_admin);
    }

    #[test]
    fn empty_secret_is_refused() {
        assert_eq!(TokenKey::new(b"").unwrap_err(), AuthError::InvalidKey);
    }
}
