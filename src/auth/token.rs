//! Stateless bearer tokens.
//!
//! Tokens are HS256-signed JWTs carrying the username, role and user id.
//! Verification is signature + expiry plus a lightweight existence check
//! against the live user store, so deleting a user is the one way to
//! invalidate a token before it expires. There is no revocation list.

use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::store::{Role, UserIdentity, UserStore};
use crate::errors::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub role: Role,
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: chrono::Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: chrono::Duration::hours(expiry_hours),
        }
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }

    /// Produce a signed token for the given identity. Stateless: nothing is
    /// recorded server-side.
    pub fn issue(&self, user: &UserIdentity) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            user_id: user.id,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {}", e)))
    }

    /// Check signature and expiry only. `verify` is the full check.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    /// Decode the token and re-resolve the username against the live store.
    /// A token for a user that no longer exists is treated as invalid.
    pub async fn verify(
        &self,
        token: &str,
        users: &dyn UserStore,
    ) -> Result<UserIdentity, AppError> {
        let claims = self.decode(token)?;
        users
            .find_user(&claims.sub)
            .await
            .ok_or(AppError::InvalidToken)
    }
}

/// Pull the bearer credential out of the Authorization header. Fails with
/// `MissingToken` before any decode attempt.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingToken)
}
