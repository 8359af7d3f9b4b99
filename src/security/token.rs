//! Short-lived session tokens binding an account identity.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Sessions last 15 minutes; expiry forces re-authentication, there is no
/// refresh mechanism.
pub const TOKEN_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub account_number: String,
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid or expired token")]
pub struct TokenError;

/// Issues and verifies HMAC-signed bearer tokens. Verification is stateless;
/// the data store is never consulted.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Arc<str>,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: Arc::from(secret),
        }
    }

    pub fn issue(&self, account_number: &str, user_id: &str) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            account_number: account_number.to_string(),
            user_id: user_id.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| TokenError)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| TokenError)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}
