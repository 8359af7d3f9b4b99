use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity record as stored. `id_number` holds the encrypted blob;
/// `id_number_digest` is a deterministic SHA-256 digest of the cleartext ID
/// used only for the uniqueness check, since the blob itself is randomized.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub account_number: String,
    pub id_number: String,
    pub id_number_digest: String,
    pub password_hash: String,
    pub is_employee: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration payload. Missing fields deserialize as empty strings so the
/// required-field check owns the error message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub password: String,
}

/// A verified caller's profile with the ID number decrypted for display.
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub full_name: String,
    pub account_number: String,
    pub id_number: String,
    pub is_employee: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: AuthenticatedUser,
    pub auth_token: String,
}
