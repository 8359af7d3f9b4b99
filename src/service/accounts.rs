//! Credential store: registration, login verification, employee seeding.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::user::{AuthenticatedUser, RegisterRequest, User};
use crate::repo::UserRepository;
use crate::security::cipher::FieldCipher;
use crate::security::validate;

/// bcrypt work factor for all stored password hashes.
const BCRYPT_COST: u32 = 12;

/// Deterministic digest of the cleartext ID number, used for the uniqueness
/// check only; the displayable value is stored encrypted.
fn id_number_digest(id_number: &str) -> String {
    let digest = Sha256::digest(id_number.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    cipher: FieldCipher,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, cipher: FieldCipher) -> Self {
        Self { users, cipher }
    }

    /// Validate, sanitize and persist a new customer account.
    ///
    /// Checks run in a fixed order and the first failure wins, so clients
    /// get stable error messages.
    pub async fn register(&self, req: RegisterRequest) -> Result<(), ApiError> {
        if req.full_name.is_empty()
            || req.account_number.is_empty()
            || req.id_number.is_empty()
            || req.password.is_empty()
        {
            return Err(ApiError::Validation("All fields are required".into()));
        }
        if !validate::valid_full_name(&req.full_name) {
            return Err(ApiError::Validation(
                "Full name must be between 2 and 100 characters".into(),
            ));
        }
        if !validate::valid_account_number(&req.account_number) {
            return Err(ApiError::Validation("Invalid account number format".into()));
        }
        if !validate::valid_id_number(&req.id_number) {
            return Err(ApiError::Validation("Invalid ID number format".into()));
        }
        if !validate::strong_password(&req.password) {
            return Err(ApiError::Validation(
                "Password does not meet complexity requirements".into(),
            ));
        }

        let full_name = validate::escape_html(&req.full_name);
        let account_number = validate::escape_html(&req.account_number);
        let id_number = validate::escape_html(&req.id_number);
        let digest = id_number_digest(&id_number);

        if self
            .users
            .exists_conflicting(&account_number, &digest)
            .await?
        {
            return Err(ApiError::Conflict(
                "Account number or ID number already exists".into(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            full_name,
            account_number,
            id_number: self.cipher.encrypt(&id_number)?,
            id_number_digest: digest,
            password_hash: bcrypt::hash(&req.password, BCRYPT_COST)?,
            is_employee: false,
            created_at: Utc::now(),
        };

        // A racing duplicate insert is rejected by the store's uniqueness
        // constraints and surfaces as a 409 like the pre-check above.
        self.users.insert(&user).await?;
        tracing::info!(account_number = %user.account_number, "user registered");
        Ok(())
    }

    /// Look up by account number and compare the supplied password against
    /// the stored hash. On success the profile is returned with the ID
    /// number decrypted for display.
    pub async fn verify_credentials(
        &self,
        account_number: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, ApiError> {
        let user = self
            .users
            .find_by_account_number(account_number)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(ApiError::Unauthorized("Invalid password".into()));
        }

        Ok(AuthenticatedUser {
            id: user.id,
            full_name: user.full_name,
            account_number: account_number.to_string(),
            id_number: self.cipher.decrypt(&user.id_number)?,
            is_employee: user.is_employee,
        })
    }

    /// Create or refresh an employee record. Only reachable from the seed
    /// binary; never exposed over HTTP.
    pub async fn upsert_employee(
        &self,
        full_name: &str,
        account_number: &str,
        id_number: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        if !validate::strong_password(password) {
            return Err(ApiError::Validation(
                "Password does not meet complexity requirements".into(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            full_name: validate::escape_html(full_name),
            account_number: validate::escape_html(account_number),
            id_number: self.cipher.encrypt(id_number)?,
            id_number_digest: id_number_digest(id_number),
            password_hash: bcrypt::hash(password, BCRYPT_COST)?,
            is_employee: true,
            created_at: Utc::now(),
        };
        self.users.upsert(&user).await?;
        tracing::info!(account_number = %user.account_number, "employee seeded");
        Ok(())
    }
}
