//! Reversible field-level encryption for PII columns.
//!
//! Sensitive fields (the national ID number) must be displayable to
//! verification staff, so they are sealed with AES-256-GCM rather than
//! hashed. The symmetric key is derived per call from the shared secret and
//! a fresh random salt via PBKDF2-HMAC-SHA512, so two encryptions of the
//! same value never produce the same blob.
//!
//! Blob layout, base64-encoded as one string:
//! `salt(64) || iv(16) || tag(16) || ciphertext`.

use std::sync::Arc;

use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::Sha512;

const SALT_LEN: usize = 64;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const ITERATIONS: u32 = 10_000;

/// AES-256-GCM with a 16-byte nonce, matching the stored blob format.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption secret must be at least 32 characters long")]
    Configuration,

    #[error("failed to encrypt data")]
    Encryption,

    /// Covers malformed blobs and failed tag authentication alike; the
    /// underlying cause is deliberately not carried.
    #[error("failed to decrypt data")]
    Decryption,
}

/// Encrypts and decrypts individual record fields with a password-derived key.
#[derive(Clone)]
pub struct FieldCipher {
    secret: Arc<str>,
}

impl FieldCipher {
    pub fn new(secret: &str) -> Result<Self, CipherError> {
        if secret.chars().count() < 32 {
            return Err(CipherError::Configuration);
        }
        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    fn derive_key(&self, salt: &[u8]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha512>(self.secret.as_bytes(), salt, ITERATIONS, &mut key);
        key
    }

    /// Seal a plaintext field. Empty input passes through unchanged.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        rand::thread_rng().fill_bytes(&mut iv);

        let key = self.derive_key(&salt);
        let cipher =
            Aes256Gcm16::new_from_slice(&key).map_err(|_| CipherError::Encryption)?;
        let sealed = cipher
            .encrypt(Nonce::<U16>::from_slice(&iv), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        // The AEAD appends the tag to the ciphertext; the blob stores it
        // ahead of the ciphertext instead.
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut blob = Vec::with_capacity(SALT_LEN + IV_LEN + TAG_LEN + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(tag);
        blob.extend_from_slice(ciphertext);

        Ok(BASE64.encode(blob))
    }

    /// Open a blob produced by [`encrypt`](Self::encrypt). Empty input passes
    /// through unchanged.
    pub fn decrypt(&self, blob: &str) -> Result<String, CipherError> {
        if blob.is_empty() {
            return Ok(String::new());
        }

        let raw = BASE64.decode(blob).map_err(|_| CipherError::Decryption)?;
        if raw.len() < SALT_LEN + IV_LEN + TAG_LEN {
            return Err(CipherError::Decryption);
        }

        let salt = &raw[..SALT_LEN];
        let iv = &raw[SALT_LEN..SALT_LEN + IV_LEN];
        let tag = &raw[SALT_LEN + IV_LEN..SALT_LEN + IV_LEN + TAG_LEN];
        let ciphertext = &raw[SALT_LEN + IV_LEN + TAG_LEN..];

        let key = self.derive_key(salt);
        let cipher =
            Aes256Gcm16::new_from_slice(&key).map_err(|_| CipherError::Decryption)?;

        // Reassemble ciphertext || tag for the AEAD open call.
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let opened = cipher
            .decrypt(
                Nonce::<U16>::from_slice(iv),
                Payload {
                    msg: &sealed,
                    aad: &[],
                },
            )
            .map_err(|_| CipherError::Decryption)?;

        String::from_utf8(opened).map_err(|_| CipherError::Decryption)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}
