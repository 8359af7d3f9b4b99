//! Repository seams over the data store.
//!
//! Controllers and services only see these traits, so the core logic runs
//! identically against Postgres and the in-memory fakes used by tests.

mod memory;
mod postgres;

pub use memory::{InMemoryTransactionRepository, InMemoryUserRepository};
pub use postgres::{PgTransactionRepository, PgUserRepository};

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::transaction::{TransactionRecord, TransactionStatus};
use crate::model::user::User;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A uniqueness constraint rejected the write. This is the only
    /// concurrency-correctness mechanism; racing duplicate inserts surface
    /// here rather than through application-level locking.
    #[error("duplicate key")]
    Duplicate,

    #[error("storage error: {0}")]
    Backend(String),
}

impl RepoError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Option<User>, RepoError>;

    /// True if any user already holds this account number or this ID digest.
    async fn exists_conflicting(
        &self,
        account_number: &str,
        id_number_digest: &str,
    ) -> Result<bool, RepoError>;

    async fn insert(&self, user: &User) -> Result<(), RepoError>;

    /// Insert, or replace the record sharing the account number. Used by the
    /// employee seeding binary only.
    async fn upsert(&self, user: &User) -> Result<(), RepoError>;
}

/// A transaction joined with its owner, for the employee listing.
#[derive(Debug, Clone)]
pub struct OwnedTransaction {
    pub record: TransactionRecord,
    pub owner_account_number: String,
    pub owner_name: String,
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), RepoError>;

    /// The caller's own records, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>, RepoError>;

    /// Every record system-wide with owner identity, newest first.
    async fn list_all(&self) -> Result<Vec<OwnedTransaction>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, RepoError>;

    /// Returns false if no record with this id exists.
    async fn set_status(&self, id: Uuid, status: TransactionStatus) -> Result<bool, RepoError>;
}
