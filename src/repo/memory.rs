//! In-memory repositories backing the test suite.
//!
//! Same contracts as the Postgres implementations, including duplicate-key
//! rejection, so service logic can be exercised without a database.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::transaction::{TransactionRecord, TransactionStatus};
use crate::model::user::User;

use super::{OwnedTransaction, RepoError, TransactionRepository, UserRepository};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepoError> {
    mutex.lock().map_err(|_| RepoError::Backend("lock poisoned".into()))
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Option<User>, RepoError> {
        let users = lock(&self.users)?;
        Ok(users
            .iter()
            .find(|u| u.account_number == account_number)
            .cloned())
    }

    async fn exists_conflicting(
        &self,
        account_number: &str,
        id_number_digest: &str,
    ) -> Result<bool, RepoError> {
        let users = lock(&self.users)?;
        Ok(users
            .iter()
            .any(|u| u.account_number == account_number || u.id_number_digest == id_number_digest))
    }

    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        let mut users = lock(&self.users)?;
        if users.iter().any(|u| {
            u.account_number == user.account_number || u.id_number_digest == user.id_number_digest
        }) {
            return Err(RepoError::Duplicate);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn upsert(&self, user: &User) -> Result<(), RepoError> {
        let mut users = lock(&self.users)?;
        if let Some(existing) = users
            .iter_mut()
            .find(|u| u.account_number == user.account_number)
        {
            *existing = user.clone();
        } else {
            users.push(user.clone());
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct InMemoryTransactionRepository {
    rows: Mutex<Vec<TransactionRecord>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryTransactionRepository {
    /// Shares the user store so the all-records listing can join owner
    /// identity the way the SQL implementation does.
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            users,
        }
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), RepoError> {
        let mut rows = lock(&self.rows)?;
        if rows.iter().any(|r| r.reference == record.reference) {
            return Err(RepoError::Duplicate);
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>, RepoError> {
        let rows = lock(&self.rows)?;
        let mut own: Vec<_> = rows.iter().filter(|r| r.user_id == user_id).cloned().collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(own)
    }

    async fn list_all(&self) -> Result<Vec<OwnedTransaction>, RepoError> {
        let rows = lock(&self.rows)?;
        let users = lock(&self.users.users)?;
        let mut all: Vec<OwnedTransaction> = rows
            .iter()
            .filter_map(|r| {
                users.iter().find(|u| u.id == r.user_id).map(|owner| OwnedTransaction {
                    record: r.clone(),
                    owner_account_number: owner.account_number.clone(),
                    owner_name: owner.full_name.clone(),
                })
            })
            .collect();
        all.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, RepoError> {
        let rows = lock(&self.rows)?;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: TransactionStatus) -> Result<bool, RepoError> {
        let mut rows = lock(&self.rows)?;
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
