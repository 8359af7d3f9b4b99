//! sqlx-backed repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::model::transaction::{TransactionRecord, TransactionStatus};
use crate::model::user::User;

use super::{OwnedTransaction, RepoError, TransactionRepository, UserRepository};

fn map_sqlx(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        // 23505: unique_violation
        if db.code().as_deref() == Some("23505") {
            return RepoError::Duplicate;
        }
    }
    RepoError::backend(err)
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            "SELECT id, full_name, account_number, id_number, id_number_digest, \
             password_hash, is_employee, created_at \
             FROM users WHERE account_number = $1",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn exists_conflicting(
        &self,
        account_number: &str,
        id_number_digest: &str,
    ) -> Result<bool, RepoError> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users WHERE account_number = $1 OR id_number_digest = $2 LIMIT 1",
        )
        .bind(account_number)
        .bind(id_number_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(found.is_some())
    }

    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO users \
             (id, full_name, account_number, id_number, id_number_digest, \
              password_hash, is_employee, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.account_number)
        .bind(&user.id_number)
        .bind(&user.id_number_digest)
        .bind(&user.password_hash)
        .bind(user.is_employee)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn upsert(&self, user: &User) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO users \
             (id, full_name, account_number, id_number, id_number_digest, \
              password_hash, is_employee, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (account_number) DO UPDATE SET \
             full_name = EXCLUDED.full_name, \
             id_number = EXCLUDED.id_number, \
             id_number_digest = EXCLUDED.id_number_digest, \
             password_hash = EXCLUDED.password_hash, \
             is_employee = EXCLUDED.is_employee",
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.account_number)
        .bind(&user.id_number)
        .bind(&user.id_number_digest)
        .bind(&user.password_hash)
        .bind(user.is_employee)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}

/// Row shape for transactions; status travels as TEXT.
#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    amount: f64,
    source_currency: String,
    target_currency: String,
    payment_method: String,
    calculated_amount: f64,
    recipient_name: String,
    recipient_account_number: String,
    recipient_bank_name: String,
    recipient_swift_code: String,
    recipient_country: String,
    recipient_city: Option<String>,
    recipient_address: Option<String>,
    reference: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = RepoError;

    fn try_from(row: TransactionRow) -> Result<Self, RepoError> {
        let status: TransactionStatus = row
            .status
            .parse()
            .map_err(|_| RepoError::Backend(format!("unknown status '{}'", row.status)))?;
        Ok(TransactionRecord {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            source_currency: row.source_currency,
            target_currency: row.target_currency,
            payment_method: row.payment_method,
            calculated_amount: row.calculated_amount,
            recipient_name: row.recipient_name,
            recipient_account_number: row.recipient_account_number,
            recipient_bank_name: row.recipient_bank_name,
            recipient_swift_code: row.recipient_swift_code,
            recipient_country: row.recipient_country,
            recipient_city: row.recipient_city,
            recipient_address: row.recipient_address,
            reference: row.reference,
            status,
            created_at: row.created_at,
        })
    }
}

/// TransactionRow plus the owner columns from the users join.
#[derive(Debug, FromRow)]
struct JoinedRow {
    id: Uuid,
    user_id: Uuid,
    amount: f64,
    source_currency: String,
    target_currency: String,
    payment_method: String,
    calculated_amount: f64,
    recipient_name: String,
    recipient_account_number: String,
    recipient_bank_name: String,
    recipient_swift_code: String,
    recipient_country: String,
    recipient_city: Option<String>,
    recipient_address: Option<String>,
    reference: String,
    status: String,
    created_at: DateTime<Utc>,
    owner_account_number: String,
    owner_name: String,
}

impl JoinedRow {
    fn split(self) -> (TransactionRow, String, String) {
        let tx = TransactionRow {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            source_currency: self.source_currency,
            target_currency: self.target_currency,
            payment_method: self.payment_method,
            calculated_amount: self.calculated_amount,
            recipient_name: self.recipient_name,
            recipient_account_number: self.recipient_account_number,
            recipient_bank_name: self.recipient_bank_name,
            recipient_swift_code: self.recipient_swift_code,
            recipient_country: self.recipient_country,
            recipient_city: self.recipient_city,
            recipient_address: self.recipient_address,
            reference: self.reference,
            status: self.status,
            created_at: self.created_at,
        };
        (tx, self.owner_account_number, self.owner_name)
    }
}

const TX_COLUMNS: &str = "id, user_id, amount, source_currency, target_currency, \
    payment_method, calculated_amount, recipient_name, recipient_account_number, \
    recipient_bank_name, recipient_swift_code, recipient_country, recipient_city, \
    recipient_address, reference, status, created_at";

#[derive(Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO transactions \
             (id, user_id, amount, source_currency, target_currency, payment_method, \
              calculated_amount, recipient_name, recipient_account_number, \
              recipient_bank_name, recipient_swift_code, recipient_country, \
              recipient_city, recipient_address, reference, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.amount)
        .bind(&record.source_currency)
        .bind(&record.target_currency)
        .bind(&record.payment_method)
        .bind(record.calculated_amount)
        .bind(&record.recipient_name)
        .bind(&record.recipient_account_number)
        .bind(&record.recipient_bank_name)
        .bind(&record.recipient_swift_code)
        .bind(&record.recipient_country)
        .bind(&record.recipient_city)
        .bind(&record.recipient_address)
        .bind(&record.reference)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    async fn list_all(&self) -> Result<Vec<OwnedTransaction>, RepoError> {
        let rows = sqlx::query_as::<_, JoinedRow>(
            "SELECT t.id, t.user_id, t.amount, t.source_currency, t.target_currency, \
             t.payment_method, t.calculated_amount, t.recipient_name, \
             t.recipient_account_number, t.recipient_bank_name, t.recipient_swift_code, \
             t.recipient_country, t.recipient_city, t.recipient_address, t.reference, \
             t.status, t.created_at, \
             u.account_number AS owner_account_number, u.full_name AS owner_name \
             FROM transactions t JOIN users u ON t.user_id = u.id \
             ORDER BY t.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                let (tx, owner_account_number, owner_name) = row.split();
                Ok(OwnedTransaction {
                    record: TransactionRecord::try_from(tx)?,
                    owner_account_number,
                    owner_name,
                })
            })
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, RepoError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(TransactionRecord::try_from).transpose()
    }

    async fn set_status(&self, id: Uuid, status: TransactionStatus) -> Result<bool, RepoError> {
        let result = sqlx::query("UPDATE transactions SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
