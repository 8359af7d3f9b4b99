//! Transaction ledger: payment creation, role-gated listing, verification
//! status transitions.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::transaction::{
    CreateTransactionRequest, TransactionRecord, TransactionStatus, TransactionView,
};
use crate::repo::{RepoError, TransactionRepository, UserRepository};

const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_LEN: usize = 8;

/// Human-readable reference: `INV-` followed by 8 random uppercase base-36
/// characters. Uniqueness is enforced by the store; a collision is retried
/// once with a fresh draw.
fn new_reference() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_LEN)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("INV-{suffix}")
}

#[derive(Clone)]
pub struct TransactionLedger {
    users: Arc<dyn UserRepository>,
    transactions: Arc<dyn TransactionRepository>,
}

impl TransactionLedger {
    pub fn new(
        users: Arc<dyn UserRepository>,
        transactions: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            users,
            transactions,
        }
    }

    async fn resolve_caller(&self, account_number: &str) -> Result<crate::model::user::User, ApiError> {
        self.users
            .find_by_account_number(account_number)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    }

    /// Persist a payment instruction for the resolved owner. The owning user
    /// always comes from the authenticated caller's account number.
    pub async fn create(
        &self,
        owner_account_number: &str,
        req: CreateTransactionRequest,
    ) -> Result<(), ApiError> {
        let owner = self.resolve_caller(owner_account_number).await?;

        let mut attempts = 0;
        loop {
            let record = TransactionRecord {
                id: Uuid::new_v4(),
                user_id: owner.id,
                amount: req.amount,
                source_currency: req.source_currency.clone(),
                target_currency: req.target_currency.clone(),
                payment_method: req.payment_method.clone(),
                calculated_amount: req.calculated_amount,
                recipient_name: req.recipient_name.clone(),
                recipient_account_number: req.recipient_account_number.clone(),
                recipient_bank_name: req.recipient_bank_name.clone(),
                recipient_swift_code: req.recipient_swift_code.clone(),
                recipient_country: req.recipient_country.clone(),
                recipient_city: req.recipient_city.clone(),
                recipient_address: req.recipient_address.clone(),
                reference: new_reference(),
                status: TransactionStatus::Pending,
                created_at: Utc::now(),
            };

            match self.transactions.insert(&record).await {
                Ok(()) => {
                    tracing::info!(reference = %record.reference, "transaction created");
                    return Ok(());
                }
                Err(RepoError::Duplicate) if attempts == 0 => {
                    tracing::warn!(reference = %record.reference, "reference collision, retrying");
                    attempts += 1;
                }
                Err(RepoError::Duplicate) => {
                    return Err(ApiError::Internal("reference collision persisted".into()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Employees see every record annotated with owner identity; customers
    /// only their own. Both branches are newest first.
    pub async fn list(&self, account_number: &str) -> Result<Vec<TransactionView>, ApiError> {
        let caller = self.resolve_caller(account_number).await?;

        if caller.is_employee {
            let all = self.transactions.list_all().await?;
            Ok(all
                .into_iter()
                .map(|owned| {
                    TransactionView::annotated(
                        owned.record,
                        owned.owner_account_number,
                        owned.owner_name,
                    )
                })
                .collect())
        } else {
            let own = self.transactions.list_for_user(caller.id).await?;
            Ok(own.into_iter().map(TransactionView::owned).collect())
        }
    }

    /// Verification-portal transition, restricted to employees and to the
    /// legal moves of the status machine.
    pub async fn update_status(
        &self,
        caller_account_number: &str,
        transaction_id: Uuid,
        next: TransactionStatus,
    ) -> Result<(), ApiError> {
        let caller = self.resolve_caller(caller_account_number).await?;
        if !caller.is_employee {
            return Err(ApiError::Unauthorized("Employee role required".into()));
        }

        let record = self
            .transactions
            .find_by_id(transaction_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Transaction not found".into()))?;

        if !record.status.can_transition_to(next) {
            return Err(ApiError::Validation(format!(
                "Cannot move transaction from {} to {next}",
                record.status
            )));
        }

        if !self.transactions.set_status(transaction_id, next).await? {
            return Err(ApiError::NotFound("Transaction not found".into()));
        }
        tracing::info!(%transaction_id, status = %next, "transaction status updated");
        Ok(())
    }
}
