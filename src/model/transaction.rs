use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verification lifecycle of a payment instruction.
///
/// Transitions: `pending -> verified | rejected`, `verified -> submitted`.
/// `rejected` and `submitted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Verified,
    Rejected,
    Submitted,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Submitted => "submitted",
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Verified)
                | (Self::Pending, Self::Rejected)
                | (Self::Verified, Self::Submitted)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            "submitted" => Ok(Self::Submitted),
            _ => Err(()),
        }
    }
}

/// A payment instruction as stored. `user_id` always comes from the
/// authenticated caller, never from client input.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub source_currency: String,
    pub target_currency: String,
    pub payment_method: String,
    pub calculated_amount: f64,
    pub recipient_name: String,
    pub recipient_account_number: String,
    pub recipient_bank_name: String,
    pub recipient_swift_code: String,
    pub recipient_country: String,
    pub recipient_city: Option<String>,
    pub recipient_address: Option<String>,
    pub reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Payment terms and recipient details as submitted by the customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub amount: f64,
    pub source_currency: String,
    pub target_currency: String,
    pub payment_method: String,
    pub calculated_amount: f64,
    pub recipient_name: String,
    pub recipient_account_number: String,
    pub recipient_bank_name: String,
    pub recipient_swift_code: String,
    pub recipient_country: String,
    #[serde(default)]
    pub recipient_city: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TransactionStatus,
}

/// What listings return. Owner fields are only populated on the employee
/// (all-records) branch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: Uuid,
    pub amount: f64,
    pub source_currency: String,
    pub target_currency: String,
    pub payment_method: String,
    pub calculated_amount: f64,
    pub recipient_name: String,
    pub recipient_account_number: String,
    pub recipient_bank_name: String,
    pub recipient_swift_code: String,
    pub recipient_country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    pub reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl TransactionView {
    pub fn owned(record: TransactionRecord) -> Self {
        Self::build(record, None, None)
    }

    pub fn annotated(record: TransactionRecord, account_number: String, name: String) -> Self {
        Self::build(record, Some(account_number), Some(name))
    }

    fn build(
        record: TransactionRecord,
        owner_account_number: Option<String>,
        owner_name: Option<String>,
    ) -> Self {
        Self {
            id: record.id,
            amount: record.amount,
            source_currency: record.source_currency,
            target_currency: record.target_currency,
            payment_method: record.payment_method,
            calculated_amount: record.calculated_amount,
            recipient_name: record.recipient_name,
            recipient_account_number: record.recipient_account_number,
            recipient_bank_name: record.recipient_bank_name,
            recipient_swift_code: record.recipient_swift_code,
            recipient_country: record.recipient_country,
            recipient_city: record.recipient_city,
            recipient_address: record.recipient_address,
            reference: record.reference,
            status: record.status,
            created_at: record.created_at,
            owner_account_number,
            owner_name,
        }
    }
}
