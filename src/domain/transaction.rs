//! Debit transaction entity: a single attempted or completed debit against
//! a mandate, with bounded retry bookkeeping.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{InvalidTransition, ParseEnumError};
use crate::utils::reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    ClassPayment,
    MembershipPayment,
    LateFee,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::ClassPayment => "class_payment",
            TransactionType::MembershipPayment => "membership_payment",
            TransactionType::LateFee => "late_fee",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "class_payment" => Ok(TransactionType::ClassPayment),
            "membership_payment" => Ok(TransactionType::MembershipPayment),
            "late_fee" => Ok(TransactionType::LateFee),
            other => Err(ParseEnumError {
                kind: "transaction type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Successful,
    Failed,
    Disputed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Successful => "successful",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Disputed => "disputed",
        }
    }

    /// Statuses that block the generator from emitting another transaction
    /// for the same (mandate, due date) pair.
    pub fn blocks_regeneration(&self) -> bool {
        !matches!(self, TransactionStatus::Failed | TransactionStatus::Disputed)
    }
}

impl FromStr for TransactionStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TransactionStatus::Pending),
            "processing" => Ok(TransactionStatus::Processing),
            "successful" => Ok(TransactionStatus::Successful),
            "failed" => Ok(TransactionStatus::Failed),
            "disputed" => Ok(TransactionStatus::Disputed),
            other => Err(ParseEnumError {
                kind: "transaction status",
                value: other.to_string(),
            }),
        }
    }
}

/// Bounded-retry policy applied by the processor. Centralized so the maximum
/// attempt count and backoff interval are named configuration rather than
/// inlined constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: i32,
    pub backoff_days: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_days: 3,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::days(self.backoff_days)
    }
}

/// `mandate_id`, `amount`, `transaction_type` and `due_date` are fixed at
/// creation; only the processing outcome fields may change afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DebitTransaction {
    pub id: Uuid,
    pub transaction_reference: String,
    pub mandate_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub retry_count: i32,
    pub next_retry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DebitTransaction {
    pub fn new(
        mandate_id: Uuid,
        amount: BigDecimal,
        transaction_type: TransactionType,
        due_date: NaiveDate,
        booking_id: Option<Uuid>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            transaction_reference: reference::transaction_reference(),
            mandate_id,
            booking_id,
            amount,
            transaction_type,
            status: TransactionStatus::Pending,
            due_date,
            description,
            processed_at: None,
            failure_reason: None,
            retry_count: 0,
            next_retry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn begin_processing(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        match self.status {
            TransactionStatus::Pending => {
                self.status = TransactionStatus::Processing;
                self.updated_at = now;
                Ok(())
            }
            other => Err(InvalidTransition {
                entity: "transaction",
                current: other.as_str(),
                action: "process",
            }),
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = TransactionStatus::Successful;
        self.processed_at = Some(now);
        self.next_retry_date = None;
        self.updated_at = now;
    }

    /// Records a failed debit attempt. While attempts remain the transaction
    /// goes back to `pending` with a future retry date; once the policy is
    /// exhausted it fails terminally.
    pub fn record_failure(&mut self, reason: &str, now: DateTime<Utc>, policy: &RetryPolicy) {
        self.retry_count += 1;
        self.failure_reason = Some(reason.to_string());
        if self.retry_count < policy.max_retries {
            self.status = TransactionStatus::Pending;
            self.next_retry_date = Some(now + policy.backoff());
        } else {
            self.status = TransactionStatus::Failed;
            self.next_retry_date = None;
            self.processed_at = Some(now);
        }
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Successful | TransactionStatus::Failed | TransactionStatus::Disputed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction() -> DebitTransaction {
        DebitTransaction::new(
            Uuid::new_v4(),
            BigDecimal::from_str("250.00").unwrap(),
            TransactionType::MembershipPayment,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            None,
            None,
        )
    }

    #[test]
    fn new_transaction_is_pending_with_zero_retries() {
        let tx = transaction();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.retry_count, 0);
        assert!(tx.next_retry_date.is_none());
        assert!(tx.transaction_reference.starts_with("TX"));
    }

    #[test]
    fn processing_requires_pending() {
        let mut tx = transaction();
        tx.begin_processing(Utc::now()).unwrap();
        assert_eq!(tx.status, TransactionStatus::Processing);

        let err = tx.begin_processing(Utc::now()).unwrap_err();
        assert_eq!(err.current, "processing");
    }

    #[test]
    fn failure_schedules_retry_while_attempts_remain() {
        let policy = RetryPolicy::default();
        let mut tx = transaction();
        let now = Utc::now();
        tx.begin_processing(now).unwrap();
        tx.record_failure("Insufficient funds", now, &policy);

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.retry_count, 1);
        assert_eq!(tx.next_retry_date, Some(now + Duration::days(3)));
        assert_eq!(tx.failure_reason.as_deref(), Some("Insufficient funds"));
    }

    #[test]
    fn exhausted_retries_fail_terminally() {
        let policy = RetryPolicy::default();
        let mut tx = transaction();

        for _ in 0..policy.max_retries {
            let now = Utc::now();
            tx.begin_processing(now).unwrap();
            tx.record_failure("Account blocked", now, &policy);
        }

        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.retry_count, policy.max_retries);
        assert!(tx.next_retry_date.is_none());
        assert!(tx.processed_at.is_some());
        assert!(tx.is_terminal());
    }

    #[test]
    fn success_after_a_retry_keeps_the_retry_count() {
        let policy = RetryPolicy::default();
        let mut tx = transaction();
        let now = Utc::now();
        tx.begin_processing(now).unwrap();
        tx.record_failure("Bank system unavailable", now, &policy);

        let later = now + Duration::days(3);
        tx.begin_processing(later).unwrap();
        tx.complete(later);

        assert_eq!(tx.status, TransactionStatus::Successful);
        assert_eq!(tx.retry_count, 1);
        assert_eq!(tx.processed_at, Some(later));
        assert!(tx.next_retry_date.is_none());
    }

    #[test]
    fn regeneration_blocking_statuses() {
        assert!(TransactionStatus::Pending.blocks_regeneration());
        assert!(TransactionStatus::Processing.blocks_regeneration());
        assert!(TransactionStatus::Successful.blocks_regeneration());
        assert!(!TransactionStatus::Failed.blocks_regeneration());
        assert!(!TransactionStatus::Disputed.blocks_regeneration());
    }

    #[test]
    fn type_round_trips() {
        assert_eq!(
            "late_fee".parse::<TransactionType>().unwrap(),
            TransactionType::LateFee
        );
        assert_eq!(TransactionType::ClassPayment.as_str(), "class_payment");
        assert!("refunded".parse::<TransactionStatus>().is_err());
    }
}
