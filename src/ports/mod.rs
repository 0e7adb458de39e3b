//! Ports consumed by the services: repositories over the durable store and
//! the external payment rail.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{DebitTransaction, Mandate, TransactionStatus};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait MandateRepository: Send + Sync {
    async fn insert(&self, mandate: &Mandate) -> RepositoryResult<Mandate>;

    async fn get(&self, id: Uuid) -> RepositoryResult<Mandate>;

    /// Persists the mutable lifecycle fields of an existing mandate.
    async fn update(&self, mandate: &Mandate) -> RepositoryResult<Mandate>;

    /// All mandates for an organization, any status, newest first.
    async fn list_for_organization(&self, organization_id: Uuid) -> RepositoryResult<Vec<Mandate>>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> RepositoryResult<Vec<Mandate>>;

    /// Active mandates whose next process date falls on or before the given
    /// day.
    async fn list_due(&self, on_or_before: NaiveDate) -> RepositoryResult<Vec<Mandate>>;

    /// Store connectivity probe for the health endpoint.
    async fn ping(&self) -> RepositoryResult<()>;
}

#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub mandate_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            mandate_id: None,
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Inserts a new transaction. Fails with [`RepositoryError::Duplicate`]
    /// when an open transaction already exists for the same
    /// (mandate, due date) pair, so concurrent generator runs cannot double
    /// up.
    async fn insert(&self, transaction: &DebitTransaction) -> RepositoryResult<DebitTransaction>;

    async fn get(&self, id: Uuid) -> RepositoryResult<DebitTransaction>;

    async fn update(&self, transaction: &DebitTransaction) -> RepositoryResult<DebitTransaction>;

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<DebitTransaction>>;

    /// Whether a pending/processing/successful transaction exists for the
    /// mandate and due date.
    async fn exists_open_for_due_date(
        &self,
        mandate_id: Uuid,
        due_date: NaiveDate,
    ) -> RepositoryResult<bool>;

    /// Pending transactions eligible for processing: never attempted, or
    /// whose retry date has arrived.
    async fn list_processable(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> RepositoryResult<Vec<DebitTransaction>>;
}

/// Outcome of a debit attempt the rail actually answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    Approved,
    Declined { reason: String },
}

#[derive(Error, Debug)]
pub enum RailError {
    #[error("rail request failed: {0}")]
    Transport(String),

    #[error("invalid response from payment rail: {0}")]
    InvalidResponse(String),

    #[error("payment rail circuit breaker is open")]
    CircuitOpen,
}

/// The external debit-execution collaborator. Implementations must not
/// retry internally; retry policy belongs to the transaction processor.
#[async_trait]
pub trait PaymentRail: Send + Sync {
    async fn attempt_debit(
        &self,
        mandate: &Mandate,
        amount: &BigDecimal,
    ) -> Result<DebitOutcome, RailError>;
}
