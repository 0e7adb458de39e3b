//! Domain entities for debit-order mandates and their transactions.
//! Framework-agnostic; persistence lives behind the repository ports.

pub mod mandate;
pub mod transaction;

pub use mandate::{AccountType, Frequency, Mandate, MandateStatus};
pub use transaction::{
    DebitTransaction, RetryPolicy, TransactionStatus, TransactionType,
};

use thiserror::Error;

/// A status transition that the state machine does not permit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a {entity} that is {current}")]
pub struct InvalidTransition {
    pub entity: &'static str,
    pub current: &'static str,
    pub action: &'static str,
}

/// A stored status string that does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
