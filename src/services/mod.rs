pub mod generator;
pub mod mandate_form;
pub mod mandate_service;
pub mod notifications;
pub mod processor;
pub mod transaction_service;

pub use generator::{GenerationReport, TransactionGenerator};
pub use mandate_service::{CreateMandate, MandateService};
pub use processor::{ProcessingReport, TransactionProcessor};
pub use transaction_service::{TransactionService, TransactionView};
