pub mod memory;
pub mod postgres_mandate_repository;
pub mod postgres_transaction_repository;

pub use memory::{MemoryMandateRepository, MemoryTransactionRepository};
pub use postgres_mandate_repository::PostgresMandateRepository;
pub use postgres_transaction_repository::PostgresTransactionRepository;
