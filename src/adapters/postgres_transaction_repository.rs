//! Postgres implementation of TransactionRepository.
//!
//! Generator idempotence is backed by the partial unique index on
//! (mandate_id, due_date): a concurrent insert for the same open pair
//! surfaces as [`RepositoryError::Duplicate`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::postgres_mandate_repository::map_sqlx_error;
use crate::domain::DebitTransaction;
use crate::ports::{
    RepositoryError, RepositoryResult, TransactionFilter, TransactionRepository,
};

const TRANSACTION_COLUMNS: &str = "id, transaction_reference, mandate_id, booking_id, amount, \
     transaction_type, status, due_date, description, processed_at, failure_reason, \
     retry_count, next_retry_date, created_at, updated_at";

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, transaction: &DebitTransaction) -> RepositoryResult<DebitTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO debit_order_transactions (
                id, transaction_reference, mandate_id, booking_id, amount,
                transaction_type, status, due_date, description, processed_at,
                failure_reason, retry_count, next_retry_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(transaction.id)
        .bind(&transaction.transaction_reference)
        .bind(transaction.mandate_id)
        .bind(transaction.booking_id)
        .bind(&transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.due_date)
        .bind(&transaction.description)
        .bind(transaction.processed_at)
        .bind(&transaction.failure_reason)
        .bind(transaction.retry_count)
        .bind(transaction.next_retry_date)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<DebitTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM debit_order_transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TransactionRow::into_domain)
            .transpose()?
            .ok_or_else(|| RepositoryError::NotFound(format!("transaction {}", id)))
    }

    async fn update(&self, transaction: &DebitTransaction) -> RepositoryResult<DebitTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            UPDATE debit_order_transactions
            SET status = $2, processed_at = $3, failure_reason = $4,
                retry_count = $5, next_retry_date = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(transaction.id)
        .bind(transaction.status.as_str())
        .bind(transaction.processed_at)
        .bind(&transaction.failure_reason)
        .bind(transaction.retry_count)
        .bind(transaction.next_retry_date)
        .bind(transaction.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TransactionRow::into_domain)
            .transpose()?
            .ok_or_else(|| RepositoryError::NotFound(format!("transaction {}", transaction.id)))
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<DebitTransaction>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM debit_order_transactions WHERE 1 = 1");
        if let Some(mandate_id) = filter.mandate_id {
            query.push(" AND mandate_id = ").push_bind(mandate_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows: Vec<TransactionRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn exists_open_for_due_date(
        &self,
        mandate_id: Uuid,
        due_date: NaiveDate,
    ) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM debit_order_transactions
                WHERE mandate_id = $1
                  AND due_date = $2
                  AND status IN ('pending', 'processing', 'successful')
            )
            "#,
        )
        .bind(mandate_id)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn list_processable(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> RepositoryResult<Vec<DebitTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM debit_order_transactions
            WHERE status = 'pending'
              AND (next_retry_date IS NULL OR next_retry_date <= $1)
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    transaction_reference: String,
    mandate_id: Uuid,
    booking_id: Option<Uuid>,
    amount: bigdecimal::BigDecimal,
    transaction_type: String,
    status: String,
    due_date: NaiveDate,
    description: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    retry_count: i32,
    next_retry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<DebitTransaction> {
        Ok(DebitTransaction {
            id: self.id,
            transaction_reference: self.transaction_reference,
            mandate_id: self.mandate_id,
            booking_id: self.booking_id,
            amount: self.amount,
            transaction_type: self
                .transaction_type
                .parse()
                .map_err(|err: crate::domain::ParseEnumError| {
                    RepositoryError::Backend(err.to_string())
                })?,
            status: self
                .status
                .parse()
                .map_err(|err: crate::domain::ParseEnumError| {
                    RepositoryError::Backend(err.to_string())
                })?,
            due_date: self.due_date,
            description: self.description,
            processed_at: self.processed_at,
            failure_reason: self.failure_reason,
            retry_count: self.retry_count,
            next_retry_date: self.next_retry_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
