//! Postgres implementation of MandateRepository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Mandate;
use crate::ports::{MandateRepository, RepositoryError, RepositoryResult};

const MANDATE_COLUMNS: &str = "id, mandate_reference, user_id, organization_id, bank_name, \
     account_holder, account_number, branch_code, account_type, max_amount, frequency, \
     start_date, end_date, status, signed_at, last_processed_at, next_process_date, \
     created_at, updated_at";

/// Postgres-backed mandate repository.
#[derive(Clone)]
pub struct PostgresMandateRepository {
    pool: PgPool,
}

impl PostgresMandateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MandateRepository for PostgresMandateRepository {
    async fn insert(&self, mandate: &Mandate) -> RepositoryResult<Mandate> {
        let row = sqlx::query_as::<_, MandateRow>(&format!(
            r#"
            INSERT INTO debit_order_mandates (
                id, mandate_reference, user_id, organization_id, bank_name,
                account_holder, account_number, branch_code, account_type, max_amount,
                frequency, start_date, end_date, status, signed_at,
                last_processed_at, next_process_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {}
            "#,
            MANDATE_COLUMNS
        ))
        .bind(mandate.id)
        .bind(&mandate.mandate_reference)
        .bind(mandate.user_id)
        .bind(mandate.organization_id)
        .bind(&mandate.bank_name)
        .bind(&mandate.account_holder)
        .bind(&mandate.account_number)
        .bind(&mandate.branch_code)
        .bind(mandate.account_type.as_str())
        .bind(&mandate.max_amount)
        .bind(mandate.frequency.as_str())
        .bind(mandate.start_date)
        .bind(mandate.end_date)
        .bind(mandate.status.as_str())
        .bind(mandate.signed_at)
        .bind(mandate.last_processed_at)
        .bind(mandate.next_process_date)
        .bind(mandate.created_at)
        .bind(mandate.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Mandate> {
        let row = sqlx::query_as::<_, MandateRow>(
            "SELECT * FROM debit_order_mandates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(MandateRow::into_domain)
            .transpose()?
            .ok_or_else(|| RepositoryError::NotFound(format!("mandate {}", id)))
    }

    async fn update(&self, mandate: &Mandate) -> RepositoryResult<Mandate> {
        let row = sqlx::query_as::<_, MandateRow>(&format!(
            r#"
            UPDATE debit_order_mandates
            SET status = $2, signed_at = $3, last_processed_at = $4,
                next_process_date = $5, updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            MANDATE_COLUMNS
        ))
        .bind(mandate.id)
        .bind(mandate.status.as_str())
        .bind(mandate.signed_at)
        .bind(mandate.last_processed_at)
        .bind(mandate.next_process_date)
        .bind(mandate.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(MandateRow::into_domain)
            .transpose()?
            .ok_or_else(|| RepositoryError::NotFound(format!("mandate {}", mandate.id)))
    }

    async fn list_for_organization(&self, organization_id: Uuid) -> RepositoryResult<Vec<Mandate>> {
        let rows = sqlx::query_as::<_, MandateRow>(
            "SELECT * FROM debit_order_mandates WHERE organization_id = $1 ORDER BY created_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(MandateRow::into_domain).collect()
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> RepositoryResult<Vec<Mandate>> {
        let rows = match organization_id {
            Some(organization_id) => {
                sqlx::query_as::<_, MandateRow>(
                    "SELECT * FROM debit_order_mandates \
                     WHERE user_id = $1 AND organization_id = $2 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(organization_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, MandateRow>(
                    "SELECT * FROM debit_order_mandates WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(MandateRow::into_domain).collect()
    }

    async fn list_due(&self, on_or_before: NaiveDate) -> RepositoryResult<Vec<Mandate>> {
        let rows = sqlx::query_as::<_, MandateRow>(
            r#"
            SELECT * FROM debit_order_mandates
            WHERE status = 'active'
              AND next_process_date IS NOT NULL
              AND next_process_date <= $1
            ORDER BY next_process_date ASC
            "#,
        )
        .bind(on_or_before)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(MandateRow::into_domain).collect()
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Duplicate(db_err.message().to_string());
        }
    }
    RepositoryError::Backend(err.to_string())
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct MandateRow {
    id: Uuid,
    mandate_reference: String,
    user_id: Uuid,
    organization_id: Uuid,
    bank_name: String,
    account_holder: String,
    account_number: String,
    branch_code: String,
    account_type: String,
    max_amount: bigdecimal::BigDecimal,
    frequency: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    status: String,
    signed_at: Option<chrono::DateTime<chrono::Utc>>,
    last_processed_at: Option<chrono::DateTime<chrono::Utc>>,
    next_process_date: Option<NaiveDate>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl MandateRow {
    fn into_domain(self) -> RepositoryResult<Mandate> {
        Ok(Mandate {
            id: self.id,
            mandate_reference: self.mandate_reference,
            user_id: self.user_id,
            organization_id: self.organization_id,
            bank_name: self.bank_name,
            account_holder: self.account_holder,
            account_number: self.account_number,
            branch_code: self.branch_code,
            account_type: self
                .account_type
                .parse()
                .map_err(|err: crate::domain::ParseEnumError| {
                    RepositoryError::Backend(err.to_string())
                })?,
            max_amount: self.max_amount,
            frequency: self
                .frequency
                .parse()
                .map_err(|err: crate::domain::ParseEnumError| {
                    RepositoryError::Backend(err.to_string())
                })?,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self
                .status
                .parse()
                .map_err(|err: crate::domain::ParseEnumError| {
                    RepositoryError::Backend(err.to_string())
                })?,
            signed_at: self.signed_at,
            last_processed_at: self.last_processed_at,
            next_process_date: self.next_process_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
