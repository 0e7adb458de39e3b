//! In-memory repositories used by the hermetic integration tests. They
//! enforce the same uniqueness rules as the Postgres schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{DebitTransaction, Mandate};
use crate::ports::{
    MandateRepository, RepositoryError, RepositoryResult, TransactionFilter,
    TransactionRepository,
};

#[derive(Default)]
pub struct MemoryMandateRepository {
    mandates: RwLock<HashMap<Uuid, Mandate>>,
}

impl MemoryMandateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MandateRepository for MemoryMandateRepository {
    async fn insert(&self, mandate: &Mandate) -> RepositoryResult<Mandate> {
        let mut mandates = self.mandates.write().await;
        if mandates
            .values()
            .any(|existing| existing.mandate_reference == mandate.mandate_reference)
        {
            return Err(RepositoryError::Duplicate(format!(
                "mandate reference {}",
                mandate.mandate_reference
            )));
        }
        mandates.insert(mandate.id, mandate.clone());
        Ok(mandate.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Mandate> {
        self.mandates
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("mandate {}", id)))
    }

    async fn update(&self, mandate: &Mandate) -> RepositoryResult<Mandate> {
        let mut mandates = self.mandates.write().await;
        if !mandates.contains_key(&mandate.id) {
            return Err(RepositoryError::NotFound(format!("mandate {}", mandate.id)));
        }
        mandates.insert(mandate.id, mandate.clone());
        Ok(mandate.clone())
    }

    async fn list_for_organization(&self, organization_id: Uuid) -> RepositoryResult<Vec<Mandate>> {
        let mut matching: Vec<Mandate> = self
            .mandates
            .read()
            .await
            .values()
            .filter(|mandate| mandate.organization_id == organization_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> RepositoryResult<Vec<Mandate>> {
        let mut matching: Vec<Mandate> = self
            .mandates
            .read()
            .await
            .values()
            .filter(|mandate| {
                mandate.user_id == user_id
                    && organization_id
                        .map(|org| mandate.organization_id == org)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_due(&self, on_or_before: NaiveDate) -> RepositoryResult<Vec<Mandate>> {
        let mut due: Vec<Mandate> = self
            .mandates
            .read()
            .await
            .values()
            .filter(|mandate| {
                mandate.status == crate::domain::MandateStatus::Active
                    && mandate
                        .next_process_date
                        .map(|date| date <= on_or_before)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by_key(|mandate| mandate.next_process_date);
        Ok(due)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTransactionRepository {
    transactions: RwLock<HashMap<Uuid, DebitTransaction>>,
}

impl MemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    async fn insert(&self, transaction: &DebitTransaction) -> RepositoryResult<DebitTransaction> {
        let mut transactions = self.transactions.write().await;
        if transactions
            .values()
            .any(|existing| existing.transaction_reference == transaction.transaction_reference)
        {
            return Err(RepositoryError::Duplicate(format!(
                "transaction reference {}",
                transaction.transaction_reference
            )));
        }
        let open_duplicate = transactions.values().any(|existing| {
            existing.mandate_id == transaction.mandate_id
                && existing.due_date == transaction.due_date
                && existing.status.blocks_regeneration()
        });
        if open_duplicate {
            return Err(RepositoryError::Duplicate(format!(
                "open transaction for mandate {} due {}",
                transaction.mandate_id, transaction.due_date
            )));
        }
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<DebitTransaction> {
        self.transactions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("transaction {}", id)))
    }

    async fn update(&self, transaction: &DebitTransaction) -> RepositoryResult<DebitTransaction> {
        let mut transactions = self.transactions.write().await;
        if !transactions.contains_key(&transaction.id) {
            return Err(RepositoryError::NotFound(format!(
                "transaction {}",
                transaction.id
            )));
        }
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction.clone())
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<DebitTransaction>> {
        let mut matching: Vec<DebitTransaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|transaction| {
                filter
                    .mandate_id
                    .map(|mandate_id| transaction.mandate_id == mandate_id)
                    .unwrap_or(true)
                    && filter
                        .status
                        .map(|status| transaction.status == status)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn exists_open_for_due_date(
        &self,
        mandate_id: Uuid,
        due_date: NaiveDate,
    ) -> RepositoryResult<bool> {
        Ok(self.transactions.read().await.values().any(|transaction| {
            transaction.mandate_id == mandate_id
                && transaction.due_date == due_date
                && transaction.status.blocks_regeneration()
        }))
    }

    async fn list_processable(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> RepositoryResult<Vec<DebitTransaction>> {
        let mut processable: Vec<DebitTransaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|transaction| {
                transaction.status == crate::domain::TransactionStatus::Pending
                    && transaction
                        .next_retry_date
                        .map(|date| date <= now)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        processable.sort_by_key(|transaction| transaction.created_at);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(processable.into_iter().take(limit).collect())
    }
}
