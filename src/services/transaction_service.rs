//! Transaction read side for the HTTP surface: listings joined with the
//! owning mandate's reference for display.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::DebitTransaction;
use crate::error::AppError;
use crate::ports::{MandateRepository, TransactionFilter, TransactionRepository};

#[derive(Debug, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: DebitTransaction,
    pub mandate_reference: Option<String>,
}

pub struct TransactionService {
    transactions: Arc<dyn TransactionRepository>,
    mandates: Arc<dyn MandateRepository>,
}

impl TransactionService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        mandates: Arc<dyn MandateRepository>,
    ) -> Self {
        Self {
            transactions,
            mandates,
        }
    }

    pub async fn list(&self, filter: TransactionFilter) -> Result<Vec<TransactionView>, AppError> {
        let transactions = self.transactions.list(&filter).await?;
        let mut references: HashMap<Uuid, Option<String>> = HashMap::new();

        let mut views = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let mandate_reference = match references.get(&transaction.mandate_id) {
                Some(cached) => cached.clone(),
                None => {
                    let looked_up = self
                        .mandates
                        .get(transaction.mandate_id)
                        .await
                        .map(|mandate| mandate.mandate_reference)
                        .ok();
                    references.insert(transaction.mandate_id, looked_up.clone());
                    looked_up
                }
            };
            views.push(TransactionView {
                transaction,
                mandate_reference,
            });
        }

        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> Result<TransactionView, AppError> {
        let transaction = self.transactions.get(id).await?;
        let mandate_reference = self
            .mandates
            .get(transaction.mandate_id)
            .await
            .map(|mandate| mandate.mandate_reference)
            .ok();

        Ok(TransactionView {
            transaction,
            mandate_reference,
        })
    }
}
