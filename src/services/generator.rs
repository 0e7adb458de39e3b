//! Transaction generation: one pending debit per active mandate per billing
//! cycle, driven by an external scheduling trigger.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::domain::{DebitTransaction, TransactionType};
use crate::error::AppError;
use crate::ports::{MandateRepository, RepositoryError, TransactionRepository};

/// Counts from one generation cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub generated: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

pub struct TransactionGenerator {
    mandates: Arc<dyn MandateRepository>,
    transactions: Arc<dyn TransactionRepository>,
}

impl TransactionGenerator {
    pub fn new(
        mandates: Arc<dyn MandateRepository>,
        transactions: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            mandates,
            transactions,
        }
    }

    /// Scans active mandates due on or before `today` and emits one pending
    /// transaction each. Idempotent: a mandate whose due date already has an
    /// open transaction only has its schedule advanced. A malformed mandate
    /// is skipped with a warning and never halts the batch.
    pub async fn run(&self, today: NaiveDate) -> Result<GenerationReport, AppError> {
        let due_mandates = self.mandates.list_due(today).await?;
        let mut report = GenerationReport::default();

        for mut mandate in due_mandates {
            let Some(due_date) = mandate.next_process_date else {
                tracing::warn!(
                    mandate = %mandate.mandate_reference,
                    "active mandate has no next process date, skipping"
                );
                report.skipped += 1;
                continue;
            };

            let problems = mandate.integrity_violations();
            if !problems.is_empty() {
                tracing::warn!(
                    mandate = %mandate.mandate_reference,
                    fields = ?problems,
                    "mandate has malformed data, skipping"
                );
                report.skipped += 1;
                continue;
            }

            if mandate.end_date.is_some_and(|end| end < due_date) {
                tracing::debug!(
                    mandate = %mandate.mandate_reference,
                    "mandate is past its end date, skipping"
                );
                report.skipped += 1;
                continue;
            }

            if self
                .transactions
                .exists_open_for_due_date(mandate.id, due_date)
                .await?
            {
                report.duplicates += 1;
            } else {
                // The due amount is the mandate's maximum; per-cycle
                // negotiated amounts would hang off bookings, which this
                // subsystem only references.
                let transaction = DebitTransaction::new(
                    mandate.id,
                    mandate.max_amount.clone(),
                    TransactionType::MembershipPayment,
                    due_date,
                    None,
                    None,
                );
                match self.transactions.insert(&transaction).await {
                    Ok(created) => {
                        report.generated += 1;
                        tracing::info!(
                            transaction = %created.transaction_reference,
                            mandate = %mandate.mandate_reference,
                            due = %due_date,
                            "debit transaction generated"
                        );
                    }
                    // Lost the race against a concurrent generator run; the
                    // transaction exists, so just advance the schedule.
                    Err(RepositoryError::Duplicate(_)) => {
                        report.duplicates += 1;
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            mandate.record_cycle(due_date, Utc::now());
            self.mandates.update(&mandate).await?;
        }

        tracing::info!(
            generated = report.generated,
            duplicates = report.duplicates,
            skipped = report.skipped,
            "debit order generation cycle complete"
        );
        Ok(report)
    }
}
