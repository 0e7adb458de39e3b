//! Transaction processing against the payment rail, with bounded retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DebitTransaction, RetryPolicy, TransactionStatus};
use crate::error::AppError;
use crate::ports::{
    DebitOutcome, MandateRepository, PaymentRail, TransactionRepository,
};
use crate::services::notifications;

const BATCH_LIMIT: i64 = 50;

/// Counts from one processing batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingReport {
    pub processed: usize,
    pub successful: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Settings the processor needs beyond its collaborators.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorSettings {
    pub retry: RetryPolicy,
    pub rail_timeout: Duration,
    pub suspend_mandate_on_exhausted_retries: bool,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            rail_timeout: Duration::from_secs(30),
            suspend_mandate_on_exhausted_retries: false,
        }
    }
}

pub struct TransactionProcessor {
    transactions: Arc<dyn TransactionRepository>,
    mandates: Arc<dyn MandateRepository>,
    rail: Arc<dyn PaymentRail>,
    settings: ProcessorSettings,
}

impl TransactionProcessor {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        mandates: Arc<dyn MandateRepository>,
        rail: Arc<dyn PaymentRail>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            transactions,
            mandates,
            rail,
            settings,
        }
    }

    /// Executes one pending transaction. Rail errors and timeouts are
    /// absorbed into the recorded failure state; callers only ever see the
    /// updated transaction or a not-found/invalid-state error.
    pub async fn process_transaction(&self, id: Uuid) -> Result<DebitTransaction, AppError> {
        let mut transaction = self.transactions.get(id).await?;
        transaction.begin_processing(Utc::now())?;
        let mut transaction = self.transactions.update(&transaction).await?;

        let mandate = self.mandates.get(transaction.mandate_id).await?;
        let attempt = self.attempt_debit(&mandate, &transaction).await;
        let now = Utc::now();

        match attempt {
            Ok(()) => {
                transaction.complete(now);
                let note = notifications::debit_processed(
                    &transaction.amount,
                    &mandate.mandate_reference,
                    transaction.transaction_type,
                    now,
                );
                tracing::info!(
                    transaction = %transaction.transaction_reference,
                    notification = %note.subject,
                    "debit successful"
                );
            }
            Err(reason) => {
                transaction.record_failure(&reason, now, &self.settings.retry);
                if transaction.status == TransactionStatus::Failed {
                    tracing::warn!(
                        transaction = %transaction.transaction_reference,
                        retries = transaction.retry_count,
                        reason = %reason,
                        "debit failed permanently, retries exhausted"
                    );
                    if self.settings.suspend_mandate_on_exhausted_retries {
                        self.suspend_parent(transaction.mandate_id).await?;
                    }
                } else {
                    tracing::info!(
                        transaction = %transaction.transaction_reference,
                        retry = transaction.retry_count,
                        reason = %reason,
                        "debit failed, retry scheduled"
                    );
                }
            }
        }

        Ok(self.transactions.update(&transaction).await?)
    }

    /// Processes every pending transaction whose retry date has arrived.
    /// Individual failures are recorded on the transaction, never
    /// propagated out of the batch.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<ProcessingReport, AppError> {
        let batch = self.transactions.list_processable(now, BATCH_LIMIT).await?;
        let mut report = ProcessingReport::default();

        for transaction in batch {
            match self.process_transaction(transaction.id).await {
                Ok(updated) => {
                    report.processed += 1;
                    match updated.status {
                        TransactionStatus::Successful => report.successful += 1,
                        TransactionStatus::Failed => report.failed += 1,
                        _ => report.retried += 1,
                    }
                }
                Err(err) => {
                    tracing::error!(
                        transaction = %transaction.transaction_reference,
                        error = %err,
                        "processing error"
                    );
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            successful = report.successful,
            retried = report.retried,
            failed = report.failed,
            "debit order processing cycle complete"
        );
        Ok(report)
    }

    /// Background loop for the server process. Polls on a fixed interval;
    /// batch errors are logged and the loop keeps going.
    pub async fn run(&self, poll_interval: Duration) {
        tracing::info!(
            interval_secs = poll_interval.as_secs(),
            "transaction processor started"
        );
        loop {
            if let Err(err) = self.process_due(Utc::now()).await {
                tracing::error!(error = %err, "processor batch error");
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Rail invocation bounded by the configured timeout. A timeout counts
    /// as a failed attempt, same as a decline.
    async fn attempt_debit(
        &self,
        mandate: &crate::domain::Mandate,
        transaction: &DebitTransaction,
    ) -> Result<(), String> {
        let call = self.rail.attempt_debit(mandate, &transaction.amount);
        match tokio::time::timeout(self.settings.rail_timeout, call).await {
            Ok(Ok(DebitOutcome::Approved)) => Ok(()),
            Ok(Ok(DebitOutcome::Declined { reason })) => Err(reason),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!(
                "payment rail timed out after {}s",
                self.settings.rail_timeout.as_secs()
            )),
        }
    }

    async fn suspend_parent(&self, mandate_id: Uuid) -> Result<(), AppError> {
        let mut mandate = self.mandates.get(mandate_id).await?;
        match mandate.suspend(Utc::now()) {
            Ok(()) => {
                self.mandates.update(&mandate).await?;
                tracing::warn!(
                    mandate = %mandate.mandate_reference,
                    "mandate suspended after exhausted retries"
                );
            }
            // Already suspended or cancelled; nothing to do.
            Err(_) => {
                tracing::debug!(
                    mandate = %mandate.mandate_reference,
                    status = mandate.status.as_str(),
                    "mandate not suspendable after exhausted retries"
                );
            }
        }
        Ok(())
    }
}
