use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use debit_order_core::adapters::{MemoryMandateRepository, MemoryTransactionRepository};
use debit_order_core::domain::{
    AccountType, Frequency, Mandate, MandateStatus, RetryPolicy, TransactionStatus,
};
use debit_order_core::error::AppError;
use debit_order_core::ports::{
    DebitOutcome, PaymentRail, RailError, TransactionFilter, TransactionRepository,
};
use debit_order_core::rail::SimulatedRail;
use debit_order_core::services::processor::ProcessorSettings;
use debit_order_core::services::{
    CreateMandate, MandateService, TransactionGenerator, TransactionProcessor,
};

/// Rail double that never answers; exercises the processor's timeout bound.
struct StalledRail;

#[async_trait]
impl PaymentRail for StalledRail {
    async fn attempt_debit(
        &self,
        _mandate: &Mandate,
        _amount: &BigDecimal,
    ) -> Result<DebitOutcome, RailError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(DebitOutcome::Approved)
    }
}

struct Fixture {
    mandates: Arc<MemoryMandateRepository>,
    transactions: Arc<MemoryTransactionRepository>,
    mandate_service: MandateService,
}

fn fixture() -> Fixture {
    let mandates = Arc::new(MemoryMandateRepository::new());
    let transactions = Arc::new(MemoryTransactionRepository::new());
    Fixture {
        mandate_service: MandateService::new(mandates.clone()),
        mandates,
        transactions,
    }
}

impl Fixture {
    fn processor(&self, rail: Arc<dyn PaymentRail>, settings: ProcessorSettings) -> TransactionProcessor {
        TransactionProcessor::new(
            self.transactions.clone(),
            self.mandates.clone(),
            rail,
            settings,
        )
    }

    /// Creates and activates a mandate, runs one generation cycle, and
    /// returns the generated transaction's id with the mandate's id.
    async fn generated_transaction(&self) -> (Uuid, Uuid) {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mandate = self
            .mandate_service
            .create_mandate(CreateMandate {
                user_id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                bank_name: "First National Bank".to_string(),
                account_holder: "J Smith".to_string(),
                account_number: "1234567890".to_string(),
                branch_code: "250655".to_string(),
                account_type: AccountType::Current,
                max_amount: BigDecimal::from_str("500.00").unwrap(),
                frequency: Frequency::Monthly,
                start_date: start,
                end_date: None,
            })
            .await
            .unwrap();
        self.mandate_service
            .activate_mandate(mandate.id)
            .await
            .unwrap();

        let generator =
            TransactionGenerator::new(self.mandates.clone(), self.transactions.clone());
        generator.run(start).await.unwrap();

        let transactions = self
            .transactions
            .list(&TransactionFilter::default())
            .await
            .unwrap();
        (transactions[0].id, mandate.id)
    }
}

#[tokio::test]
async fn a_successful_debit_completes_the_transaction() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let processor = fx.processor(Arc::new(SimulatedRail::approving()), ProcessorSettings::default());

    let updated = processor.process_transaction(tx_id).await.unwrap();

    assert_eq!(updated.status, TransactionStatus::Successful);
    assert_eq!(updated.retry_count, 0);
    assert!(updated.processed_at.is_some());
    assert!(updated.next_retry_date.is_none());
    assert!(updated.failure_reason.is_none());
}

#[tokio::test]
async fn a_declined_debit_schedules_a_retry() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let processor = fx.processor(Arc::new(SimulatedRail::declining()), ProcessorSettings::default());

    let before = Utc::now();
    let updated = processor.process_transaction(tx_id).await.unwrap();

    assert_eq!(updated.status, TransactionStatus::Pending);
    assert_eq!(updated.retry_count, 1);
    assert!(updated.failure_reason.is_some());
    let retry_at = updated.next_retry_date.expect("retry date must be set");
    assert!(retry_at > before + chrono::Duration::days(2));
}

#[tokio::test]
async fn retries_exhaust_into_a_terminal_failure() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let policy = RetryPolicy::default();
    let processor = fx.processor(Arc::new(SimulatedRail::declining()), ProcessorSettings::default());

    for _ in 0..policy.max_retries {
        processor.process_transaction(tx_id).await.unwrap();
    }

    let final_state = fx.transactions.get(tx_id).await.unwrap();
    assert_eq!(final_state.status, TransactionStatus::Failed);
    assert_eq!(final_state.retry_count, policy.max_retries);
    assert!(final_state.next_retry_date.is_none());
    assert!(final_state.failure_reason.is_some());

    // A terminally failed transaction cannot be processed again.
    let err = processor.process_transaction(tx_id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn success_on_the_second_attempt_keeps_one_retry_on_record() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let processor = fx.processor(
        Arc::new(SimulatedRail::failing_first(1)),
        ProcessorSettings::default(),
    );

    processor.process_transaction(tx_id).await.unwrap();
    let updated = processor.process_transaction(tx_id).await.unwrap();

    assert_eq!(updated.status, TransactionStatus::Successful);
    assert_eq!(updated.retry_count, 1);
    assert!(updated.processed_at.is_some());
}

#[tokio::test]
async fn processing_an_unknown_transaction_is_not_found() {
    let fx = fixture();
    let processor = fx.processor(Arc::new(SimulatedRail::approving()), ProcessorSettings::default());

    let err = processor.process_transaction(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn processing_a_successful_transaction_is_a_conflict() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let processor = fx.processor(Arc::new(SimulatedRail::approving()), ProcessorSettings::default());

    processor.process_transaction(tx_id).await.unwrap();
    let err = processor.process_transaction(tx_id).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn a_rail_timeout_counts_as_a_failed_attempt() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let settings = ProcessorSettings {
        rail_timeout: Duration::from_millis(50),
        ..ProcessorSettings::default()
    };
    let processor = fx.processor(Arc::new(StalledRail), settings);

    let updated = processor.process_transaction(tx_id).await.unwrap();

    assert_eq!(updated.status, TransactionStatus::Pending);
    assert_eq!(updated.retry_count, 1);
    assert!(updated
        .failure_reason
        .as_deref()
        .unwrap_or_default()
        .contains("timed out"));
}

#[tokio::test]
async fn process_due_skips_transactions_waiting_for_their_retry_date() {
    let fx = fixture();
    let (tx_id, _) = fx.generated_transaction().await;
    let processor = fx.processor(Arc::new(SimulatedRail::declining()), ProcessorSettings::default());

    // First failure schedules a retry three days out.
    processor.process_transaction(tx_id).await.unwrap();

    let now = Utc::now();
    let report = processor.process_due(now).await.unwrap();
    assert_eq!(report.processed, 0);

    let later = now + chrono::Duration::days(4);
    let report = processor.process_due(later).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.retried, 1);
}

#[tokio::test]
async fn process_due_reports_batch_outcomes() {
    let fx = fixture();
    let (_, _) = fx.generated_transaction().await;
    let processor = fx.processor(Arc::new(SimulatedRail::approving()), ProcessorSettings::default());

    let report = processor.process_due(Utc::now()).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.retried, 0);
}

#[tokio::test]
async fn exhausted_retries_suspend_the_mandate_when_configured() {
    let fx = fixture();
    let (tx_id, mandate_id) = fx.generated_transaction().await;
    let settings = ProcessorSettings {
        suspend_mandate_on_exhausted_retries: true,
        ..ProcessorSettings::default()
    };
    let processor = fx.processor(Arc::new(SimulatedRail::declining()), settings);

    for _ in 0..RetryPolicy::default().max_retries {
        processor.process_transaction(tx_id).await.unwrap();
    }

    let mandate = fx.mandate_service.get_mandate(mandate_id).await.unwrap();
    assert_eq!(mandate.status, MandateStatus::Suspended);
}

#[tokio::test]
async fn exhausted_retries_leave_the_mandate_alone_by_default() {
    let fx = fixture();
    let (tx_id, mandate_id) = fx.generated_transaction().await;
    let processor = fx.processor(Arc::new(SimulatedRail::declining()), ProcessorSettings::default());

    for _ in 0..RetryPolicy::default().max_retries {
        processor.process_transaction(tx_id).await.unwrap();
    }

    let mandate = fx.mandate_service.get_mandate(mandate_id).await.unwrap();
    assert_eq!(mandate.status, MandateStatus::Active);
}
