//! Mandate store and lifecycle operations.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{AccountType, Frequency, Mandate};
use crate::error::AppError;
use crate::ports::MandateRepository;
use crate::services::mandate_form;
use crate::utils::reference;
use crate::validation::{
    sanitize_string, validate_date_order, validate_digits, validate_exact_len, validate_len_range,
    validate_positive_amount, validate_required, Violations, ACCOUNT_NUMBER_MAX_LEN,
    ACCOUNT_NUMBER_MIN_LEN, BRANCH_CODE_LEN,
};

/// Input for mandate creation.
#[derive(Debug, Clone)]
pub struct CreateMandate {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub branch_code: String,
    pub account_type: AccountType,
    pub max_amount: BigDecimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl CreateMandate {
    fn sanitized(mut self) -> Self {
        self.bank_name = sanitize_string(&self.bank_name);
        self.account_holder = sanitize_string(&self.account_holder);
        self.account_number = sanitize_string(&self.account_number);
        self.branch_code = sanitize_string(&self.branch_code);
        self
    }
}

pub struct MandateService {
    repository: Arc<dyn MandateRepository>,
}

impl MandateService {
    pub fn new(repository: Arc<dyn MandateRepository>) -> Self {
        Self { repository }
    }

    /// Validates every field and reports all violations at once, so a user
    /// can correct the whole form in one pass.
    pub async fn create_mandate(&self, input: CreateMandate) -> Result<Mandate, AppError> {
        let input = input.sanitized();

        let mut violations = Violations::default();
        violations.collect(validate_required("bank_name", &input.bank_name));
        violations.collect(validate_required("account_holder", &input.account_holder));
        violations.collect(validate_digits("account_number", &input.account_number));
        violations.collect(validate_len_range(
            "account_number",
            &input.account_number,
            ACCOUNT_NUMBER_MIN_LEN,
            ACCOUNT_NUMBER_MAX_LEN,
        ));
        violations.collect(validate_digits("branch_code", &input.branch_code));
        violations.collect(validate_exact_len(
            "branch_code",
            &input.branch_code,
            BRANCH_CODE_LEN,
        ));
        violations.collect(validate_positive_amount("max_amount", &input.max_amount));
        violations.collect(validate_date_order(
            "end_date",
            input.start_date,
            input.end_date,
        ));
        violations.into_result().map_err(AppError::Validation)?;

        let mandate = Mandate::new(
            reference::mandate_reference(),
            input.user_id,
            input.organization_id,
            input.bank_name,
            input.account_holder,
            input.account_number,
            input.branch_code,
            input.account_type,
            input.max_amount,
            input.frequency,
            input.start_date,
            input.end_date,
        );

        let created = self.repository.insert(&mandate).await?;
        tracing::info!(
            mandate = %created.mandate_reference,
            organization = %created.organization_id,
            "mandate created"
        );
        Ok(created)
    }

    pub async fn get_mandate(&self, id: Uuid) -> Result<Mandate, AppError> {
        Ok(self.repository.get(id).await?)
    }

    pub async fn mandates_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Mandate>, AppError> {
        Ok(self.repository.list_for_organization(organization_id).await?)
    }

    pub async fn mandates_for_user(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<Vec<Mandate>, AppError> {
        Ok(self
            .repository
            .list_for_user(user_id, organization_id)
            .await?)
    }

    pub async fn activate_mandate(&self, id: Uuid) -> Result<Mandate, AppError> {
        let mut mandate = self.repository.get(id).await?;
        mandate.activate(Utc::now())?;
        let updated = self.repository.update(&mandate).await?;
        tracing::info!(mandate = %updated.mandate_reference, "mandate activated");
        Ok(updated)
    }

    pub async fn suspend_mandate(&self, id: Uuid) -> Result<Mandate, AppError> {
        let mut mandate = self.repository.get(id).await?;
        mandate.suspend(Utc::now())?;
        let updated = self.repository.update(&mandate).await?;
        tracing::info!(mandate = %updated.mandate_reference, "mandate suspended");
        Ok(updated)
    }

    pub async fn resume_mandate(&self, id: Uuid) -> Result<Mandate, AppError> {
        let mut mandate = self.repository.get(id).await?;
        mandate.resume(Utc::now())?;
        let updated = self.repository.update(&mandate).await?;
        tracing::info!(mandate = %updated.mandate_reference, "mandate resumed");
        Ok(updated)
    }

    pub async fn cancel_mandate(&self, id: Uuid) -> Result<Mandate, AppError> {
        let mut mandate = self.repository.get(id).await?;
        mandate.cancel(Utc::now())?;
        let updated = self.repository.update(&mandate).await?;
        tracing::info!(mandate = %updated.mandate_reference, "mandate cancelled");
        Ok(updated)
    }

    /// Renders the authorization document for download/print.
    pub async fn mandate_form(&self, id: Uuid) -> Result<String, AppError> {
        let mandate = self.repository.get(id).await?;
        Ok(mandate_form::render(&mandate))
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        Ok(self.repository.ping().await?)
    }
}
