//! Mandate domain entity and its lifecycle state machine.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{InvalidTransition, ParseEnumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Current,
    Savings,
    Transmission,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Current => "current",
            AccountType::Savings => "savings",
            AccountType::Transmission => "transmission",
        }
    }
}

impl FromStr for AccountType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "current" => Ok(AccountType::Current),
            "savings" => Ok(AccountType::Savings),
            "transmission" => Ok(AccountType::Transmission),
            other => Err(ParseEnumError {
                kind: "account type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Weekly,
    #[serde(rename = "bi-weekly")]
    BiWeekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi-weekly",
        }
    }

    /// Next due date one billing interval after `from`. Monthly advancement
    /// clamps to the end of shorter months (Jan 31 -> Feb 28).
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        let next = match self {
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
            Frequency::Weekly => from.checked_add_days(Days::new(7)),
            Frequency::BiWeekly => from.checked_add_days(Days::new(14)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }
}

impl FromStr for Frequency {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "monthly" => Ok(Frequency::Monthly),
            "weekly" => Ok(Frequency::Weekly),
            "bi-weekly" => Ok(Frequency::BiWeekly),
            other => Err(ParseEnumError {
                kind: "frequency",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MandateStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
}

impl MandateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MandateStatus::Pending => "pending",
            MandateStatus::Active => "active",
            MandateStatus::Suspended => "suspended",
            MandateStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for MandateStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(MandateStatus::Pending),
            "active" => Ok(MandateStatus::Active),
            "suspended" => Ok(MandateStatus::Suspended),
            "cancelled" => Ok(MandateStatus::Cancelled),
            other => Err(ParseEnumError {
                kind: "mandate status",
                value: other.to_string(),
            }),
        }
    }
}

/// A user's standing authorization for an organization to debit a bank
/// account up to `max_amount` on a recurring schedule. Never deleted;
/// cancellation is a status change so the audit history survives.
#[derive(Debug, Clone, Serialize)]
pub struct Mandate {
    pub id: Uuid,
    pub mandate_reference: String,
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
    pub status: MandateStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub next_process_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mandate {
    pub fn new(
        mandate_reference: String,
        user_id: Uuid,
        organization_id: Uuid,
        bank_name: String,
        account_holder: String,
        account_number: String,
        branch_code: String,
        account_type: AccountType,
        max_amount: BigDecimal,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            mandate_reference,
            user_id,
            organization_id,
            bank_name,
            account_holder,
            account_number,
            branch_code,
            account_type,
            max_amount,
            frequency,
            start_date,
            end_date,
            status: MandateStatus::Pending,
            signed_at: None,
            last_processed_at: None,
            next_process_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Activation simulates bank approval: the mandate is signed and the
    /// first billing cycle becomes due on the start date itself.
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        match self.status {
            MandateStatus::Pending => {
                self.status = MandateStatus::Active;
                self.signed_at = Some(now);
                self.next_process_date = Some(self.start_date);
                self.updated_at = now;
                Ok(())
            }
            other => Err(self.rejected(other, "activate")),
        }
    }

    pub fn suspend(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        match self.status {
            MandateStatus::Active => {
                self.status = MandateStatus::Suspended;
                self.updated_at = now;
                Ok(())
            }
            other => Err(self.rejected(other, "suspend")),
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        match self.status {
            MandateStatus::Suspended => {
                self.status = MandateStatus::Active;
                self.updated_at = now;
                Ok(())
            }
            other => Err(self.rejected(other, "resume")),
        }
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        match self.status {
            MandateStatus::Cancelled => Err(self.rejected(MandateStatus::Cancelled, "cancel")),
            _ => {
                self.status = MandateStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Called by the generator after a transaction has been emitted (or found
    /// already present) for `due_date`.
    pub fn record_cycle(&mut self, due_date: NaiveDate, now: DateTime<Utc>) {
        self.last_processed_at = Some(now);
        self.next_process_date = Some(self.frequency.advance(due_date));
        self.updated_at = now;
    }

    /// Fields a stored mandate must carry before the generator will touch it.
    /// Violations are a data-integrity problem, not a validation failure.
    pub fn integrity_violations(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bank_name.trim().is_empty() {
            missing.push("bank_name");
        }
        if self.account_holder.trim().is_empty() {
            missing.push("account_holder");
        }
        if self.account_number.trim().is_empty() {
            missing.push("account_number");
        }
        if self.branch_code.trim().is_empty() {
            missing.push("branch_code");
        }
        if self.max_amount <= BigDecimal::from(0) {
            missing.push("max_amount");
        }
        missing
    }

    fn rejected(&self, current: MandateStatus, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            entity: "mandate",
            current: current.as_str(),
            action,
        }
    }
}
