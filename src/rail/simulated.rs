//! Simulated payment rail with deterministic, configurable outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::domain::Mandate;
use crate::ports::{DebitOutcome, PaymentRail, RailError};

/// Decline reasons a South African debit run actually produces.
pub const DECLINE_REASONS: [&str; 5] = [
    "Insufficient funds",
    "Account not found",
    "Account blocked",
    "Bank system unavailable",
    "Invalid account details",
];

#[derive(Debug, Clone, Copy)]
enum Mode {
    Approve,
    Decline,
    /// Decline the first N attempts, approve afterwards.
    FailFirst(u64),
}

pub struct SimulatedRail {
    mode: Mode,
    calls: AtomicU64,
}

impl SimulatedRail {
    pub fn approving() -> Self {
        Self {
            mode: Mode::Approve,
            calls: AtomicU64::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            mode: Mode::Decline,
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing_first(attempts: u64) -> Self {
        Self {
            mode: Mode::FailFirst(attempts),
            calls: AtomicU64::new(0),
        }
    }

    fn decline(call: u64) -> DebitOutcome {
        let index = usize::try_from(call).unwrap_or(0) % DECLINE_REASONS.len();
        DebitOutcome::Declined {
            reason: DECLINE_REASONS[index].to_string(),
        }
    }
}

#[async_trait]
impl PaymentRail for SimulatedRail {
    async fn attempt_debit(
        &self,
        _mandate: &Mandate,
        _amount: &BigDecimal,
    ) -> Result<DebitOutcome, RailError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let outcome = match self.mode {
            Mode::Approve => DebitOutcome::Approved,
            Mode::Decline => Self::decline(call),
            Mode::FailFirst(attempts) => {
                if call < attempts {
                    Self::decline(call)
                } else {
                    DebitOutcome::Approved
                }
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, Frequency};
    use crate::utils::reference;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn mandate() -> Mandate {
        Mandate::new(
            reference::mandate_reference(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Capitec".to_string(),
            "B Member".to_string(),
            "9876543210".to_string(),
            "470010".to_string(),
            AccountType::Current,
            BigDecimal::from_str("150.00").unwrap(),
            Frequency::Monthly,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            None,
        )
    }

    #[tokio::test]
    async fn approving_rail_always_approves() {
        let rail = SimulatedRail::approving();
        let mandate = mandate();
        let amount = BigDecimal::from(100);

        for _ in 0..3 {
            let outcome = rail.attempt_debit(&mandate, &amount).await.unwrap();
            assert_eq!(outcome, DebitOutcome::Approved);
        }
    }

    #[tokio::test]
    async fn declining_rail_cycles_reasons() {
        let rail = SimulatedRail::declining();
        let mandate = mandate();
        let amount = BigDecimal::from(100);

        let first = rail.attempt_debit(&mandate, &amount).await.unwrap();
        let second = rail.attempt_debit(&mandate, &amount).await.unwrap();

        assert_eq!(
            first,
            DebitOutcome::Declined {
                reason: DECLINE_REASONS[0].to_string()
            }
        );
        assert_eq!(
            second,
            DebitOutcome::Declined {
                reason: DECLINE_REASONS[1].to_string()
            }
        );
    }

    #[tokio::test]
    async fn fail_first_approves_after_the_configured_attempts() {
        let rail = SimulatedRail::failing_first(2);
        let mandate = mandate();
        let amount = BigDecimal::from(100);

        assert!(matches!(
            rail.attempt_debit(&mandate, &amount).await.unwrap(),
            DebitOutcome::Declined { .. }
        ));
        assert!(matches!(
            rail.attempt_debit(&mandate, &amount).await.unwrap(),
            DebitOutcome::Declined { .. }
        ));
        assert_eq!(
            rail.attempt_debit(&mandate, &amount).await.unwrap(),
            DebitOutcome::Approved
        );
    }
}
