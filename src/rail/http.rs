//! HTTP client for an external debit-execution endpoint.

use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::Mandate;
use crate::ports::{DebitOutcome, PaymentRail, RailError};

#[derive(Debug, Serialize)]
struct DebitRequest {
    mandate_reference: String,
    account_holder: String,
    account_number: String,
    branch_code: String,
    account_type: String,
    /// Decimal amount as a string so no precision is lost on the wire.
    amount: String,
}

#[derive(Debug, Deserialize)]
struct DebitResponse {
    approved: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// HTTP adapter for the payment rail. A circuit breaker keeps a flapping
/// rail from being hammered by every processor cycle.
#[derive(Clone)]
pub struct HttpRail {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl HttpRail {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(60), Duration::from_secs(120));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        HttpRail {
            client,
            base_url,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker.
    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }
}

#[async_trait]
impl PaymentRail for HttpRail {
    async fn attempt_debit(
        &self,
        mandate: &Mandate,
        amount: &BigDecimal,
    ) -> Result<DebitOutcome, RailError> {
        let url = format!("{}/debits", self.base_url.trim_end_matches('/'));
        let request = DebitRequest {
            mandate_reference: mandate.mandate_reference.clone(),
            account_holder: mandate.account_holder.clone(),
            account_number: mandate.account_number.clone(),
            branch_code: mandate.branch_code.clone(),
            account_type: mandate.account_type.as_str().to_string(),
            amount: amount.to_string(),
        };
        let client = self.client.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|err| RailError::Transport(err.to_string()))?;

                if !response.status().is_success() {
                    return Err(RailError::InvalidResponse(format!(
                        "unexpected status {}",
                        response.status()
                    )));
                }

                let body: DebitResponse = response
                    .json()
                    .await
                    .map_err(|err| RailError::InvalidResponse(err.to_string()))?;

                if body.approved {
                    Ok(DebitOutcome::Approved)
                } else {
                    Ok(DebitOutcome::Declined {
                        reason: body
                            .reason
                            .unwrap_or_else(|| "declined by payment rail".to_string()),
                    })
                }
            })
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(FailsafeError::Rejected) => Err(RailError::CircuitOpen),
            Err(FailsafeError::Inner(err)) => Err(err),
        }
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
            "Nedbank".to_string(),
            "C Parent".to_string(),
            "1122334455".to_string(),
            "198765".to_string(),
            AccountType::Current,
            BigDecimal::from_str("420.00").unwrap(),
            Frequency::Monthly,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            None,
        )
    }

    #[test]
    fn new_rail_has_a_closed_circuit() {
        let rail = HttpRail::new(
            "http://localhost:9999".to_string(),
            Duration::from_secs(30),
        );
        assert_eq!(rail.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn approved_response_maps_to_approved() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/debits")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"approved": true}"#)
            .create_async()
            .await;

        let rail = HttpRail::new(server.url(), Duration::from_secs(5));
        let outcome = rail
            .attempt_debit(&mandate(), &BigDecimal::from(100))
            .await
            .unwrap();

        assert_eq!(outcome, DebitOutcome::Approved);
    }

    #[tokio::test]
    async fn declined_response_carries_the_reason() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/debits")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"approved": false, "reason": "Insufficient funds"}"#)
            .create_async()
            .await;

        let rail = HttpRail::new(server.url(), Duration::from_secs(5));
        let outcome = rail
            .attempt_debit(&mandate(), &BigDecimal::from(100))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DebitOutcome::Declined {
                reason: "Insufficient funds".to_string()
            }
        );
    }

    #[tokio::test]
    async fn server_error_is_an_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/debits")
            .with_status(500)
            .create_async()
            .await;

        let rail = HttpRail::new(server.url(), Duration::from_secs(5));
        let result = rail.attempt_debit(&mandate(), &BigDecimal::from(100)).await;

        assert!(matches!(result, Err(RailError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn circuit_breaker_opens_after_consecutive_failures() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/debits")
            .with_status(500)
            .expect_at_least(3)
            .create_async()
            .await;

        let rail = HttpRail::new(server.url(), Duration::from_secs(5));
        for _ in 0..3 {
            let _ = rail.attempt_debit(&mandate(), &BigDecimal::from(100)).await;
        }

        let result = rail.attempt_debit(&mandate(), &BigDecimal::from(100)).await;
        assert!(matches!(result, Err(RailError::CircuitOpen)));
    }
}
