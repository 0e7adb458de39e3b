//! Payment notification text. The email transport lives outside this
//! subsystem; successful debits surface the rendered subject via logging.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::domain::TransactionType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub subject: String,
    pub body: String,
}

pub fn debit_processed(
    amount: &BigDecimal,
    mandate_reference: &str,
    transaction_type: TransactionType,
    processed_at: DateTime<Utc>,
) -> PaymentNotification {
    let subject = format!("Debit Order Processed - {}", mandate_reference);
    let type_label = transaction_type.as_str().replace('_', " ").to_uppercase();

    let body = format!(
        "Dear Member,\n\n\
         This is to confirm that a debit order has been processed on your account:\n\n\
         Amount: R {amount}\n\
         Mandate Reference: {mandate_reference}\n\
         Transaction Type: {type_label}\n\
         Date: {date}\n\n\
         If you have any queries regarding this transaction, please contact the organization directly.\n\n\
         Thank you for using our debit order service.",
        amount = amount,
        mandate_reference = mandate_reference,
        type_label = type_label,
        date = processed_at.format("%Y-%m-%d"),
    );

    PaymentNotification { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn notification_names_the_mandate_and_amount() {
        let amount = BigDecimal::from_str("350.00").unwrap();
        let note = debit_processed(
            &amount,
            "DO1234ABCD5678EF",
            TransactionType::MembershipPayment,
            Utc::now(),
        );

        assert_eq!(note.subject, "Debit Order Processed - DO1234ABCD5678EF");
        assert!(note.body.contains("R 350.00"));
        assert!(note.body.contains("MEMBERSHIP PAYMENT"));
    }
}
