//! External reference generation for mandates and transactions.
//!
//! References appear on generated authorization documents and in reporting,
//! so they carry a stable tag followed by an uppercase token. The token is
//! drawn from a v4 UUID; uniqueness is additionally enforced by the store.

use uuid::Uuid;

const MANDATE_PREFIX: &str = "DO";
const TRANSACTION_PREFIX: &str = "TX";

const MANDATE_TOKEN_LEN: usize = 12;
const TRANSACTION_TOKEN_LEN: usize = 16;

pub fn mandate_reference() -> String {
    format!("{}{}", MANDATE_PREFIX, token(MANDATE_TOKEN_LEN))
}

pub fn transaction_reference() -> String {
    format!("{}{}", TRANSACTION_PREFIX, token(TRANSACTION_TOKEN_LEN))
}

fn token(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..len].to_ascii_uppercase()
}
