use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub const ACCOUNT_NUMBER_MIN_LEN: usize = 9;
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 11;
pub const BRANCH_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Collects every violation so callers can report all failing fields at
/// once instead of stopping at the first.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<ValidationError>,
}

impl Violations {
    pub fn collect(&mut self, result: ValidationResult) {
        if let Err(error) = result {
            self.errors.push(error);
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_digits(field: &'static str, value: &str) -> ValidationResult {
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(field, "must contain only digits"));
    }

    Ok(())
}

pub fn validate_len_range(
    field: &'static str,
    value: &str,
    min_len: usize,
    max_len: usize,
) -> ValidationResult {
    if value.len() < min_len || value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be between {} and {} digits", min_len, max_len),
        ));
    }

    Ok(())
}

pub fn validate_exact_len(field: &'static str, value: &str, len: usize) -> ValidationResult {
    if value.len() != len {
        return Err(ValidationError::new(
            field,
            format!("must be exactly {} digits", len),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_date_order(
    field: &'static str,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> ValidationResult {
    if let Some(end) = end_date {
        if end <= start_date {
            return Err(ValidationError::new(field, "must be after the start date"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_digits() {
        assert!(validate_digits("account_number", "1234567890").is_ok());
        assert!(validate_digits("account_number", "12345abc90").is_err());
        assert!(validate_digits("account_number", "").is_err());
    }

    #[test]
    fn validates_len_range() {
        assert!(validate_len_range("account_number", "123456789", 9, 11).is_ok());
        assert!(validate_len_range("account_number", "12345678901", 9, 11).is_ok());
        assert!(validate_len_range("account_number", "12345678", 9, 11).is_err());
        assert!(validate_len_range("account_number", "123456789012", 9, 11).is_err());
    }

    #[test]
    fn validates_exact_len() {
        assert!(validate_exact_len("branch_code", "250655", 6).is_ok());
        assert!(validate_exact_len("branch_code", "25065", 6).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  First\tNational  "), "First National");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount("max_amount", &positive).is_ok());
        assert!(validate_positive_amount("max_amount", &zero).is_err());
        assert!(validate_positive_amount("max_amount", &negative).is_err());
    }

    #[test]
    fn validates_date_order() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let after = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        assert!(validate_date_order("end_date", start, None).is_ok());
        assert!(validate_date_order("end_date", start, Some(after)).is_ok());
        assert!(validate_date_order("end_date", start, Some(start)).is_err());
    }

    #[test]
    fn violations_keep_every_failure() {
        let mut violations = Violations::default();
        violations.collect(validate_required("bank_name", ""));
        violations.collect(validate_exact_len("branch_code", "123", 6));
        violations.collect(validate_required("account_holder", "J Smith"));

        let errors = violations.into_result().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "bank_name");
        assert_eq!(errors[1].field, "branch_code");
    }
}
