//! Validation outcome types
//!
//! A candidate record is classified into one of three outcomes. Rejections
//! carry the structural problems found; warnings are advisory data the caller
//! branches on, they never stop a write by themselves.

use super::record::{RecordId, TransactionRecord};
use rust_decimal::Decimal;
use std::fmt;

/// A structural problem that keeps a record out of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The id column is empty
    MissingId,

    /// The date column is empty
    MissingTimestamp,

    /// The date or time column could not be parsed
    MalformedTimestamp { value: String },

    /// The cost column is empty
    MissingAmount,

    /// The cost column is not a decimal number
    MalformedAmount { value: String },

    /// The cost is larger in magnitude than any single sale can be
    AmountOutOfRange { value: String },

    /// The amount carries more decimal places than the ledger stores
    ExcessPrecision { amount: Decimal },

    /// The timestamp has a fraction of a second the ledger cannot store
    FractionalSeconds { value: String },

    /// A text column has leading or trailing whitespace
    UntrimmedText { column: &'static str },

    /// The barber column is empty
    MissingSource,

    /// The service type column is empty
    MissingCategory,

    /// The role column holds something other than Owner/Employee
    UnknownRole { value: String },

    /// The id is already used by a committed record
    DuplicateId { id: RecordId },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::MissingId => write!(f, "ID is required"),
            FieldError::MissingTimestamp => write!(f, "Date is required"),
            FieldError::MalformedTimestamp { value } => {
                write!(f, "Invalid date/time '{}'", value)
            }
            FieldError::MissingAmount => write!(f, "Cost is required"),
            FieldError::MalformedAmount { value } => write!(f, "Invalid cost '{}'", value),
            FieldError::AmountOutOfRange { value } => {
                write!(f, "Cost '{}' is outside the supported range", value)
            }
            FieldError::ExcessPrecision { amount } => {
                write!(f, "Cost {} has more than two decimal places", amount)
            }
            FieldError::FractionalSeconds { value } => {
                write!(f, "Time '{}' has fractional seconds", value)
            }
            FieldError::UntrimmedText { column } => {
                write!(f, "{} has leading or trailing whitespace", column)
            }
            FieldError::MissingSource => write!(f, "Barber name is required"),
            FieldError::MissingCategory => write!(f, "Service type is required"),
            FieldError::UnknownRole { value } => {
                write!(f, "Unknown role '{}' (expected Owner or Employee)", value)
            }
            FieldError::DuplicateId { id } => write!(f, "ID '{}' already exists in the ledger", id),
        }
    }
}

/// A statistically unusual, but structurally valid, record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Above the fixed ceiling
    HighAmount { amount: Decimal, ceiling: Decimal },

    /// Positive but below the fixed floor
    LowAmount { amount: Decimal, floor: Decimal },

    /// Zero or negative (refund or correction)
    NonPositiveAmount { amount: Decimal },

    /// Far above what this service usually costs
    Outlier {
        amount: Decimal,
        service_type: String,
        historical_mean: Decimal,
    },

    /// Dated after today
    FutureDate { date: time::Date },

    /// Dated further back than the configured window
    StaleDate { date: time::Date, max_age_days: i64 },

    /// Service type neither known nor seen before
    UnknownCategory { service_type: String },

    /// Barber not seen before in a non-empty ledger
    NewSource { barber: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::HighAmount { amount, .. } => {
                write!(f, "Cost of ${:.2} is unusually high", amount)
            }
            Warning::LowAmount { amount, .. } => {
                write!(f, "Cost of ${:.2} is unusually low", amount)
            }
            Warning::NonPositiveAmount { amount } => {
                write!(f, "Cost of ${:.2} is not positive", amount)
            }
            Warning::Outlier {
                amount,
                service_type,
                historical_mean,
            } => write!(
                f,
                "Cost of ${:.2} is far above the usual ${:.2} for {}",
                amount, historical_mean, service_type
            ),
            Warning::FutureDate { date } => write!(f, "Date {} is in the future", date),
            Warning::StaleDate { date, max_age_days } => write!(
                f,
                "Date {} is more than {} days in the past",
                date, max_age_days
            ),
            Warning::UnknownCategory { service_type } => {
                write!(f, "Service type '{}' has not been seen before", service_type)
            }
            Warning::NewSource { barber } => {
                write!(f, "Barber '{}' has no previous entries", barber)
            }
        }
    }
}

/// Classification of a candidate record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Structurally valid and unremarkable
    Accept(TransactionRecord),

    /// Structurally valid; the caller should confirm before appending
    AcceptWithWarning(TransactionRecord, Vec<Warning>),

    /// Must never enter the store
    Reject(Vec<FieldError>),
}

impl Validation {
    /// The accepted record, if any
    pub fn record(&self) -> Option<&TransactionRecord> {
        match self {
            Validation::Accept(record) | Validation::AcceptWithWarning(record, _) => Some(record),
            Validation::Reject(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Validation::Reject(_))
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Validation::AcceptWithWarning(_, warnings) => warnings,
            _ => &[],
        }
    }
}

/// Join field errors into one line for error messages and logs
pub fn describe_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::date;

    #[rstest]
    #[case::missing_id(FieldError::MissingId, "ID is required")]
    #[case::malformed_amount(
        FieldError::MalformedAmount { value: "abc".to_string() },
        "Invalid cost 'abc'"
    )]
    #[case::unknown_role(
        FieldError::UnknownRole { value: "boss".to_string() },
        "Unknown role 'boss' (expected Owner or Employee)"
    )]
    #[case::untrimmed(
        FieldError::UntrimmedText { column: "ID" },
        "ID has leading or trailing whitespace"
    )]
    #[case::duplicate_id(
        FieldError::DuplicateId { id: "X".to_string() },
        "ID 'X' already exists in the ledger"
    )]
    fn test_field_error_display(#[case] error: FieldError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::high(
        Warning::HighAmount { amount: Decimal::new(50000, 0), ceiling: Decimal::new(500, 0) },
        "Cost of $50000.00 is unusually high"
    )]
    #[case::low(
        Warning::LowAmount { amount: Decimal::new(250, 2), floor: Decimal::new(5, 0) },
        "Cost of $2.50 is unusually low"
    )]
    #[case::future(
        Warning::FutureDate { date: date!(2030 - 01 - 02) },
        "Date 2030-01-02 is in the future"
    )]
    fn test_warning_display(#[case] warning: Warning, #[case] expected: &str) {
        assert_eq!(warning.to_string(), expected);
    }

    #[test]
    fn test_describe_field_errors_joins_messages() {
        let text = describe_field_errors(&[FieldError::MissingId, FieldError::MissingSource]);
        assert_eq!(text, "ID is required; Barber name is required");
    }
}
