//! Candidate record validation
//!
//! The validator classifies a candidate against a snapshot of the committed
//! store. It has no side effects: the same candidate, snapshot and `now`
//! always produce the same classification.
//!
//! Two tiers of findings are produced:
//! - structural problems ([`FieldError`]) reject the record outright
//! - statistical oddities ([`Warning`]) accept it, leaving the caller to
//!   confirm or discard before appending

use crate::io::csv_format::{convert_csv_row, CsvRow};
use crate::types::{
    amount_in_range, normalize_amount, FieldError, TransactionRecord, Validation, Warning,
    AMOUNT_SCALE, KNOWN_SERVICES,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use time::PrimitiveDateTime;

/// Thresholds for statistical warnings
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    /// Amounts above this are flagged as unusually high
    pub high_amount_ceiling: Decimal,

    /// Positive amounts below this are flagged as unusually low
    pub low_amount_floor: Decimal,

    /// An amount this many times the service's historical mean is an outlier
    pub mean_multiple: Decimal,

    /// Records of a service needed before its mean is trusted
    pub min_history: usize,

    /// Dates further back than this many days are flagged
    pub max_age_days: i64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            high_amount_ceiling: Decimal::new(500, 0),
            low_amount_floor: Decimal::new(5, 0),
            mean_multiple: Decimal::new(10, 0),
            min_history: 3,
            max_age_days: 365,
        }
    }
}

/// What the committed store says is normal
struct HistoryProfile<'a> {
    ids: HashSet<&'a str>,
    barbers: HashSet<String>,
    /// Service type → (total amount, record count); no total once it overflows
    services: HashMap<&'a str, (Option<Decimal>, usize)>,
}

impl<'a> HistoryProfile<'a> {
    fn from_records(records: &'a [TransactionRecord]) -> Self {
        let mut profile = HistoryProfile {
            ids: HashSet::with_capacity(records.len()),
            barbers: HashSet::new(),
            services: HashMap::new(),
        };

        for record in records {
            profile.ids.insert(record.id.as_str());
            profile.barbers.insert(record.barber.to_lowercase());
            let entry = profile
                .services
                .entry(record.service_type.as_str())
                .or_insert((Some(Decimal::ZERO), 0));
            entry.0 = entry.0.and_then(|total| total.checked_add(record.amount));
            entry.1 += 1;
        }

        profile
    }

    fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Mean amount for a service, once enough history exists
    fn service_mean(&self, service_type: &str, min_history: usize) -> Option<Decimal> {
        match self.services.get(service_type) {
            Some((Some(total), count)) if *count >= min_history && *count > 0 => {
                total.checked_div(Decimal::from(*count))
            }
            _ => None,
        }
    }
}

/// Classifies candidate records
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    /// Create a validator with the given thresholds
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Classify a raw candidate row (form fields or an uploaded row)
    ///
    /// # Arguments
    ///
    /// * `candidate` - Untyped field values
    /// * `existing` - Snapshot of the committed store
    /// * `now` - Reference time for date warnings
    pub fn validate(
        &self,
        candidate: CsvRow,
        existing: &[TransactionRecord],
        now: PrimitiveDateTime,
    ) -> Validation {
        match convert_csv_row(candidate) {
            Ok(record) => self.validate_record(record, existing, now),
            Err(errors) => Validation::Reject(errors),
        }
    }

    /// Classify an already-typed candidate record
    pub fn validate_record(
        &self,
        record: TransactionRecord,
        existing: &[TransactionRecord],
        now: PrimitiveDateTime,
    ) -> Validation {
        let history = HistoryProfile::from_records(existing);

        let mut errors = match check_structure(&record) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };
        if history.ids.contains(record.id.as_str()) {
            errors.push(FieldError::DuplicateId {
                id: record.id.clone(),
            });
        }
        if !errors.is_empty() {
            return Validation::Reject(errors);
        }

        let warnings = self.warnings_for(&record, &history, now);
        if warnings.is_empty() {
            Validation::Accept(record)
        } else {
            Validation::AcceptWithWarning(record, warnings)
        }
    }

    fn warnings_for(
        &self,
        record: &TransactionRecord,
        history: &HistoryProfile<'_>,
        now: PrimitiveDateTime,
    ) -> Vec<Warning> {
        let policy = &self.policy;
        let mut warnings = Vec::new();
        let amount = record.amount;

        if amount <= Decimal::ZERO {
            warnings.push(Warning::NonPositiveAmount { amount });
        } else if amount < policy.low_amount_floor {
            warnings.push(Warning::LowAmount {
                amount,
                floor: policy.low_amount_floor,
            });
        }

        if amount > policy.high_amount_ceiling {
            warnings.push(Warning::HighAmount {
                amount,
                ceiling: policy.high_amount_ceiling,
            });
        }

        if let Some(mean) = history.service_mean(&record.service_type, policy.min_history) {
            let outlier = mean > Decimal::ZERO
                && mean
                    .checked_mul(policy.mean_multiple)
                    .is_some_and(|limit| amount > limit);
            if outlier {
                warnings.push(Warning::Outlier {
                    amount,
                    service_type: record.service_type.clone(),
                    historical_mean: normalize_amount(mean),
                });
            }
        }

        let date = record.date();
        let today = now.date();
        if date > today {
            warnings.push(Warning::FutureDate { date });
        } else if (today - date).whole_days() > policy.max_age_days {
            warnings.push(Warning::StaleDate {
                date,
                max_age_days: policy.max_age_days,
            });
        }

        let service_type = record.service_type.as_str();
        if !KNOWN_SERVICES.contains(&service_type) && !history.services.contains_key(service_type)
        {
            warnings.push(Warning::UnknownCategory {
                service_type: record.service_type.clone(),
            });
        }

        if !history.is_empty() && !history.barbers.contains(&record.barber.to_lowercase()) {
            warnings.push(Warning::NewSource {
                barber: record.barber.clone(),
            });
        }

        warnings
    }
}

/// Structural checks that apply to any typed record
///
/// A parsed row already satisfies these; records built in code (or handed
/// to the merge) may not. Besides the required fields, the record must be
/// in the exact form the ledger file stores: trimmed text, at most two
/// decimal places, whole seconds and a bounded amount. Anything else would
/// read back as a different record, or collide with an existing id once
/// trimmed.
pub fn check_structure(record: &TransactionRecord) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let required = [
        ("ID", record.id.as_str(), FieldError::MissingId),
        ("Barber_Name", record.barber.as_str(), FieldError::MissingSource),
        ("Service_Type", record.service_type.as_str(), FieldError::MissingCategory),
    ];
    for (column, value, missing) in required {
        if value.trim().is_empty() {
            errors.push(missing);
        } else if value.trim() != value {
            errors.push(FieldError::UntrimmedText { column });
        }
    }
    for (column, value) in [
        ("Customer_Name", record.customer.as_str()),
        ("Notes", record.notes.as_str()),
    ] {
        if value.trim() != value {
            errors.push(FieldError::UntrimmedText { column });
        }
    }

    if !amount_in_range(record.amount) {
        errors.push(FieldError::AmountOutOfRange {
            value: record.amount.to_string(),
        });
    } else if record.amount.scale() > AMOUNT_SCALE
        && record.amount != normalize_amount(record.amount)
    {
        errors.push(FieldError::ExcessPrecision {
            amount: record.amount,
        });
    }

    if record.timestamp.nanosecond() != 0 {
        errors.push(FieldError::FractionalSeconds {
            value: record.timestamp.time().to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
