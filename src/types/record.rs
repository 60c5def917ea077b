//! Transaction-related types for the shop ledger
//!
//! This module defines the ledger record, the role of the person who
//! performed a service, and the draft builder used by producers (the CLI
//! form, an uploaded file) to create new records.

use crate::types::LedgerError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Transaction identifier
///
/// Generated by the producer, never by the ledger itself.
pub type RecordId = String;

/// Number of decimal places kept for every stored amount
pub const AMOUNT_SCALE: u32 = 2;

/// Largest magnitude a single amount may have
///
/// Sums and projections over bounded amounts stay far inside `Decimal`'s
/// range, so ledger arithmetic cannot overflow on parsed input.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Service names the shop sells
///
/// The category set is open-ended; anything outside this list (and not
/// already seen in history) triggers a warning rather than a rejection.
pub const KNOWN_SERVICES: [&str; 5] = ["Haircut", "Beard Trim", "Full Service", "Line Up", "Product"];

/// Service type for retail sales rather than chair time
pub const PRODUCT_SERVICE: &str = "Product";

/// Customer name filled in for product sales without a named customer
pub const WALK_IN_CUSTOMER: &str = "Walk-In";

/// Who performed the service
///
/// Owner revenue is retained in full; employee revenue is subject to the
/// worker's commission cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Role {
    /// Staff barber paid a commission on their revenue
    #[default]
    Employee,

    /// The shop owner's own chair
    Owner,
}

impl Role {
    /// Parse a role label, ignoring case and surrounding whitespace
    ///
    /// An empty label means `Employee`, matching how older ledgers without a
    /// role were treated.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("employee") {
            Some(Role::Employee)
        } else if label.eq_ignore_ascii_case("owner") {
            Some(Role::Owner)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Owner => "Owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single committed ledger entry
///
/// Field-for-field equality is what round-trip and dedup tests compare, so
/// `amount` is always normalised to [`AMOUNT_SCALE`] places before a record is
/// built (see [`normalize_amount`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Identity key, unique across the store
    pub id: RecordId,

    /// When the service was performed (naive local wall-clock time)
    pub timestamp: PrimitiveDateTime,

    /// Signed currency amount, two decimal places
    pub amount: Decimal,

    /// Service type label (e.g. "Haircut")
    pub service_type: String,

    /// Barber who performed the service; the record's provenance
    pub barber: String,

    /// Customer name, may be empty
    pub customer: String,

    /// Whether the barber is the owner or an employee
    pub role: Role,

    /// Free text
    pub notes: String,
}

impl TransactionRecord {
    /// The day bucket this record belongs to
    pub fn date(&self) -> time::Date {
        self.timestamp.date()
    }

    /// The hour-of-day bucket (0-23) this record belongs to
    pub fn hour(&self) -> u8 {
        self.timestamp.hour()
    }

    /// Product sales are excluded from service counts
    pub fn is_product_sale(&self) -> bool {
        self.service_type == PRODUCT_SERVICE
    }
}

/// Round an amount to the stored precision
pub fn normalize_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether an amount is within [`MAX_AMOUNT`] either side of zero
pub fn amount_in_range(amount: Decimal) -> bool {
    amount.abs() <= MAX_AMOUNT
}

/// Add amounts, failing instead of panicking when the total overflows
pub fn checked_total<I>(amounts: I, context: &str) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow(context))
    })
}

/// Trim and capitalise each word of a person's name
///
/// `"  john DOE "` becomes `"John Doe"`.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a collision-resistant record id
///
/// The id leads with the wall-clock time so ids sort roughly by creation, and
/// ends with the random part of a ULID to separate entries created within the
/// same instant.
pub fn generate_record_id(now: OffsetDateTime) -> RecordId {
    let stamp = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}{:06}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.microsecond()
    );
    let ulid = ulid::Ulid::new().to_string();
    let suffix = &ulid[ulid.len() - 4..];
    format!("{}-{}", stamp, suffix.to_ascii_lowercase())
}

/// Form input for a new transaction
///
/// Producers fill this in and call [`NewTransaction::into_record`], which
/// applies the same clean-up the shop's entry form always has.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub timestamp: PrimitiveDateTime,
    pub barber: String,
    pub customer: String,
    pub service_type: String,
    pub amount: Decimal,
    pub role: Role,
    pub notes: String,
}

impl NewTransaction {
    /// Build a record with the given id
    ///
    /// Names are title-cased and a product sale without a customer is booked
    /// to [`WALK_IN_CUSTOMER`].
    pub fn into_record(self, id: RecordId) -> TransactionRecord {
        let service_type = self.service_type.trim().to_string();
        let mut customer = title_case(&self.customer);
        if customer.is_empty() && service_type == PRODUCT_SERVICE {
            customer = WALK_IN_CUSTOMER.to_string();
        }

        TransactionRecord {
            id,
            timestamp: self.timestamp,
            amount: normalize_amount(self.amount),
            service_type,
            barber: title_case(&self.barber),
            customer,
            role: self.role,
            notes: self.notes.trim().to_string(),
        }
    }
}
