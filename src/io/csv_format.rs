//! CSV format handling for ledger files
//!
//! This module centralizes all CSV format concerns, providing:
//! - The fixed, ordered column header of the canonical store
//! - CsvRow structure for deserialization
//! - Conversion from CSV rows to ledger records (structural validation)
//! - Record serialization with a stable amount format
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::record::{amount_in_range, normalize_amount, Role, TransactionRecord};
use crate::types::{FieldError, LedgerError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

/// Column header written to every ledger file, in order
pub const HEADER: [&str; 9] = [
    "ID",
    "Date",
    "Time",
    "Barber_Name",
    "Customer_Name",
    "Service_Type",
    "Cost",
    "Role",
    "Notes",
];

/// Columns a file must carry to be read
///
/// `Notes` is left out so ledgers written before the column existed still load.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "ID",
    "Date",
    "Time",
    "Barber_Name",
    "Customer_Name",
    "Service_Type",
    "Cost",
    "Role",
];

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem] = format_description!("[hour]:[minute]:[second]");

/// CSV row structure for deserialization
///
/// Every field is read as text so that conversion can report all problems
/// in a row at once instead of stopping at the first serde failure.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Barber_Name")]
    pub barber: String,
    #[serde(rename = "Customer_Name")]
    pub customer: String,
    #[serde(rename = "Service_Type")]
    pub service_type: String,
    #[serde(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
}

/// Check that a header row carries every required column
///
/// # Arguments
///
/// * `headers` - The header fields read from the file
/// * `path` - File name used in the error message
///
/// # Returns
///
/// * `Ok(())` if all required columns are present (in any order)
/// * `Err(LedgerError::MissingColumns)` listing the absent columns otherwise
pub fn check_headers<'a>(
    headers: impl IntoIterator<Item = &'a str>,
    path: &str,
) -> Result<(), LedgerError> {
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !present.contains(*column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::missing_columns(path, missing))
    }
}

/// Convert a CsvRow to a TransactionRecord
///
/// This function:
/// - Requires a non-empty id, date, barber and service type
/// - Parses `Date` and `Time` into one timestamp (an empty time is midnight)
/// - Parses the cost into a Decimal, normalised to two places
/// - Parses the role (empty means Employee)
///
/// # Returns
///
/// * `Ok(TransactionRecord)` - Structurally valid record
/// * `Err(Vec<FieldError>)` - Every structural problem found in the row
pub fn convert_csv_row(row: CsvRow) -> Result<TransactionRecord, Vec<FieldError>> {
    let mut errors = Vec::new();

    let id = row.id.trim().to_string();
    if id.is_empty() {
        errors.push(FieldError::MissingId);
    }

    let timestamp = match parse_timestamp(&row.date, &row.time) {
        Ok(timestamp) => Some(timestamp),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let amount = match parse_amount(&row.cost) {
        Ok(amount) => Some(amount),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let barber = row.barber.trim().to_string();
    if barber.is_empty() {
        errors.push(FieldError::MissingSource);
    }

    let service_type = row.service_type.trim().to_string();
    if service_type.is_empty() {
        errors.push(FieldError::MissingCategory);
    }

    let role = Role::parse(&row.role);
    if role.is_none() {
        errors.push(FieldError::UnknownRole {
            value: row.role.trim().to_string(),
        });
    }

    match (timestamp, amount, role) {
        (Some(timestamp), Some(amount), Some(role)) if errors.is_empty() => Ok(TransactionRecord {
            id,
            timestamp,
            amount,
            service_type,
            barber,
            customer: row.customer.trim().to_string(),
            role,
            notes: row.notes.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

/// Parse the `Date` and `Time` columns into a timestamp
///
/// Accepts `HH:MM:SS`, `HH:MM`, and `HH:MM:SS.ffffff` (fraction dropped).
pub fn parse_timestamp(date: &str, time: &str) -> Result<PrimitiveDateTime, FieldError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(FieldError::MissingTimestamp);
    }

    let malformed = || FieldError::MalformedTimestamp {
        value: format!("{} {}", date, time.trim()).trim().to_string(),
    };

    let date = Date::parse(date, DATE_FORMAT).map_err(|_| malformed())?;

    let time = time.trim();
    let time = if time.is_empty() {
        Time::MIDNIGHT
    } else {
        let whole_seconds = time.split('.').next().unwrap_or(time);
        // HH:MM carries no seconds column
        let whole_seconds = if whole_seconds.matches(':').count() == 1 {
            format!("{}:00", whole_seconds)
        } else {
            whole_seconds.to_string()
        };
        Time::parse(&whole_seconds, TIME_FORMAT).map_err(|_| malformed())?
    };

    Ok(PrimitiveDateTime::new(date, time))
}

/// Parse the `Cost` column into a normalised amount
///
/// Costs beyond [`MAX_AMOUNT`](crate::types::MAX_AMOUNT) either side of zero are rejected.
pub fn parse_amount(cost: &str) -> Result<Decimal, FieldError> {
    let cost = cost.trim();
    if cost.is_empty() {
        return Err(FieldError::MissingAmount);
    }

    let amount = Decimal::from_str(cost).map_err(|_| FieldError::MalformedAmount {
        value: cost.to_string(),
    })?;
    if !amount_in_range(amount) {
        return Err(FieldError::AmountOutOfRange {
            value: cost.to_string(),
        });
    }
    Ok(normalize_amount(amount))
}

/// `Date` column text, `YYYY-MM-DD`
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// `Time` column text, `HH:MM:SS`
pub fn format_time(time: Time) -> String {
    time.format(TIME_FORMAT).unwrap_or_default()
}

/// Render a record as the ordered fields of one CSV row
///
/// Amounts are always written with two decimal places so that reading a
/// file and writing it back reproduces the same bytes. The record must
/// already be in canonical form (see `check_structure`); nothing here rounds
/// or trims.
pub fn record_to_row(record: &TransactionRecord) -> [String; 9] {
    [
        record.id.clone(),
        format_date(record.timestamp.date()),
        format_time(record.timestamp.time()),
        record.barber.clone(),
        record.customer.clone(),
        record.service_type.clone(),
        format!("{:.2}", record.amount),
        record.role.to_string(),
        record.notes.clone(),
    ]
}

/// Write ledger records to CSV format
///
/// Writes the fixed header followed by one row per record, in the order
/// given. An empty slice produces a header-only file.
///
/// # Arguments
///
/// * `records` - Records to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(LedgerError)` if a write error occurred
pub fn write_records_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(HEADER)?;

    for record in records {
        writer.write_record(record_to_row(record))?;
    }

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;
    use rstest::rstest;
    use time::macros::datetime;

    fn row(id: &str, date: &str, time: &str, cost: &str) -> CsvRow {
        CsvRow {
            id: id.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            barber: "David".to_string(),
            customer: "John Doe".to_string(),
            service_type: "Haircut".to_string(),
            cost: cost.to_string(),
            role: "Employee".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_convert_csv_row_valid() {
        let record = convert_csv_row(row("a1", "2025-03-04", "14:30:00", "25")).unwrap();

        assert_eq!(record.id, "a1");
        assert_eq!(record.timestamp, datetime!(2025-03-04 14:30));
        assert_eq!(record.amount, Decimal::new(2500, 2));
        assert_eq!(record.barber, "David");
        assert_eq!(record.role, Role::Employee);
    }

    #[rstest]
    #[case::seconds("14:30:15", datetime!(2025-03-04 14:30:15))]
    #[case::short("14:30", datetime!(2025-03-04 14:30))]
    #[case::fractional("14:30:15.123456", datetime!(2025-03-04 14:30:15))]
    #[case::empty("", datetime!(2025-03-04 0:00))]
    fn test_parse_timestamp_time_forms(#[case] time: &str, #[case] expected: PrimitiveDateTime) {
        assert_eq!(parse_timestamp("2025-03-04", time).unwrap(), expected);
    }

    #[rstest]
    #[case::missing_id(row("", "2025-03-04", "10:00:00", "20"), FieldError::MissingId)]
    #[case::missing_date(row("a", "", "10:00:00", "20"), FieldError::MissingTimestamp)]
    #[case::bad_date(
        row("a", "04/03/2025", "10:00:00", "20"),
        FieldError::MalformedTimestamp { value: "04/03/2025 10:00:00".to_string() }
    )]
    #[case::bad_time(
        row("a", "2025-03-04", "noon", "20"),
        FieldError::MalformedTimestamp { value: "2025-03-04 noon".to_string() }
    )]
    #[case::missing_cost(row("a", "2025-03-04", "10:00:00", " "), FieldError::MissingAmount)]
    #[case::bad_cost(
        row("a", "2025-03-04", "10:00:00", "twenty"),
        FieldError::MalformedAmount { value: "twenty".to_string() }
    )]
    #[case::infinite_cost(
        row("a", "2025-03-04", "10:00:00", "inf"),
        FieldError::MalformedAmount { value: "inf".to_string() }
    )]
    #[case::decimal_max_cost(
        row("a", "2025-03-04", "10:00:00", "79228162514264337593543950335"),
        FieldError::AmountOutOfRange { value: "79228162514264337593543950335".to_string() }
    )]
    #[case::cost_above_ceiling(
        row("a", "2025-03-04", "10:00:00", "-1000000000.01"),
        FieldError::AmountOutOfRange { value: "-1000000000.01".to_string() }
    )]
    fn test_convert_csv_row_errors(#[case] input: CsvRow, #[case] expected: FieldError) {
        let errors = convert_csv_row(input).unwrap_err();
        assert_eq!(errors, vec![expected]);
    }

    #[test]
    fn test_convert_csv_row_reports_every_problem() {
        let input = CsvRow {
            role: "boss".to_string(),
            ..row("", "", "", "x")
        };

        let errors = convert_csv_row(input).unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError::MissingId,
                FieldError::MissingTimestamp,
                FieldError::MalformedAmount {
                    value: "x".to_string()
                },
                FieldError::UnknownRole {
                    value: "boss".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_check_headers_lists_missing_columns() {
        let headers = StringRecord::from(vec!["ID", "Date", "Time", "Barber_Name", "Cost"]);

        let error = check_headers(&headers, "upload.csv").unwrap_err();
        assert_eq!(
            error,
            LedgerError::MissingColumns {
                path: "upload.csv".to_string(),
                columns: vec![
                    "Customer_Name".to_string(),
                    "Service_Type".to_string(),
                    "Role".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_check_headers_accepts_any_order_without_notes() {
        let headers = StringRecord::from(vec![
            "Role",
            "Cost",
            "Service_Type",
            "Customer_Name",
            "Barber_Name",
            "Time",
            "Date",
            "ID",
        ]);

        assert!(check_headers(&headers, "old.csv").is_ok());
    }

    #[rstest]
    #[case::empty(vec![], "ID,Date,Time,Barber_Name,Customer_Name,Service_Type,Cost,Role,Notes\n")]
    #[case::single(
        vec![convert_csv_row(row("a1", "2025-03-04", "14:30:00", "25.5")).unwrap()],
        "ID,Date,Time,Barber_Name,Customer_Name,Service_Type,Cost,Role,Notes\n\
         a1,2025-03-04,14:30:00,David,John Doe,Haircut,25.50,Employee,\n"
    )]
    #[case::quoted_notes(
        vec![TransactionRecord {
            notes: "paid cash, tipped".to_string(),
            role: Role::Owner,
            ..convert_csv_row(row("a2", "2025-03-05", "09:05", "-10")).unwrap()
        }],
        "ID,Date,Time,Barber_Name,Customer_Name,Service_Type,Cost,Role,Notes\n\
         a2,2025-03-05,09:05:00,David,John Doe,Haircut,-10.00,Owner,\"paid cash, tipped\"\n"
    )]
    fn test_write_records_csv(#[case] records: Vec<TransactionRecord>, #[case] expected: &str) {
        let mut output = Vec::new();
        write_records_csv(&records, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
