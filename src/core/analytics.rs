//! Read-only aggregates over a ledger snapshot
//!
//! These are the views the dashboard collaborators chart: revenue per
//! service type and per barber, transaction counts per hour of day, revenue
//! per day, and the owner's monthly financials. Nothing here writes.
//!
//! Totals use checked arithmetic; a ledger whose sums leave the range of
//! `Decimal` yields [`LedgerError::Overflow`] instead of a panic.

use crate::core::projection::Commission;
use crate::core::traits::LedgerSnapshot;
use crate::types::{checked_total, normalize_amount, LedgerError, Role, TransactionRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use time::{Date, Month};

/// Total revenue per label, largest first, ties in label order
fn ranked_totals<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    label: impl Fn(&'a TransactionRecord) -> &'a str,
    context: &str,
) -> Result<Vec<(String, Decimal)>, LedgerError> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for record in records {
        let total = totals.entry(label(record)).or_default();
        *total = add(*total, record.amount, context)?;
    }

    let mut ranked: Vec<(String, Decimal)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_string(), total))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(ranked)
}

fn add(total: Decimal, amount: Decimal, context: &str) -> Result<Decimal, LedgerError> {
    total
        .checked_add(amount)
        .ok_or_else(|| LedgerError::overflow(context))
}

/// Revenue per service type
pub fn revenue_by_service<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Result<Vec<(String, Decimal)>, LedgerError> {
    ranked_totals(records, |record| record.service_type.as_str(), "revenue by service")
}

/// Revenue per barber
pub fn revenue_by_barber<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Result<Vec<(String, Decimal)>, LedgerError> {
    ranked_totals(records, |record| record.barber.as_str(), "revenue by barber")
}

/// Number of transactions in each hour of the day, index 0 is midnight
pub fn transactions_by_hour<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> [usize; 24] {
    let mut counts = [0usize; 24];
    for record in records {
        counts[usize::from(record.hour())] += 1;
    }
    counts
}

/// Revenue per calendar day, in date order
pub fn daily_revenue<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Result<BTreeMap<Date, Decimal>, LedgerError> {
    let mut days = BTreeMap::new();
    for record in records {
        let total = days.entry(record.date()).or_insert(Decimal::ZERO);
        *total = add(*total, record.amount, "daily revenue")?;
    }
    Ok(days)
}

/// Records dated within the given calendar month
pub fn records_in_month(records: &[TransactionRecord], year: i32, month: Month) -> Vec<&TransactionRecord> {
    records
        .iter()
        .filter(|record| {
            let date = record.date();
            date.year() == year && date.month() == month
        })
        .collect()
}

/// The owner's figures for one month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: Month,
    pub total_revenue: Decimal,
    pub transactions: usize,
    /// Mean amount per transaction, zero for an empty month
    pub average_price: Decimal,
    /// Transactions that were not product sales
    pub service_count: usize,
    pub owner_revenue: Decimal,
    pub employee_revenue: Decimal,
    /// Owner's retained share of employee revenue
    pub commission_income: Decimal,
    /// Owner revenue plus commission income
    pub gross: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

impl MonthlySummary {
    pub fn is_empty(&self) -> bool {
        self.transactions == 0
    }
}

/// Summarise one month of the ledger for the owner
///
/// # Arguments
///
/// * `records` - Whole ledger; only the month's records are counted
/// * `commission` - How employee revenue is split with the owner
/// * `monthly_overhead` - Rent plus utilities for the month
pub fn monthly_summary(
    records: &[TransactionRecord],
    year: i32,
    month: Month,
    commission: &Commission,
    monthly_overhead: Decimal,
) -> Result<MonthlySummary, LedgerError> {
    let in_month = records_in_month(records, year, month);

    let mut owner_revenue = Decimal::ZERO;
    let mut employee_revenue = Decimal::ZERO;
    let mut service_count = 0;
    for record in &in_month {
        match record.role {
            Role::Owner => owner_revenue = add(owner_revenue, record.amount, "owner revenue")?,
            Role::Employee => {
                employee_revenue = add(employee_revenue, record.amount, "employee revenue")?
            }
        }
        if !record.is_product_sale() {
            service_count += 1;
        }
    }
    let total_revenue = add(owner_revenue, employee_revenue, "monthly revenue")?;

    let transactions = in_month.len();
    let average_price = if transactions == 0 {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(transactions)
    };
    let gross = commission.owner_income(owner_revenue, employee_revenue)?;
    let net = gross
        .checked_sub(monthly_overhead)
        .ok_or_else(|| LedgerError::overflow("monthly net"))?;

    Ok(MonthlySummary {
        year,
        month,
        total_revenue,
        transactions,
        average_price: normalize_amount(average_price),
        service_count,
        owner_revenue,
        employee_revenue,
        commission_income: normalize_amount(gross - owner_revenue),
        gross: normalize_amount(gross),
        expenses: monthly_overhead,
        net: normalize_amount(net),
    })
}

/// Every aggregate the analytics views need, computed from one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerAnalytics {
    pub transactions: usize,
    pub total_revenue: Decimal,
    pub revenue_by_service: Vec<(String, Decimal)>,
    pub revenue_by_barber: Vec<(String, Decimal)>,
    pub transactions_by_hour: [usize; 24],
    pub daily_revenue: BTreeMap<Date, Decimal>,
}

impl LedgerAnalytics {
    /// Aggregate the given records, e.g. a whole ledger or one month of it
    pub fn from_records<'a, I>(records: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        Ok(Self {
            transactions: records.clone().count(),
            total_revenue: checked_total(records.clone().map(|record| record.amount), "total revenue")?,
            revenue_by_service: revenue_by_service(records.clone())?,
            revenue_by_barber: revenue_by_barber(records.clone())?,
            transactions_by_hour: transactions_by_hour(records.clone()),
            daily_revenue: daily_revenue(records)?,
        })
    }

    /// Take a snapshot and aggregate it
    pub fn from_snapshot<L>(ledger: &L) -> Result<Self, LedgerError>
    where
        L: LedgerSnapshot + ?Sized,
    {
        Self::from_records(&ledger.snapshot()?)
    }

    /// The hour with the most transactions, earliest on a tie
    pub fn busiest_hour(&self) -> Option<u8> {
        let (hour, count) = self
            .transactions_by_hour
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))?;
        (*count > 0).then_some(hour as u8)
    }
}
