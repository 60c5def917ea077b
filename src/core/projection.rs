//! Commission-based profit projection
//!
//! Extrapolates revenue linearly from the observed daily average and turns
//! it into owner profit under an explicit commission model.
//!
//! # Commission direction
//!
//! A [`Commission`] is always stored as the share of *employee* revenue the
//! owner keeps. Callers build one from whichever number they have:
//!
//! - [`Commission::worker_cut`] - the rate paid out to the barber; the owner
//!   keeps `1 - rate`
//! - [`Commission::owner_share`] - the rate the owner keeps
//!
//! Revenue booked under [`Role::Owner`] is never subject to commission.
//!
//! # Formulas
//!
//! ```text
//! observed_days          = last date - first date + 1
//! historical_daily_avg   = historical_total / observed_days
//! projected_revenue      = historical_daily_avg * horizon_days
//! projected_owner_profit = projected owner-role revenue
//!                        + projected employee revenue * owner share
//! projected_net_profit   = projected_owner_profit - overhead * horizon_days / 30
//! ```
//!
//! Intermediate values keep full precision; every reported figure is rounded
//! to cents.

use crate::core::traits::LedgerSnapshot;
use crate::types::{
    amount_in_range, checked_total, normalize_amount, LedgerError, Role, TransactionRecord,
};
use rust_decimal::Decimal;
use std::fmt;

/// Horizon used when the caller does not pick one
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Fewer observed days than this flags the projection as low confidence
pub const MIN_CONFIDENT_DAYS: i64 = 7;

/// Days in the month that monthly overhead is quoted for
const OVERHEAD_PERIOD_DAYS: u32 = 30;

/// How a share of employee revenue is split between owner and worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commission {
    owner_retained: Decimal,
}

impl Commission {
    /// Commission as the cut paid to the worker
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `rate` is outside `[0, 1]`.
    pub fn worker_cut(rate: Decimal) -> Result<Self, LedgerError> {
        check_rate(rate)?;
        Ok(Self {
            owner_retained: Decimal::ONE - rate,
        })
    }

    /// Commission as the share the owner keeps
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `rate` is outside `[0, 1]`.
    pub fn owner_share(rate: Decimal) -> Result<Self, LedgerError> {
        check_rate(rate)?;
        Ok(Self {
            owner_retained: rate,
        })
    }

    /// Share of employee revenue the owner keeps
    pub fn owner_rate(&self) -> Decimal {
        self.owner_retained
    }

    /// Share of employee revenue paid to the worker
    pub fn worker_rate(&self) -> Decimal {
        Decimal::ONE - self.owner_retained
    }

    /// Owner's income from a split of revenue by role
    ///
    /// # Errors
    ///
    /// `Overflow` when the income is beyond the range of `Decimal`.
    pub fn owner_income(
        &self,
        owner_revenue: Decimal,
        employee_revenue: Decimal,
    ) -> Result<Decimal, LedgerError> {
        employee_revenue
            .checked_mul(self.owner_retained)
            .and_then(|retained| owner_revenue.checked_add(retained))
            .ok_or_else(|| LedgerError::overflow("owner income"))
    }
}

fn check_rate(rate: Decimal) -> Result<(), LedgerError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(LedgerError::invalid_parameter(
            "commission rate",
            rate,
            "must be between 0 and 1",
        ));
    }
    Ok(())
}

/// Validate a monthly overhead figure
///
/// # Errors
///
/// `InvalidParameter` when the amount is negative or above [`MAX_AMOUNT`](crate::types::MAX_AMOUNT).
pub fn check_overhead(monthly_overhead: Decimal) -> Result<Decimal, LedgerError> {
    if monthly_overhead < Decimal::ZERO {
        return Err(LedgerError::invalid_parameter(
            "overhead",
            monthly_overhead,
            "must not be negative",
        ));
    }
    if !amount_in_range(monthly_overhead) {
        return Err(LedgerError::invalid_parameter(
            "overhead",
            monthly_overhead,
            "is outside the supported range",
        ));
    }
    Ok(monthly_overhead)
}

/// Inputs to a projection
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    pub commission: Commission,
    horizon_days: u32,
    monthly_overhead: Decimal,
}

impl ProjectionParams {
    /// 30-day projection with no overhead
    pub fn new(commission: Commission) -> Self {
        Self {
            commission,
            horizon_days: DEFAULT_HORIZON_DAYS,
            monthly_overhead: Decimal::ZERO,
        }
    }

    /// Set how many days ahead to project
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a zero horizon.
    pub fn with_horizon(mut self, horizon_days: u32) -> Result<Self, LedgerError> {
        if horizon_days == 0 {
            return Err(LedgerError::invalid_parameter(
                "horizon",
                horizon_days,
                "must be at least one day",
            ));
        }
        self.horizon_days = horizon_days;
        Ok(self)
    }

    /// Set monthly fixed costs (rent plus utilities)
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or out-of-range amount.
    pub fn with_overhead(mut self, monthly_overhead: Decimal) -> Result<Self, LedgerError> {
        self.monthly_overhead = check_overhead(monthly_overhead)?;
        Ok(self)
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn monthly_overhead(&self) -> Decimal {
        self.monthly_overhead
    }
}

/// How much trust to put in a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// At least [`MIN_CONFIDENT_DAYS`] of history
    Normal,
    /// Some history, but less than [`MIN_CONFIDENT_DAYS`] of it
    Low,
    /// No history at all; every figure is zero
    InsufficientData,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Normal => write!(f, "based on the full observed history"),
            Confidence::Low => write!(
                f,
                "low confidence: fewer than {} days of history",
                MIN_CONFIDENT_DAYS
            ),
            Confidence::InsufficientData => write!(f, "insufficient data: the ledger is empty"),
        }
    }
}

/// A forward-looking profit estimate
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub historical_total: Decimal,
    pub historical_daily_avg: Decimal,
    /// Calendar days from the first to the last transaction, inclusive
    pub observed_days: i64,
    pub horizon_days: u32,
    pub projected_revenue: Decimal,
    pub projected_owner_profit: Decimal,
    /// Owner profit less overhead pro-rated to the horizon
    pub projected_net_profit: Decimal,
    pub confidence: Confidence,
}

impl Projection {
    fn insufficient_data(horizon_days: u32) -> Self {
        Self {
            historical_total: Decimal::ZERO,
            historical_daily_avg: Decimal::ZERO,
            observed_days: 0,
            horizon_days,
            projected_revenue: Decimal::ZERO,
            projected_owner_profit: Decimal::ZERO,
            projected_net_profit: Decimal::ZERO,
            confidence: Confidence::InsufficientData,
        }
    }

    /// Human-readable note on how far the figures can be trusted
    pub fn confidence_note(&self) -> String {
        self.confidence.to_string()
    }
}

/// Project owner profit from a ledger snapshot
///
/// # Arguments
///
/// * `ledger` - Committed store or in-memory records; read only
/// * `params` - Commission, horizon and overhead
///
/// # Errors
///
/// Failures taking the snapshot, or `Overflow` when the figures exceed the
/// range of `Decimal`. Degenerate history is reported through
/// [`Projection::confidence`], never as an error.
pub fn project<L>(ledger: &L, params: &ProjectionParams) -> Result<Projection, LedgerError>
where
    L: LedgerSnapshot + ?Sized,
{
    let records = ledger.snapshot()?;
    project_records(&records, params)
}

/// Project owner profit from records already in memory
pub fn project_records(
    records: &[TransactionRecord],
    params: &ProjectionParams,
) -> Result<Projection, LedgerError> {
    let horizon_days = params.horizon_days;

    let (Some(first), Some(last)) = (
        records.iter().map(TransactionRecord::date).min(),
        records.iter().map(TransactionRecord::date).max(),
    ) else {
        tracing::debug!("projection requested on an empty ledger");
        return Ok(Projection::insufficient_data(horizon_days));
    };

    let observed_days = (last - first).whole_days() + 1;
    let owner_revenue = checked_total(
        records
            .iter()
            .filter(|record| record.role == Role::Owner)
            .map(|record| record.amount),
        "owner revenue",
    )?;
    let employee_revenue = checked_total(
        records
            .iter()
            .filter(|record| record.role == Role::Employee)
            .map(|record| record.amount),
        "employee revenue",
    )?;
    let historical_total = owner_revenue
        .checked_add(employee_revenue)
        .ok_or_else(|| LedgerError::overflow("historical revenue"))?;

    let days = Decimal::from(observed_days);
    let horizon = Decimal::from(horizon_days);
    let scale = |revenue: Decimal, context: &str| {
        revenue
            .checked_div(days)
            .and_then(|daily| daily.checked_mul(horizon))
            .ok_or_else(|| LedgerError::overflow(context))
    };

    let projected_revenue = scale(historical_total, "projected revenue")?;
    let projected_owner_profit = params.commission.owner_income(
        scale(owner_revenue, "projected owner revenue")?,
        scale(employee_revenue, "projected employee revenue")?,
    )?;
    let overhead = params
        .monthly_overhead
        .checked_mul(horizon)
        .map(|total| total / Decimal::from(OVERHEAD_PERIOD_DAYS))
        .ok_or_else(|| LedgerError::overflow("overhead"))?;
    let net_profit = projected_owner_profit
        .checked_sub(overhead)
        .ok_or_else(|| LedgerError::overflow("net profit"))?;

    let confidence = if observed_days < MIN_CONFIDENT_DAYS {
        Confidence::Low
    } else {
        Confidence::Normal
    };

    let projection = Projection {
        historical_total: normalize_amount(historical_total),
        historical_daily_avg: normalize_amount(historical_total / days),
        observed_days,
        horizon_days,
        projected_revenue: normalize_amount(projected_revenue),
        projected_owner_profit: normalize_amount(projected_owner_profit),
        projected_net_profit: normalize_amount(net_profit),
        confidence,
    };

    tracing::debug!(
        records = records.len(),
        observed_days,
        horizon_days,
        revenue = %projection.projected_revenue,
        owner_profit = %projection.projected_owner_profit,
        "projection computed"
    );
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger_store::LedgerStore;
    use rstest::rstest;
    use std::str::FromStr;
    use tempfile::TempDir;
    use time::macros::datetime;
    use time::PrimitiveDateTime;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn record(id: &str, timestamp: PrimitiveDateTime, amount: &str, role: Role) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            timestamp,
            amount: dec(amount),
            service_type: "Haircut".to_string(),
            barber: "David".to_string(),
            customer: String::new(),
            role,
            notes: String::new(),
        }
    }

    fn two_day_history() -> Vec<TransactionRecord> {
        vec![
            record("a", datetime!(2025-03-01 10:00), "100", Role::Employee),
            record("b", datetime!(2025-03-02 15:30), "200", Role::Employee),
        ]
    }

    #[test]
    fn test_two_day_projection_with_forty_percent_worker_cut() {
        let params = ProjectionParams::new(Commission::worker_cut(dec("0.4")).unwrap());

        let projection = project_records(&two_day_history(), &params).unwrap();

        assert_eq!(projection.historical_total, dec("300"));
        assert_eq!(projection.historical_daily_avg, dec("150"));
        assert_eq!(projection.observed_days, 2);
        assert_eq!(projection.projected_revenue, dec("4500"));
        assert_eq!(projection.projected_owner_profit, dec("2700"));
        assert_eq!(projection.projected_net_profit, dec("2700"));
        assert_eq!(projection.confidence, Confidence::Low);
    }

    #[test]
    fn test_owner_share_is_the_mirror_of_worker_cut() {
        assert_eq!(
            Commission::owner_share(dec("0.6")).unwrap(),
            Commission::worker_cut(dec("0.4")).unwrap()
        );
        let commission = Commission::owner_share(dec("0.3")).unwrap();
        assert_eq!(commission.owner_rate(), dec("0.3"));
        assert_eq!(commission.worker_rate(), dec("0.7"));
    }

    #[rstest]
    #[case::negative("-0.1")]
    #[case::above_one("1.01")]
    #[case::percentage("40")]
    fn test_commission_rate_out_of_range_is_rejected(#[case] rate: &str) {
        let expected = Err(LedgerError::invalid_parameter(
            "commission rate",
            dec(rate),
            "must be between 0 and 1",
        ));

        assert_eq!(Commission::worker_cut(dec(rate)), expected);
        assert_eq!(Commission::owner_share(dec(rate)), expected);
    }

    #[rstest]
    #[case::zero("0")]
    #[case::one("1")]
    fn test_commission_rate_bounds_are_valid(#[case] rate: &str) {
        assert!(Commission::worker_cut(dec(rate)).is_ok());
    }

    #[test]
    fn test_owner_profit_non_increasing_in_worker_cut() {
        let history = vec![
            record("a", datetime!(2025-03-01 10:00), "45.50", Role::Employee),
            record("b", datetime!(2025-03-04 11:00), "30", Role::Owner),
            record("c", datetime!(2025-03-09 12:00), "80", Role::Employee),
        ];

        let profits: Vec<Decimal> = ["0", "0.1", "0.25", "0.5", "0.75", "1"]
            .iter()
            .map(|rate| {
                let params = ProjectionParams::new(Commission::worker_cut(dec(rate)).unwrap());
                project_records(&history, &params).unwrap().projected_owner_profit
            })
            .collect();

        assert!(profits.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(profits[0] > profits[profits.len() - 1]);
    }

    #[test]
    fn test_owner_revenue_is_not_subject_to_commission() {
        let history = vec![
            record("a", datetime!(2025-03-01 10:00), "100", Role::Owner),
            record("b", datetime!(2025-03-02 10:00), "100", Role::Employee),
        ];
        let params = ProjectionParams::new(Commission::worker_cut(dec("1")).unwrap())
            .with_horizon(2)
            .unwrap();

        let projection = project_records(&history, &params).unwrap();

        assert_eq!(projection.projected_revenue, dec("200"));
        assert_eq!(projection.projected_owner_profit, dec("100"));
    }

    #[test]
    fn test_empty_ledger_flags_insufficient_data() {
        let params = ProjectionParams::new(Commission::worker_cut(dec("0.4")).unwrap())
            .with_overhead(dec("1800"))
            .unwrap();

        let projection = project_records(&[], &params).unwrap();

        assert_eq!(projection.confidence, Confidence::InsufficientData);
        assert_eq!(projection.projected_revenue, Decimal::ZERO);
        assert_eq!(projection.projected_owner_profit, Decimal::ZERO);
        assert_eq!(projection.projected_net_profit, Decimal::ZERO);
        assert!(projection.confidence_note().contains("insufficient data"));
    }

    #[test]
    fn test_single_day_history_projects_with_low_confidence() {
        let history = vec![record("a", datetime!(2025-03-01 10:00), "60", Role::Employee)];
        let params = ProjectionParams::new(Commission::worker_cut(Decimal::ZERO).unwrap());

        let projection = project_records(&history, &params).unwrap();

        assert_eq!(projection.observed_days, 1);
        assert_eq!(projection.projected_revenue, dec("1800"));
        assert_eq!(projection.confidence, Confidence::Low);
    }

    #[test]
    fn test_week_of_history_is_normal_confidence() {
        let history = vec![
            record("a", datetime!(2025-03-01 10:00), "70", Role::Employee),
            record("b", datetime!(2025-03-07 10:00), "70", Role::Employee),
        ];
        let params = ProjectionParams::new(Commission::worker_cut(Decimal::ZERO).unwrap());

        let projection = project_records(&history, &params).unwrap();

        // Quiet days inside the range count towards the average
        assert_eq!(projection.observed_days, 7);
        assert_eq!(projection.historical_daily_avg, dec("20"));
        assert_eq!(projection.confidence, Confidence::Normal);
    }

    #[test]
    fn test_overhead_is_prorated_to_horizon() {
        let params = ProjectionParams::new(Commission::worker_cut(dec("0.4")).unwrap())
            .with_horizon(15)
            .unwrap()
            .with_overhead(dec("1800"))
            .unwrap();

        let projection = project_records(&two_day_history(), &params).unwrap();

        assert_eq!(projection.projected_revenue, dec("2250"));
        assert_eq!(projection.projected_owner_profit, dec("1350"));
        assert_eq!(projection.projected_net_profit, dec("450"));
    }

    #[test]
    fn test_figures_keep_precision_until_rounded() {
        let history = vec![
            record("a", datetime!(2025-03-01 10:00), "50", Role::Employee),
            record("b", datetime!(2025-03-03 10:00), "50", Role::Employee),
        ];
        let params = ProjectionParams::new(Commission::worker_cut(Decimal::ZERO).unwrap());

        let projection = project_records(&history, &params).unwrap();

        assert_eq!(projection.historical_daily_avg, dec("33.33"));
        assert_eq!(projection.projected_revenue, dec("1000"));
    }

    #[test]
    fn test_invalid_horizon_and_overhead_are_rejected() {
        let params = ProjectionParams::new(Commission::worker_cut(dec("0.4")).unwrap());

        assert!(matches!(
            params.clone().with_horizon(0),
            Err(LedgerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            params.with_overhead(dec("-1")),
            Err(LedgerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_project_reads_committed_store() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::new(dir.path().join("shop_data.csv"));
        store.replace(&two_day_history()).unwrap();
        let params = ProjectionParams::new(Commission::worker_cut(dec("0.4")).unwrap());

        let projection = project(&store, &params).unwrap();

        assert_eq!(projection.projected_owner_profit, dec("2700"));
        assert_eq!(store.read_backup().unwrap(), vec![]);
    }

    #[test]
    fn test_amounts_beyond_decimal_range_report_overflow() {
        let history = vec![
            TransactionRecord {
                amount: Decimal::MAX,
                ..record("a", datetime!(2025-03-01 10:00), "0", Role::Employee)
            },
            TransactionRecord {
                amount: Decimal::MAX,
                ..record("b", datetime!(2025-03-02 10:00), "0", Role::Employee)
            },
        ];
        let params = ProjectionParams::new(Commission::worker_cut(dec("0.4")).unwrap());

        assert_eq!(
            project_records(&history, &params),
            Err(LedgerError::overflow("employee revenue"))
        );
    }

    #[rstest]
    #[case::zero("0", true)]
    #[case::rent("1800", true)]
    #[case::negative("-0.01", false)]
    #[case::beyond_ceiling("1000000000.01", false)]
    fn test_check_overhead(#[case] overhead: &str, #[case] valid: bool) {
        assert_eq!(check_overhead(dec(overhead)).is_ok(), valid);
    }
}
