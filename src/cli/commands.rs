//! Command execution for the binary
//!
//! Each subcommand is a thin wrapper over the library: it builds the inputs,
//! calls the validator, store, merge or projection, and prints the result.
//! Data goes to the supplied writer; diagnostics go through `tracing`.

use crate::cli::args::{
    AddArgs, CliArgs, Command, MergeArgs, ProjectArgs, StatsArgs, StrategyType, SummaryArgs,
};
use crate::core::analytics::{monthly_summary, records_in_month, LedgerAnalytics};
use crate::core::ledger_store::LedgerStore;
use crate::core::merge::consolidate;
use crate::core::projection::{check_overhead, project};
use crate::core::validator::Validator;
use crate::io::csv_format::{format_date, format_time, parse_timestamp, write_records_csv};
use crate::strategy::create_loader;
use crate::types::{generate_record_id, LedgerError, NewTransaction, Validation};
use rust_decimal::Decimal;
use std::io::Write;
use time::{OffsetDateTime, PrimitiveDateTime};

/// How a command finished when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// An entry raised warnings and was not saved because `--confirm` was absent
    Blocked,
}

/// Run a parsed command line against its ledger
///
/// # Arguments
///
/// * `args` - Parsed command line
/// * `now` - Wall-clock time used for new ids and date checks
/// * `out` - Where command output is written
pub fn run(args: CliArgs, now: OffsetDateTime, out: &mut dyn Write) -> Result<Outcome, LedgerError> {
    let store = LedgerStore::new(args.ledger);

    match args.command {
        Command::Add(add) => add_transaction(&store, add, now, out),
        Command::List => {
            write_records_csv(&store.read_all()?, out)?;
            Ok(Outcome::Completed)
        }
        Command::Delete { id } => {
            let removed = store.delete(&id)?;
            writeln!(
                out,
                "Deleted {}: {} {} by {} (${:.2})",
                removed.id,
                format_date(removed.date()),
                removed.service_type,
                removed.barber,
                removed.amount
            )?;
            Ok(Outcome::Completed)
        }
        Command::Merge(merge) => merge_files(&store, merge, out),
        Command::Project(project) => project_profit(&store, project, out),
        Command::Summary(summary) => summarize_month(&store, summary, out),
        Command::Stats(stats) => print_stats(&store, stats, out),
    }
}

/// Naive local wall-clock time
///
/// Falls back to UTC when the local offset cannot be determined.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn naive(now: OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(now.date(), now.time())
}

fn add_transaction(
    store: &LedgerStore,
    add: AddArgs,
    now: OffsetDateTime,
    out: &mut dyn Write,
) -> Result<Outcome, LedgerError> {
    let wall_clock = naive(now);
    let date = add.date.unwrap_or_else(|| format_date(wall_clock.date()));
    let time = add.time.unwrap_or_else(|| format_time(wall_clock.time()));
    let timestamp =
        parse_timestamp(&date, &time).map_err(|e| LedgerError::validation(None, vec![e]))?;

    let draft = NewTransaction {
        timestamp,
        barber: add.barber,
        customer: add.customer,
        service_type: add.service_type,
        amount: add.cost,
        role: add.role,
        notes: add.notes,
    };
    let record = draft.into_record(generate_record_id(now));

    let existing = store.read_all()?;
    let record = match Validator::default().validate_record(record, &existing, wall_clock) {
        Validation::Accept(record) => record,
        Validation::AcceptWithWarning(record, warnings) => {
            for warning in &warnings {
                writeln!(out, "Warning: {}", warning)?;
            }
            if !add.confirm {
                writeln!(out, "Not saved. Re-run with --confirm to save anyway.")?;
                return Ok(Outcome::Blocked);
            }
            record
        }
        Validation::Reject(errors) => return Err(LedgerError::validation(None, errors)),
    };

    let id = record.id.clone();
    store.append(record)?;
    writeln!(out, "Saved {}", id)?;
    Ok(Outcome::Completed)
}

fn merge_files(store: &LedgerStore, merge: MergeArgs, out: &mut dyn Write) -> Result<Outcome, LedgerError> {
    let config = match merge.strategy {
        StrategyType::Async => Some(merge.to_batch_config()),
        StrategyType::Sync => None,
    };
    let loader = create_loader(merge.strategy, config);

    // Every file is loaded before anything is merged or written
    let sources = loader.load(&merge.files)?;
    let outcome = consolidate(store, sources)?;

    for rejected in &outcome.rejected {
        writeln!(out, "Skipped row in {}: {}", rejected.source, rejected.error)?;
    }
    if outcome.duplicates_removed > 0 {
        writeln!(
            out,
            "Removed {} duplicate entries ({} ids)",
            outcome.duplicates_removed,
            outcome.dropped_duplicate_ids.len()
        )?;
    }
    writeln!(out, "Merged {} records and saved", outcome.records.len())?;
    Ok(Outcome::Completed)
}

fn project_profit(store: &LedgerStore, args: ProjectArgs, out: &mut dyn Write) -> Result<Outcome, LedgerError> {
    let params = args.to_params()?;
    let projection = project(store, &params)?;

    writeln!(out, "Historical revenue:   ${:.2}", projection.historical_total)?;
    writeln!(out, "Observed days:        {}", projection.observed_days)?;
    writeln!(out, "Avg daily revenue:    ${:.2}", projection.historical_daily_avg)?;
    writeln!(
        out,
        "Projected {}-day revenue:      ${:.2}",
        projection.horizon_days, projection.projected_revenue
    )?;
    writeln!(
        out,
        "Projected {}-day owner profit: ${:.2}",
        projection.horizon_days, projection.projected_owner_profit
    )?;
    writeln!(
        out,
        "Projected {}-day net profit:   ${:.2}",
        projection.horizon_days, projection.projected_net_profit
    )?;
    writeln!(out, "Note: {}", projection.confidence_note())?;
    Ok(Outcome::Completed)
}

fn summarize_month(store: &LedgerStore, args: SummaryArgs, out: &mut dyn Write) -> Result<Outcome, LedgerError> {
    let commission = args.commission.to_commission()?;
    let overhead = check_overhead(args.overhead)?;

    let (year, month) = args.month;
    let records = store.read_all()?;
    let summary = monthly_summary(&records, year, month, &commission, overhead)?;

    if summary.is_empty() {
        writeln!(out, "No transactions in {} {}.", month, year)?;
        return Ok(Outcome::Completed);
    }

    writeln!(out, "{} {} financials", month, year)?;
    writeln!(out, "Total revenue:     ${:.2}", summary.total_revenue)?;
    writeln!(out, "Transactions:      {}", summary.transactions)?;
    writeln!(out, "Avg price:         ${:.2}", summary.average_price)?;
    writeln!(out, "Services:          {}", summary.service_count)?;
    writeln!(out, "Owner revenue:     ${:.2}", summary.owner_revenue)?;
    writeln!(out, "Employee revenue:  ${:.2}", summary.employee_revenue)?;
    writeln!(out, "Commission income: ${:.2}", summary.commission_income)?;
    writeln!(out, "Gross:             ${:.2}", summary.gross)?;
    writeln!(out, "Expenses:          ${:.2}", summary.expenses)?;
    if summary.net < Decimal::ZERO {
        writeln!(out, "Net loss:          ${:.2}", summary.net.abs())?;
    } else {
        writeln!(out, "Net profit:        ${:.2}", summary.net)?;
    }
    Ok(Outcome::Completed)
}

fn print_stats(store: &LedgerStore, args: StatsArgs, out: &mut dyn Write) -> Result<Outcome, LedgerError> {
    let analytics = match args.month {
        Some((year, month)) => {
            let records = store.read_all()?;
            writeln!(out, "{} {}", month, year)?;
            LedgerAnalytics::from_records(records_in_month(&records, year, month))?
        }
        None => LedgerAnalytics::from_snapshot(store)?,
    };

    writeln!(out, "Transactions:  {}", analytics.transactions)?;
    writeln!(out, "Total revenue: ${:.2}", analytics.total_revenue)?;

    writeln!(out, "\nRevenue by service")?;
    for (service, total) in &analytics.revenue_by_service {
        writeln!(out, "  {:<14} ${:.2}", service, total)?;
    }

    writeln!(out, "\nRevenue by barber")?;
    for (barber, total) in &analytics.revenue_by_barber {
        writeln!(out, "  {:<14} ${:.2}", barber, total)?;
    }

    writeln!(out, "\nTransactions by hour")?;
    for (hour, count) in analytics.transactions_by_hour.iter().enumerate() {
        if *count > 0 {
            writeln!(out, "  {:02}:00  {}", hour, count)?;
        }
    }
    if let Some(hour) = analytics.busiest_hour() {
        writeln!(out, "Busiest hour: {:02}:00", hour)?;
    }

    writeln!(out, "\nDaily revenue")?;
    for (date, total) in &analytics.daily_revenue {
        writeln!(out, "  {}  ${:.2}", format_date(*date), total)?;
    }
    Ok(Outcome::Completed)
}
