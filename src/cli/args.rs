use crate::core::ledger_store::DEFAULT_LEDGER_FILE;
use crate::core::projection::{Commission, ProjectionParams, DEFAULT_HORIZON_DAYS};
use crate::strategy::BatchConfig;
use crate::types::{LedgerError, Role};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use time::Month;

/// Record, consolidate and project a barber shop's transactions
#[derive(Parser, Debug)]
#[command(name = "shop-ledger")]
#[command(about = "Record, consolidate and project a barber shop's transactions", long_about = None)]
pub struct CliArgs {
    /// Canonical ledger file
    #[arg(
        long = "ledger",
        value_name = "PATH",
        global = true,
        default_value = DEFAULT_LEDGER_FILE,
        help = "Path to the canonical ledger CSV"
    )]
    pub ledger: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate and record a new transaction
    Add(AddArgs),

    /// Print the ledger as CSV
    List,

    /// Remove a transaction by id
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Merge uploaded ledger files into the canonical ledger
    Merge(MergeArgs),

    /// Project owner profit from the ledger's history
    Project(ProjectArgs),

    /// Show the owner's financials for one month
    Summary(SummaryArgs),

    /// Show revenue and traffic aggregates
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long, value_name = "NAME")]
    pub barber: String,

    #[arg(long, value_name = "NAME", default_value = "")]
    pub customer: String,

    #[arg(long = "service", value_name = "SERVICE")]
    pub service_type: String,

    /// Amount charged; negative for a refund
    #[arg(long, value_name = "AMOUNT", allow_hyphen_values = true)]
    pub cost: Decimal,

    #[arg(long, value_name = "ROLE", default_value = "employee", value_parser = parse_role)]
    pub role: Role,

    /// Service date, YYYY-MM-DD (default: today)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Service time, HH:MM or HH:MM:SS (default: now)
    #[arg(long, value_name = "TIME")]
    pub time: Option<String>,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub notes: String,

    /// Save even when the entry raises warnings
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Ledger files to merge, highest priority first
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Loading strategy for the merge inputs
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Loading strategy: 'sync' reads files one by one, 'async' reads them concurrently"
    )]
    pub strategy: StrategyType,

    /// Number of rows per batch (async mode only)
    #[arg(long = "batch-size", value_name = "SIZE")]
    pub batch_size: Option<usize>,

    /// Maximum number of files read at once (async mode only)
    #[arg(long = "max-concurrent", value_name = "COUNT")]
    pub max_concurrent: Option<usize>,
}

/// Available loading strategies for merge inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// What the commission rate on the command line means
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CommissionBasis {
    /// Share of employee revenue paid to the barber
    WorkerCut,
    /// Share of employee revenue the owner keeps
    OwnerShare,
}

#[derive(Args, Debug)]
pub struct CommissionArgs {
    /// Commission rate between 0 and 1
    #[arg(long = "commission", value_name = "RATE")]
    pub rate: Decimal,

    #[arg(long = "commission-basis", value_name = "BASIS", default_value = "worker-cut")]
    pub basis: CommissionBasis,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub commission: CommissionArgs,

    #[arg(long = "horizon-days", value_name = "DAYS", default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon_days: u32,

    /// Monthly rent plus utilities
    #[arg(long, value_name = "AMOUNT", default_value = "0", allow_hyphen_values = true)]
    pub overhead: Decimal,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Month to summarise, YYYY-MM
    #[arg(long, value_name = "MONTH", value_parser = parse_month)]
    pub month: (i32, Month),

    #[command(flatten)]
    pub commission: CommissionArgs,

    /// Monthly rent plus utilities
    #[arg(long, value_name = "AMOUNT", default_value = "0", allow_hyphen_values = true)]
    pub overhead: Decimal,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Only count transactions in this month, YYYY-MM
    #[arg(long, value_name = "MONTH", value_parser = parse_month)]
    pub month: Option<(i32, Month)>,
}

impl CommissionArgs {
    /// Resolve the rate and its basis into a commission model
    pub fn to_commission(&self) -> Result<Commission, LedgerError> {
        match self.basis {
            CommissionBasis::WorkerCut => Commission::worker_cut(self.rate),
            CommissionBasis::OwnerShare => Commission::owner_share(self.rate),
        }
    }
}

impl ProjectArgs {
    pub fn to_params(&self) -> Result<ProjectionParams, LedgerError> {
        ProjectionParams::new(self.commission.to_commission()?)
            .with_horizon(self.horizon_days)?
            .with_overhead(self.overhead)
    }
}

impl MergeArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// the defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value).ok_or_else(|| format!("expected 'owner' or 'employee', got '{}'", value))
}

fn parse_month(value: &str) -> Result<(i32, Month), String> {
    let invalid = || format!("expected YYYY-MM, got '{}'", value);

    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Ok((year, month))
}
