// CLI module
// Command-line parsing and command execution

mod args;
mod commands;

pub use args::{
    AddArgs, CliArgs, Command, CommissionArgs, CommissionBasis, MergeArgs, ProjectArgs,
    StatsArgs, StrategyType, SummaryArgs,
};
pub use commands::{local_now, run, Outcome};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments, missing required arguments, or
/// `--help`), clap displays an error message or help text and exits the
/// process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
