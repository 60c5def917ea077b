//! Shop Ledger CLI
//!
//! Command-line interface for recording, consolidating and projecting a
//! barber shop's transactions.
//!
//! # Usage
//!
//! ```bash
//! shop-ledger add --barber David --customer "John Doe" --service Haircut --cost 25
//! shop-ledger add --barber David --service "Full Service" --cost 650 --confirm
//! shop-ledger list > ledger_export.csv
//! shop-ledger delete 20250304163000123456-8k2p
//! shop-ledger merge --strategy async chair_one.csv chair_two.csv
//! shop-ledger project --commission 0.4 --horizon-days 30 --overhead 1800
//! shop-ledger summary --month 2025-03 --commission 0.3 --commission-basis owner-share
//! shop-ledger stats
//! shop-ledger --ledger /srv/shop/shop_data.csv list
//! ```
//!
//! Command output goes to stdout. Logs go to stderr, filtered by `RUST_LOG`
//! (default `info`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid input, unknown id, backup failure, unreadable file, etc.)
//! - 2: An entry raised warnings and was not saved (re-run with `--confirm`)

use shop_ledger::cli::{self, Outcome};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Read the local offset before any other thread exists
    let now = cli::local_now();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let mut output = std::io::stdout().lock();
    match cli::run(args, now, &mut output) {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Blocked) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
