pub mod app;

use app::cli::{run, Cli};
use app::error::AppError;
use app::models::CollectReport;
use uuid::Uuid;

/// Parses the command line and runs one collection.
pub fn run_cli() -> Result<(Cli, CollectReport), AppError> {
    let cli = <Cli as clap::Parser>::parse();
    let trace_id = Uuid::new_v4().to_string();
    let report = run(&cli, &trace_id)?;
    Ok((cli, report))
}
