use std::process::ExitCode;

use collect_bugreport_lib::run_cli;
use tracing::error;

fn main() -> ExitCode {
    match run_cli() {
        Ok((cli, report)) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(err) => eprintln!("Failed to serialize summary: {err}"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(trace_id = %err.trace_id, code = %err.code, "{}", err.error);
            eprintln!("Error: {}", err.error);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
