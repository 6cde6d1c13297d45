//! sw - Shelfwork command-line entry point

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use shelfwork::cli::{self, Cli};
use shelfwork::ui::output;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "SHELFWORK_LOG";

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if debug { "shelfwork=debug" } else { "shelfwork=warn" })
    });
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
