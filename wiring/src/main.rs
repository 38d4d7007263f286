use std::process::ExitCode;

use clap::Parser;
use wiring::{
    cli::{Cli, Toggles},
    driver::{self, Outcome},
    logging, EXIT_OUTPUT_FAILED, EXIT_RESOLVE_FAILED, EXIT_STARTUP_FAILED,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_level.as_deref());
    let toggles = Toggles::from_env(&cli);

    match driver::run(cli, toggles).await {
        Ok(Outcome::Completed) => {
            if toggles.exit_zero {
                println!("*** Explicit exit(0).");
                std::process::exit(0);
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::ResolveFailed(names)) => {
            eprintln!("*** Could not resolve: [{}]", names.join(", "));
            ExitCode::from(EXIT_RESOLVE_FAILED)
        }
        Ok(Outcome::OutputFailed(e)) => {
            eprintln!("*** Could not write the resolved entries: {e}");
            ExitCode::from(EXIT_OUTPUT_FAILED)
        }
        Err(e) => {
            eprintln!("*** Startup failed: {e:#}");
            ExitCode::from(EXIT_STARTUP_FAILED)
        }
    }
}
