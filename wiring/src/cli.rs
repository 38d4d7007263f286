use std::path::PathBuf;

use clap::Parser;

/// Presence of this variable has the same effect as `--wait-for-close`
pub const WAIT_FOR_CLOSE_ENV: &str = "WIRING_WAIT_FOR_CLOSE";
/// Presence of this variable has the same effect as `--exit-zero`
pub const EXIT_ZERO_ENV: &str = "WIRING_EXIT_ZERO";

#[derive(Parser, Debug)]
#[command(name = "wiring")]
#[command(about = "Wires a container from a description and prints the requested entries", long_about = None)]
pub struct Cli {
    /// Container description (TOML)
    pub config: PathBuf,

    /// Entries to resolve and print
    pub names: Vec<String>,

    /// Block until the registry has been shut down by a signal
    #[arg(long)]
    pub wait_for_close: bool,

    /// Exit explicitly with status 0 after normal completion
    #[arg(long)]
    pub exit_zero: bool,

    /// Override the log filter, e.g. `debug` or `wiring_di=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Upper bound for wiring, overrides the description's `wire_timeout_ms`
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Behaviour switches taken from flags or the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub wait_for_close: bool,
    pub exit_zero: bool,
}

impl Toggles {
    /// A toggle is on if its flag is given or its variable is present
    pub fn resolve(cli: &Cli, is_set: impl Fn(&str) -> bool) -> Self {
        Toggles {
            wait_for_close: cli.wait_for_close || is_set(WAIT_FOR_CLOSE_ENV),
            exit_zero: cli.exit_zero || is_set(EXIT_ZERO_ENV),
        }
    }

    pub fn from_env(cli: &Cli) -> Self {
        Self::resolve(cli, |name| std::env::var_os(name).is_some())
    }
}
