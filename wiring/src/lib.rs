//! Driver wiring a container from a TOML description.
//!
//! # Flow
//! ```text
//! load description -> catalog builds entries -> controller wires registry
//!     -> resolve + print requested names
//!     -> close (explicitly, or by Ctrl+C/SIGTERM when waiting) -> report
//! ```

pub mod cli;
pub mod demo;
pub mod driver;
pub mod logging;

/// Exit status when at least one requested name could not be resolved
pub const EXIT_RESOLVE_FAILED: u8 = 1;
/// Exit status when the description could not be loaded or wired
pub const EXIT_STARTUP_FAILED: u8 = 2;
/// Exit status when the resolved entries could not be written out
pub const EXIT_OUTPUT_FAILED: u8 = 3;
