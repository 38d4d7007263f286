use std::{
    future::Future,
    io::{self, Write},
    time::Duration,
};

use anyhow::Context;
use wiring_config::load_config;
use wiring_di::DiContainer;
use wiring_lifecycle::{
    signals::{shutdown_signal, spawn_shutdown_listener},
    LifecycleController,
};

use crate::{
    cli::{Cli, Toggles},
    demo,
};

/// Prints a status line to stdout
///
/// A closed stdout must not keep the registry from shutting down, so write errors are dropped.
macro_rules! status {
    ($($arg:tt)*) => {{
        let _ = writeln!(io::stdout(), $($arg)*);
    }};
}

/// How a completed run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The listed names could not be resolved
    ResolveFailed(Vec<String>),
    /// Printing the resolved entries failed, the registry was still shut down
    OutputFailed(String),
}

/// Resolves and prints every requested name
///
/// A failing name is reported and does not stop the remaining ones.
/// Returns the names which failed.
pub fn print_entries(
    container: &DiContainer,
    names: &[String],
    out: &mut impl Write,
) -> io::Result<Vec<String>> {
    let mut failed = Vec::new();

    for name in names {
        match container.resolve(name) {
            Ok(instance) => writeln!(
                out,
                "bean '{name}' = '{}'  ({})",
                instance.describe(),
                instance.info
            )?,
            Err(e) => {
                tracing::error!("Failed to resolve '{name}': {e}");
                writeln!(out, "*** Failed to resolve '{name}': {e}")?;
                failed.push(name.clone());
            }
        }
    }

    out.flush()?;
    Ok(failed)
}

/// Loads the description, wires it, prints the requested entries and shuts down
///
/// Errors are startup failures: unreadable description, unknown kinds or broken wiring.
pub async fn run(cli: Cli, toggles: Toggles) -> anyhow::Result<Outcome> {
    run_with(
        cli,
        toggles,
        &LifecycleController::new(),
        shutdown_signal(),
        io::stdout(),
    )
    .await
}

/// [run] with the controller, the external shutdown trigger and the entry output supplied
///
/// `trigger` replaces Ctrl+C/SIGTERM. When waiting for close, this returns only after it fired.
pub async fn run_with(
    cli: Cli,
    toggles: Toggles,
    controller: &LifecycleController,
    trigger: impl Future<Output = io::Result<()>> + Send + 'static,
    mut out: impl Write,
) -> anyhow::Result<Outcome> {
    status!(
        "*** Loading container description from '{}'",
        cli.config.display()
    );
    let config = load_config(&cli.config)
        .with_context(|| format!("could not load '{}'", cli.config.display()))?;

    let builder = demo::catalog()?.builder_for(&config)?;

    controller.on_closing(|| status!("*** Shutting down registry ..."));
    controller.on_close(|report| {
        let outcome = if report.inactive {
            "OK/inactive"
        } else {
            "FAIL/still active"
        };
        status!("*** Shutdown completed with {outcome}.");
    });

    let timeout = cli
        .timeout_ms
        .map(Duration::from_millis)
        .or(config.wire_timeout());
    let container = match timeout {
        Some(timeout) => controller.start_timeout(builder, timeout).await,
        None => controller.start(builder).await,
    }
    .context("wiring failed")?;

    // External trigger, racing with the explicit close below
    let _listener = spawn_shutdown_listener(controller.clone(), trigger);

    status!("*** Getting beans: [{}]", cli.names.join(", "));
    // Shutdown happens even if the output is gone
    let printed = print_entries(&container, &cli.names, &mut out);

    if toggles.wait_for_close {
        status!("*** Waiting for registry shutdown ...");
        controller.closed().await?;
    } else {
        let closer = controller.clone();
        tokio::task::spawn_blocking(move || closer.close_and_report()).await??;
    }

    status!("done");

    Ok(match printed {
        Err(e) => {
            tracing::error!("Writing the resolved entries failed: {e}");
            Outcome::OutputFailed(e.to_string())
        }
        Ok(failed) if failed.is_empty() => Outcome::Completed,
        Ok(failed) => Outcome::ResolveFailed(failed),
    })
}
