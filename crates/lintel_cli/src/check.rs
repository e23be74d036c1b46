//! Check command implementation

use std::io;
use std::sync::Arc;
use std::time::Instant;

use lintel_core::{Interrupt, LintelError, Manager, StyleGuideManager};
use lintel_tokens::BasicFrontEnd;
use miette::{IntoDiagnostic, Result};
use signal_hook::consts::SIGINT;
use tracing::{debug, error};

use crate::cli::Cli;
use crate::output::{Formatter, benchmark_lines, statistics_lines};

/// Exit status used when a second interrupt kills the process outright.
const INTERRUPTED_STATUS: i32 = 130;

/// Sets `interrupt` on the first SIGINT and exits on the second.
fn watch_interrupts(interrupt: &Interrupt) -> Result<()> {
    signal_hook::flag::register_conditional_shutdown(SIGINT, INTERRUPTED_STATUS, interrupt.flag())
        .into_diagnostic()?;
    signal_hook::flag::register(SIGINT, interrupt.flag()).into_diagnostic()?;
    Ok(())
}

/// Runs every check and prints the findings.
///
/// Returns true when the process should exit with a failure status.
pub fn run_check(cli: &Cli) -> Result<bool> {
    let started = Instant::now();
    let options = Arc::new(cli.run_options()?);
    let plugins = lintel_rules::plugins()
        .map_err(|source| LintelError::PluginLoad {
            plugin: "lintel-rules".to_string(),
            source,
        })
        .into_diagnostic()?;

    let interrupt = Interrupt::new();
    watch_interrupts(&interrupt)?;

    let formatter = Formatter::new(cli.format, cli.show_source, io::stdout().lock());
    let mut guides = StyleGuideManager::new(&options, &plugins, formatter).into_diagnostic()?;
    let mut manager = Manager::new(Arc::clone(&options), &plugins, Arc::new(BasicFrontEnd::new()))
        .with_interrupt(interrupt);

    manager.start().into_diagnostic()?;
    match manager.run() {
        Ok(()) => {}
        Err(LintelError::EarlyQuit) => {
            eprintln!("... stopped");
            return Ok(true);
        }
        Err(e) => return Err(e).into_diagnostic(),
    }

    let (found, reported) = manager.report(&mut guides);
    debug!("Found {} results, reported {}", found, reported);
    guides.sink_mut().finish().into_diagnostic()?;

    let mut failed = false;
    for failure in manager.failures() {
        error!("{}", failure);
        failed = true;
    }

    if cli.statistics {
        for line in statistics_lines(guides.statistics()) {
            println!("{}", line);
        }
    }
    if cli.count {
        println!("{}", reported);
    }
    if cli.benchmark {
        let elapsed = started.elapsed().as_secs_f64();
        for line in benchmark_lines(&manager.statistics(), elapsed) {
            println!("{}", line);
        }
    }

    Ok(failed || (reported > 0 && !cli.exit_zero))
}
