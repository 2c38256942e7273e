/*!
 * Dispatcher - Main Entry Point
 *
 * Usage: `dispatcher [INPUT]`
 *
 * Reads events from INPUT (or stdin when absent or `-`), prints the accounting
 * report on stdout and diagnostics on stderr.
 */

use std::fs::File;
use std::io::{self, BufReader, Write};

use dispatch_sim::{init_tracing, monitoring::span_simulation, DispatcherConfig, DispatcherError, Simulation};
use miette::{IntoDiagnostic, Result};
use tracing::info;

fn main() -> Result<()> {
    let config = DispatcherConfig::from_env()?;
    init_tracing(&config);

    let input = std::env::args().nth(1).filter(|arg| arg != "-");
    let label = input.as_deref().unwrap_or("stdin");
    let span = span_simulation(label, &config);
    let _guard = span.enter();
    info!(input = label, "Dispatcher starting");

    let outcome = match &input {
        Some(path) => {
            let file = File::open(path).map_err(DispatcherError::Io)?;
            Simulation::run_reader(config.clone(), BufReader::new(file))?
        }
        None => Simulation::run_reader(config.clone(), BufReader::new(io::stdin()))?,
    };

    let rendered = outcome
        .report
        .render(config.report_format)
        .map_err(DispatcherError::Report)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes()).into_diagnostic()?;
    if !rendered.ends_with('\n') {
        writeln!(stdout).into_diagnostic()?;
    }
    stdout.flush().into_diagnostic()?;

    outcome.enforce(config.strict_invariants)?;
    Ok(())
}
