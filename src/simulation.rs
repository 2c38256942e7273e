/*!
 * Simulation Driver
 * Feeds the event stream through the engine and collects diagnostics
 *
 * Per-event failures never stop the run: they are logged, recorded as diagnostics
 * and the next event is processed. Only I/O failures abort.
 */

use crate::config::DispatcherConfig;
use crate::core::errors::{DispatchError, DispatcherError, ParseError, Severity};
use crate::core::serde::is_none;
use crate::events::{spawn_reader, Event, EventReader, SourceItem};
use crate::report::Report;
use crate::scheduler::{Dispatch, DispatchEngine};
use serde::Serialize;
use std::io::BufRead;
use tracing::{debug, error, info, warn};

/// Something worth telling the user about, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Line could not be tokenized
    Parse { error: ParseError },
    /// Event was discarded or applied with a warning
    Dispatch {
        #[serde(skip_serializing_if = "is_none")]
        line: Option<usize>,
        error: DispatchError,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Parse { .. } => Severity::Warning,
            Self::Dispatch { error, .. } => error.level(),
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { error } => Some(error.line),
            Self::Dispatch { line, .. } => *line,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub report: Report,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when processes were still alive at end of input
    pub violation: Option<DispatchError>,
    pub lines_read: usize,
}

impl SimulationOutcome {
    /// Turn a dirty finish into an error when `strict` is set
    pub fn enforce(&self, strict: bool) -> Result<(), DispatcherError> {
        match (&self.violation, strict) {
            (Some(violation), true) => Err(DispatcherError::Dispatch(violation.clone())),
            _ => Ok(()),
        }
    }

    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() >= severity)
            .count()
    }
}

/// One dispatcher run
pub struct Simulation {
    config: DispatcherConfig,
    engine: DispatchEngine,
    diagnostics: Vec<Diagnostic>,
    lines_read: usize,
}

impl Simulation {
    pub fn new(config: DispatcherConfig) -> Self {
        let engine = DispatchEngine::new(config.time_ordering);
        Self {
            config,
            engine,
            diagnostics: Vec::new(),
            lines_read: 0,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Handle one item from the event source
    pub fn feed(&mut self, item: SourceItem) -> Option<Dispatch> {
        match item {
            SourceItem::Event { line, event } => {
                self.lines_read = self.lines_read.max(line);
                self.submit(Some(line), &event)
            }
            SourceItem::Rejected(error) => {
                self.lines_read = self.lines_read.max(error.line);
                warn!(line = error.line, error = %error, "input line skipped");
                self.diagnostics.push(Diagnostic::Parse { error });
                None
            }
        }
    }

    /// Apply one event, recording a diagnostic if it was discarded or anomalous
    pub fn submit(&mut self, line: Option<usize>, event: &Event) -> Option<Dispatch> {
        match self.engine.dispatch(event) {
            Ok(mut dispatch) => {
                if let Some(anomaly) = dispatch.anomaly.take() {
                    warn!(line = ?line, time = dispatch.time, error = %anomaly, "anomalous transition");
                    self.diagnostics.push(Diagnostic::Dispatch {
                        line,
                        error: anomaly.clone(),
                    });
                    dispatch.anomaly = Some(anomaly);
                }
                Some(dispatch)
            }
            Err(e) => {
                warn!(line = ?line, event = %event, error = %e, "event discarded");
                self.diagnostics.push(Diagnostic::Dispatch { line, error: e });
                None
            }
        }
    }

    /// Close the run: charge live processes, check for leftovers, build the report
    pub fn finish(mut self) -> SimulationOutcome {
        let violation = self.engine.finish();
        if let Some(v) = &violation {
            error!(error = %v, "simulation ended with live processes");
            self.diagnostics.push(Diagnostic::Dispatch {
                line: None,
                error: v.clone(),
            });
        }

        let report = Report::from_engine(&self.engine).with_diagnostics(self.diagnostics.len());
        let stats = report.stats;
        info!(
            end_time = report.end_time,
            processes = report.processes.len(),
            accepted = stats.events_accepted,
            discarded = stats.events_discarded,
            diagnostics = self.diagnostics.len(),
            "simulation finished"
        );

        SimulationOutcome {
            report,
            diagnostics: self.diagnostics,
            violation,
            lines_read: self.lines_read,
        }
    }

    /// Run pre-built events, numbering them as consecutive input lines
    pub fn run_events<I>(config: DispatcherConfig, events: I) -> SimulationOutcome
    where
        I: IntoIterator<Item = Event>,
    {
        let mut sim = Self::new(config);
        for (i, event) in events.into_iter().enumerate() {
            sim.feed(SourceItem::Event { line: i + 1, event });
        }
        sim.finish()
    }

    /// Read and run on the calling thread
    pub fn run_blocking<R: BufRead>(
        config: DispatcherConfig,
        reader: R,
    ) -> Result<SimulationOutcome, DispatcherError> {
        let mut sim = Self::new(config);
        let mut events = EventReader::new(reader);
        for item in events.by_ref() {
            sim.feed(item?);
        }
        sim.lines_read = sim.lines_read.max(events.lines_read());
        Ok(sim.finish())
    }

    /// Parse on a reader thread and dispatch here, connected by a bounded channel
    pub fn run_reader<R>(
        config: DispatcherConfig,
        reader: R,
    ) -> Result<SimulationOutcome, DispatcherError>
    where
        R: BufRead + Send + 'static,
    {
        let (rx, handle) = spawn_reader(reader, config.channel_capacity)?;
        let mut sim = Self::new(config);
        info!(capacity = sim.config.channel_capacity, "event reader started");

        let mut failure = None;
        for item in rx.iter() {
            match item {
                Ok(item) => {
                    sim.feed(item);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(rx);

        let lines = handle.join().map_err(|_| DispatcherError::ReaderPanicked)?;
        if let Some(e) = failure {
            return Err(DispatcherError::Io(e));
        }
        debug!(lines, "event reader finished");
        sim.lines_read = sim.lines_read.max(lines);
        Ok(sim.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ParseErrorKind;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_parse_errors_become_diagnostics() {
        let input = "0 C 1\n2 X 1\n5 E 1\n";
        let outcome = Simulation::run_blocking(DispatcherConfig::default(), Cursor::new(input)).unwrap();
        assert_eq!(outcome.report.to_text(), "0 0\n1 5 0 0\n");
        assert_eq!(outcome.diagnostics.len(), 1);
        match &outcome.diagnostics[0] {
            Diagnostic::Parse { error } => {
                assert_eq!(error.line, 2);
                assert_eq!(error.kind, ParseErrorKind::UnknownCode("X".into()));
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
        assert_eq!(outcome.lines_read, 3);
    }

    #[test]
    fn test_anomaly_is_recorded_but_applied() {
        let outcome = Simulation::run_events(
            DispatcherConfig::default(),
            vec![
                Event::create(0, 1),
                Event::create(1, 2),
                Event::exit(4, 2),
                Event::exit(6, 1),
            ],
        );
        assert_eq!(outcome.report.to_text(), "0 0\n1 6 0 0\n2 0 3 0\n");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].severity(), Severity::Notice);
        assert_eq!(outcome.diagnostics[0].line(), Some(3));
        assert!(outcome.violation.is_none());
    }

    #[test]
    fn test_strict_invariants() {
        let outcome = Simulation::run_events(DispatcherConfig::default(), vec![Event::create(0, 1)]);
        assert!(outcome.violation.is_some());
        assert!(outcome.enforce(false).is_ok());
        assert!(matches!(
            outcome.enforce(true),
            Err(DispatcherError::Dispatch(DispatchError::InvariantViolation { running: Some(1), .. }))
        ));
        assert_eq!(outcome.count_at_least(Severity::Error), 1);
    }

    #[test]
    fn test_reader_thread_matches_blocking_run() {
        let input = "0 C 1\n2 R 1 1\n2 C 2\n8 I 1 1\n20 E 1\n";
        let threaded = Simulation::run_reader(
            DispatcherConfig::default().with_channel_capacity(1).unwrap(),
            Cursor::new(input.to_string()),
        )
        .unwrap();
        let blocking = Simulation::run_blocking(DispatcherConfig::default(), Cursor::new(input)).unwrap();
        assert_eq!(threaded.report, blocking.report);
        assert_eq!(threaded.lines_read, 5);
    }
}
