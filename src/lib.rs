/*!
 * Dispatch Simulator Library
 * Event-driven uniprocessor dispatcher with round-robin scheduling and
 * per-process run/ready/block accounting
 */

pub mod config;
pub mod core;
pub mod events;
pub mod monitoring;
pub mod process;
pub mod report;
pub mod scheduler;
pub mod simulation;

// Re-exports
pub use config::{DispatcherConfig, ReportFormat, TimeOrdering};
pub use crate::core::errors::*;
pub use crate::core::types::{Millis, Pid, ResourceId, Timestamp};
pub use events::{parse_line, Event, EventKind, EventReader, SourceItem};
pub use monitoring::init_tracing;
pub use process::{Accounting, ProcessRecord, ProcessState, ProcessStore};
pub use report::{ProcessSummary, Report};
pub use scheduler::{Dispatch, DispatchEngine, DispatchStats, Outcome, QueueId};
pub use simulation::{Diagnostic, Simulation, SimulationOutcome};
