/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::{Pid, ResourceId};
use crate::events::EventKind;
use crate::process::ProcessState;
use crate::scheduler::QueueId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dispatch operation result
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Queue operation result
pub type QueueResult<T> = Result<T, QueueError>;

/// Event parsing result
pub type ParseResult<T> = Result<T, ParseError>;

/// Configuration result
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How loudly a diagnostic should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Event was accepted, but acted on a process that was not running
    Notice,
    /// Event was discarded; the stream continues
    Warning,
    /// End-of-stream state is inconsistent
    Error,
}

/// Why an event failed validation
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum MalformedReason {
    #[error("negative time")]
    NegativeTime,

    #[error("time does not advance past {previous}")]
    TimeNotIncreasing { previous: u64 },

    #[error("time goes backward from {previous}")]
    TimeWentBackward { previous: u64 },

    #[error("negative pid {0}")]
    NegativePid(i64),

    #[error("pid {0} does not fit a process id")]
    PidOutOfRange(i64),

    #[error("pid 0 is reserved for the idle process")]
    ReservedPid,

    #[error("missing pid")]
    MissingPid,

    #[error("timer events carry no pid")]
    UnexpectedPid,

    #[error("resource {0} outside 1..=5")]
    ResourceOutOfRange(i64),

    #[error("missing resource id")]
    MissingResource,

    #[error("only request and interrupt events carry a resource id")]
    UnexpectedResource,

    #[error("process {0} was already created")]
    DuplicatePid(Pid),
}

/// Errors raised by the dispatch engine
///
/// Everything except `InvariantViolation` is handled per event: the driver logs it,
/// records it as a diagnostic and moves on to the next event.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum DispatchError {
    #[error("Malformed event at t={time}: {reason}")]
    #[diagnostic(
        code(dispatch::malformed_event),
        help("The event was discarded. Check time ordering, pid and resource fields.")
    )]
    MalformedEvent { time: i64, reason: MalformedReason },

    #[error("Process {pid} is not known at t={time}")]
    #[diagnostic(
        code(dispatch::unknown_process),
        help("The process was never created or has already exited. The event was discarded.")
    )]
    UnknownProcess { time: u64, pid: Pid },

    #[error("{event:?} for process {pid} at t={time} while it was {from:?}")]
    #[diagnostic(
        code(dispatch::anomalous_transition),
        severity(Warning),
        help("The event was applied to a process that was not running.")
    )]
    AnomalousStateTransition {
        time: u64,
        pid: Pid,
        event: EventKind,
        from: ProcessState,
    },

    #[error("Interrupt from {resource} at t={time}, but process {pid} is {state:?}")]
    #[diagnostic(
        code(dispatch::unexpected_interrupt),
        help("Only a process blocked on that resource can be released. The event was discarded.")
    )]
    UnexpectedInterrupt {
        time: u64,
        pid: Pid,
        resource: ResourceId,
        state: ProcessState,
    },

    #[error("Invalid state transition for process {pid}: {from:?} -> {to:?}")]
    #[diagnostic(
        code(dispatch::invalid_transition),
        help("The event would break the process state machine and was discarded.")
    )]
    InvalidStateTransition {
        pid: Pid,
        from: ProcessState,
        to: ProcessState,
    },

    #[error("Simulation ended with live processes: running {running:?}, queued {queued:?}")]
    #[diagnostic(
        code(dispatch::invariant_violation),
        help("Every admitted process should exit before the end of the input.")
    )]
    InvariantViolation {
        running: Option<Pid>,
        queued: Vec<Pid>,
    },

    #[error("Queue error: {0}")]
    #[diagnostic(code(dispatch::queue))]
    Queue(#[from] QueueError),
}

impl DispatchError {
    /// How loudly the driver reports this error
    pub fn level(&self) -> Severity {
        match self {
            Self::AnomalousStateTransition { .. } => Severity::Notice,
            Self::InvariantViolation { .. } | Self::Queue(_) => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn malformed(time: i64, reason: MalformedReason) -> Self {
        Self::MalformedEvent { time, reason }
    }
}

/// Queue discipline errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum QueueError {
    #[error("{0} queue is empty")]
    #[diagnostic(code(queue::empty))]
    Empty(QueueId),

    #[error("Process {pid} not found in {queue} queue")]
    #[diagnostic(code(queue::not_found))]
    NotFound { queue: QueueId, pid: Pid },

    #[error("Process {0} is already in the completed collection")]
    #[diagnostic(code(queue::duplicate_pid))]
    DuplicatePid(Pid),
}

/// Input line tokenizing errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[error("line {line}: {kind}")]
#[diagnostic(
    code(events::parse),
    help("Expected `<time> <C|E|R|I|T> [<resource>] [<pid>]`.")
)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParseErrorKind {
    #[error("missing event code")]
    MissingCode,

    #[error("unknown event code '{0}'")]
    UnknownCode(String),

    #[error("missing {0}")]
    MissingField(String),

    #[error("'{0}' is not an integer")]
    InvalidNumber(String),

    #[error("unexpected trailing token '{0}'")]
    TrailingToken(String),

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Top-level error for running a simulation end to end
#[derive(Error, Debug, Diagnostic)]
pub enum DispatcherError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(dispatcher::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Report serialization failed: {0}")]
    #[diagnostic(code(dispatcher::report))]
    Report(#[from] serde_json::Error),

    #[error("Event reader thread panicked")]
    #[diagnostic(code(dispatcher::reader))]
    ReaderPanicked,
}
