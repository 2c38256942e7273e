/*!
 * Event Types
 * Normalized scheduling events as delivered to the dispatch engine
 */

use crate::core::serde::is_none;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of scheduling stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `C` - process creation
    Create,
    /// `E` - process exit
    Exit,
    /// `R` - request for a resource
    Request,
    /// `I` - interrupt from a resource (request completed)
    Interrupt,
    /// `T` - timer interrupt
    Timer,
}

impl EventKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(Self::Create),
            "E" => Some(Self::Exit),
            "R" => Some(Self::Request),
            "I" => Some(Self::Interrupt),
            "T" => Some(Self::Timer),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn code(self) -> char {
        match self {
            Self::Create => 'C',
            Self::Exit => 'E',
            Self::Request => 'R',
            Self::Interrupt => 'I',
            Self::Timer => 'T',
        }
    }

    #[inline(always)]
    pub const fn takes_resource(self) -> bool {
        matches!(self, Self::Request | Self::Interrupt)
    }

    #[inline(always)]
    pub const fn takes_pid(self) -> bool {
        !matches!(self, Self::Timer)
    }
}

/// A normalized event
///
/// Fields are kept signed and optional exactly as tokenized; the engine does its own
/// validation before acting on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: i64,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "is_none", default)]
    pub resource: Option<i64>,
    #[serde(skip_serializing_if = "is_none", default)]
    pub pid: Option<i64>,
}

impl Event {
    pub fn create(time: i64, pid: i64) -> Self {
        Self {
            time,
            kind: EventKind::Create,
            resource: None,
            pid: Some(pid),
        }
    }

    pub fn exit(time: i64, pid: i64) -> Self {
        Self {
            time,
            kind: EventKind::Exit,
            resource: None,
            pid: Some(pid),
        }
    }

    pub fn request(time: i64, resource: i64, pid: i64) -> Self {
        Self {
            time,
            kind: EventKind::Request,
            resource: Some(resource),
            pid: Some(pid),
        }
    }

    pub fn interrupt(time: i64, resource: i64, pid: i64) -> Self {
        Self {
            time,
            kind: EventKind::Interrupt,
            resource: Some(resource),
            pid: Some(pid),
        }
    }

    pub fn timer(time: i64) -> Self {
        Self {
            time,
            kind: EventKind::Timer,
            resource: None,
            pid: None,
        }
    }
}

/// Renders the input-line form, e.g. `8 I 1 1`
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.kind.code())?;
        if let Some(resource) = self.resource {
            write!(f, " {}", resource)?;
        }
        if let Some(pid) = self.pid {
            write!(f, " {}", pid)?;
        }
        Ok(())
    }
}
