/*!
 * Process Types
 * Process state machine and per-process time accounting
 */

use crate::core::errors::{DispatchError, DispatchResult};
use crate::core::serde::is_zero_u64;
use crate::core::types::{Millis, Pid, ResourceId, Timestamp};
use serde::{Deserialize, Serialize};

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "resource", rename_all = "snake_case")]
pub enum ProcessState {
    /// Record admitted, not yet placed on the CPU or a queue
    New,
    /// Holding the CPU
    Running,
    /// Runnable, waiting in the ready queue
    Ready,
    /// Waiting for a request on the given resource class to complete
    Blocked(ResourceId),
    /// Exited; the record is frozen
    Terminated,
}

impl ProcessState {
    /// Check whether the state machine allows moving from `self` to `to`
    ///
    /// Blocked processes only go back through Ready. A Blocked process may also be
    /// re-queued on a resource (including the same one) or exit.
    pub fn can_transition_to(self, to: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, to),
            (New, Running)
                | (New, Ready)
                | (Running, Ready)
                | (Running, Blocked(_))
                | (Running, Terminated)
                | (Ready, Running)
                | (Ready, Blocked(_))
                | (Ready, Terminated)
                | (Blocked(_), Ready)
                | (Blocked(_), Blocked(_))
                | (Blocked(_), Terminated)
        )
    }

    #[inline]
    pub fn is_live(self) -> bool {
        !matches!(self, ProcessState::Terminated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::New => "new",
            ProcessState::Running => "running",
            ProcessState::Ready => "ready",
            ProcessState::Blocked(_) => "blocked",
            ProcessState::Terminated => "terminated",
        }
    }
}

/// Accumulated time per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accounting {
    pub run_time: Millis,
    pub ready_time: Millis,
    pub block_time: Millis,
}

impl Accounting {
    #[inline]
    pub fn total(&self) -> Millis {
        self.run_time + self.ready_time + self.block_time
    }

    fn add(&mut self, state: ProcessState, delta: Millis) {
        match state {
            ProcessState::Running => self.run_time += delta,
            ProcessState::Ready => self.ready_time += delta,
            ProcessState::Blocked(_) => self.block_time += delta,
            ProcessState::New | ProcessState::Terminated => {}
        }
    }
}

/// Simulated process control block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub state: ProcessState,
    pub admitted_at: Timestamp,
    /// Time of the last state change; deltas are measured from here
    pub anchor: Timestamp,
    #[serde(flatten)]
    accounting: Accounting,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub dispatches: u64,
}

impl ProcessRecord {
    pub fn new(pid: Pid, now: Timestamp) -> Self {
        Self {
            pid,
            state: ProcessState::New,
            admitted_at: now,
            anchor: now,
            accounting: Accounting::default(),
            dispatches: 0,
        }
    }

    /// Charge the time since the anchor to the current state and move the anchor
    pub fn charge(&mut self, now: Timestamp) {
        if !self.state.is_live() {
            return;
        }
        let delta = now.saturating_sub(self.anchor);
        self.accounting.add(self.state, delta);
        self.anchor = now;
    }

    /// Charge the current state, then move to `to`
    ///
    /// Fails without touching the record if the state machine forbids the move.
    pub fn transition(&mut self, to: ProcessState, now: Timestamp) -> DispatchResult<ProcessState> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(DispatchError::InvalidStateTransition {
                pid: self.pid,
                from,
                to,
            });
        }
        self.charge(now);
        self.state = to;
        if to == ProcessState::Running {
            self.dispatches += 1;
        }
        Ok(from)
    }

    /// Totals charged so far
    #[inline]
    pub fn accounting(&self) -> Accounting {
        self.accounting
    }

    /// Totals as they would be if charged at `now`, without mutating the record
    pub fn accounting_at(&self, now: Timestamp) -> Accounting {
        let mut snapshot = self.accounting;
        if self.state.is_live() {
            snapshot.add(self.state, now.saturating_sub(self.anchor));
        }
        snapshot
    }
}

/// Run-time clock of the idle pseudo-process
///
/// The idle process only ever runs; it is "on" whenever the CPU has no user process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleClock {
    run_time: Millis,
    since: Option<Timestamp>,
}

impl IdleClock {
    /// Idle clock running from time 0
    pub fn started() -> Self {
        Self {
            run_time: 0,
            since: Some(0),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.since.is_some()
    }

    /// CPU went idle at `now`
    pub fn start(&mut self, now: Timestamp) {
        if self.since.is_none() {
            self.since = Some(now);
        }
    }

    /// A user process took the CPU at `now`
    pub fn stop(&mut self, now: Timestamp) {
        if let Some(since) = self.since.take() {
            self.run_time += now.saturating_sub(since);
        }
    }

    /// Charge the open interval up to `now` and keep running
    pub fn settle(&mut self, now: Timestamp) {
        if self.since.is_some() {
            self.stop(now);
            self.since = Some(now);
        }
    }

    pub fn run_time(&self) -> Millis {
        self.run_time
    }

    pub fn run_time_at(&self, now: Timestamp) -> Millis {
        self.run_time + self.since.map_or(0, |since| now.saturating_sub(since))
    }
}
