/*!
 * Dispatch Engine
 * Event-driven uniprocessor dispatcher with per-process time accounting
 *
 * The engine owns every piece of mutable simulation state: the record store, the
 * ready and resource queues, the completed collection and the running slot. Events
 * are applied one at a time, to completion; before any transition the time since the
 * previous change is charged to the state the process was in.
 */

use super::completed::CompletedCollection;
use super::queue::{QueueId, QueueSet};
use crate::config::TimeOrdering;
use crate::core::errors::{DispatchError, DispatchResult};
use crate::core::types::{is_idle, Millis, Pid, ResourceId, Timestamp};
use crate::events::Event;
use crate::process::{Accounting, IdleClock, ProcessState, ProcessStore};
use serde::Serialize;
use tracing::{debug, info};

mod operations;
mod stats;
mod validation;

pub use stats::DispatchStats;
pub use validation::Command;

/// What an accepted event did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// New process got the CPU (`running`) or joined the ready queue
    Admitted { pid: Pid, running: bool },
    Exited { pid: Pid, from: ProcessState },
    Blocked {
        pid: Pid,
        resource: ResourceId,
        from: ProcessState,
    },
    /// Unblocked process got the CPU (`running`) or joined the ready queue
    Unblocked { pid: Pid, running: bool },
    Preempted { pid: Pid, next: Pid },
    /// Timer with nothing to rotate to
    TimerIgnored,
}

/// Result of one accepted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub time: Timestamp,
    pub outcome: Outcome,
    /// Process placed on the CPU by this event, if any
    pub dispatched: Option<Pid>,
    /// Set when the event acted on a process that was not running
    pub anomaly: Option<DispatchError>,
}

/// Uniprocessor dispatcher
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    ordering: TimeOrdering,
    store: ProcessStore,
    queues: QueueSet,
    completed: CompletedCollection,
    /// `None` means the idle process holds the CPU
    running: Option<Pid>,
    idle: IdleClock,
    /// Time of the last accepted event
    clock: Option<Timestamp>,
    stats: DispatchStats,
}

impl DispatchEngine {
    pub fn new(ordering: TimeOrdering) -> Self {
        info!(ordering = ordering.as_str(), "Dispatch engine initialized");
        Self {
            ordering,
            store: ProcessStore::new(),
            queues: QueueSet::new(),
            completed: CompletedCollection::new(),
            running: None,
            idle: IdleClock::started(),
            clock: None,
            stats: DispatchStats::default(),
        }
    }

    /// Apply one event
    ///
    /// On error nothing has changed: the event is discarded and the clock stays put.
    pub fn dispatch(&mut self, event: &Event) -> DispatchResult<Dispatch> {
        let result = validation::validate(event, self.clock, self.ordering)
            .and_then(|(now, command)| self.apply(now, command));

        match &result {
            Ok(dispatch) => {
                self.clock = Some(dispatch.time);
                self.stats.events_accepted += 1;
                if dispatch.anomaly.is_some() {
                    self.stats.anomalies += 1;
                }
                debug!(
                    event = %event,
                    outcome = ?dispatch.outcome,
                    running = ?self.running,
                    "event applied"
                );
            }
            Err(_) => self.stats.events_discarded += 1,
        }

        debug_assert!(self.membership_consistent(), "queue membership broken after {}", event);
        result
    }

    fn apply(&mut self, now: Timestamp, command: Command) -> DispatchResult<Dispatch> {
        match command {
            Command::Create(pid) => self.create(now, pid),
            Command::Exit(pid) => self.exit(now, pid),
            Command::Request(resource, pid) => self.request(now, resource, pid),
            Command::Interrupt(resource, pid) => self.interrupt(now, resource, pid),
            Command::Timer => self.timer(now),
        }
    }

    /// Charge every live process up to the last accepted event and check that the
    /// simulation ended cleanly
    ///
    /// Returns the invariant violation, if any. Safe to call more than once.
    pub fn finish(&mut self) -> Option<DispatchError> {
        let end = self.end_time();
        self.idle.settle(end);
        for pid in self.store.live_pids() {
            if let Some(record) = self.store.get_mut(pid) {
                record.charge(end);
            }
        }

        let queued = self.queues.queued_pids();
        if self.running.is_none() && queued.is_empty() {
            return None;
        }
        Some(DispatchError::InvariantViolation {
            running: self.running,
            queued,
        })
    }

    /// Time of the last accepted event (0 before any)
    pub fn end_time(&self) -> Timestamp {
        self.clock.unwrap_or(0)
    }

    pub fn clock(&self) -> Option<Timestamp> {
        self.clock
    }

    pub fn ordering(&self) -> TimeOrdering {
        self.ordering
    }

    /// Currently running user process; `None` while idle
    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    pub fn store(&self) -> &ProcessStore {
        &self.store
    }

    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    pub fn completed(&self) -> &CompletedCollection {
        &self.completed
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Idle time charged so far
    pub fn idle_time(&self) -> Millis {
        self.idle.run_time()
    }

    /// Accounting of `pid` as if charged at `now`; pid 0 reports idle run time
    pub fn accounting_at(&self, pid: Pid, now: Timestamp) -> Option<Accounting> {
        if is_idle(pid) {
            return Some(Accounting {
                run_time: self.idle.run_time_at(now),
                ..Accounting::default()
            });
        }
        self.store.get(pid).map(|r| r.accounting_at(now))
    }

    /// Every live pid is in exactly the place its state says, and nowhere else
    pub fn membership_consistent(&self) -> bool {
        let mut placed = 0usize;
        for record in self.store.sorted() {
            let expected = match record.state {
                ProcessState::Running => None,
                ProcessState::Ready => Some(QueueId::Ready),
                ProcessState::Blocked(r) => Some(QueueId::Resource(r)),
                ProcessState::New => return false,
                ProcessState::Terminated => {
                    if self.running == Some(record.pid) || self.queues.locate(record.pid).is_some() {
                        return false;
                    }
                    continue;
                }
            };
            let in_queue = self.queues.locate(record.pid);
            let occurrences: usize = self
                .queues
                .iter()
                .map(|q| q.iter().filter(|&p| p == record.pid).count())
                .sum();
            let ok = match expected {
                None => self.running == Some(record.pid) && occurrences == 0,
                Some(id) => self.running != Some(record.pid) && in_queue == Some(id) && occurrences == 1,
            };
            if !ok {
                return false;
            }
            placed += 1;
        }
        placed == self.queues.total_len() + usize::from(self.running.is_some())
            && self.idle.is_running() == self.running.is_none()
    }
}

impl Default for DispatchEngine {
    fn default() -> Self {
        Self::new(TimeOrdering::default())
    }
}
