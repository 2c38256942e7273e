/*!
 * Dispatch Operations
 * Transition rules for create, exit, request, interrupt and timer events
 */

use super::{Dispatch, DispatchEngine, Outcome};
use crate::core::errors::{DispatchError, DispatchResult};
use crate::core::types::{Pid, ResourceId, Timestamp};
use crate::events::EventKind;
use crate::process::ProcessState;
use crate::scheduler::queue::QueueId;
use tracing::debug;

impl DispatchEngine {
    /// Admit a process; it takes the CPU at once if the CPU is idle
    pub(super) fn create(&mut self, now: Timestamp, pid: Pid) -> DispatchResult<Dispatch> {
        self.store
            .admit(pid, now)
            .map_err(|reason| DispatchError::malformed(now as i64, reason))?;

        let running = self.running.is_none();
        if running {
            self.run(pid, now)?;
        } else {
            self.enqueue_ready(pid, now)?;
        }

        debug!(pid, time = now, running, "process admitted");
        Ok(Dispatch {
            time: now,
            outcome: Outcome::Admitted { pid, running },
            dispatched: running.then_some(pid),
            anomaly: None,
        })
    }

    /// Terminate a process from whatever state it is in
    pub(super) fn exit(&mut self, now: Timestamp, pid: Pid) -> DispatchResult<Dispatch> {
        let from = self.live_state(now, pid)?;
        self.ensure_transition(pid, from, ProcessState::Terminated)?;

        self.detach(pid, from)?;
        self.transition(pid, ProcessState::Terminated, now)?;
        self.completed.insert_sorted(pid)?;

        let dispatched = if from == ProcessState::Running {
            self.promote_next(now)?
        } else {
            None
        };

        debug!(pid, time = now, from = from.as_str(), "process exited");
        Ok(Dispatch {
            time: now,
            outcome: Outcome::Exited { pid, from },
            dispatched,
            anomaly: Self::anomaly(now, pid, EventKind::Exit, from),
        })
    }

    /// Block a process on `resource`
    pub(super) fn request(
        &mut self,
        now: Timestamp,
        resource: ResourceId,
        pid: Pid,
    ) -> DispatchResult<Dispatch> {
        let from = self.live_state(now, pid)?;
        let to = ProcessState::Blocked(resource);
        self.ensure_transition(pid, from, to)?;

        self.detach(pid, from)?;
        self.transition(pid, to, now)?;
        self.queues.get_mut(QueueId::Resource(resource)).push_back(pid);

        let dispatched = if from == ProcessState::Running {
            self.promote_next(now)?
        } else {
            None
        };

        debug!(pid, time = now, resource = resource.get(), from = from.as_str(), "process blocked");
        Ok(Dispatch {
            time: now,
            outcome: Outcome::Blocked { pid, resource, from },
            dispatched,
            anomaly: Self::anomaly(now, pid, EventKind::Request, from),
        })
    }

    /// Release a process blocked on `resource`, wherever it sits in that queue
    ///
    /// The released process goes through Ready; if the CPU is idle it is dispatched
    /// in the same instant.
    pub(super) fn interrupt(
        &mut self,
        now: Timestamp,
        resource: ResourceId,
        pid: Pid,
    ) -> DispatchResult<Dispatch> {
        let state = self.live_state(now, pid)?;
        if state != ProcessState::Blocked(resource) {
            return Err(DispatchError::UnexpectedInterrupt {
                time: now,
                pid,
                resource,
                state,
            });
        }

        self.queues
            .get_mut(QueueId::Resource(resource))
            .pop_by_id(pid)?;
        self.transition(pid, ProcessState::Ready, now)?;

        let running = self.running.is_none();
        if running {
            self.run(pid, now)?;
        } else {
            self.queues.ready_mut().push_back(pid);
        }

        debug!(pid, time = now, resource = resource.get(), running, "process unblocked");
        Ok(Dispatch {
            time: now,
            outcome: Outcome::Unblocked { pid, running },
            dispatched: running.then_some(pid),
            anomaly: None,
        })
    }

    /// Round-robin rotation: the running process goes to the back of the ready queue
    /// and the front of the ready queue takes the CPU
    pub(super) fn timer(&mut self, now: Timestamp) -> DispatchResult<Dispatch> {
        let current = match self.running {
            Some(pid) if !self.queues.ready().is_empty() => pid,
            _ => {
                self.stats.idle_timer_ticks += 1;
                return Ok(Dispatch {
                    time: now,
                    outcome: Outcome::TimerIgnored,
                    dispatched: None,
                    anomaly: None,
                });
            }
        };

        self.running = None;
        self.enqueue_ready(current, now)?;
        let next = self.queues.ready_mut().pop_front()?;
        self.run(next, now)?;
        self.stats.preemptions += 1;

        debug!(pid = current, next, time = now, "process preempted");
        Ok(Dispatch {
            time: now,
            outcome: Outcome::Preempted { pid: current, next },
            dispatched: Some(next),
            anomaly: None,
        })
    }

    // ------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------

    /// State of a process that can still be acted on
    fn live_state(&self, now: Timestamp, pid: Pid) -> DispatchResult<ProcessState> {
        self.store
            .live_state(pid)
            .ok_or(DispatchError::UnknownProcess { time: now, pid })
    }

    /// Reject a transition before anything is mutated
    fn ensure_transition(&self, pid: Pid, from: ProcessState, to: ProcessState) -> DispatchResult<()> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(DispatchError::InvalidStateTransition { pid, from, to })
        }
    }

    fn transition(&mut self, pid: Pid, to: ProcessState, now: Timestamp) -> DispatchResult<ProcessState> {
        let record = self
            .store
            .get_mut(pid)
            .ok_or(DispatchError::UnknownProcess { time: now, pid })?;
        record.transition(to, now)
    }

    /// Take `pid` off the CPU or out of the queue its state points at
    fn detach(&mut self, pid: Pid, state: ProcessState) -> DispatchResult<()> {
        match state {
            ProcessState::Running => {
                self.running = None;
            }
            ProcessState::Ready => {
                self.queues.ready_mut().pop_by_id(pid)?;
            }
            ProcessState::Blocked(r) => {
                self.queues.get_mut(QueueId::Resource(r)).pop_by_id(pid)?;
            }
            ProcessState::New | ProcessState::Terminated => {}
        }
        Ok(())
    }

    fn enqueue_ready(&mut self, pid: Pid, now: Timestamp) -> DispatchResult<()> {
        self.transition(pid, ProcessState::Ready, now)?;
        self.queues.ready_mut().push_back(pid);
        Ok(())
    }

    /// Put `pid` on the CPU, closing the idle interval if there was one
    fn run(&mut self, pid: Pid, now: Timestamp) -> DispatchResult<()> {
        self.transition(pid, ProcessState::Running, now)?;
        self.idle.stop(now);
        self.running = Some(pid);
        self.stats.context_switches += 1;
        Ok(())
    }

    /// CPU was vacated: hand it to the ready front, or go idle
    fn promote_next(&mut self, now: Timestamp) -> DispatchResult<Option<Pid>> {
        match self.queues.ready_mut().pop_front() {
            Ok(next) => {
                self.run(next, now)?;
                Ok(Some(next))
            }
            Err(_) => {
                self.idle.start(now);
                debug!(time = now, "cpu idle");
                Ok(None)
            }
        }
    }

    fn anomaly(now: Timestamp, pid: Pid, event: EventKind, from: ProcessState) -> Option<DispatchError> {
        (from != ProcessState::Running).then_some(DispatchError::AnomalousStateTransition {
            time: now,
            pid,
            event,
            from,
        })
    }
}
