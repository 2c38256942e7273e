/*!
 * Process Record Store
 * Owns every admitted process record, keyed by pid
 */

use super::types::{ProcessRecord, ProcessState};
use crate::core::errors::MalformedReason;
use crate::core::limits::INITIAL_STORE_CAPACITY;
use crate::core::types::{Pid, Timestamp};
use ahash::AHashMap;

/// Counts of records per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub new: usize,
    pub running: usize,
    pub ready: usize,
    pub blocked: usize,
    pub terminated: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.new + self.running + self.ready + self.blocked + self.terminated
    }
}

/// Arena of process records
///
/// Records are never removed: a terminated record stays here, frozen, until the
/// report is built. Queues refer to records by pid only.
#[derive(Debug, Clone)]
pub struct ProcessStore {
    records: AHashMap<Pid, ProcessRecord>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self {
            records: AHashMap::with_capacity(INITIAL_STORE_CAPACITY),
        }
    }

    /// Admit a new process at `now`
    ///
    /// A pid can be admitted only once per simulation, even after it terminated.
    pub fn admit(&mut self, pid: Pid, now: Timestamp) -> Result<&mut ProcessRecord, MalformedReason> {
        use std::collections::hash_map::Entry;
        match self.records.entry(pid) {
            Entry::Occupied(_) => Err(MalformedReason::DuplicatePid(pid)),
            Entry::Vacant(slot) => Ok(slot.insert(ProcessRecord::new(pid, now))),
        }
    }

    #[inline]
    pub fn get(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    #[inline]
    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut ProcessRecord> {
        self.records.get_mut(&pid)
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.records.contains_key(&pid)
    }

    /// State of a live (non-terminated) process
    pub fn live_state(&self, pid: Pid) -> Option<ProcessState> {
        self.records
            .get(&pid)
            .map(|r| r.state)
            .filter(|s| s.is_live())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending pid order
    pub fn sorted(&self) -> Vec<&ProcessRecord> {
        let mut records: Vec<&ProcessRecord> = self.records.values().collect();
        records.sort_unstable_by_key(|r| r.pid);
        records
    }

    /// Pids of records that have not terminated, ascending
    pub fn live_pids(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self
            .records
            .values()
            .filter(|r| r.state.is_live())
            .map(|r| r.pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for record in self.records.values() {
            match record.state {
                ProcessState::New => counts.new += 1,
                ProcessState::Running => counts.running += 1,
                ProcessState::Ready => counts.ready += 1,
                ProcessState::Blocked(_) => counts.blocked += 1,
                ProcessState::Terminated => counts.terminated += 1,
            }
        }
        counts
    }
}

impl Default for ProcessStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once() {
        let mut store = ProcessStore::new();
        assert!(store.admit(4, 0).is_ok());
        assert_eq!(store.admit(4, 9), Err(MalformedReason::DuplicatePid(4)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(4).map(|r| r.admitted_at), Some(0));
    }

    #[test]
    fn test_sorted_and_live() {
        let mut store = ProcessStore::new();
        for pid in [9, 2, 5] {
            store.admit(pid, 1).unwrap();
        }
        let record = store.get_mut(5).unwrap();
        record.transition(ProcessState::Running, 1).unwrap();
        record.transition(ProcessState::Terminated, 3).unwrap();

        let pids: Vec<Pid> = store.sorted().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 5, 9]);
        assert_eq!(store.live_pids(), vec![2, 9]);
        assert_eq!(store.live_state(5), None);
        assert_eq!(store.live_state(2), Some(ProcessState::New));

        let counts = store.state_counts();
        assert_eq!(counts.new, 2);
        assert_eq!(counts.terminated, 1);
        assert_eq!(counts.total(), 3);
    }
}
