/*!
 * Completed Collection
 * Terminated processes kept in ascending pid order for reporting
 */

use crate::core::errors::{QueueError, QueueResult};
use crate::core::types::Pid;

#[derive(Debug, Clone, Default)]
pub struct CompletedCollection {
    pids: Vec<Pid>,
}

impl CompletedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping strict ascending order
    pub fn insert_sorted(&mut self, pid: Pid) -> QueueResult<()> {
        match self.pids.binary_search(&pid) {
            Ok(_) => Err(QueueError::DuplicatePid(pid)),
            Err(pos) => {
                self.pids.insert(pos, pid);
                Ok(())
            }
        }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.binary_search(&pid).is_ok()
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.pids.iter().copied()
    }
}
