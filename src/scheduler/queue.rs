/*!
 * Queue Discipline
 * FIFO queues for the ready list and each resource class
 */

use crate::core::errors::{QueueError, QueueResult};
use crate::core::limits::QUEUE_COUNT;
use crate::core::types::{Pid, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Identifies one of the dispatcher queues (ready = 0, resources = 1..=5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "queue", content = "resource", rename_all = "snake_case")]
pub enum QueueId {
    Ready,
    Resource(ResourceId),
}

impl QueueId {
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            QueueId::Ready => 0,
            QueueId::Resource(r) => r.get() as usize,
        }
    }

    /// Every queue id in index order
    pub fn all() -> impl Iterator<Item = QueueId> {
        std::iter::once(QueueId::Ready).chain(ResourceId::all().map(QueueId::Resource))
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueId::Ready => write!(f, "ready"),
            QueueId::Resource(r) => write!(f, "resource {}", r.get()),
        }
    }
}

/// FIFO of pids
///
/// Order is arrival order only; removal by pid keeps the relative order of the rest.
#[derive(Debug, Clone)]
pub struct ProcessQueue {
    id: QueueId,
    entries: VecDeque<Pid>,
}

impl ProcessQueue {
    pub fn new(id: QueueId) -> Self {
        Self {
            id,
            entries: VecDeque::new(),
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Append to the tail
    pub fn push_back(&mut self, pid: Pid) {
        self.entries.push_back(pid);
    }

    /// Remove and return the head
    pub fn pop_front(&mut self) -> QueueResult<Pid> {
        self.entries.pop_front().ok_or(QueueError::Empty(self.id))
    }

    /// Remove `pid` from wherever it sits in the queue
    pub fn pop_by_id(&mut self, pid: Pid) -> QueueResult<Pid> {
        let pos = self
            .entries
            .iter()
            .position(|&p| p == pid)
            .ok_or(QueueError::NotFound { queue: self.id, pid })?;
        self.entries
            .remove(pos)
            .ok_or(QueueError::NotFound { queue: self.id, pid })
    }

    pub fn front(&self) -> Option<Pid> {
        self.entries.front().copied()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pids front to back
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.entries.iter().copied()
    }
}

/// The ready queue plus one queue per resource class
#[derive(Debug, Clone)]
pub struct QueueSet {
    queues: Vec<ProcessQueue>,
}

impl QueueSet {
    pub fn new() -> Self {
        let queues: Vec<ProcessQueue> = QueueId::all().map(ProcessQueue::new).collect();
        debug_assert_eq!(queues.len(), QUEUE_COUNT);
        Self { queues }
    }

    #[inline]
    pub fn get(&self, id: QueueId) -> &ProcessQueue {
        &self.queues[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: QueueId) -> &mut ProcessQueue {
        &mut self.queues[id.index()]
    }

    #[inline]
    pub fn ready(&self) -> &ProcessQueue {
        self.get(QueueId::Ready)
    }

    #[inline]
    pub fn ready_mut(&mut self) -> &mut ProcessQueue {
        self.get_mut(QueueId::Ready)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessQueue> {
        self.queues.iter()
    }

    /// Queue currently holding `pid`, if any
    pub fn locate(&self, pid: Pid) -> Option<QueueId> {
        self.queues.iter().find(|q| q.contains(pid)).map(|q| q.id())
    }

    /// Total number of queued pids across every queue
    pub fn total_len(&self) -> usize {
        self.queues.iter().map(ProcessQueue::len).sum()
    }

    /// Every queued pid, queue by queue, front to back
    pub fn queued_pids(&self) -> Vec<Pid> {
        self.queues.iter().flat_map(|q| q.iter()).collect()
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource(n: i64) -> QueueId {
        QueueId::Resource(ResourceId::new(n).unwrap())
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ProcessQueue::new(QueueId::Ready);
        queue.push_back(9);
        queue.push_back(1);
        queue.push_back(5);
        assert_eq!(queue.pop_front(), Ok(9));
        assert_eq!(queue.pop_front(), Ok(1));
        assert_eq!(queue.pop_front(), Ok(5));
        assert_eq!(queue.pop_front(), Err(QueueError::Empty(QueueId::Ready)));
    }

    #[test]
    fn test_pop_by_id_from_middle() {
        let mut queue = ProcessQueue::new(resource(2));
        for pid in [4, 7, 3, 8] {
            queue.push_back(pid);
        }
        assert_eq!(queue.pop_by_id(3), Ok(3));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![4, 7, 8]);
        assert_eq!(
            queue.pop_by_id(3),
            Err(QueueError::NotFound {
                queue: resource(2),
                pid: 3
            })
        );
    }

    #[test]
    fn test_queue_indices() {
        let ids: Vec<usize> = QueueId::all().map(QueueId::index).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(resource(4).to_string(), "resource 4");
    }

    #[test]
    fn test_queue_set_locate() {
        let mut set = QueueSet::new();
        set.ready_mut().push_back(1);
        set.get_mut(resource(3)).push_back(2);
        assert_eq!(set.locate(1), Some(QueueId::Ready));
        assert_eq!(set.locate(2), Some(resource(3)));
        assert_eq!(set.locate(5), None);
        assert_eq!(set.total_len(), 2);
        assert_eq!(set.queued_pids(), vec![1, 2]);
    }
}
