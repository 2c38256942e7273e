/*!
 * Core Types
 * Common types used across the dispatcher
 */

use super::limits::{IDLE_PID, RESOURCE_CLASSES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID type (0 is the idle pseudo-process)
pub type Pid = u32;

/// Simulated time in milliseconds since the start of the run
pub type Timestamp = u64;

/// Accumulated duration in milliseconds
pub type Millis = u64;

/// Returns true for the reserved idle process id
#[inline(always)]
pub const fn is_idle(pid: Pid) -> bool {
    pid == IDLE_PID
}

/// Resource class a process can block on (1..=5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ResourceId(u8);

impl ResourceId {
    /// Validate a raw resource number
    pub fn new(raw: i64) -> Option<Self> {
        if (1..=RESOURCE_CLASSES as i64).contains(&raw) {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Raw resource number
    #[inline(always)]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Iterate every resource class in ascending order
    pub fn all() -> impl Iterator<Item = ResourceId> {
        (1..=RESOURCE_CLASSES as u8).map(ResourceId)
    }
}

impl TryFrom<u8> for ResourceId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as i64)
            .ok_or_else(|| format!("resource {} outside 1..={}", value, RESOURCE_CLASSES))
    }
}

impl From<ResourceId> for u8 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_bounds() {
        assert!(ResourceId::new(0).is_none());
        assert!(ResourceId::new(-3).is_none());
        assert_eq!(ResourceId::new(1).map(ResourceId::get), Some(1));
        assert_eq!(ResourceId::new(5).map(ResourceId::get), Some(5));
        assert!(ResourceId::new(6).is_none());
    }

    #[test]
    fn test_resource_iteration() {
        let all: Vec<u8> = ResourceId::all().map(ResourceId::get).collect();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_resource_serde() {
        let id = ResourceId::new(3).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
        assert!(serde_json::from_str::<ResourceId>("9").is_err());
    }
}
