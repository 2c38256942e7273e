/*!
 * Dispatch Statistics
 * Counters kept by the engine while it consumes the event stream
 */

use crate::core::serde::is_zero_u64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DispatchStats {
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub events_accepted: u64,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub events_discarded: u64,
    /// A user process was put on the CPU
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub context_switches: u64,
    /// Timer interrupts that rotated the running process out
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub preemptions: u64,
    /// Timer interrupts with nothing to rotate to
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub idle_timer_ticks: u64,
    /// Exit/Request applied to a process that was not running
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub anomalies: u64,
}

impl DispatchStats {
    pub fn events_seen(&self) -> u64 {
        self.events_accepted + self.events_discarded
    }
}
