/*!
 * Accounting Report
 * Final per-process totals in ascending pid order, idle process first
 */

use crate::config::ReportFormat;
use crate::core::limits::IDLE_PID;
use crate::core::serde::{is_empty_vec, is_zero_u64, is_zero_usize};
use crate::core::types::{Millis, Pid, Timestamp};
use crate::scheduler::{DispatchEngine, DispatchStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Totals for one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub pid: Pid,
    pub run_time: Millis,
    pub ready_time: Millis,
    pub block_time: Millis,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub admitted_at: Timestamp,
    /// Times the process was put on the CPU
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub dispatches: u64,
    pub terminated: bool,
}

impl ProcessSummary {
    /// Elapsed time covered by the three counters
    pub fn lifetime(&self) -> Millis {
        self.run_time + self.ready_time + self.block_time
    }
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.pid, self.run_time, self.ready_time, self.block_time
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Run time of the idle process (pid 0)
    pub idle_time: Millis,
    /// Time of the last accepted event
    pub end_time: Timestamp,
    /// Every admitted user process, ascending pid
    pub processes: Vec<ProcessSummary>,
    /// Pids still running or queued when the input ended
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub unterminated: Vec<Pid>,
    pub stats: DispatchStats,
    #[serde(skip_serializing_if = "is_zero_usize", default)]
    pub diagnostics: usize,
}

impl Report {
    /// Snapshot of the engine, with live processes charged up to the last accepted event
    ///
    /// Terminated processes come from the completed collection, which is already in
    /// pid order; processes still alive are merged in at their pid.
    pub fn from_engine(engine: &DispatchEngine) -> Self {
        let end = engine.end_time();
        let store = engine.store();
        let summarize = |pid: Pid| {
            store.get(pid).map(|record| {
                let accounting = record.accounting_at(end);
                ProcessSummary {
                    pid,
                    run_time: accounting.run_time,
                    ready_time: accounting.ready_time,
                    block_time: accounting.block_time,
                    admitted_at: record.admitted_at,
                    dispatches: record.dispatches,
                    terminated: !record.state.is_live(),
                }
            })
        };

        let unterminated = store.live_pids();
        let mut completed = engine.completed().iter().peekable();
        let mut live = unterminated.iter().copied().peekable();
        let mut processes = Vec::with_capacity(store.len());
        loop {
            let pid = match (completed.peek(), live.peek()) {
                (Some(&done), Some(&alive)) if done < alive => completed.next(),
                (Some(_), Some(_)) | (None, Some(_)) => live.next(),
                (Some(_), None) => completed.next(),
                (None, None) => break,
            };
            processes.extend(pid.and_then(summarize));
        }
        debug_assert_eq!(processes.len(), store.len(), "completed and live pids must cover the store");
        debug_assert!(processes.windows(2).all(|w| w[0].pid < w[1].pid));

        Self {
            idle_time: engine
                .accounting_at(IDLE_PID, end)
                .map_or(0, |a| a.run_time),
            end_time: end,
            processes,
            unterminated,
            stats: engine.stats(),
            diagnostics: 0,
        }
    }

    pub fn with_diagnostics(mut self, count: usize) -> Self {
        self.diagnostics = count;
        self
    }

    pub fn process(&self, pid: Pid) -> Option<&ProcessSummary> {
        self.processes
            .binary_search_by_key(&pid, |p| p.pid)
            .ok()
            .map(|i| &self.processes[i])
    }

    /// `0 <idle>` followed by one `pid run ready block` line per process
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", IDLE_PID, self.idle_time)?;
        for process in &self.processes {
            writeln!(f, "{}", process)?;
        }
        Ok(())
    }
}
