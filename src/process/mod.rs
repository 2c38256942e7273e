/*!
 * Process Module
 * Process records, state machine and the record store
 */

pub mod store;
pub mod types;

// Re-export for convenience
pub use store::{ProcessStore, StateCounts};
pub use types::{Accounting, IdleClock, ProcessRecord, ProcessState};
