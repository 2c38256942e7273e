/*!
 * Scheduler Module
 * Round-robin dispatching over the ready queue and five resource queues
 */

pub mod completed;
pub mod engine;
pub mod queue;

// Re-export public API
pub use completed::CompletedCollection;
pub use engine::{Command, Dispatch, DispatchEngine, DispatchStats, Outcome};
pub use queue::{ProcessQueue, QueueId, QueueSet};
