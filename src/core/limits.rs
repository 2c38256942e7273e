/*!
 * System Limits and Constants
 *
 * Centralized location for the dispatcher's fixed limits and defaults.
 */

// =============================================================================
// PROCESS MODEL
// =============================================================================

/// Pid of the idle pseudo-process
/// Runs whenever no user process holds the CPU, admitted at time 0
pub const IDLE_PID: u32 = 0;

/// Number of resource classes a process can block on
/// Resource ids are 1-based: 1..=RESOURCE_CLASSES
pub const RESOURCE_CLASSES: usize = 5;

/// Total number of FIFO queues (ready + one per resource class)
pub const QUEUE_COUNT: usize = RESOURCE_CLASSES + 1;

// =============================================================================
// EVENT INGESTION
// =============================================================================

/// Bounded channel capacity between the reader thread and the engine
/// Large enough to keep the reader ahead without buffering whole inputs
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Upper bound on the channel capacity accepted from configuration
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 20;

/// Initial capacity of the process record store
pub const INITIAL_STORE_CAPACITY: usize = 64;
