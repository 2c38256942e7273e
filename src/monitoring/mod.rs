/*!
 * Monitoring
 * Structured tracing setup for the dispatcher
 */

mod tracer;

pub use tracer::{init_tracing, span_simulation};
