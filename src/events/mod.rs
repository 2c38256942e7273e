/*!
 * Events Module
 * Event types, line tokenizer and the input event source
 */

pub mod parser;
pub mod source;
pub mod types;

// Re-export for convenience
pub use parser::parse_line;
pub use source::{spawn_reader, EventReader, SourceItem};
pub use types::{Event, EventKind};
