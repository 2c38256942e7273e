/*!
 * Event Source
 * Reads input lines and yields normalized events in input order
 *
 * The stream ends at the first blank line or at EOF. Lines that fail to tokenize
 * are yielded as rejections so the caller can report them and keep going.
 */

use super::parser::parse_line;
use super::types::Event;
use crate::core::errors::{ParseError, ParseErrorKind};
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// One item produced by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    Event { line: usize, event: Event },
    Rejected(ParseError),
}

/// Iterator over the events of a line-oriented reader
pub struct EventReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            done: false,
        }
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = io::Result<SourceItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_no += 1;
                let Ok(text) = std::str::from_utf8(&self.buf) else {
                    return Some(Ok(SourceItem::Rejected(ParseError {
                        line: self.line_no,
                        kind: ParseErrorKind::InvalidUtf8,
                    })));
                };
                match parse_line(self.line_no, text) {
                    Ok(Some(event)) => Some(Ok(SourceItem::Event {
                        line: self.line_no,
                        event,
                    })),
                    Ok(None) => {
                        debug!(line = self.line_no, "blank line, end of event stream");
                        self.done = true;
                        None
                    }
                    Err(e) => Some(Ok(SourceItem::Rejected(e))),
                }
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse on a dedicated thread and hand items over a bounded channel
///
/// Single producer, single consumer: items arrive in input order. The channel
/// disconnects when the stream ends or the consumer hangs up.
pub fn spawn_reader<R>(
    reader: R,
    capacity: usize,
) -> io::Result<(flume::Receiver<io::Result<SourceItem>>, JoinHandle<usize>)>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = flume::bounded(capacity);
    let handle = thread::Builder::new()
        .name("event-reader".into())
        .spawn(move || {
            let mut events = EventReader::new(reader);
            for item in events.by_ref() {
                if tx.send(item).is_err() {
                    debug!("event consumer hung up");
                    break;
                }
            }
            events.lines_read()
        })?;
    Ok((rx, handle))
}
