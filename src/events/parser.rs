/*!
 * Event Parser
 * Tokenizes one input line into a normalized event
 *
 * Grammar: `<time> <code> [<resource>] [<pid>]`
 * - `C`/`E` take a pid
 * - `R`/`I` take a resource then a pid
 * - `T` takes nothing
 */

use super::types::{Event, EventKind};
use crate::core::errors::{ParseError, ParseErrorKind, ParseResult};

/// Parse a single line
///
/// Returns `Ok(None)` for a blank line, which marks the end of the stream.
pub fn parse_line(line_no: usize, line: &str) -> ParseResult<Option<Event>> {
    let err = |kind| ParseError {
        line: line_no,
        kind,
    };

    let mut tokens = line.split_whitespace();
    let Some(time_token) = tokens.next() else {
        return Ok(None);
    };
    let time = parse_number(time_token).map_err(err)?;

    let code = tokens.next().ok_or(err(ParseErrorKind::MissingCode))?;
    let kind = EventKind::from_code(code)
        .ok_or_else(|| err(ParseErrorKind::UnknownCode(code.to_string())))?;

    let mut field = |name: &str| -> ParseResult<i64> {
        let token = tokens
            .next()
            .ok_or_else(|| err(ParseErrorKind::MissingField(name.to_string())))?;
        parse_number(token).map_err(err)
    };

    let resource = if kind.takes_resource() {
        Some(field("resource")?)
    } else {
        None
    };
    let pid = if kind.takes_pid() {
        Some(field("pid")?)
    } else {
        None
    };

    if let Some(extra) = tokens.next() {
        return Err(err(ParseErrorKind::TrailingToken(extra.to_string())));
    }

    Ok(Some(Event {
        time,
        kind,
        resource,
        pid,
    }))
}

fn parse_number(token: &str) -> Result<i64, ParseErrorKind> {
    token
        .parse::<i64>()
        .map_err(|_| ParseErrorKind::InvalidNumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_each_code() {
        assert_eq!(parse_line(1, "0 C 1").unwrap(), Some(Event::create(0, 1)));
        assert_eq!(parse_line(1, "5 E 1").unwrap(), Some(Event::exit(5, 1)));
        assert_eq!(parse_line(1, "2 R 3 1").unwrap(), Some(Event::request(2, 3, 1)));
        assert_eq!(parse_line(1, "8 I 1 4").unwrap(), Some(Event::interrupt(8, 1, 4)));
        assert_eq!(parse_line(1, "3 T").unwrap(), Some(Event::timer(3)));
    }

    #[test]
    fn test_blank_line_ends_stream() {
        assert_eq!(parse_line(1, "").unwrap(), None);
        assert_eq!(parse_line(1, "   \t").unwrap(), None);
    }

    #[test]
    fn test_extra_whitespace_is_ignored() {
        assert_eq!(
            parse_line(1, "  10   R  2   7 \r").unwrap(),
            Some(Event::request(10, 2, 7))
        );
    }

    #[test]
    fn test_negative_values_pass_through() {
        // Range checks belong to the engine, not the tokenizer
        assert_eq!(parse_line(1, "-1 C -4").unwrap(), Some(Event::create(-1, -4)));
        assert_eq!(parse_line(1, "4 R 9 2").unwrap(), Some(Event::request(4, 9, 2)));
    }

    #[test]
    fn test_parse_errors() {
        let e = parse_line(7, "5").unwrap_err();
        assert_eq!(e.line, 7);
        assert_eq!(e.kind, ParseErrorKind::MissingCode);

        let e = parse_line(2, "5 Q 1").unwrap_err();
        assert_eq!(e.kind, ParseErrorKind::UnknownCode("Q".into()));

        let e = parse_line(2, "5 R 1").unwrap_err();
        assert_eq!(e.kind, ParseErrorKind::MissingField("pid".into()));

        let e = parse_line(2, "x C 1").unwrap_err();
        assert_eq!(e.kind, ParseErrorKind::InvalidNumber("x".into()));

        let e = parse_line(2, "5 T 1").unwrap_err();
        assert_eq!(e.kind, ParseErrorKind::TrailingToken("1".into()));
    }
}
