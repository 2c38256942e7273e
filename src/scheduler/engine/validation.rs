/*!
 * Event Validation
 * Turns a raw event into a command the engine can apply
 */

use crate::config::TimeOrdering;
use crate::core::errors::{DispatchError, DispatchResult, MalformedReason};
use crate::core::types::{is_idle, Pid, ResourceId, Timestamp};
use crate::events::{Event, EventKind};

/// A validated engine command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Create(Pid),
    Exit(Pid),
    Request(ResourceId, Pid),
    Interrupt(ResourceId, Pid),
    Timer,
}

/// Check time ordering, pid and resource fields
///
/// `last` is the time of the previous accepted event, if any.
pub(super) fn validate(
    event: &Event,
    last: Option<Timestamp>,
    ordering: TimeOrdering,
) -> DispatchResult<(Timestamp, Command)> {
    let bad = |reason| Err(DispatchError::malformed(event.time, reason));

    if event.time < 0 {
        return bad(MalformedReason::NegativeTime);
    }
    let time = event.time as Timestamp;
    if let Some(previous) = last {
        match ordering {
            TimeOrdering::Strict if time <= previous => {
                return bad(MalformedReason::TimeNotIncreasing { previous })
            }
            TimeOrdering::NonDecreasing if time < previous => {
                return bad(MalformedReason::TimeWentBackward { previous })
            }
            _ => {}
        }
    }

    let resource = match (event.kind.takes_resource(), event.resource) {
        (true, None) => return bad(MalformedReason::MissingResource),
        (true, Some(raw)) => match ResourceId::new(raw) {
            Some(id) => Some(id),
            None => return bad(MalformedReason::ResourceOutOfRange(raw)),
        },
        (false, Some(_)) => return bad(MalformedReason::UnexpectedResource),
        (false, None) => None,
    };

    let pid = match (event.kind.takes_pid(), event.pid) {
        (true, None) => return bad(MalformedReason::MissingPid),
        (true, Some(raw)) if raw < 0 => return bad(MalformedReason::NegativePid(raw)),
        (true, Some(raw)) => match Pid::try_from(raw) {
            Ok(pid) if is_idle(pid) => return bad(MalformedReason::ReservedPid),
            Ok(pid) => Some(pid),
            Err(_) => return bad(MalformedReason::PidOutOfRange(raw)),
        },
        (false, Some(_)) => return bad(MalformedReason::UnexpectedPid),
        (false, None) => None,
    };

    let command = match (event.kind, resource, pid) {
        (EventKind::Create, None, Some(pid)) => Command::Create(pid),
        (EventKind::Exit, None, Some(pid)) => Command::Exit(pid),
        (EventKind::Request, Some(r), Some(pid)) => Command::Request(r, pid),
        (EventKind::Interrupt, Some(r), Some(pid)) => Command::Interrupt(r, pid),
        (EventKind::Timer, None, None) => Command::Timer,
        // Field presence was checked against the kind above
        _ => return bad(MalformedReason::MissingPid),
    };

    Ok((time, command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: DispatchResult<(Timestamp, Command)>) -> MalformedReason {
        match result {
            Err(DispatchError::MalformedEvent { reason, .. }) => reason,
            other => panic!("expected malformed event, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_commands() {
        let r2 = ResourceId::new(2).unwrap();
        let ok = |e: Event| validate(&e, None, TimeOrdering::Strict).unwrap();
        assert_eq!(ok(Event::create(0, 1)), (0, Command::Create(1)));
        assert_eq!(ok(Event::request(4, 2, 1)), (4, Command::Request(r2, 1)));
        assert_eq!(ok(Event::interrupt(9, 2, 1)), (9, Command::Interrupt(r2, 1)));
        assert_eq!(ok(Event::timer(11)), (11, Command::Timer));
    }

    #[test]
    fn test_time_ordering_modes() {
        let e = Event::timer(5);
        assert_eq!(
            reason(validate(&e, Some(5), TimeOrdering::Strict)),
            MalformedReason::TimeNotIncreasing { previous: 5 }
        );
        assert!(validate(&e, Some(5), TimeOrdering::NonDecreasing).is_ok());
        assert_eq!(
            reason(validate(&e, Some(6), TimeOrdering::NonDecreasing)),
            MalformedReason::TimeWentBackward { previous: 6 }
        );
        assert_eq!(
            reason(validate(&Event::timer(-1), None, TimeOrdering::Strict)),
            MalformedReason::NegativeTime
        );
    }

    #[test]
    fn test_field_checks() {
        let v = |e: Event| reason(validate(&e, None, TimeOrdering::Strict));
        assert_eq!(v(Event::create(1, -2)), MalformedReason::NegativePid(-2));
        assert_eq!(v(Event::create(1, 0)), MalformedReason::ReservedPid);
        assert_eq!(
            v(Event::create(1, i64::from(u32::MAX) + 1)),
            MalformedReason::PidOutOfRange(i64::from(u32::MAX) + 1)
        );
        assert_eq!(v(Event::request(1, 0, 3)), MalformedReason::ResourceOutOfRange(0));
        assert_eq!(v(Event::interrupt(1, 6, 3)), MalformedReason::ResourceOutOfRange(6));

        let mut timer_with_pid = Event::timer(1);
        timer_with_pid.pid = Some(3);
        assert_eq!(v(timer_with_pid), MalformedReason::UnexpectedPid);

        let mut exit_with_resource = Event::exit(1, 3);
        exit_with_resource.resource = Some(1);
        assert_eq!(v(exit_with_resource), MalformedReason::UnexpectedResource);

        let mut request_without_resource = Event::request(1, 1, 3);
        request_without_resource.resource = None;
        assert_eq!(v(request_without_resource), MalformedReason::MissingResource);
    }
}
