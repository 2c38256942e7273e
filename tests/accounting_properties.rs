/*!
 * Accounting Properties
 * Randomized event traces checked against the dispatcher's invariants
 */

use dispatch_sim::{DispatchEngine, Event, Outcome, ProcessState, Report, TimeOrdering};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 256;

/// Raw ingredients of one event; time is a delta from the previous event
#[derive(Debug, Clone)]
struct Step {
    delta: i64,
    code: u8,
    resource: i64,
    pid: i64,
}

impl Step {
    fn to_event(&self, time: i64) -> Event {
        match self.code {
            0 | 1 => Event::create(time, self.pid),
            2 => Event::exit(time, self.pid),
            3 => Event::request(time, self.resource, self.pid),
            4 => Event::interrupt(time, self.resource, self.pid),
            _ => Event::timer(time),
        }
    }
}

fn step() -> impl Strategy<Value = Step> {
    (0i64..6, 0u8..6, 0i64..7, -1i64..8).prop_map(|(delta, code, resource, pid)| Step {
        delta,
        code,
        resource,
        pid,
    })
}

fn trace() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(step(), 0..120).prop_map(|steps| {
        let mut time = 0;
        steps
            .iter()
            .map(|s| {
                time += s.delta;
                s.to_event(time)
            })
            .collect()
    })
}

/// `admitted` is the number of accepted Create events so far
fn check_engine(engine: &DispatchEngine, admitted: usize) -> Result<(), TestCaseError> {
    let now = engine.end_time();
    prop_assert!(engine.membership_consistent());

    let mut running = 0;
    let mut user_run = 0;
    for record in engine.store().sorted() {
        let accounting = record.accounting_at(now);
        if record.state.is_live() {
            prop_assert_eq!(accounting.total(), now - record.admitted_at);
        } else {
            prop_assert!(accounting.total() <= now - record.admitted_at);
        }
        if record.state == ProcessState::Running {
            running += 1;
        }
        user_run += accounting.run_time;
    }
    prop_assert!(running <= 1);

    // Exactly one of idle or a user process holds the CPU at every instant
    let idle = engine.accounting_at(0, now).map_or(0, |a| a.run_time);
    prop_assert_eq!(idle + user_run, now);

    let placed = engine.queues().total_len()
        + usize::from(engine.running().is_some())
        + engine.completed().len();
    prop_assert_eq!(placed, engine.store().len());

    let counts = engine.store().state_counts();
    prop_assert_eq!(counts.total(), admitted);
    prop_assert_eq!(counts.new, 0);
    prop_assert_eq!(counts.running, usize::from(engine.running().is_some()));
    prop_assert_eq!(counts.ready, engine.queues().ready().len());
    prop_assert_eq!(
        counts.blocked,
        engine.queues().total_len() - engine.queues().ready().len()
    );
    prop_assert_eq!(counts.terminated, engine.completed().len());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Invariants hold after every event, accepted or not
    #[test]
    fn invariants_hold_after_each_event(events in trace()) {
        let mut engine = DispatchEngine::new(TimeOrdering::NonDecreasing);
        let mut admitted = 0;
        for event in &events {
            let before = engine.clock();
            match engine.dispatch(event) {
                Ok(dispatch) => {
                    prop_assert_eq!(engine.clock(), Some(dispatch.time));
                    if matches!(dispatch.outcome, Outcome::Admitted { .. }) {
                        admitted += 1;
                    }
                }
                Err(_) => prop_assert_eq!(engine.clock(), before),
            }
            check_engine(&engine, admitted)?;
        }
    }

    /// Report lists every admitted process once, ascending, with consistent totals
    #[test]
    fn report_is_sorted_and_complete(events in trace()) {
        let mut engine = DispatchEngine::new(TimeOrdering::NonDecreasing);
        for event in &events {
            let _ = engine.dispatch(event);
        }
        let violation = engine.finish();
        let report = Report::from_engine(&engine);

        prop_assert_eq!(report.processes.len(), engine.store().len());
        prop_assert!(report.processes.windows(2).all(|w| w[0].pid < w[1].pid));
        prop_assert_eq!(report.unterminated.is_empty(), violation.is_none());

        let text = report.to_text();
        let first = text.lines().next().unwrap_or_default();
        prop_assert_eq!(first, format!("0 {}", report.idle_time));

        let user_run: u64 = report.processes.iter().map(|p| p.run_time).sum();
        prop_assert_eq!(report.idle_time + user_run, report.end_time);
        let stats = report.stats;
        prop_assert_eq!(stats.events_seen(), events.len() as u64);
    }

    /// Under strict ordering accepted events have strictly increasing times
    #[test]
    fn strict_ordering_accepts_increasing_times(events in trace()) {
        let mut engine = DispatchEngine::new(TimeOrdering::Strict);
        let mut previous: Option<u64> = None;
        let mut admitted = 0;
        for event in &events {
            if let Ok(dispatch) = engine.dispatch(event) {
                prop_assert!(previous.map_or(true, |p| dispatch.time > p));
                previous = Some(dispatch.time);
                if matches!(dispatch.outcome, Outcome::Admitted { .. }) {
                    admitted += 1;
                }
            }
        }
        check_engine(&engine, admitted)?;
    }
}
