//! Rendered reports for complete traces.

use std::thread;
use std::time::Duration;

use calltree::{ManualClock, Resolution, TraceController};
use insta::assert_snapshot;
use rstest::rstest;

use crate::common::{advance_ms, probe_lines, tracer};

/// request (20ms) > parse (3ms), execute (7ms) > query (4ms)
fn record_request(tracer: &mut TraceController<ManualClock>) {
    tracer.start_trace("request");
    advance_ms(tracer, 2);
    tracer.start_probe("parse");
    advance_ms(tracer, 3);
    tracer.finish_probe(false);
    tracer.start_probe("execute");
    advance_ms(tracer, 1);
    tracer.start_probe("query");
    advance_ms(tracer, 4);
    tracer.finish_probe(false);
    advance_ms(tracer, 2);
    tracer.finish_probe(false);
    advance_ms(tracer, 8);
    tracer.finish_trace(false);
}

#[rstest]
fn test_nested_report(mut tracer: TraceController<ManualClock>) {
    record_request(&mut tracer);

    assert_snapshot!(tracer.to_report(), @r"
    request processed for 20 ms
    #1 -> parse took 3 ms - 15.00% of total time
    #2 -> execute took 7 ms - 35.00% of total time
    #3 --> query took 4 ms - 20.00% of total time
    ");
}

#[rstest]
#[case::nanoseconds(
    Resolution::Nanoseconds,
    "request processed for 20000000 ns\n\
     #1 -> parse took 3000000 ns - 15.00% of total time\n\
     #2 -> execute took 7000000 ns - 35.00% of total time\n\
     #3 --> query took 4000000 ns - 20.00% of total time\n"
)]
#[case::microseconds(
    Resolution::Microseconds,
    "request processed for 20000 us\n\
     #1 -> parse took 3000 us - 15.00% of total time\n\
     #2 -> execute took 7000 us - 35.00% of total time\n\
     #3 --> query took 4000 us - 20.00% of total time\n"
)]
#[case::seconds(
    Resolution::Seconds,
    "request processed for 0 sec\n\
     #1 -> parse took 0 sec - 0.00% of total time\n\
     #2 -> execute took 0 sec - 0.00% of total time\n\
     #3 --> query took 0 sec - 0.00% of total time\n"
)]
fn test_resolution_applies_at_render_time(
    mut tracer: TraceController<ManualClock>,
    #[case] resolution: Resolution,
    #[case] expected: &str,
) {
    record_request(&mut tracer);

    // Changing the unit after the fact re-reads the raw instants
    tracer.set_resolution(resolution);
    assert_eq!(tracer.to_report(), expected);
}

#[rstest]
fn test_single_probe_takes_whole_trace(mut tracer: TraceController<ManualClock>) {
    tracer.start_trace("T");
    tracer.start_probe("A");
    advance_ms(&tracer, 5);
    tracer.finish_probe(false);
    tracer.finish_trace(false);

    assert_snapshot!(tracer.to_report(), @r"
    T processed for 5 ms
    #1 -> A took 5 ms - 100.00% of total time
    ");
}

#[test]
fn test_single_probe_with_real_clock() {
    let mut tracer = TraceController::new();
    tracer.set_enabled(true);

    tracer.start_trace("T");
    tracer.start_probe("A");
    thread::sleep(Duration::from_millis(10));
    tracer.finish_probe(false);
    tracer.finish_trace(false);

    let report = tracer.to_report();
    let pattern =
        regex::Regex::new(r"^T processed for \d+ ms\n#1 -> A took \d+ ms - \d+\.\d{2}% of total time\n$")
            .unwrap();
    assert!(pattern.is_match(&report), "unexpected report:\n{report}");

    let root = tracer.trace().unwrap().root();
    let probe = &root.children()[0];
    let trace_ms = root.elapsed(Resolution::Milliseconds).unwrap();
    let probe_ms = probe.elapsed(Resolution::Milliseconds).unwrap();
    assert!(probe_ms >= 10);
    assert!(probe_ms <= trace_ms);
}

#[rstest]
fn test_sequence_padded_to_probe_count(mut tracer: TraceController<ManualClock>) {
    tracer.start_trace("batch");
    for i in 1..=12 {
        tracer.start_probe(&format!("p{i}"));
        advance_ms(&tracer, 1);
        tracer.finish_probe(false);
    }
    tracer.finish_trace(false);

    let report = tracer.to_report();
    let lines = probe_lines(&report);
    assert_eq!(report.lines().next(), Some("batch processed for 12 ms"));
    assert_eq!(lines.len(), 12);
    for (i, line) in (1..=12).zip(&lines) {
        assert_eq!(*line, format!("#{i:02} -> p{i} took 1 ms - 8.33% of total time"));
    }
}

/// Percentages use each probe's own time, so nested shares overlap their parent's.
#[rstest]
fn test_percentages_are_not_cumulative(mut tracer: TraceController<ManualClock>) {
    tracer.start_trace("t");
    tracer.start_probe("outer");
    tracer.start_probe("inner");
    advance_ms(&tracer, 10);
    tracer.finish_probe(false);
    tracer.finish_probe(false);
    tracer.finish_trace(false);

    assert_snapshot!(tracer.to_report(), @r"
    t processed for 10 ms
    #1 -> outer took 10 ms - 100.00% of total time
    #2 --> inner took 10 ms - 100.00% of total time
    ");
}

#[rstest]
fn test_unfinished_trace(mut tracer: TraceController<ManualClock>) {
    tracer.start_trace("t");
    tracer.start_probe("a");
    advance_ms(&tracer, 2);
    tracer.finish_probe(false);

    assert!(tracer.is_active());
    assert_eq!(
        tracer.to_report(),
        "t has invalid start/end time\n#1 -> a took 2 ms - 0.00% of total time\n"
    );
}

#[rstest]
fn test_open_probe_in_finished_trace(mut tracer: TraceController<ManualClock>) {
    tracer.start_trace("t");
    tracer.start_probe("done");
    advance_ms(&tracer, 1);
    tracer.finish_probe(false);
    tracer.start_probe("abandoned");
    advance_ms(&tracer, 3);
    tracer.finish_trace(false);

    assert_snapshot!(tracer.to_report(), @r"
    t processed for 4 ms
    #1 -> done took 1 ms - 25.00% of total time
    #2 -> abandoned has invalid start/end time
    ");
}

#[rstest]
fn test_trace_without_probes(mut tracer: TraceController<ManualClock>) {
    tracer.start_trace("idle");
    advance_ms(&tracer, 7);
    tracer.finish_trace(false);

    assert_eq!(tracer.to_report(), "idle processed for 7 ms\n");
}

#[rstest]
fn test_failed_flag_does_not_change_report(mut tracer: TraceController<ManualClock>) {
    record_request(&mut tracer);
    let clean = tracer.to_report();

    tracer.clock().set(crate::common::CLOCK_START);
    tracer.start_trace("request");
    advance_ms(&tracer, 2);
    tracer.start_probe("parse");
    advance_ms(&tracer, 3);
    tracer.finish_probe(true);
    tracer.start_probe("execute");
    advance_ms(&tracer, 1);
    tracer.start_probe("query");
    advance_ms(&tracer, 4);
    tracer.finish_probe(true);
    advance_ms(&tracer, 2);
    tracer.finish_probe(false);
    advance_ms(&tracer, 8);
    tracer.finish_trace(true);

    assert!(tracer.trace().unwrap().root().failed());
    assert_eq!(tracer.to_report(), clean);
}

#[rstest]
fn test_deep_chain_renders(mut tracer: TraceController<ManualClock>) {
    const DEPTH: usize = 10_000;

    tracer.start_trace("deep");
    for level in 1..=DEPTH {
        tracer.start_probe(&format!("level {level}"));
    }
    advance_ms(&tracer, 1);
    for _ in 0..DEPTH {
        tracer.finish_probe(false);
    }
    tracer.finish_trace(false);
    assert_eq!(tracer.probe_count(), DEPTH);

    let report = tracer.to_report();
    let lines = probe_lines(&report);
    assert_eq!(lines.len(), DEPTH);
    assert_eq!(lines[0], "#00001 -> level 1 took 1 ms - 100.00% of total time");
    let last = format!(
        "#10000 {}> level 10000 took 1 ms - 100.00% of total time",
        "-".repeat(DEPTH)
    );
    assert_eq!(lines[DEPTH - 1], last);
}

#[rstest]
fn test_report_is_repeatable(mut tracer: TraceController<ManualClock>) {
    record_request(&mut tracer);
    assert_eq!(tracer.to_report(), tracer.to_report());
    assert_eq!(tracer.report().to_string(), tracer.to_report());
}
