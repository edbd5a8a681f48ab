mod common;

use common::*;
use easyprof_studio::aggregator::{build_collapsed_stacks, total_weight};
use easyprof_studio::analyzer::{Analyzer, IssueKind, Severity};
use easyprof_studio::flamegraph::generate_flamegraph;
use easyprof_studio::output::{read_report, write_report, AnalysisReport};
use easyprof_studio::parser::{decode, Capture, ReadOptions};
use easyprof_studio::session::Session;
use easyprof_studio::utils::error::SessionError;
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::time::Duration;

fn load(writer: &CaptureWriter) -> Capture {
    decode(Cursor::new(writer.bytes()), &ReadOptions::default()).unwrap()
}

#[test]
fn test_single_long_block_is_one_high_issue() {
    let capture = load(
        &CaptureWriter::new(V2_1_0)
            .span(0, 10_000 * MS)
            .descriptor(1, "load_level", "level.cpp", 88)
            .thread(ThreadSpec::new(1, "main").event(0, 600 * MS, 1)),
    );

    let issues = Analyzer::new(&capture).issues();
    let long: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::LongBlockingOperation)
        .collect();

    assert_eq!(long.len(), 1);
    assert_eq!(long[0].severity, Severity::High);
    assert_eq!(long[0].location, "level.cpp:88");
    assert_eq!(long[0].duration, Some(Duration::from_millis(600)));
    assert_eq!(long[0].thread_name.as_deref(), Some("main"));
}

#[test]
fn test_thread_imbalance_detected_once() {
    let capture = load(
        &CaptureWriter::new(V2_1_0)
            .span(0, 10_000 * MS)
            .thread(ThreadSpec::new(1, "light").event(0, 100 * MS, 1))
            .thread(ThreadSpec::new(2, "heavy").event(0, 300 * MS, 1)),
    );

    let imbalance: Vec<_> = Analyzer::new(&capture)
        .issues()
        .into_iter()
        .filter(|i| i.kind == IssueKind::ThreadImbalance)
        .collect();
    assert_eq!(imbalance.len(), 1);
    assert_eq!(imbalance[0].location, "across all threads");
}

#[test]
fn test_mild_imbalance_not_reported() {
    let capture = load(
        &CaptureWriter::new(V2_1_0)
            .span(0, 10_000 * MS)
            .thread(ThreadSpec::new(1, "a").event(0, 100 * MS, 1))
            .thread(ThreadSpec::new(2, "b").event(0, 150 * MS, 1)),
    );

    assert!(Analyzer::new(&capture)
        .issues()
        .iter()
        .all(|i| i.kind != IssueKind::ThreadImbalance));
}

#[test]
fn test_excessive_context_switches_from_decoded_capture() {
    let writer = CaptureWriter::new(V2_1_0).thread(ThreadSpec::new(9, "io").switches(1001));

    let report = Analyzer::new(&load(&writer)).issue_report();
    assert_eq!(report.total_issues, 1);
    assert_eq!(report.by_severity.medium[0].kind, IssueKind::ExcessiveContextSwitches);
    assert_eq!(report.by_severity.medium[0].location, "io");

    // skipped switches are never counted
    let fast = decode(Cursor::new(writer.bytes()), &ReadOptions::fast()).unwrap();
    assert_eq!(Analyzer::new(&fast).issue_report().total_issues, 0);
}

#[test]
fn test_queries_on_nested_capture() {
    let capture = load(
        &CaptureWriter::new(V2_1_0)
            .span(0, 100 * MS)
            .descriptor(1, "frame", "main.cpp", 1)
            .descriptor(2, "draw", "render.cpp", 2)
            .thread(
                ThreadSpec::new(1, "main")
                    .event(10 * MS, 30 * MS, 2)
                    .event(40 * MS, 50 * MS, 2)
                    .event(0, 60 * MS, 1),
            )
            .thread(ThreadSpec::new(2, "worker").event(0, 20 * MS, 2)),
    );
    let analyzer = Analyzer::new(&capture);

    let slowest = analyzer.slowest_events(2);
    assert_eq!(slowest.len(), 2);
    assert_eq!(slowest[0].name, "frame");
    assert_eq!(slowest[0].depth, 0);
    assert_eq!(slowest[1].duration, Duration::from_millis(20));

    let threads = analyzer.thread_statistics();
    assert_eq!(threads[0].thread_name, "main");
    assert_eq!(threads[0].total_duration, Duration::from_millis(60));
    assert_eq!(threads[0].block_count, 3);
    assert_eq!(threads[0].percent_of_total, 60.0);

    let hotspots = analyzer.hotspots(10);
    assert_eq!(hotspots.len(), 2);
    assert_eq!(hotspots[0].name, "frame");
    assert_eq!(hotspots[1].name, "draw");
    assert_eq!(hotspots[1].call_count, 3);
    assert_eq!(hotspots[1].total_duration, Duration::from_millis(50));
    assert_eq!(hotspots[1].avg_duration, Duration::from_nanos(50 * MS / 3));
    assert_eq!(hotspots[1].location(), "draw (render.cpp:2)");
}

#[test]
fn test_overlapping_records_count_once_per_root() {
    let writer = CaptureWriter::new(V2_1_0).span(0, 1000 * MS).thread(
        ThreadSpec::new(1, "main")
            .event(0, 100 * MS, 1)
            .event(50 * MS, 60 * MS, 2)
            .event(200 * MS, 210 * MS, 1),
    );

    // The enclosed record nests, so the thread total counts the outer span only
    let capture = load(&writer);
    assert_eq!(capture.threads[&1].blocks.len(), 2);
    let stats = Analyzer::new(&capture).thread_statistics();
    assert_eq!(stats[0].total_duration, Duration::from_millis(110));
    assert_eq!(stats[0].block_count, 3);

    // Sampling counts top-level events; the nested record travels with its root
    let sampled = decode(Cursor::new(writer.bytes()), &ReadOptions::new().with_sample_every(2)).unwrap();
    assert_eq!(sampled.threads[&1].blocks.len(), 1);
    assert_eq!(sampled.total_blocks_count, 2);
    let stats = Analyzer::new(&sampled).thread_statistics();
    assert_eq!(stats[0].total_duration, Duration::from_millis(100));
}

#[test]
fn test_collapsed_stacks_and_flamegraph() {
    let capture = load(
        &CaptureWriter::new(V2_1_0)
            .descriptor(1, "frame", "main.cpp", 1)
            .descriptor(2, "draw", "render.cpp", 2)
            .thread(ThreadSpec::new(1, "main").event(10, 30, 2).event(0, 100, 1)),
    );

    let stacks = build_collapsed_stacks(&capture);
    let lines: Vec<String> = stacks.iter().map(|s| s.to_line()).collect();
    assert_eq!(lines, vec!["main;frame 80".to_string(), "main;frame;draw 20".to_string()]);
    assert_eq!(total_weight(&stacks), 100);

    let svg = generate_flamegraph(&stacks, None).unwrap();
    assert!(svg.contains("frame"));
}

#[test]
fn test_session_load_from_file() {
    let file = CaptureWriter::new(V2_0_0)
        .thread(ThreadSpec::new(1, "main").event(0, 10, 0))
        .write_temp();

    let mut session = Session::new();
    assert!(matches!(session.analyzer(), Err(SessionError::NotLoaded)));

    let summary = session.load(file.path(), &ReadOptions::default()).unwrap();
    assert_eq!(summary.version_name, "2.0.0");
    assert_eq!(summary.threads_count, 1);
    assert_eq!(session.analyzer().unwrap().slowest_events(5).len(), 1);

    let missing = session.load("/no/such/file.prof", &ReadOptions::default());
    assert!(matches!(missing, Err(SessionError::Decode(_))));
    assert_eq!(session.source().unwrap(), file.path());
}

#[test]
fn test_report_round_trip() {
    let capture = load(
        &CaptureWriter::new(V2_1_0)
            .span(0, 1000 * MS)
            .descriptor(1, "load", "io.cpp", 7)
            .thread(ThreadSpec::new(1, "main").event(0, 600 * MS, 1))
            .bookmark(10, 0, "start"),
    );

    let report = AnalysisReport::build(&Analyzer::new(&capture), "level.prof", &ReadOptions::default(), 5);
    assert_eq!(report.summary.bookmarks_count, 1);
    assert_eq!(report.issues.by_severity.high.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/report.json");
    write_report(&report, &path).unwrap();

    let loaded = read_report(&path).unwrap();
    assert_eq!(loaded, report);
}
