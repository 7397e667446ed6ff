//! End-to-end: record a window, export the flat record stream to disk, parse
//! it back, and verify the offline analysis agrees with the live one.

use std::io::Write;

use opscope::analysis::NodeTimings;
use opscope::export::ChromeTraceExporter;
use opscope::plan::{NodeSource, PlanGraph};
use opscope::profiling::EventProfiler;
use opscope::viz::DagVisualizer;
use opscope_common::ProfileRecord;

fn recorded_window() -> EventProfiler {
    let profiler = EventProfiler::new();
    let container = profiler.container();
    for tag in ["0", "0", "1"] {
        container.start_event(tag);
        container.end_event(tag).unwrap();
    }
    profiler
}

#[test]
fn test_export_file_replays_to_same_timings() {
    let plan = PlanGraph::new(vec!["TableScan".to_string(), "Selection".to_string()]);
    let profiler = recorded_window();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut out = Vec::new();
    profiler.write_to_stream(&mut out).unwrap();
    file.write_all(&out).unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let records = ProfileRecord::parse_lines(&text).unwrap();
    assert_eq!(records.len(), 3);

    let live = NodeTimings::from_profiler(&profiler, plan.node_count());
    let replayed = NodeTimings::from_records(&records, plan.node_count());

    assert_eq!(live.contributing_threads(), replayed.contributing_threads());
    for node in 0..plan.node_count() {
        let delta = (live.elapsed_secs()[node] - replayed.elapsed_secs()[node]).abs();
        // Record lines round to 12 fractional digits.
        assert!(delta < 1e-9, "node {node}: live/replay divergence {delta}");
    }

    let dot = DagVisualizer::new(&plan).to_dot(&replayed);
    assert!(dot.contains("TableScan"));
    assert!(dot.contains("Selection"));
}

#[test]
fn test_chrome_trace_written_from_records() {
    let plan = PlanGraph::new(vec!["TableScan".to_string(), "Selection".to_string()]);
    let profiler = recorded_window();

    let mut out = Vec::new();
    profiler.write_to_stream(&mut out).unwrap();
    let records = ProfileRecord::parse_lines(&String::from_utf8(out).unwrap()).unwrap();

    let mut exporter = ChromeTraceExporter::new();
    exporter.add_records(&records, Some(&plan));

    let path = tempfile::tempdir().unwrap();
    let trace_path = path.path().join("trace.json");
    exporter.export(std::fs::File::create(&trace_path).unwrap()).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&trace_path).unwrap()).unwrap();
    assert_eq!(parsed["displayTimeUnit"], "ms");
    let events = parsed["traceEvents"].as_array().unwrap();
    assert!(events.iter().any(|e| e["name"] == "TableScan"));
    assert!(events.iter().any(|e| e["ph"] == "M"));
}
