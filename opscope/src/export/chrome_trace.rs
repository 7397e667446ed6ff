//! Chrome Trace Event Format export.
//!
//! Converts a finished measurement window into the JSON trace format
//! understood by chrome://tracing, Perfetto and Speedscope: one complete
//! (`ph: "X"`) event per finished operator event, with microsecond
//! timestamps relative to the window epoch and one timeline row per
//! recording thread.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Write;

use opscope_common::ProfileRecord;

use crate::domain::{ExportError, OperatorIndex};
use crate::plan::NodeSource;
use crate::profiling::EventProfiler;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Chrome Trace Event format
/// Spec: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize)]
struct ChromeTraceEvent {
    /// Event name (operator name when resolvable, otherwise the raw tag)
    name: String,
    /// Category for filtering/coloring
    cat: String,
    /// Phase: "X" = complete, "M" = metadata
    ph: String,
    /// Timestamp in microseconds
    ts: f64,
    /// Duration in microseconds ("X" events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<f64>,
    /// Process ID
    pid: u32,
    /// Thread ID (the profiler's thread registration index)
    tid: u32,
    /// Optional arguments (metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<HashMap<String, JsonValue>>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: String,
}

/// Chrome trace exporter for timeline visualization
#[derive(Debug)]
pub struct ChromeTraceExporter {
    /// Collected trace events
    events: Vec<ChromeTraceEvent>,
    pid: u32,
}

impl Default for ChromeTraceExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeTraceExporter {
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new(), pid: std::process::id() }
    }

    /// Add every finished event of a profiler's window.
    ///
    /// Open events are left to [`EventProfiler::write_to_stream`] to flag;
    /// the timeline view only shows completed spans.
    pub fn add_window(&mut self, profiler: &EventProfiler, names: Option<&dyn NodeSource>) {
        let epoch = profiler.epoch();
        profiler.visit_containers(|thread_index, container| {
            for (tag, line) in container.lines() {
                for event in line {
                    let Some(duration_secs) = event.duration_secs() else { continue };
                    let ts = event.start_time.saturating_duration_since(epoch).as_secs_f64()
                        * MICROS_PER_SEC;
                    self.events.push(complete_event(
                        resolve_name(tag, names),
                        ts,
                        duration_secs * MICROS_PER_SEC,
                        self.pid,
                        thread_index.0,
                        event.payload.0 as u64,
                    ));
                }
            }
        });
    }

    /// Add parsed export records (the offline path).
    pub fn add_records(&mut self, records: &[ProfileRecord], names: Option<&dyn NodeSource>) {
        for record in records {
            self.events.push(complete_event(
                resolve_name(&record.tag, names),
                record.start_secs * MICROS_PER_SEC,
                record.duration_secs() * MICROS_PER_SEC,
                self.pid,
                record.thread_index,
                record.payload,
            ));
        }
    }

    /// Export the trace to any writer (file, stdout, buffer, etc.)
    ///
    /// # Errors
    ///
    /// [`ExportError::Json`] when serialization fails.
    pub fn export<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut all_events = self.events.clone();

        // One thread-name metadata row per distinct (pid, tid)
        let mut threads: Vec<(u32, u32)> =
            self.events.iter().map(|event| (event.pid, event.tid)).collect();
        threads.sort_unstable();
        threads.dedup();

        for (pid, tid) in threads {
            let mut args = HashMap::new();
            args.insert("name".to_string(), serde_json::json!(format!("Worker {tid}")));
            all_events.push(ChromeTraceEvent {
                name: "thread_name".to_string(),
                cat: String::new(),
                ph: "M".to_string(),
                ts: 0.0,
                dur: None,
                pid,
                tid,
                args: Some(args),
            });
        }

        let trace =
            ChromeTrace { trace_events: all_events, display_time_unit: "ms".to_string() };
        serde_json::to_writer_pretty(writer, &trace)?;
        Ok(())
    }

    /// Get the number of events collected
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

fn resolve_name(tag: &str, names: Option<&dyn NodeSource>) -> String {
    if let (Some(names), Some(op)) = (names, OperatorIndex::from_tag(tag)) {
        if op.0 < names.node_count() {
            return names.node_name(op.0).to_string();
        }
    }
    tag.to_string()
}

fn complete_event(
    name: String,
    ts: f64,
    dur: f64,
    pid: u32,
    tid: u32,
    payload: u64,
) -> ChromeTraceEvent {
    let mut args = HashMap::new();
    args.insert("payload".to_string(), serde_json::json!(payload));
    ChromeTraceEvent {
        name,
        cat: "operator".to_string(),
        ph: "X".to_string(),
        ts,
        dur: Some(dur),
        pid,
        tid,
        args: Some(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanGraph;

    fn sample_records() -> Vec<ProfileRecord> {
        vec![
            ProfileRecord {
                timestamp: "2026-08-07 00:00:00".to_string(),
                thread_index: 0,
                tag: "0".to_string(),
                payload: 0,
                start_secs: 0.0,
                end_secs: 0.05,
            },
            ProfileRecord {
                timestamp: "2026-08-07 00:00:00".to_string(),
                thread_index: 1,
                tag: "1".to_string(),
                payload: 1,
                start_secs: 0.1,
                end_secs: 0.25,
            },
        ]
    }

    #[test]
    fn test_export_creates_valid_json() {
        let mut exporter = ChromeTraceExporter::new();
        exporter.add_records(&sample_records(), None);

        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert!(parsed.get("traceEvents").is_some());
        assert_eq!(parsed["displayTimeUnit"], "ms");
    }

    #[test]
    fn test_complete_events_carry_microsecond_spans() {
        let mut exporter = ChromeTraceExporter::new();
        exporter.add_records(&sample_records(), None);
        assert_eq!(exporter.event_count(), 2);

        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        let complete: Vec<&serde_json::Value> = parsed["traceEvents"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|event| event["ph"] == "X")
            .collect();
        assert_eq!(complete.len(), 2);
        assert_eq!(complete[0]["dur"].as_f64().unwrap(), 50_000.0);
        assert_eq!(complete[1]["ts"].as_f64().unwrap(), 100_000.0);
    }

    #[test]
    fn test_node_names_resolved_from_plan() {
        let plan = PlanGraph::new(vec!["TableScan".to_string(), "HashJoin".to_string()]);
        let mut exporter = ChromeTraceExporter::new();
        exporter.add_records(&sample_records(), Some(&plan));

        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("TableScan"));
        assert!(text.contains("HashJoin"));
    }

    #[test]
    fn test_thread_name_metadata_rows() {
        let mut exporter = ChromeTraceExporter::new();
        exporter.add_records(&sample_records(), None);

        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let metadata: Vec<&serde_json::Value> = parsed["traceEvents"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|event| event["ph"] == "M")
            .collect();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata[0]["args"]["name"], "Worker 0");
    }

    #[test]
    fn test_window_export_skips_open_events() {
        let profiler = EventProfiler::new();
        let handle = profiler.container();
        handle.start_event("0");
        handle.end_event("0").unwrap();
        handle.start_event("0");

        let mut exporter = ChromeTraceExporter::new();
        exporter.add_window(&profiler, None);
        assert_eq!(exporter.event_count(), 1);
    }
}
