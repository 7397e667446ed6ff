//! # Shared Profile Record Format (engine exporter ↔ offline tooling)
//!
//! Defines the flat record emitted for every finished profiling event, together
//! with its text line format. The in-engine exporter writes these lines at the
//! end of a measurement window; the offline render tool parses them back to
//! recompute per-operator timings without access to the live profiler.
//!
//! ## Line Format
//!
//! One record per line, six comma-separated fields:
//!
//! ```text
//! <timestamp>,<thread_index>,<tag>,<payload>,<start_secs>,<end_secs>
//! 2026-08-07 14:03:21,0,3,3,0.000214938000,0.018530114000
//! ```
//!
//! - `timestamp` — wall-clock time of the export itself, identical for every
//!   line of one export pass
//! - `thread_index` — dense per-window index assigned at thread registration
//! - `tag` — event timeline key; for operator events this is the plan node
//!   index. Tags containing commas are not representable.
//! - `payload` — auxiliary numeric identifier carried by the event
//! - `start_secs` / `end_secs` — seconds since the window epoch

use thiserror::Error;

/// Number of comma-separated fields in a record line.
pub const RECORD_FIELDS: usize = 6;

/// A single finished profiling event in flat export form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    /// Wall-clock timestamp of the export pass that produced this line.
    pub timestamp: String,
    /// Registration-order index of the recording thread.
    pub thread_index: u32,
    /// Event timeline key (plan node index for operator events).
    pub tag: String,
    /// Auxiliary numeric identifier attached to the event.
    pub payload: u64,
    /// Event start, seconds since the window epoch.
    pub start_secs: f64,
    /// Event end, seconds since the window epoch.
    pub end_secs: f64,
}

/// Failure to parse a record line.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("expected {RECORD_FIELDS} comma-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid {field} field {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl ProfileRecord {
    /// Format this record as one export line (no trailing newline).
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{:.12},{:.12}",
            self.timestamp, self.thread_index, self.tag, self.payload, self.start_secs, self.end_secs
        )
    }

    /// Parse a single export line.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the line does not have exactly
    /// [`RECORD_FIELDS`] fields or a numeric field fails to parse.
    pub fn parse_csv_line(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != RECORD_FIELDS {
            return Err(RecordError::FieldCount(fields.len()));
        }

        Ok(Self {
            timestamp: fields[0].to_string(),
            thread_index: parse_field("thread_index", fields[1])?,
            tag: fields[2].to_string(),
            payload: parse_field("payload", fields[3])?,
            start_secs: parse_field("start_secs", fields[4])?,
            end_secs: parse_field("end_secs", fields[5])?,
        })
    }

    /// Parse a whole export stream, skipping blank lines.
    ///
    /// # Errors
    ///
    /// Returns the first line-level [`RecordError`] encountered.
    pub fn parse_lines(input: &str) -> Result<Vec<Self>, RecordError> {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Self::parse_csv_line)
            .collect()
    }

    /// Event duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, RecordError> {
    value.parse().map_err(|_| RecordError::InvalidField { field, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ProfileRecord {
        ProfileRecord {
            timestamp: "2026-08-07 14:03:21".to_string(),
            thread_index: 2,
            tag: "5".to_string(),
            payload: 5,
            start_secs: 0.25,
            end_secs: 0.75,
        }
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record();
        let line = record.to_csv_line();
        let parsed = ProfileRecord::parse_csv_line(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_line_has_six_fields() {
        let line = sample_record().to_csv_line();
        assert_eq!(line.split(',').count(), RECORD_FIELDS);
        assert!(line.starts_with("2026-08-07 14:03:21,2,5,5,"));
    }

    #[test]
    fn test_field_count_error() {
        let err = ProfileRecord::parse_csv_line("a,b,c").unwrap_err();
        assert!(matches!(err, RecordError::FieldCount(3)));
    }

    #[test]
    fn test_invalid_numeric_field() {
        let err =
            ProfileRecord::parse_csv_line("ts,not-a-number,3,0,0.0,1.0").unwrap_err();
        assert!(err.to_string().contains("thread_index"));
    }

    #[test]
    fn test_parse_lines_skips_blanks() {
        let input = format!("{}\n\n{}\n", sample_record().to_csv_line(), sample_record().to_csv_line());
        let records = ProfileRecord::parse_lines(&input).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_duration() {
        let record = sample_record();
        assert!((record.duration_secs() - 0.5).abs() < f64::EPSILON);
    }
}
