//! Structured error types for opscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::ThreadIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("no open event to finish for tag {tag:?}")]
    NoOpenEvent { tag: String },

    #[error("no recorded event for tag {tag:?}")]
    NoSuchEvent { tag: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    /// A start without a matching end reached the exporter. This is an
    /// instrumentation bug in the caller, not a data condition: the export
    /// aborts instead of silently dropping the event.
    #[error("unfinished profiling event for tag {tag:?} on thread {thread_index}")]
    UnfinishedEvent { thread_index: ThreadIndex, tag: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("edge {src} -> {dst} references a node outside the plan ({node_count} nodes)")]
    EdgeOutOfRange { src: usize, dst: usize, node_count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
