//! # opscope - Operator Event Profiler and DAG Visualizer
//!
//! opscope is a low-overhead event-tracing profiler for a parallel relational
//! query-execution engine, paired with a visualizer that correlates the
//! recorded timings with the execution plan's operator dependency graph and
//! renders an annotated DOT graph.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Engine Worker Threads                      │
//! │     (operator execution loop, externally scheduled)         │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ start_event / end_event
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   opscope (This Crate)                      │
//! │                                                             │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐   │
//! │  │  Profiling   │───▶│   Analysis   │───▶│     Viz      │   │
//! │  │ (containers) │    │ (NodeTimings)│    │  (DOT text)  │   │
//! │  └──────┬───────┘    └──────────────┘    └──────────────┘   │
//! │         │                    ▲                              │
//! │         ▼                    │                              │
//! │  ┌──────────────┐    ┌──────────────┐                       │
//! │  │    Export    │───▶│     Plan     │                       │
//! │  │ (records /   │    │ (NodeSource, │                       │
//! │  │ Chrome trace)│    │  EdgeSource) │                       │
//! │  └──────────────┘    └──────────────┘                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: the recording path. Each worker thread obtains its own
//!   event container once (the only registry-locked step) and records
//!   start/end events per operator tag without cross-thread contention.
//!   The profiler exports one flat record per finished event and resets
//!   measurement windows.
//!
//! - [`analysis`]: correlates recorded events with plan nodes and produces
//!   [`NodeTimings`](analysis::NodeTimings) - per-node elapsed estimates,
//!   total, and shares, behind a replaceable aggregation policy.
//!
//! - [`plan`]: the two narrow read-only interfaces the visualizer consumes
//!   (node and edge sources) plus a JSON-loadable standalone implementation.
//!
//! - [`viz`]: renders the annotated DAG as DOT text - the committed output
//!   contract consumed by external graph tooling.
//!
//! - [`export`]: Chrome Trace Event Format export for timeline views in
//!   chrome://tracing or Perfetto.
//!
//! - [`cli`] / [`domain`]: argument parsing for the offline render binary;
//!   newtype ids and structured errors.
//!
//! ## Measurement Windows
//!
//! A window spans from profiler creation (or the last `clear()`) to the next
//! `clear()` - typically one query execution. All exported times are seconds
//! relative to the window's epoch. Export and visualization must run after
//! the window's workers have finished recording; the profiler does not
//! police that precondition.
//!
//! ## Typical Usage
//!
//! ```
//! use opscope::analysis::NodeTimings;
//! use opscope::plan::{NodeSource, PlanGraph};
//! use opscope::profiling::EventProfiler;
//! use opscope::viz::DagVisualizer;
//!
//! let profiler = EventProfiler::new();
//!
//! // Inside a worker thread, around an operator's execution:
//! let container = profiler.container();
//! container.start_event("0");
//! // ... operator runs ...
//! container.end_event("0").unwrap();
//!
//! // At window end:
//! let plan = PlanGraph::new(vec!["TableScan".to_string()]);
//! let timings = NodeTimings::from_profiler(&profiler, plan.node_count());
//! let dot = DagVisualizer::new(&plan).to_dot(&timings);
//! assert!(dot.starts_with("digraph g {"));
//! ```

// Expose modules for testing
pub mod analysis;
pub mod cli;
pub mod domain;
pub mod export;
pub mod plan;
pub mod profiling;
pub mod viz;
