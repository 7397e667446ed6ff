//! Visualization of the execution-plan DAG
//!
//! Renders the plan annotated with a window's aggregated timings as a DOT
//! (Graphviz) text block. The output text is a committed contract consumed by
//! external rendering tools, not an internal detail.

pub mod dot;

pub use dot::DagVisualizer;
