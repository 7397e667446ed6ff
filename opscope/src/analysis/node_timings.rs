//! Per-node timing aggregation.
//!
//! Correlates recorded events with plan nodes: the event tag encodes the
//! originating node index. Summed durations are turned into an elapsed-time
//! estimate per node by an [`ElapsedPolicy`], and each node's share of the
//! total drives the annotated graph rendering.
//!
//! The default policy divides a node's summed duration by the number of
//! threads that contributed events in the window. Under uneven parallelism
//! (one node touched by a single thread, another by many) this is an
//! approximation of wall-clock cost, not a measurement; it is kept behind the
//! trait so callers can substitute their own estimate.

// Share and average computations intentionally convert usize to f64
#![allow(clippy::cast_precision_loss)]

use std::collections::HashSet;

use log::warn;
use opscope_common::ProfileRecord;

use crate::domain::OperatorIndex;
use crate::profiling::{EventInfo, EventProfiler};

/// Turns per-node duration sums into an elapsed-time estimate.
pub trait ElapsedPolicy {
    fn per_node_elapsed(&self, summed_secs: &[f64], contributing_threads: usize) -> Vec<f64>;
}

/// Default policy: summed duration averaged over contributing threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadAveraged;

impl ElapsedPolicy for ThreadAveraged {
    fn per_node_elapsed(&self, summed_secs: &[f64], contributing_threads: usize) -> Vec<f64> {
        if contributing_threads == 0 {
            return vec![0.0; summed_secs.len()];
        }
        let threads = contributing_threads as f64;
        summed_secs.iter().map(|sum| sum / threads).collect()
    }
}

/// Aggregated timings for every node of one plan, over one window.
#[derive(Debug, Clone)]
pub struct NodeTimings {
    elapsed_secs: Vec<f64>,
    share: Vec<f64>,
    total_secs: f64,
    contributing_threads: usize,
}

impl NodeTimings {
    /// Aggregate a live profiler's window with the default policy.
    ///
    /// Must run only after the measured window has ended.
    #[must_use]
    pub fn from_profiler(profiler: &EventProfiler, node_count: usize) -> Self {
        Self::from_profiler_with_policy(profiler, node_count, &ThreadAveraged)
    }

    /// Aggregate a live profiler's window with a caller-supplied policy.
    #[must_use]
    pub fn from_profiler_with_policy(
        profiler: &EventProfiler,
        node_count: usize,
        policy: &dyn ElapsedPolicy,
    ) -> Self {
        let mut summed = vec![0.0; node_count];
        let mut contributing = 0usize;
        profiler.visit_containers(|_, container| {
            if !container.is_empty() {
                contributing += 1;
            }
            for (tag, line) in container.lines() {
                let Some(node) = parse_node_tag(tag, node_count) else { continue };
                summed[node.0] += line.iter().filter_map(EventInfo::duration_secs).sum::<f64>();
            }
        });
        Self::from_sums(summed, contributing, policy)
    }

    /// Aggregate parsed export records (the offline path) with the default
    /// policy.
    #[must_use]
    pub fn from_records(records: &[ProfileRecord], node_count: usize) -> Self {
        Self::from_records_with_policy(records, node_count, &ThreadAveraged)
    }

    /// Aggregate parsed export records with a caller-supplied policy.
    #[must_use]
    pub fn from_records_with_policy(
        records: &[ProfileRecord],
        node_count: usize,
        policy: &dyn ElapsedPolicy,
    ) -> Self {
        let mut summed = vec![0.0; node_count];
        let mut threads = HashSet::new();
        for record in records {
            threads.insert(record.thread_index);
            let Some(node) = parse_node_tag(&record.tag, node_count) else { continue };
            summed[node.0] += record.duration_secs();
        }
        Self::from_sums(summed, threads.len(), policy)
    }

    fn from_sums(summed: Vec<f64>, contributing_threads: usize, policy: &dyn ElapsedPolicy) -> Self {
        let elapsed_secs = policy.per_node_elapsed(&summed, contributing_threads);
        let total_secs: f64 = elapsed_secs.iter().sum();
        // A window with no elapsed time yields all-zero shares, never NaN.
        let share = elapsed_secs
            .iter()
            .map(|&secs| if total_secs > 0.0 { secs / total_secs } else { 0.0 })
            .collect();
        Self { elapsed_secs, share, total_secs, contributing_threads }
    }

    /// Estimated elapsed seconds per node, indexed by node index.
    #[must_use]
    pub fn elapsed_secs(&self) -> &[f64] {
        &self.elapsed_secs
    }

    /// Each node's fraction of the total elapsed time (0.0 - 1.0).
    #[must_use]
    pub fn share(&self) -> &[f64] {
        &self.share
    }

    /// Sum of per-node elapsed estimates.
    #[must_use]
    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    /// Number of distinct threads that contributed events.
    #[must_use]
    pub fn contributing_threads(&self) -> usize {
        self.contributing_threads
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.elapsed_secs.len()
    }
}

/// A tag names a node only if it parses as an in-range index; anything else
/// belongs to a non-operator timeline and is skipped.
fn parse_node_tag(tag: &str, node_count: usize) -> Option<OperatorIndex> {
    match OperatorIndex::from_tag(tag) {
        Some(node) if node.0 < node_count => Some(node),
        Some(node) => {
            warn!("event tag {node} is outside the plan ({node_count} nodes), skipping");
            None
        }
        None => None,
    }
}
