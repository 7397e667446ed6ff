//! Execution-plan graph interfaces and a file-backed implementation.
//!
//! The visualizer does not depend on the engine's plan type. It consumes two
//! narrow read-only views: a node source (count, name by index) and an edge
//! source (dependents by index with the pipeline-breaker flag). The engine's
//! plan implements them directly; [`PlanGraph`] is the standalone
//! implementation used by the offline render tool and by synthetic test
//! graphs, loaded from a small JSON description:
//!
//! ```json
//! {
//!   "nodes": ["TableScan", "HashJoin"],
//!   "edges": [{ "src": 0, "dst": 1, "pipeline_breaker": false }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::domain::PlanError;

/// One dependency edge endpoint as seen from its source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
    /// Index of the dependent (downstream) node.
    pub index: usize,
    /// Whether the dependent must wait for full materialization upstream.
    pub is_pipeline_breaker: bool,
}

/// Read-only view of the plan's nodes.
pub trait NodeSource {
    fn node_count(&self) -> usize;
    fn node_name(&self, index: usize) -> &str;
}

/// Read-only view of the plan's dependency edges.
pub trait EdgeSource {
    /// Dependents of `index`, i.e. edges `index -> dependent`.
    fn dependents(&self, index: usize) -> &[Dependent];
}

#[derive(Debug, Deserialize)]
struct PlanFileEdge {
    src: usize,
    dst: usize,
    #[serde(default)]
    pipeline_breaker: bool,
}

#[derive(Debug, Deserialize)]
struct PlanFile {
    nodes: Vec<String>,
    #[serde(default)]
    edges: Vec<PlanFileEdge>,
}

/// An execution-plan DAG decoupled from the engine.
#[derive(Debug, Clone, Default)]
pub struct PlanGraph {
    names: Vec<String>,
    dependents: Vec<Vec<Dependent>>,
}

impl PlanGraph {
    /// A graph with the given node names and no edges.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let dependents = vec![Vec::new(); names.len()];
        Self { names, dependents }
    }

    /// Add the dependency edge `src -> dst`.
    ///
    /// # Errors
    ///
    /// [`PlanError::EdgeOutOfRange`] when either endpoint is not a node.
    pub fn add_edge(
        &mut self,
        src: usize,
        dst: usize,
        is_pipeline_breaker: bool,
    ) -> Result<(), PlanError> {
        let node_count = self.names.len();
        if src >= node_count || dst >= node_count {
            return Err(PlanError::EdgeOutOfRange { src, dst, node_count });
        }
        self.dependents[src].push(Dependent { index: dst, is_pipeline_breaker });
        Ok(())
    }

    /// Parse a plan description from its JSON text.
    ///
    /// # Errors
    ///
    /// [`PlanError::Json`] on malformed JSON, [`PlanError::EdgeOutOfRange`]
    /// on edges referencing missing nodes.
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        let file: PlanFile = serde_json::from_str(text)?;
        let mut graph = Self::new(file.nodes);
        for edge in file.edges {
            graph.add_edge(edge.src, edge.dst, edge.pipeline_breaker)?;
        }
        Ok(graph)
    }

    /// Load a plan description file.
    ///
    /// # Errors
    ///
    /// [`PlanError::Io`] on read failure, otherwise as [`Self::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl NodeSource for PlanGraph {
    fn node_count(&self) -> usize {
        self.names.len()
    }

    fn node_name(&self, index: usize) -> &str {
        &self.names[index]
    }
}

impl EdgeSource for PlanGraph {
    fn dependents(&self, index: usize) -> &[Dependent] {
        &self.dependents[index]
    }
}
