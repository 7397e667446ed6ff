//! DOT rendering of the annotated execution DAG.
//!
//! A [`DagVisualizer`] correlates one window's [`NodeTimings`] with the plan
//! graph and renders a directed-graph text block: bottom-to-top layout, one
//! statement per visible node (operator name plus a coarse time bucket),
//! dashed edges for pipeline breakers. Bookkeeping operators that carry no
//! timing insight are hidden, along with every edge touching them.
//!
//! Rendering is a pure function of the graph and the timings: no mutation,
//! no I/O.

use std::collections::{HashMap, HashSet};

use crate::analysis::NodeTimings;
use crate::plan::{EdgeSource, NodeSource};

/// Operators hidden from the rendered graph by default.
const HIDDEN_OP_NAMES: [&str; 2] = ["DestroyHashOperator", "DropTableOperator"];

/// Information of a graph node.
#[derive(Debug)]
struct NodeInfo {
    id: usize,
    labels: Vec<String>,
    color: Option<String>,
}

/// Information of a graph edge.
#[derive(Debug)]
struct EdgeInfo {
    src_node_id: usize,
    dst_node_id: usize,
    labels: Vec<String>,
    is_pipeline_breaker: bool,
}

/// Renders an execution-plan DAG annotated with per-node timings.
pub struct DagVisualizer<'a, G> {
    graph: &'a G,
    hidden_ops: HashSet<String>,
    color_map: HashMap<String, String>,
}

impl<'a, G: NodeSource + EdgeSource> DagVisualizer<'a, G> {
    #[must_use]
    pub fn new(graph: &'a G) -> Self {
        Self {
            graph,
            hidden_ops: HIDDEN_OP_NAMES.iter().map(ToString::to_string).collect(),
            color_map: HashMap::new(),
        }
    }

    /// Hide every node named `name` (and all edges touching it).
    #[must_use]
    pub fn hide_op(mut self, name: impl Into<String>) -> Self {
        self.hidden_ops.insert(name.into());
        self
    }

    /// Fill nodes named `name` with `color`.
    #[must_use]
    pub fn color_op(mut self, name: impl Into<String>, color: impl Into<String>) -> Self {
        self.color_map.insert(name.into(), color.into());
        self
    }

    /// Render the annotated DAG as DOT text.
    #[must_use]
    pub fn to_dot(&self, timings: &NodeTimings) -> String {
        let num_nodes = self.graph.node_count();

        let mut display_ops = vec![false; num_nodes];
        let mut nodes = Vec::new();
        for node_index in 0..num_nodes {
            let name = self.graph.node_name(node_index);
            if self.hidden_ops.contains(name) {
                continue;
            }
            display_ops[node_index] = true;
            let elapsed = timings.elapsed_secs().get(node_index).copied().unwrap_or(0.0);
            nodes.push(NodeInfo {
                id: node_index,
                labels: vec![name.to_string(), time_bucket(elapsed)],
                color: self.color_map.get(name).cloned(),
            });
        }

        let mut edges = Vec::new();
        for node_index in 0..num_nodes {
            if !display_ops[node_index] {
                continue;
            }
            for link in self.graph.dependents(node_index) {
                if display_ops[link.index] {
                    edges.push(EdgeInfo {
                        src_node_id: node_index,
                        dst_node_id: link.index,
                        labels: Vec::new(),
                        is_pipeline_breaker: link.is_pipeline_breaker,
                    });
                }
            }
        }

        render(&nodes, &edges)
    }
}

/// Coarse elapsed-time bucket shown as the node's second label line.
fn time_bucket(elapsed_secs: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let bucket = (elapsed_secs / 100.0).round() as i64;
    bucket.to_string()
}

fn render(nodes: &[NodeInfo], edges: &[EdgeInfo]) -> String {
    let mut graph = String::new();
    graph.push_str("digraph g {\n");
    graph.push_str("  rankdir=BT\n");
    graph.push_str("  node [penwidth=2]\n");
    graph.push_str("  edge [fontsize=16 fontcolor=gray penwidth=2]\n\n");

    for node in nodes {
        graph.push_str(&format!("  {} [ ", node.id));
        if !node.labels.is_empty() {
            graph.push_str(&format!("label=\"{}\" ", escape_label(&node.labels.join("&#10;"))));
        }
        if let Some(color) = &node.color {
            graph.push_str(&format!("style=filled fillcolor=\"{color}\" "));
        }
        graph.push_str("]\n");
    }
    graph.push('\n');

    for edge in edges {
        graph.push_str(&format!("  {} -> {} [ ", edge.src_node_id, edge.dst_node_id));
        if edge.is_pipeline_breaker {
            graph.push_str("style=dashed ");
        }
        if !edge.labels.is_empty() {
            graph.push_str(&format!("label=\"{}\" ", escape_label(&edge.labels.join("&#10;"))));
        }
        graph.push_str("]\n");
    }

    graph.push_str("}\n");
    graph
}

/// Escape characters that would terminate a quoted DOT label.
fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}
