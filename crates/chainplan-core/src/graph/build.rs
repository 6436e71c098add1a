//! Graph construction from snapshot nodes and edges.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A finishes before B starts". Successor lists point
//! downstream (toward the deliverable), predecessor lists upstream.
//!
//! ## Indexing
//!
//! Every node gets a dense petgraph [`NodeIndex`] equal to its position in
//! the snapshot's node array. Per-node data elsewhere in the engine lives in
//! plain `Vec`s indexed by `idx.index()`.
//!
//! ## Parallel Edges
//!
//! Repeated `(source, target)` pairs are redundant and collapse to a single
//! graph edge. Successor and predecessor lists keep first-insertion order.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use super::order::{cycle_members, kahn_order};
use crate::error::PlanError;
use crate::model::{Edge, Node};

// ---------------------------------------------------------------------------
// GraphModel
// ---------------------------------------------------------------------------

/// A validated task DAG.
///
/// Nodes are task IDs. Construction fails on duplicate IDs, dangling edges,
/// self-loops and cycles, so a `GraphModel` value is always acyclic.
#[derive(Debug)]
pub struct GraphModel {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    successors: Vec<Vec<NodeIndex>>,
    predecessors: Vec<Vec<NodeIndex>>,
    topo: Vec<NodeIndex>,
    reverse_topo: Vec<NodeIndex>,
    content_hash: String,
}

impl GraphModel {
    /// Build and validate the graph for `nodes` and `edges`.
    ///
    /// # Errors
    ///
    /// - [`PlanError::DuplicateNode`] if two nodes share an ID.
    /// - [`PlanError::DanglingEdge`] if an edge endpoint is not a node.
    /// - [`PlanError::CycleDetected`] for a self-loop or any cycle.
    #[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Result<Self, PlanError> {
        let mut graph = DiGraph::<String, ()>::with_capacity(nodes.len(), edges.len());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if node_map.contains_key(&node.id) {
                return Err(PlanError::DuplicateNode(node.id.clone()));
            }
            let idx = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), idx);
        }

        let mut successors = vec![Vec::new(); nodes.len()];
        let mut predecessors = vec![Vec::new(); nodes.len()];

        for edge in edges {
            let source = lookup(&node_map, edge, &edge.source)?;
            let target = lookup(&node_map, edge, &edge.target)?;

            if source == target {
                return Err(PlanError::CycleDetected {
                    members: vec![edge.source.clone()],
                });
            }

            if !graph.contains_edge(source, target) {
                graph.add_edge(source, target, ());
                successors[source.index()].push(target);
                predecessors[target.index()].push(source);
            }
        }

        let topo = kahn_order(&successors, &predecessors);
        if topo.len() < nodes.len() {
            let members = cycle_members(&graph);
            debug!(?members, "cycle detected during topological sort");
            return Err(PlanError::CycleDetected { members });
        }
        let reverse_topo = kahn_order(&predecessors, &successors);

        let content_hash = compute_edge_hash(&graph);
        debug!(
            edges = graph.edge_count(),
            hash = %content_hash,
            "dependency graph built"
        );

        Ok(Self {
            graph,
            node_map,
            successors,
            predecessors,
            topo,
            reverse_topo,
            content_hash,
        })
    }

    /// Return the number of nodes (tasks) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up the `NodeIndex` for a task ID.
    #[must_use]
    pub fn node_index(&self, task_id: &str) -> Option<NodeIndex> {
        self.node_map.get(task_id).copied()
    }

    /// Return the task ID for a node index.
    ///
    /// # Panics
    ///
    /// Panics if `idx` did not come from this graph.
    #[must_use]
    pub fn task_id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Direct successors of `idx` in edge insertion order.
    #[must_use]
    pub fn successors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.successors[idx.index()]
    }

    /// Direct predecessors of `idx` in edge insertion order.
    #[must_use]
    pub fn predecessors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.predecessors[idx.index()]
    }

    /// Kahn order from sources: every edge's source precedes its target.
    #[must_use]
    pub fn topological_order(&self) -> &[NodeIndex] {
        &self.topo
    }

    /// Kahn order from sinks: every edge's target precedes its source.
    #[must_use]
    pub fn reverse_topological_order(&self) -> &[NodeIndex] {
        &self.reverse_topo
    }

    /// Task IDs in [`GraphModel::topological_order`].
    #[must_use]
    pub fn topological_ids(&self) -> Vec<&str> {
        self.topo.iter().map(|&idx| self.task_id(idx)).collect()
    }

    /// Nodes with no incoming edge, in snapshot order.
    #[must_use]
    pub fn sources(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|idx| self.predecessors[idx.index()].is_empty())
            .collect()
    }

    /// Nodes with no outgoing edge, in snapshot order.
    #[must_use]
    pub fn sinks(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|idx| self.successors[idx.index()].is_empty())
            .collect()
    }

    /// Number of weakly connected components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }

    /// BLAKE3 fingerprint of the deduplicated edge set (`blake3:<hex>`).
    ///
    /// Independent of edge IDs and edge order.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn lookup(
    node_map: &HashMap<String, NodeIndex>,
    edge: &Edge,
    endpoint: &str,
) -> Result<NodeIndex, PlanError> {
    node_map
        .get(endpoint)
        .copied()
        .ok_or_else(|| PlanError::DanglingEdge {
            edge_id: edge.id.clone(),
            node_id: endpoint.to_string(),
        })
}

/// Compute a BLAKE3 hash of the sorted edge list.
fn compute_edge_hash(graph: &DiGraph<String, ()>) -> String {
    let mut pairs: Vec<(&str, &str)> = graph
        .raw_edges()
        .iter()
        .map(|e| (graph[e.source()].as_str(), graph[e.target()].as_str()))
        .collect();
    pairs.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for (source, target) in pairs {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
