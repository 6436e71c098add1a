//! Critical chain analysis for the task graph.
//!
//! # Overview
//!
//! The critical chain is the *longest effort-weighted* path through the DAG.
//! Its length is the minimum achievable project duration: tasks off the chain
//! can slip without moving the finish, tasks on it cannot.
//!
//! # Definitions
//!
//! | Term               | Definition |
//! |--------------------|------------|
//! | effective effort   | `effort_hours * shrink_ratio` when estimate shrinking is on, else `effort_hours`. |
//! | `dist[v]`          | Heaviest effort sum over any root-to-`v` path, `v` included. |
//! | `prev[v]`          | Predecessor of `v` on that heaviest path. |
//!
//! # Algorithm
//!
//! 1. Build the [`GraphModel`]; cycles are fatal.
//! 2. Seed every root (no incoming edge) with its own effective effort.
//! 3. Relax edges in topological order:
//!    `dist[t] = max(dist[t], dist[s] + eff(t))`. `prev[t]` moves only on a
//!    strict improvement, so ties keep the earliest-seen predecessor.
//! 4. The chain ends at the first node (snapshot order) holding the global
//!    maximum `dist`, carried forward through zero-effort successors that
//!    tie it; walk `prev` back to a root for the path.
//!
//! Forests are fine: every component is relaxed the same way and only the
//! globally longest path is reported.

#![allow(clippy::module_name_repetitions)]

use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::PlanError;
use crate::graph::GraphModel;
use crate::model::{Edge, Node, NodeId, ProjectSettings};
use crate::validate::check_efforts;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of critical chain analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalChain {
    /// Task IDs on the chain, in dependency order (root first).
    pub path: Vec<NodeId>,
    /// Sum of effective effort along `path`.
    pub total_hours: f64,
}

impl CriticalChain {
    /// Number of tasks on the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Return `true` if the chain has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Compute the critical chain of `nodes`/`edges`.
///
/// `use_fifty_pct` is the analyzer-level switch for estimate shrinking; the
/// shrink ratio applies only when it and
/// [`ProjectSettings::use_fifty_pct_estimate`] are both set.
///
/// # Errors
///
/// - [`PlanError::EmptyGraph`] when `nodes` is empty.
/// - [`PlanError::InvalidSnapshot`] if any effort is negative or not finite.
/// - Any [`GraphModel::build`] error (cycles, dangling edges, duplicates).
#[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len(), use_fifty_pct))]
pub fn compute_critical_chain(
    nodes: &[Node],
    edges: &[Edge],
    settings: &ProjectSettings,
    use_fifty_pct: bool,
) -> Result<CriticalChain, PlanError> {
    if nodes.is_empty() {
        return Err(PlanError::EmptyGraph);
    }

    check_efforts(nodes)?;
    let graph = GraphModel::build(nodes, edges)?;
    let effort: Vec<f64> = nodes
        .iter()
        .map(|n| settings.effective_effort(n, use_fifty_pct))
        .collect();

    let (dist, prev) = longest_paths(&graph, &effort);

    // First maximum in snapshot order wins.
    let mut end: Option<(usize, f64)> = None;
    for (i, d) in dist.iter().enumerate() {
        if let Some(d) = *d {
            if end.is_none_or(|(_, best)| d > best) {
                end = Some((i, d));
            }
        }
    }
    let Some((end, total_hours)) = end else {
        return Err(PlanError::EmptyGraph);
    };

    let end = extend_through_ties(&graph, &dist, &prev, NodeIndex::new(end));
    let path = reconstruct_path(&graph, &prev, end);
    debug!(len = path.len(), total_hours, "critical chain computed");

    Ok(CriticalChain { path, total_hours })
}

/// Forward relaxation in topological order.
///
/// Returns `dist` and `prev` indexed by node position. On a DAG every node
/// is reachable from some root, so no `dist` entry stays `None`.
fn longest_paths(graph: &GraphModel, effort: &[f64]) -> (Vec<Option<f64>>, Vec<Option<NodeIndex>>) {
    let n = graph.node_count();
    let mut dist: Vec<Option<f64>> = vec![None; n];
    let mut prev: Vec<Option<NodeIndex>> = vec![None; n];

    for root in graph.sources() {
        dist[root.index()] = Some(effort[root.index()]);
    }

    for &v in graph.topological_order() {
        let Some(dv) = dist[v.index()] else {
            continue;
        };
        for &w in graph.successors(v) {
            let alt = dv + effort[w.index()];
            if dist[w.index()].is_none_or(|dw| alt > dw) {
                dist[w.index()] = Some(alt);
                prev[w.index()] = Some(v);
            }
        }
    }

    (dist, prev)
}

// ---------------------------------------------------------------------------
// Path reconstruction helpers
// ---------------------------------------------------------------------------

/// Walk forward from `end` along successors that continue the same chain at
/// the same `dist` (zero-effort milestones).
fn extend_through_ties(
    graph: &GraphModel,
    dist: &[Option<f64>],
    prev: &[Option<NodeIndex>],
    end: NodeIndex,
) -> NodeIndex {
    let mut current = end;
    while let Some(&next) = graph.successors(current).iter().find(|w| {
        prev[w.index()] == Some(current) && dist[w.index()] == dist[current.index()]
    }) {
        current = next;
    }
    current
}

/// Follow `prev` links from `end` back to a root, returned root-first.
fn reconstruct_path(graph: &GraphModel, prev: &[Option<NodeIndex>], end: NodeIndex) -> Vec<NodeId> {
    let mut path = vec![graph.task_id(end).to_string()];
    let mut current = end;
    while let Some(p) = prev[current.index()] {
        path.push(graph.task_id(p).to_string());
        current = p;
    }
    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
