//! Layered auto-layout for drawing the task DAG.
//!
//! # Pipeline
//!
//! 1. **Layering**: sinks sit on layer 0; every other task sits one layer
//!    beyond its furthest successor, so layers grow upstream.
//! 2. **Crossing reduction**: layers are ordered from 0 upward. Within a
//!    layer, tasks sort by barycenter (mean in-layer index of their
//!    successors, `+∞` with none), then by name, then by snapshot order.
//! 3. **Coordinates**: `x = −layer * h_gap`, `y = index * v_gap`, and a
//!    greedy pass pushes `y` down by `v_gap` until the task is clear of
//!    every task already placed.
//!
//! One pass, deterministic, not optimal.

use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::error::PlanError;
use crate::graph::GraphModel;
use crate::model::{Edge, Node, Position};

/// Default horizontal distance between layers.
pub const DEFAULT_H_GAP: f64 = 280.0;
/// Default vertical distance between tasks in a layer.
pub const DEFAULT_V_GAP: f64 = 110.0;

/// Spacing used by [`auto_layout`]. Both gaps double as the minimum
/// separation between any two placed tasks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub h_gap: f64,
    pub v_gap: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            h_gap: DEFAULT_H_GAP,
            v_gap: DEFAULT_V_GAP,
        }
    }
}

impl LayoutOptions {
    fn validate(&self) -> Result<(), PlanError> {
        for (name, gap) in [("h_gap", self.h_gap), ("v_gap", self.v_gap)] {
            if !gap.is_finite() || gap <= 0.0 {
                return Err(PlanError::InvalidSettings(format!(
                    "{name} must be a positive number, got {gap}"
                )));
            }
        }
        Ok(())
    }
}

/// Lay out `nodes`, returning copies (in input order) with `position` set.
///
/// # Errors
///
/// - [`PlanError::InvalidSettings`] if a gap is not positive and finite.
/// - Any [`GraphModel::build`] error (cycles, dangling edges, duplicates).
#[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
pub fn auto_layout(
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
) -> Result<Vec<Node>, PlanError> {
    options.validate()?;
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    let graph = GraphModel::build(nodes, edges)?;
    let layer = assign_layers(&graph);
    let layer_count = layer.iter().max().map_or(0, |&max| max + 1);

    let mut buckets: Vec<Vec<NodeIndex>> = vec![Vec::new(); layer_count];
    for (i, &l) in layer.iter().enumerate() {
        buckets[l].push(NodeIndex::new(i));
    }

    let mut slot: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut bary: Vec<f64> = vec![f64::INFINITY; nodes.len()];
    let mut positions: Vec<Option<Position>> = vec![None; nodes.len()];
    let mut placed: Vec<Position> = Vec::with_capacity(nodes.len());

    for (l, mut members) in buckets.into_iter().enumerate() {
        for &v in &members {
            bary[v.index()] = barycenter(&graph, &slot, v);
        }
        // Stable sort: equal keys keep snapshot order.
        members.sort_by(|&a, &b| {
            bary[a.index()]
                .total_cmp(&bary[b.index()])
                .then_with(|| nodes[a.index()].name.cmp(&nodes[b.index()].name))
        });

        for (i, &v) in members.iter().enumerate() {
            let pos = place(&placed, l, i, options);
            placed.push(pos);
            positions[v.index()] = Some(pos);
            slot[v.index()] = Some(i);
        }
    }

    debug!(layers = layer_count, "auto layout computed");

    Ok(nodes
        .iter()
        .zip(positions)
        .map(|(node, position)| Node {
            position,
            ..node.clone()
        })
        .collect())
}

/// Layer number per node (indexed by snapshot position).
///
/// Sinks are layer 0; `layer(v) = max(layer(s) + 1)` over successors `s`.
#[must_use]
pub fn assign_layers(graph: &GraphModel) -> Vec<usize> {
    let mut layer = vec![0usize; graph.node_count()];
    for &v in graph.reverse_topological_order() {
        layer[v.index()] = graph
            .successors(v)
            .iter()
            .map(|s| layer[s.index()] + 1)
            .max()
            .unwrap_or(0);
    }
    layer
}

/// Mean in-layer index of `v`'s successors; `+∞` for a sink.
#[allow(clippy::cast_precision_loss)]
fn barycenter(graph: &GraphModel, slot: &[Option<usize>], v: NodeIndex) -> f64 {
    let succ = graph.successors(v);
    if succ.is_empty() {
        return f64::INFINITY;
    }
    let sum: usize = succ.iter().map(|s| slot[s.index()].unwrap_or(0)).sum();
    sum as f64 / succ.len() as f64
}

/// First free slot at or below row `index` of layer `layer`.
#[allow(clippy::cast_precision_loss)]
fn place(placed: &[Position], layer: usize, index: usize, options: &LayoutOptions) -> Position {
    // Subtracting from 0.0 keeps layer 0 at +0.0.
    let x = 0.0 - layer as f64 * options.h_gap;
    let mut y = index as f64 * options.v_gap;
    while placed
        .iter()
        .any(|p| (p.x - x).abs() < options.h_gap && (p.y - y).abs() < options.v_gap)
    {
        y += options.v_gap;
    }
    Position { x, y }
}
