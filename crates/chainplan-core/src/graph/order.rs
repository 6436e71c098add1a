//! Kahn orderings and cycle diagnostics.
//!
//! Both orderings use a FIFO queue seeded in snapshot order, so nodes leave
//! the queue first-discovered-first-removed. The forward order consumes
//! in-degree starting from sources; the reverse order consumes out-degree
//! starting from sinks.

use std::collections::VecDeque;

use petgraph::{algo::tarjan_scc, graph::DiGraph, graph::NodeIndex};

/// Kahn's algorithm over adjacency lists.
///
/// `forward[v]` lists the nodes released when `v` is removed; `backward[v]`
/// lists the nodes that must be removed before `v`. Returns fewer than
/// `forward.len()` nodes when the graph contains a cycle.
pub(crate) fn kahn_order(
    forward: &[Vec<NodeIndex>],
    backward: &[Vec<NodeIndex>],
) -> Vec<NodeIndex> {
    let mut remaining: Vec<usize> = backward.iter().map(Vec::len).collect();
    let mut queue: VecDeque<NodeIndex> = remaining
        .iter()
        .enumerate()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(i, _)| NodeIndex::new(i))
        .collect();

    let mut order = Vec::with_capacity(forward.len());
    while let Some(v) = queue.pop_front() {
        order.push(v);
        for &w in &forward[v.index()] {
            let deg = &mut remaining[w.index()];
            *deg -= 1;
            if *deg == 0 {
                queue.push_back(w);
            }
        }
    }
    order
}

/// Task IDs of one cycle, sorted.
///
/// Picks the non-trivial strongly connected component containing the
/// lowest-indexed node so the report is stable across runs.
pub(crate) fn cycle_members(graph: &DiGraph<String, ()>) -> Vec<String> {
    let Some(scc) = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .min_by_key(|scc| scc.iter().map(|idx| idx.index()).min().unwrap_or(usize::MAX))
    else {
        return Vec::new();
    };

    let mut members: Vec<String> = scc.into_iter().map(|idx| graph[idx].clone()).collect();
    members.sort();
    members
}
