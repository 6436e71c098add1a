#![allow(dead_code)]

use chainplan_core::{Edge, Node, ProjectSettings};
use chrono::NaiveDate;
use proptest::prelude::*;

/// A generated acyclic project. Edges always run from a lower rank to a
/// higher one; `nodes` is shuffled so snapshot order differs from rank.
#[derive(Debug, Clone)]
pub struct Dag {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn arb_effort() -> impl Strategy<Value = f64> {
    (0u32..=80).prop_map(|half_hours| f64::from(half_hours) / 2.0)
}

pub fn arb_dag(max_nodes: usize) -> impl Strategy<Value = Dag> {
    (1..=max_nodes)
        .prop_flat_map(|n| {
            let efforts = prop::collection::vec(arb_effort(), n);
            let pairs = prop::collection::vec((0..n, 0..n), 0..=n * 2);
            (Just(n), efforts, pairs)
        })
        .prop_flat_map(|(n, efforts, pairs)| {
            let nodes: Vec<Node> = efforts
                .iter()
                .enumerate()
                .map(|(i, &effort)| Node::new(format!("n{i}"), format!("Task {}", n - i), effort))
                .collect();
            let edges: Vec<Edge> = pairs
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| {
                    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                    Edge::between(format!("n{lo}"), format!("n{hi}"))
                })
                .collect();
            (Just(nodes).prop_shuffle(), Just(edges))
        })
        .prop_map(|(nodes, edges)| Dag { nodes, edges })
}

pub fn arb_settings() -> impl Strategy<Value = ProjectSettings> {
    (0u32..=10, any::<bool>(), 1u32..=10, prop::sample::select(vec![4.0, 6.0, 8.0, 10.0]))
        .prop_map(|(buffer_half_days, shrink, ratio_tenths, hours_per_day)| {
            let mut settings = ProjectSettings::new(
                "generated",
                NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"),
            );
            settings.project_buffer_days = f64::from(buffer_half_days) / 2.0;
            settings.use_fifty_pct_estimate = shrink;
            settings.shrink_ratio = f64::from(ratio_tenths) / 10.0;
            settings.hours_per_day = hours_per_day;
            settings
        })
}
