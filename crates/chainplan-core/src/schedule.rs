//! Backward calendar scheduling from the due date.
//!
//! # Propagation rule
//!
//! Dates flow upstream from the terminal task in reverse-topological order,
//! so a task is scheduled only after every one of its successors:
//!
//! - the terminal ends at `due_date − project_buffer_days`;
//! - any other task ends at the earliest `start` among its scheduled direct
//!   successors (fan-out takes the minimum);
//! - `start = end − calendar_duration(effective effort)`.
//!
//! Fan-in is not reconciled: each predecessor derives its own window from
//! its own successors. This is not resource leveling.
//!
//! # Partial results
//!
//! Tasks from which the terminal cannot be reached (through successor
//! chains) keep `start`/`end` unset. Partial graphs are a normal editing
//! state, so this is reported in [`ScheduleResult::unscheduled`] rather than
//! raised as an error.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::calendar::{calendar_duration, terminal_end};
use crate::error::PlanError;
use crate::graph::GraphModel;
use crate::model::{Edge, Node, ProjectSettings};
use crate::validate::check_efforts;

/// Output of [`schedule_backward`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    /// Copy of every input node, in input order, with `start`/`end` set for
    /// scheduled tasks and cleared for the rest.
    pub nodes: Vec<Node>,
    /// The instant the terminal task finishes.
    pub terminal_end: NaiveDateTime,
    /// Number of tasks left without dates.
    pub unscheduled: usize,
}

/// Schedule every task that feeds `terminal_id` so the terminal finishes on
/// the buffered due date.
///
/// The shrink ratio applies when [`ProjectSettings::use_fifty_pct_estimate`]
/// is set.
///
/// # Errors
///
/// - [`PlanError::TerminalNotFound`] if `terminal_id` is not a node.
/// - [`PlanError::InvalidSnapshot`] if any effort is negative or not finite,
///   or so large that a start date falls outside the representable range.
/// - [`PlanError::InvalidSettings`] if the buffer does the same to the
///   terminal end.
/// - Any [`GraphModel::build`] error (cycles, dangling edges, duplicates).
#[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len(), terminal = terminal_id))]
pub fn schedule_backward(
    nodes: &[Node],
    edges: &[Edge],
    settings: &ProjectSettings,
    terminal_id: &str,
) -> Result<ScheduleResult, PlanError> {
    let finish = terminal_end(settings)?;
    if nodes.is_empty() {
        return Ok(ScheduleResult {
            nodes: Vec::new(),
            terminal_end: finish,
            unscheduled: 0,
        });
    }

    check_efforts(nodes)?;
    let graph = GraphModel::build(nodes, edges)?;
    let terminal = graph
        .node_index(terminal_id)
        .ok_or_else(|| PlanError::TerminalNotFound(terminal_id.to_string()))?;

    let feeds_terminal = upstream_of(&graph, terminal);

    let mut start_at: Vec<Option<NaiveDateTime>> = vec![None; nodes.len()];
    let mut end_at: Vec<Option<NaiveDateTime>> = vec![None; nodes.len()];

    for &v in graph.reverse_topological_order() {
        if !feeds_terminal[v.index()] {
            continue;
        }

        let end = if v == terminal {
            finish
        } else {
            graph
                .successors(v)
                .iter()
                .filter_map(|s| start_at[s.index()])
                .min()
                .unwrap_or(finish)
        };

        let node = &nodes[v.index()];
        let effort = settings.effective_effort(node, true);
        let start = calendar_duration(effort, settings.hours_per_day)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| PlanError::InvalidSnapshot {
                problems: vec![format!(
                    "task {} effort {}h starts before the supported date range",
                    node.id, node.effort_hours
                )],
            })?;
        end_at[v.index()] = Some(end);
        start_at[v.index()] = Some(start);
    }

    let out: Vec<Node> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| Node {
            start: start_at[i].map(|t| t.date()),
            end: end_at[i].map(|t| t.date()),
            ..node.clone()
        })
        .collect();

    let unscheduled = feeds_terminal.iter().filter(|&&f| !f).count();
    if unscheduled > 0 {
        warn!(unscheduled, "tasks do not feed the terminal and were left unscheduled");
    }
    debug!(scheduled = nodes.len() - unscheduled, "backward schedule computed");

    Ok(ScheduleResult {
        nodes: out,
        terminal_end: finish,
        unscheduled,
    })
}

/// Mark `terminal` and every node that reaches it through successor chains.
fn upstream_of(graph: &GraphModel, terminal: NodeIndex) -> Vec<bool> {
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::from([terminal]);
    seen[terminal.index()] = true;

    while let Some(v) = queue.pop_front() {
        for &p in graph.predecessors(v) {
            if !seen[p.index()] {
                seen[p.index()] = true;
                queue.push_back(p);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn settings() -> ProjectSettings {
        let mut s = ProjectSettings::new("demo", date(2025, 1, 10));
        s.use_fifty_pct_estimate = false;
        s.hours_per_day = 8.0;
        s
    }

    fn tasks(rows: &[(&str, f64)]) -> Vec<Node> {
        rows.iter().map(|(id, h)| Node::new(*id, *id, *h)).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs.iter().map(|(a, b)| Edge::between(*a, *b)).collect()
    }

    fn by_id(result: &ScheduleResult) -> HashMap<&str, &Node> {
        result.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    fn window(node: &Node) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (node.start, node.end)
    }

    #[test]
    fn linear_chain_backward_from_due_date() {
        let nodes = tasks(&[("A", 8.0), ("B", 8.0), ("T", 0.0)]);
        let result = schedule_backward(&nodes, &edges(&[("A", "B"), ("B", "T")]), &settings(), "T")
            .expect("schedule");
        let out = by_id(&result);

        assert_eq!(window(out["T"]), (Some(date(2025, 1, 10)), Some(date(2025, 1, 10))));
        assert_eq!(window(out["B"]), (Some(date(2025, 1, 9)), Some(date(2025, 1, 10))));
        assert_eq!(window(out["A"]), (Some(date(2025, 1, 8)), Some(date(2025, 1, 9))));
        assert_eq!(result.unscheduled, 0);
    }

    #[test]
    fn buffer_days_move_the_terminal_end() {
        let mut s = settings();
        s.project_buffer_days = 3.0;
        let nodes = tasks(&[("A", 16.0), ("T", 8.0)]);
        let result = schedule_backward(&nodes, &edges(&[("A", "T")]), &s, "T").expect("schedule");
        let out = by_id(&result);

        assert_eq!(window(out["T"]), (Some(date(2025, 1, 6)), Some(date(2025, 1, 7))));
        assert_eq!(window(out["A"]), (Some(date(2025, 1, 4)), Some(date(2025, 1, 6))));
    }

    #[test]
    fn shrink_ratio_shortens_windows() {
        let mut s = settings();
        s.use_fifty_pct_estimate = true;
        s.shrink_ratio = 0.5;
        let nodes = tasks(&[("A", 16.0), ("T", 0.0)]);
        let result = schedule_backward(&nodes, &edges(&[("A", "T")]), &s, "T").expect("schedule");

        assert_eq!(window(by_id(&result)["A"]), (Some(date(2025, 1, 9)), Some(date(2025, 1, 10))));
    }

    #[test]
    fn fan_out_uses_earliest_successor_start() {
        // S1 (5 days) and S2 (2 days) both feed T; X feeds both.
        let nodes = tasks(&[("X", 8.0), ("S1", 40.0), ("S2", 16.0), ("T", 0.0)]);
        let links = edges(&[("X", "S1"), ("X", "S2"), ("S1", "T"), ("S2", "T")]);
        let result = schedule_backward(&nodes, &links, &settings(), "T").expect("schedule");
        let out = by_id(&result);

        assert_eq!(out["S1"].start, Some(date(2025, 1, 5)));
        assert_eq!(out["S2"].start, Some(date(2025, 1, 8)));
        assert_eq!(window(out["X"]), (Some(date(2025, 1, 4)), Some(date(2025, 1, 5))));
    }

    #[test]
    fn fan_in_predecessors_schedule_independently() {
        // P1 → M, P2 → S → M: P2 ends at S's start, P1 at M's start.
        let nodes = tasks(&[("P1", 8.0), ("P2", 8.0), ("S", 16.0), ("M", 8.0)]);
        let links = edges(&[("P1", "M"), ("P2", "S"), ("S", "M")]);
        let result = schedule_backward(&nodes, &links, &settings(), "M").expect("schedule");
        let out = by_id(&result);

        assert_eq!(window(out["M"]), (Some(date(2025, 1, 9)), Some(date(2025, 1, 10))));
        assert_eq!(window(out["P1"]), (Some(date(2025, 1, 8)), Some(date(2025, 1, 9))));
        assert_eq!(window(out["S"]), (Some(date(2025, 1, 7)), Some(date(2025, 1, 9))));
        assert_eq!(window(out["P2"]), (Some(date(2025, 1, 6)), Some(date(2025, 1, 7))));
    }

    #[test]
    fn half_day_precision_is_kept_between_tasks() {
        // Two 4h tasks at 8h/day cover 12 calendar hours each.
        let nodes = tasks(&[("A", 4.0), ("B", 4.0), ("T", 0.0)]);
        let result = schedule_backward(&nodes, &edges(&[("A", "B"), ("B", "T")]), &settings(), "T")
            .expect("schedule");
        let out = by_id(&result);

        assert_eq!(window(out["B"]), (Some(date(2025, 1, 9)), Some(date(2025, 1, 10))));
        assert_eq!(window(out["A"]), (Some(date(2025, 1, 9)), Some(date(2025, 1, 9))));
    }

    #[test]
    fn nodes_not_feeding_terminal_stay_unscheduled() {
        // D hangs off T, Z is isolated; neither reaches T.
        let mut nodes = tasks(&[("A", 8.0), ("T", 8.0), ("D", 8.0), ("Z", 8.0)]);
        nodes[3].start = Some(date(2020, 1, 1));
        let result = schedule_backward(&nodes, &edges(&[("A", "T"), ("T", "D")]), &settings(), "T")
            .expect("schedule");
        let out = by_id(&result);

        assert_eq!(window(out["T"]), (Some(date(2025, 1, 9)), Some(date(2025, 1, 10))));
        assert_eq!(window(out["D"]), (None, None));
        assert_eq!(window(out["Z"]), (None, None), "stale dates are cleared");
        assert_eq!(result.unscheduled, 2);
    }

    #[test]
    fn output_preserves_input_order_and_fields() {
        let mut nodes = tasks(&[("T", 0.0), ("A", 8.0)]);
        nodes[1].group_id = Some("g".to_string());
        let result = schedule_backward(&nodes, &edges(&[("A", "T")]), &settings(), "T")
            .expect("schedule");

        let order: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["T", "A"]);
        assert_eq!(result.nodes[1].group_id.as_deref(), Some("g"));
    }

    #[test]
    fn rerun_on_own_output_is_identical() {
        let nodes = tasks(&[("A", 6.0), ("B", 10.0), ("C", 3.0), ("T", 0.0)]);
        let links = edges(&[("A", "B"), ("A", "C"), ("B", "T"), ("C", "T")]);
        let first = schedule_backward(&nodes, &links, &settings(), "T").expect("schedule");
        let second = schedule_backward(&first.nodes, &links, &settings(), "T").expect("schedule");
        assert_eq!(first, second);
    }

    #[test]
    fn start_never_after_end() {
        let nodes = tasks(&[("A", 3.0), ("B", 0.0), ("C", 17.5), ("T", 1.0)]);
        let links = edges(&[("A", "B"), ("B", "C"), ("C", "T"), ("A", "T")]);
        let result = schedule_backward(&nodes, &links, &settings(), "T").expect("schedule");
        for node in &result.nodes {
            assert!(node.start <= node.end, "{}: start after end", node.id);
        }
    }

    #[test]
    fn missing_terminal_is_an_error() {
        let err = schedule_backward(&tasks(&[("A", 1.0)]), &[], &settings(), "T")
            .expect_err("missing terminal");
        assert_eq!(err, PlanError::TerminalNotFound("T".to_string()));
    }

    #[test]
    fn empty_graph_returns_empty_result() {
        let result = schedule_backward(&[], &[], &settings(), "T").expect("schedule");
        assert!(result.nodes.is_empty());
        assert_eq!(result.unscheduled, 0);
    }

    #[test]
    fn cycle_is_propagated() {
        let err = schedule_backward(
            &tasks(&[("A", 1.0), ("B", 1.0)]),
            &edges(&[("A", "B"), ("B", "A")]),
            &settings(),
            "B",
        )
        .expect_err("cycle");
        assert!(matches!(err, PlanError::CycleDetected { .. }));
    }

    #[test]
    fn effort_beyond_date_range_is_an_error() {
        let nodes = tasks(&[("A", 1e9), ("T", 0.0)]);
        let err = schedule_backward(&nodes, &edges(&[("A", "T")]), &settings(), "T")
            .expect_err("out of range");
        match err {
            PlanError::InvalidSnapshot { problems } => {
                assert_eq!(problems.len(), 1);
                assert!(problems[0].starts_with("task A "), "{problems:?}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn buffer_beyond_date_range_is_an_error() {
        let mut s = settings();
        s.project_buffer_days = 1e9;
        let err = schedule_backward(&tasks(&[("T", 1.0)]), &[], &s, "T").expect_err("out of range");
        assert!(matches!(err, PlanError::InvalidSettings(_)));

        let err = schedule_backward(&[], &[], &s, "T").expect_err("empty graph still checks buffer");
        assert!(matches!(err, PlanError::InvalidSettings(_)));
    }

    #[test]
    fn negative_effort_is_rejected() {
        let err = schedule_backward(&tasks(&[("T", -1.0)]), &[], &settings(), "T")
            .expect_err("negative effort");
        assert!(matches!(err, PlanError::InvalidSnapshot { .. }));
    }
}
