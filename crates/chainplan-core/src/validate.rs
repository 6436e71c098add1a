//! Structural validation of snapshots at the persistence boundary.
//!
//! Validation collects every problem instead of stopping at the first, so a
//! user fixing a hand-edited project file sees the whole list at once. Graph
//! shape (cycles) is left to [`crate::graph::GraphModel::build`].
//!
//! Zero effort is accepted: milestones such as a final deliverable carry no
//! work of their own.

use std::collections::HashSet;

use crate::error::PlanError;
use crate::model::{Node, Snapshot};

/// Validate settings, nodes, edges and groups of `snapshot`.
///
/// # Errors
///
/// Returns [`PlanError::InvalidSnapshot`] listing every problem found.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), PlanError> {
    let mut problems = Vec::new();
    let settings = &snapshot.project;

    if !settings.project_buffer_days.is_finite() || settings.project_buffer_days < 0.0 {
        problems.push(format!(
            "projectBufferDays must be >= 0, got {}",
            settings.project_buffer_days
        ));
    }
    if !settings.shrink_ratio.is_finite() || settings.shrink_ratio <= 0.0 {
        problems.push(format!("shrinkRatio must be > 0, got {}", settings.shrink_ratio));
    }
    if !settings.hours_per_day.is_finite() || settings.hours_per_day <= 0.0 {
        problems.push(format!("hoursPerDay must be > 0, got {}", settings.hours_per_day));
    }

    let mut ids: HashSet<&str> = HashSet::with_capacity(snapshot.nodes.len());
    for node in &snapshot.nodes {
        if node.id.trim().is_empty() {
            problems.push("task with empty id".to_string());
        }
        if !ids.insert(node.id.as_str()) {
            problems.push(format!("duplicate task id {}", node.id));
        }
        if node.name.trim().is_empty() {
            problems.push(format!("task {} has an empty name", node.id));
        }
        if let Some(problem) = effort_problem(node) {
            problems.push(problem);
        }
    }

    for edge in &snapshot.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                problems.push(format!("edge {} references missing task {endpoint}", edge.id));
            }
        }
    }

    for group in &snapshot.groups {
        for member in &group.node_ids {
            if !ids.contains(member.as_str()) {
                problems.push(format!("group {} references missing task {member}", group.id));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PlanError::InvalidSnapshot { problems })
    }
}

/// Reject negative or non-finite effort estimates.
///
/// # Errors
///
/// Returns [`PlanError::InvalidSnapshot`] listing the offending tasks.
pub fn check_efforts(nodes: &[Node]) -> Result<(), PlanError> {
    let problems: Vec<String> = nodes.iter().filter_map(effort_problem).collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(PlanError::InvalidSnapshot { problems })
    }
}

fn effort_problem(node: &Node) -> Option<String> {
    (!node.effort_hours.is_finite() || node.effort_hours < 0.0).then(|| {
        format!(
            "task {} has invalid effortHours {}",
            node.id, node.effort_hours
        )
    })
}
