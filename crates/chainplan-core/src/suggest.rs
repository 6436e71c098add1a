//! Task suggestion port.
//!
//! A [`TaskSuggestionProvider`] turns a free-text prompt into candidate
//! tasks, typically by asking a language model. The engine never calls one;
//! callers feed the candidates through [`adopt_suggestions`] to merge them
//! into a snapshot with fresh IDs and dependency edges.

use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, instrument};

use crate::error::PlanError;
use crate::model::{Edge, Node, Snapshot};

/// Effort assigned to candidates that arrive without a usable estimate.
pub const DEFAULT_SUGGESTED_EFFORT: f64 = 8.0;

/// What the prompt asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    /// Break an existing task into smaller tasks.
    Decompose,
    /// Produce the sequence of tasks leading to a final deliverable.
    FinalDeliverable,
}

#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    pub kind: SuggestionKind,
    pub snapshot: &'a Snapshot,
}

pub trait TaskSuggestionProvider {
    /// Candidate tasks for `prompt`. Returned nodes may have an empty `id`.
    fn generate(&self, prompt: &str, context: &SuggestionContext<'_>) -> Result<Vec<Node>>;
}

/// Provider that always returns the same candidates. Useful offline.
#[derive(Debug, Clone, Default)]
pub struct StaticSuggestions {
    tasks: Vec<Node>,
}

impl StaticSuggestions {
    #[must_use]
    pub const fn new(tasks: Vec<Node>) -> Self {
        Self { tasks }
    }
}

impl TaskSuggestionProvider for StaticSuggestions {
    fn generate(&self, _prompt: &str, _context: &SuggestionContext<'_>) -> Result<Vec<Node>> {
        Ok(self.tasks.clone())
    }
}

/// Merge `suggested` into a copy of `snapshot`.
///
/// - Candidates with an empty or already-taken ID get `t-<8 hex>`, derived
///   from a BLAKE3 hash of the name and position in `suggested`.
/// - Non-positive or non-finite effort becomes [`DEFAULT_SUGGESTED_EFFORT`].
/// - With `feeds`, every candidate gets an edge into that task.
///
/// # Errors
///
/// [`PlanError::DanglingEdge`] if `feeds` names a task not in `snapshot`.
#[instrument(skip_all, fields(existing = snapshot.nodes.len(), suggested = suggested.len()))]
pub fn adopt_suggestions(
    snapshot: &Snapshot,
    suggested: Vec<Node>,
    feeds: Option<&str>,
) -> Result<Snapshot, PlanError> {
    if let Some(target) = feeds {
        if snapshot.node(target).is_none() {
            return Err(PlanError::DanglingEdge {
                edge_id: format!("e-*-{target}"),
                node_id: target.to_string(),
            });
        }
    }

    let mut out = snapshot.clone();
    let mut taken: HashSet<String> = out.nodes.iter().map(|n| n.id.clone()).collect();
    let mut linked: HashSet<(String, String)> = out
        .edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();

    for (position, mut node) in suggested.into_iter().enumerate() {
        if node.id.trim().is_empty() || taken.contains(&node.id) {
            node.id = fresh_id(&node.name, position, &taken);
        }
        if !node.effort_hours.is_finite() || node.effort_hours <= 0.0 {
            node.effort_hours = DEFAULT_SUGGESTED_EFFORT;
        }
        node.start = None;
        node.end = None;
        taken.insert(node.id.clone());

        if let Some(target) = feeds {
            if linked.insert((node.id.clone(), target.to_string())) {
                out.edges.push(Edge::between(node.id.as_str(), target));
            }
        }
        out.nodes.push(node);
    }

    debug!(nodes = out.nodes.len(), edges = out.edges.len(), "suggestions adopted");
    Ok(out)
}

fn fresh_id(name: &str, position: usize, taken: &HashSet<String>) -> String {
    let mut attempt: u64 = 0;
    loop {
        let mut hasher = blake3::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(&(position as u64).to_le_bytes());
        hasher.update(&attempt.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        let id = format!("t-{}", &hex.as_str()[..8]);
        if !taken.contains(&id) {
            return id;
        }
        attempt += 1;
    }
}
