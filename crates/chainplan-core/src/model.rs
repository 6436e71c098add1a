//! Plain data types shared by the engine and its collaborators.
//!
//! These are the only persisted shapes. They serialize as JSON records with
//! camelCase field names, and dates use the `YYYY-MM-DD` form.
//!
//! `start`, `end` and `position` on [`Node`] are derived outputs: the
//! scheduler writes the dates and the layout engine writes the position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task identifier, unique within a snapshot.
pub type NodeId = String;

/// A task in the work breakdown structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Effort in working hours.
    pub effort_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    /// A task with no derived fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, effort_hours: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            effort_hours,
            start: None,
            end: None,
            locked: None,
            group_id: None,
            position: None,
        }
    }
}

/// Drawing coordinates produced by [`crate::layout::auto_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A finish-to-start dependency: `source` must finish before `target` starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// An edge whose ID is derived from its endpoints (`e-<source>-<target>`).
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("e-{source}-{target}"),
            source,
            target,
        }
    }
}

/// A named set of tasks. The engine carries groups through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub node_ids: Vec<NodeId>,
}

/// Project-wide planning settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    #[serde(default)]
    pub name: String,
    /// The date the terminal deliverable is due.
    pub due_date: NaiveDate,
    /// Calendar days reserved between the terminal task and the due date.
    /// Fractional values are allowed.
    #[serde(default)]
    pub project_buffer_days: f64,
    /// Apply `shrink_ratio` to every effort estimate.
    #[serde(default = "default_true")]
    pub use_fifty_pct_estimate: bool,
    #[serde(default = "default_shrink_ratio")]
    pub shrink_ratio: f64,
    /// Working hours that make up one calendar day.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
}

impl ProjectSettings {
    /// Settings with the default buffer, shrink ratio and working day.
    pub fn new(name: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            due_date,
            project_buffer_days: 0.0,
            use_fifty_pct_estimate: default_true(),
            shrink_ratio: default_shrink_ratio(),
            hours_per_day: default_hours_per_day(),
        }
    }

    /// Effort of `node` after the safety shrink.
    ///
    /// The shrink applies only when both `use_fifty_pct` and
    /// [`ProjectSettings::use_fifty_pct_estimate`] are set.
    #[must_use]
    pub fn effective_effort(&self, node: &Node, use_fifty_pct: bool) -> f64 {
        if use_fifty_pct && self.use_fifty_pct_estimate {
            node.effort_hours * self.shrink_ratio
        } else {
            node.effort_hours
        }
    }
}

/// Everything the surrounding application persists for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub project: ProjectSettings,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Snapshot {
    /// An empty project with default settings.
    pub fn empty(name: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            project: ProjectSettings::new(name, due_date),
            nodes: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Look up a node by ID.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_shrink_ratio() -> f64 {
    0.6
}

const fn default_hours_per_day() -> f64 {
    8.0
}
