use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ProjectFileMissing,
    ConfigParseError,
    InvalidSnapshot,
    InvalidSettings,
    CycleDetected,
    DanglingEdge,
    DuplicateNode,
    TerminalNotFound,
    EmptyGraph,
    SnapshotWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ProjectFileMissing => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidSnapshot => "E1003",
            Self::InvalidSettings => "E1004",
            Self::CycleDetected => "E2001",
            Self::DanglingEdge => "E2002",
            Self::DuplicateNode => "E2003",
            Self::TerminalNotFound => "E3001",
            Self::EmptyGraph => "E3002",
            Self::SnapshotWriteFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ProjectFileMissing => "Project file not found",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidSnapshot => "Invalid project snapshot",
            Self::InvalidSettings => "Invalid project settings",
            Self::CycleDetected => "Dependency cycle detected",
            Self::DanglingEdge => "Edge references a missing task",
            Self::DuplicateNode => "Duplicate task ID",
            Self::TerminalNotFound => "Terminal task not found",
            Self::EmptyGraph => "Project has no tasks",
            Self::SnapshotWriteFailed => "Project file write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ProjectFileMissing => {
                Some("Run `cplan init` or pass --file pointing at a project JSON file.")
            }
            Self::ConfigParseError => Some("Fix syntax in .chainplan/config.toml and retry."),
            Self::InvalidSnapshot => Some("Fix the listed fields in the project file."),
            Self::InvalidSettings => {
                Some("Use positive values for hoursPerDay, shrinkRatio and layout gaps.")
            }
            Self::CycleDetected => Some("Remove a dependency so the task graph is acyclic."),
            Self::DanglingEdge => Some("Delete the edge or add the task it points at."),
            Self::DuplicateNode => Some("Give every task a unique ID."),
            Self::TerminalNotFound => {
                Some("Pass --terminal with the ID of the final deliverable.")
            }
            Self::EmptyGraph => Some("Add at least one task before computing a chain."),
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `cplan` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced by the planning engine and snapshot validation.
///
/// All variants are fatal for the operation that raised them; the engine
/// never returns a partial result alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Topological ordering could not complete. `members` lists the task IDs
    /// of one strongly connected component that forms the cycle.
    #[error("dependency cycle detected among tasks: {}", members.join(", "))]
    CycleDetected { members: Vec<String> },

    /// An edge references a task ID that is not in the node set.
    #[error("edge {edge_id} references missing task {node_id}")]
    DanglingEdge { edge_id: String, node_id: String },

    /// Two nodes share the same ID.
    #[error("duplicate task id: {0}")]
    DuplicateNode(String),

    /// The terminal task named for scheduling is not in the node set.
    #[error("terminal task not found: {0}")]
    TerminalNotFound(String),

    /// The node set is empty.
    #[error("project has no tasks")]
    EmptyGraph,

    /// A numeric setting is outside its valid range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The snapshot failed structural validation.
    #[error("invalid snapshot: {}", problems.join("; "))]
    InvalidSnapshot { problems: Vec<String> },
}

impl PlanError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::DanglingEdge { .. } => ErrorCode::DanglingEdge,
            Self::DuplicateNode(_) => ErrorCode::DuplicateNode,
            Self::TerminalNotFound(_) => ErrorCode::TerminalNotFound,
            Self::EmptyGraph => ErrorCode::EmptyGraph,
            Self::InvalidSettings(_) => ErrorCode::InvalidSettings,
            Self::InvalidSnapshot { .. } => ErrorCode::InvalidSnapshot,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
