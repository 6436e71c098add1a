//! Task dependency graph.
//!
//! # Overview
//!
//! [`GraphModel`] is built once per engine call from a snapshot's nodes and
//! edges. Construction validates the graph (unique IDs, no dangling edges,
//! no cycles) and precomputes both Kahn orderings, so every consumer sees a
//! DAG with explicit, reproducible iteration order.
//!
//! ## Pipeline
//!
//! ```text
//! nodes + edges
//!        ↓  build::GraphModel::build()
//! GraphModel (dense NodeIndex per task, succ/pred lists, orderings)
//!        ├─ critical_chain::compute_critical_chain()
//!        ├─ schedule::schedule_backward()
//!        └─ layout::auto_layout()
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! use chainplan_core::graph::GraphModel;
//! use chainplan_core::model::{Edge, Node};
//!
//! let nodes = vec![Node::new("A", "Design", 8.0), Node::new("B", "Build", 8.0)];
//! let edges = vec![Edge::between("A", "B")];
//! let graph = GraphModel::build(&nodes, &edges)?;
//! assert_eq!(graph.topological_ids(), vec!["A", "B"]);
//! # Ok::<(), chainplan_core::PlanError>(())
//! ```

pub mod build;
pub mod order;

pub use build::GraphModel;
