#![forbid(unsafe_code)]
//! chainplan-core library.
//!
//! The planning engine works on an immutable [`model::Snapshot`] of tasks
//! (nodes) and finish-to-start dependencies (edges):
//!
//! - [`graph::GraphModel`] validates the DAG and exposes orderings.
//! - [`critical_chain`] finds the longest effort-weighted path.
//! - [`schedule`] propagates dates backward from the due date.
//! - [`layout`] assigns layered 2-D coordinates.
//!
//! Every engine call is a pure function: it reads the inputs and returns new
//! collections.
//!
//! # Conventions
//!
//! - **Errors**: engine failures are [`error::PlanError`]; boundary code
//!   (persistence, config) uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod calendar;
pub mod config;
pub mod critical_chain;
pub mod error;
pub mod graph;
pub mod layout;
pub mod lock;
pub mod model;
pub mod persistence;
pub mod schedule;
pub mod suggest;
pub mod validate;

pub use critical_chain::{CriticalChain, compute_critical_chain};
pub use error::{ErrorCode, PlanError};
pub use graph::GraphModel;
pub use layout::{LayoutOptions, auto_layout};
pub use model::{Edge, Group, Node, Position, ProjectSettings, Snapshot};
pub use schedule::{ScheduleResult, schedule_backward};
