//! `cplan init`: write a fresh project file.

use std::io::Write;

use anyhow::Result;
use chainplan_core::{Node, Position, Snapshot};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::Context;
use crate::output::{CliError, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name.
    #[arg(long, default_value = "New Project")]
    pub name: String,

    /// Due date of the final deliverable (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Overwrite an existing project file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitOutput {
    path: String,
    name: String,
    due_date: NaiveDate,
    nodes: usize,
}

/// Starting snapshot: default settings and one final-deliverable task.
fn starter(name: &str, due: NaiveDate) -> Snapshot {
    let mut snapshot = Snapshot::empty(name, due);
    let mut deliverable = Node::new("n1", "Final deliverable", 8.0);
    deliverable.position = Some(Position { x: 0.0, y: 0.0 });
    snapshot.nodes.push(deliverable);
    snapshot
}

/// Execute `cplan init`.
///
/// # Errors
///
/// Fails if the project file exists and `--force` is not set, or if the
/// write fails.
pub fn run_init(args: &InitArgs, ctx: &Context) -> Result<()> {
    if ctx.file.exists() && !args.force {
        return Err(CliError::with_suggestion(
            format!("{} already exists", ctx.file.display()),
            "use `cplan init --force` to overwrite it",
        )
        .into());
    }

    let due = args.due.unwrap_or_else(|| Local::now().date_naive());
    let snapshot = starter(&args.name, due);
    ctx.save(&snapshot)?;
    info!(path = %ctx.file.display(), "project initialized");

    let payload = InitOutput {
        path: ctx.file.display().to_string(),
        name: snapshot.project.name.clone(),
        due_date: due,
        nodes: snapshot.nodes.len(),
    };

    render_mode(
        ctx.output,
        &payload,
        |p, w| writeln!(w, "initialized {} due {}", p.path, p.due_date),
        |p, w| {
            pretty_section(w, "Initialized project")?;
            pretty_kv(w, "Name", &p.name)?;
            pretty_kv(w, "Due", p.due_date.to_string())?;
            pretty_kv(w, "File", &p.path)?;
            pretty_kv(w, "Tasks", p.nodes.to_string())
        },
    )
}
