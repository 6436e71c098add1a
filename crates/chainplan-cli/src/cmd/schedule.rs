//! `cplan schedule`: backward-schedule from the due date.

use std::io::Write;

use anyhow::Result;
use chainplan_core::config::ProjectConfig;
use chainplan_core::{GraphModel, Snapshot, schedule_backward};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::Context;
use crate::output::{CliError, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `cplan schedule`.
#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Task that must finish on the (buffered) due date.
    #[arg(long)]
    pub terminal: Option<String>,

    /// Write the computed dates back to the project file.
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledTask {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleReport {
    terminal: String,
    due_date: NaiveDate,
    terminal_end: NaiveDateTime,
    unscheduled: usize,
    written: bool,
    tasks: Vec<ScheduledTask>,
}

/// Terminal precedence: flag, project config, then the graph's only sink.
fn pick_terminal(
    flag: Option<&str>,
    config: &ProjectConfig,
    snapshot: &Snapshot,
) -> Result<String> {
    if let Some(id) = flag.or(config.schedule.terminal.as_deref()) {
        return Ok(id.to_string());
    }

    let graph = GraphModel::build(&snapshot.nodes, &snapshot.edges)?;
    let sinks: Vec<&str> = graph.sinks().into_iter().map(|v| graph.task_id(v)).collect();
    match sinks.as_slice() {
        [only] => Ok((*only).to_string()),
        [] => Err(CliError::with_details(
            "project has no tasks to schedule",
            "add a task with `cplan init` or edit the project file",
            "E3002",
        )
        .into()),
        many => Err(CliError::with_details(
            format!("cannot pick a terminal task: {} sinks ({})", many.len(), many.join(", ")),
            "pass --terminal ID or set [schedule] terminal in .chainplan/config.toml",
            "E3001",
        )
        .into()),
    }
}

/// Execute `cplan schedule`.
pub fn run_schedule(args: &ScheduleArgs, ctx: &Context) -> Result<()> {
    let mut snapshot = ctx.load()?;
    let terminal = pick_terminal(args.terminal.as_deref(), &ctx.config, &snapshot)?;
    let result = schedule_backward(&snapshot.nodes, &snapshot.edges, &snapshot.project, &terminal)?;

    if args.write {
        snapshot.nodes.clone_from(&result.nodes);
        ctx.save(&snapshot)?;
        info!(path = %ctx.file.display(), "schedule written");
    }

    let report = ScheduleReport {
        terminal,
        due_date: snapshot.project.due_date,
        terminal_end: result.terminal_end,
        unscheduled: result.unscheduled,
        written: args.write,
        tasks: result
            .nodes
            .into_iter()
            .map(|n| ScheduledTask {
                id: n.id,
                name: n.name,
                start: n.start,
                end: n.end,
            })
            .collect(),
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for task in &r.tasks {
                match (task.start, task.end) {
                    (Some(start), Some(end)) => writeln!(w, "{}  {start}  {end}", task.id)?,
                    _ => writeln!(w, "{}  -  -", task.id)?,
                }
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Backward schedule to {}", r.terminal))?;
            pretty_kv(w, "Due", r.due_date.to_string())?;
            pretty_kv(w, "Terminal end", r.terminal_end.format("%Y-%m-%d %H:%M").to_string())?;
            pretty_rule(w)?;
            for task in &r.tasks {
                let span = match (task.start, task.end) {
                    (Some(start), Some(end)) => format!("{start} → {end}"),
                    _ => "(not scheduled)".to_string(),
                };
                writeln!(w, "{:<12} {:<32} {span}", task.id, task.name)?;
            }
            if r.unscheduled > 0 {
                writeln!(w)?;
                pretty_kv(w, "Unscheduled", r.unscheduled.to_string())?;
            }
            if r.written {
                pretty_kv(w, "Saved", "yes")?;
            }
            Ok(())
        },
    )
}
