//! `cplan layout`: compute drawing positions.

use std::io::Write;

use anyhow::Result;
use chainplan_core::auto_layout;
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::Context;
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `cplan layout`.
#[derive(Args, Debug, Default)]
pub struct LayoutArgs {
    /// Horizontal distance between layers (default from config, else 280).
    #[arg(long)]
    pub h_gap: Option<f64>,

    /// Vertical distance between rows (default from config, else 110).
    #[arg(long)]
    pub v_gap: Option<f64>,

    /// Write the positions back to the project file.
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacedTask {
    id: String,
    name: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutReport {
    h_gap: f64,
    v_gap: f64,
    written: bool,
    tasks: Vec<PlacedTask>,
}

/// Execute `cplan layout`.
pub fn run_layout(args: &LayoutArgs, ctx: &Context) -> Result<()> {
    let mut snapshot = ctx.load()?;
    let options = ctx.config.layout_options(args.h_gap, args.v_gap);
    let placed = auto_layout(&snapshot.nodes, &snapshot.edges, &options)?;

    let tasks = placed
        .iter()
        .filter_map(|n| {
            n.position.map(|p| PlacedTask {
                id: n.id.clone(),
                name: n.name.clone(),
                x: p.x,
                y: p.y,
            })
        })
        .collect();

    if args.write {
        snapshot.nodes = placed;
        ctx.save(&snapshot)?;
        info!(path = %ctx.file.display(), "layout written");
    }

    let report = LayoutReport {
        h_gap: options.h_gap,
        v_gap: options.v_gap,
        written: args.write,
        tasks,
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for task in &r.tasks {
                writeln!(w, "{}  {}  {}", task.id, task.x, task.y)?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, "Layout")?;
            for task in &r.tasks {
                writeln!(w, "{:<12} {:<32} ({:>7.1}, {:>7.1})", task.id, task.name, task.x, task.y)?;
            }
            writeln!(w)?;
            pretty_kv(w, "Gaps", format!("{} x {}", r.h_gap, r.v_gap))?;
            if r.written {
                pretty_kv(w, "Saved", "yes")?;
            }
            Ok(())
        },
    )
}
