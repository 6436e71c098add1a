//! `cplan chain`: report the critical chain.

use std::io::Write;

use anyhow::Result;
use chainplan_core::{Snapshot, compute_critical_chain};
use clap::Args;
use serde::Serialize;

use super::{Context, format_hours};
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `cplan chain`.
#[derive(Args, Debug, Default)]
pub struct ChainArgs {
    /// Use raw effort estimates, ignoring the project's shrink ratio.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainStep {
    id: String,
    name: String,
    hours: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainReport {
    path: Vec<String>,
    total_hours: f64,
    shrunk: bool,
    steps: Vec<ChainStep>,
}

fn build_report(snapshot: &Snapshot, raw: bool) -> Result<ChainReport> {
    let use_fifty_pct = !raw;
    let chain = compute_critical_chain(
        &snapshot.nodes,
        &snapshot.edges,
        &snapshot.project,
        use_fifty_pct,
    )?;

    let steps = chain
        .path
        .iter()
        .filter_map(|id| snapshot.node(id))
        .map(|node| ChainStep {
            id: node.id.clone(),
            name: node.name.clone(),
            hours: snapshot.project.effective_effort(node, use_fifty_pct),
        })
        .collect();

    Ok(ChainReport {
        path: chain.path,
        total_hours: chain.total_hours,
        shrunk: use_fifty_pct && snapshot.project.use_fifty_pct_estimate,
        steps,
    })
}

/// Execute `cplan chain`.
pub fn run_chain(args: &ChainArgs, ctx: &Context) -> Result<()> {
    let snapshot = ctx.load()?;
    let report = build_report(&snapshot, args.raw)?;

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            writeln!(w, "{} total={}", r.path.join(" "), format_hours(r.total_hours))
        },
        |r, w| {
            pretty_section(w, "Critical chain")?;
            for (i, step) in r.steps.iter().enumerate() {
                writeln!(
                    w,
                    "{:>3}. {:<12} {:<32} {:>8}",
                    i + 1,
                    step.id,
                    step.name,
                    format_hours(step.hours)
                )?;
            }
            writeln!(w)?;
            pretty_kv(w, "Total", format_hours(r.total_hours))?;
            pretty_kv(w, "Estimates", if r.shrunk { "shrunk" } else { "raw" })
        },
    )
}
