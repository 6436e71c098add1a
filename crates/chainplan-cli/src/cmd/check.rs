//! `cplan check`: validate the project and summarize its graph.

use std::io::Write;

use anyhow::Result;
use chainplan_core::{GraphModel, Snapshot};
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output::{pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `cplan check`.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    project: String,
    nodes: usize,
    edges: usize,
    components: usize,
    sources: Vec<String>,
    sinks: Vec<String>,
    order: Vec<String>,
    content_hash: String,
}

fn build_report(snapshot: &Snapshot) -> Result<CheckReport> {
    let graph = GraphModel::build(&snapshot.nodes, &snapshot.edges)?;
    let ids = |list: Vec<_>| -> Vec<String> {
        list.into_iter().map(|v| graph.task_id(v).to_string()).collect()
    };

    Ok(CheckReport {
        project: snapshot.project.name.clone(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        components: graph.component_count(),
        sources: ids(graph.sources()),
        sinks: ids(graph.sinks()),
        order: graph
            .topological_ids()
            .into_iter()
            .map(str::to_string)
            .collect(),
        content_hash: graph.content_hash().to_string(),
    })
}

/// Execute `cplan check`.
pub fn run_check(_args: &CheckArgs, ctx: &Context) -> Result<()> {
    let snapshot = ctx.load()?;
    let report = build_report(&snapshot)?;

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            writeln!(
                w,
                "ok nodes={} edges={} components={} hash={}",
                r.nodes, r.edges, r.components, r.content_hash
            )?;
            writeln!(w, "order {}", r.order.join(" "))
        },
        |r, w| {
            pretty_section(w, &format!("Project {}", r.project))?;
            pretty_kv(w, "Tasks", r.nodes.to_string())?;
            pretty_kv(w, "Dependencies", r.edges.to_string())?;
            pretty_kv(w, "Components", r.components.to_string())?;
            pretty_kv(w, "Sources", r.sources.join(", "))?;
            pretty_kv(w, "Sinks", r.sinks.join(", "))?;
            pretty_kv(w, "Hash", &r.content_hash)?;
            pretty_rule(w)?;
            writeln!(w, "{}", r.order.join(" → "))
        },
    )
}
