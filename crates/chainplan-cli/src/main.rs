#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use chainplan_core::persistence::DEFAULT_PROJECT_FILE;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, select_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "cplan",
    author,
    version,
    about = "cplan: critical-chain planning for task graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project JSON file.
    #[arg(long, global = true, env = "CHAINPLAN_FILE", default_value = DEFAULT_PROJECT_FILE)]
    file: PathBuf,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Create a project file",
        long_about = "Create a project file with default settings and one final-deliverable task.",
        after_help = "EXAMPLES:\n    # New project due at the end of March\n    cplan init --name \"Launch\" --due 2025-03-31\n\n    # Overwrite an existing file\n    cplan init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Project",
        about = "Validate the project graph",
        long_about = "Validate the project file and print graph counts, sources, sinks and topological order.",
        after_help = "EXAMPLES:\n    # Validate the default project.json\n    cplan check\n\n    # Validate another file with JSON output\n    cplan check --file plans/q3.json --json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Show the critical chain",
        long_about = "Show the longest effort-weighted dependency chain.",
        after_help = "EXAMPLES:\n    # Chain using shrunk (50%) estimates\n    cplan chain\n\n    # Chain using raw estimates\n    cplan chain --raw"
    )]
    Chain(cmd::chain::ChainArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Schedule backward from the due date",
        long_about = "Assign start and end dates so the terminal task finishes on the buffered due date.",
        after_help = "EXAMPLES:\n    # Schedule against the only sink\n    cplan schedule\n\n    # Pick the terminal task and save the dates\n    cplan schedule --terminal ship --write"
    )]
    Schedule(cmd::schedule::ScheduleArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Compute a layered diagram layout",
        long_about = "Compute layered x/y positions for every task.",
        after_help = "EXAMPLES:\n    # Default spacing\n    cplan layout\n\n    # Tighter spacing, saved to the project file\n    cplan layout --h-gap 200 --v-gap 80 --write"
    )]
    Layout(cmd::layout::LayoutArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    cplan completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CHAINPLAN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "chainplan=debug,info"
        } else {
            "chainplan=info,warn"
        })
    });

    let format = env::var("CHAINPLAN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn report(mode: OutputMode, error: &CliError) -> ExitCode {
    if render_error(mode, error).is_err() {
        eprintln!("error: {}", error.message);
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match cmd::Context::resolve(&cli.file, cli.format, cli.json) {
        Ok(ctx) => ctx,
        Err(err) => {
            let mode = select_output_mode(cli.format, cli.json, None);
            return report(mode, &CliError::config(&err));
        }
    };
    debug!(
        file = %ctx.file.display(),
        project_dir = %ctx.project_dir.display(),
        output = ?ctx.output,
        "context resolved"
    );

    let result = match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &ctx),
        Commands::Check(ref args) => cmd::check::run_check(args, &ctx),
        Commands::Chain(ref args) => cmd::chain::run_chain(args, &ctx),
        Commands::Schedule(ref args) => cmd::schedule::run_schedule(args, &ctx),
        Commands::Layout(ref args) => cmd::layout::run_layout(args, &ctx),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(ctx.output, &CliError::from_anyhow(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["cplan", "chain", "--raw", "--file", "plan.json", "--json"]);
        assert!(cli.json);
        assert_eq!(cli.file, PathBuf::from("plan.json"));
        assert!(matches!(cli.command, Commands::Chain(cmd::chain::ChainArgs { raw: true })));
    }

    #[test]
    fn schedule_parses_terminal_and_write() {
        let cli = Cli::parse_from(["cplan", "schedule", "--terminal", "ship", "--write"]);
        match cli.command {
            Commands::Schedule(args) => {
                assert_eq!(args.terminal.as_deref(), Some("ship"));
                assert!(args.write);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn layout_parses_gaps() {
        let cli = Cli::parse_from(["cplan", "layout", "--h-gap", "200", "--v-gap", "80.5"]);
        match cli.command {
            Commands::Layout(args) => {
                assert_eq!(args.h_gap, Some(200.0));
                assert_eq!(args.v_gap, Some(80.5));
                assert!(!args.write);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn init_parses_due_date() {
        let cli = Cli::parse_from(["cplan", "init", "--name", "Launch", "--due", "2025-03-31"]);
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.name, "Launch");
                assert_eq!(args.due, chrono::NaiveDate::from_ymd_opt(2025, 3, 31));
                assert!(!args.force);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bad_due_date_is_rejected() {
        let err = Cli::try_parse_from(["cplan", "init", "--due", "31/03/2025"]).expect_err("bad date");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn format_flag_accepts_each_mode() {
        for (raw, mode) in [
            ("pretty", OutputMode::Pretty),
            ("text", OutputMode::Text),
            ("json", OutputMode::Json),
        ] {
            let cli = Cli::parse_from(["cplan", "--format", raw, "check"]);
            assert_eq!(cli.format, Some(mode));
        }
    }
}
