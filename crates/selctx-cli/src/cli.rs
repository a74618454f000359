//! Argument parsing, logging setup and command dispatch.

use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use selctx_label::LabelFormat;
use selctx_property::{ConvergeMode, EnsureKind};
use selctx_telemetry::{LogFormat, LoggingConfig, init_logging};

use crate::commands::converge::handle_converge;
use crate::commands::show::handle_show;
use crate::context::{AppContext, CliError, CliResult, CommandOutput};

/// Parses CLI arguments, executes the requested command and prints its output.
/// Returns the process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    match execute(&cli) {
        Ok(output) => {
            print!("{}", output.text);
            output.exit_code
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn execute(cli: &Cli) -> CliResult<CommandOutput> {
    let ctx = AppContext::load(cli, |name| env::var(name).ok())?;
    init_logging(&LoggingConfig {
        level: &ctx.settings.logging.level,
        format: ctx.settings.logging.format,
        build_id: env!("CARGO_PKG_VERSION"),
    })
    .map_err(|err| CliError::failure(anyhow!("failed to initialise logging: {err}")))?;
    dispatch(&cli.command, &ctx)
}

fn dispatch(command: &Command, ctx: &AppContext) -> CliResult<CommandOutput> {
    match command {
        Command::Show(args) => handle_show(ctx, args),
        Command::Check(args) => {
            handle_converge(ctx, args, EnsureKind::Present, ConvergeMode::Check)
        }
        Command::Apply(args) => {
            handle_converge(ctx, &args.fields, args.ensure, ConvergeMode::Apply)
        }
    }
}

#[derive(Parser)]
#[command(
    name = "selctx",
    version,
    about = "Inspect and converge SELinux file labels"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "SELCTX_MANIFEST",
        help = "JSON manifest with settings and label declarations"
    )]
    pub(crate) manifest: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_parser = parse_label_format,
        help = "Label shape reported by the platform (triple or mls); use mls when labels end in a range such as :s0"
    )]
    pub(crate) label_format: Option<LabelFormat>,
    #[arg(long, global = true, help = "Log level used when RUST_LOG is unset")]
    pub(crate) log_level: Option<String>,
    #[arg(
        long,
        global = true,
        value_parser = parse_log_format,
        help = "Log output format (json or pretty)"
    )]
    pub(crate) log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        help = "Write Prometheus metrics to this file after converging"
    )]
    pub(crate) metrics_file: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the current label and policy default of each path.
    Show(ShowArgs),
    /// Report fields that differ from the desired label without changing them.
    Check(FieldArgs),
    /// Change fields that differ from the desired label.
    Apply(ApplyArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ShowArgs {
    #[arg(help = "Paths to inspect (defaults to the manifest resources)")]
    pub(crate) paths: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct FieldArgs {
    #[arg(long, help = "Desired SELinux user")]
    pub(crate) user: Option<String>,
    #[arg(long, help = "Desired SELinux role")]
    pub(crate) role: Option<String>,
    #[arg(long = "type", help = "Desired SELinux type")]
    pub(crate) type_: Option<String>,
    #[arg(help = "Paths to converge in addition to the manifest resources")]
    pub(crate) paths: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ApplyArgs {
    #[command(flatten)]
    pub(crate) fields: FieldArgs,
    #[arg(
        long,
        value_parser = parse_ensure,
        default_value = "present",
        help = "Create missing PATH arguments as a file or directory"
    )]
    pub(crate) ensure: EnsureKind,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_label_format(value: &str) -> Result<LabelFormat, String> {
    value
        .parse::<LabelFormat>()
        .map_err(|_| format!("unknown label format '{value}' (expected triple or mls)"))
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse::<LogFormat>()
}

fn parse_ensure(value: &str) -> Result<EnsureKind, String> {
    value.parse::<EnsureKind>()
}
