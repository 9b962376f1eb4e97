//! xtrace command-line entry point.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xtrace::base::constants::DEFAULT_LINE_WIDTH;
use xtrace::instrument::clock_seed;
use xtrace::{
    CopyOnlyFilter, DisplayOptions, Error, FsLoader, GoListLoader, InstrumentationConfig,
    Namespace, PackageLoader, TraceCategories, resolve_package, transform_tree,
    write_support_files,
};

/// xtrace: rewrite a Go program so it traces its own execution
#[derive(Parser, Debug)]
#[command(name = "xtrace", version)]
#[command(about = "Rewrite a Go package so it prints what it executes", long_about = None)]
struct Cli {
    /// Log resolution and per-file progress
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a package to a directory, instrumenting its sources
    Rewrite(RewriteArgs),
}

#[derive(Args, Debug)]
struct RewriteArgs {
    /// Package directory (optionally `dir/...`) or comma-separated `.go` files
    package: String,

    /// Directory the transformed package is written to
    #[arg(long, short)]
    output_directory: PathBuf,

    /// Trace statements
    #[arg(long)]
    stmt: bool,

    /// Trace variables
    #[arg(long)]
    var: bool,

    /// Trace function calls and returns
    #[arg(long)]
    call: bool,

    /// Trace selected branches and cases
    #[arg(long)]
    case: bool,

    /// Prefix each trace line with a timestamp
    #[arg(long)]
    timestamp: bool,

    /// Prefix each trace line with the goroutine id
    #[arg(long)]
    task_id: bool,

    /// Display width of statement traces
    #[arg(long, default_value_t = DEFAULT_LINE_WIDTH)]
    line_width: usize,

    /// Seed of the generated-name token; a clock seed is used when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Copy `.go` files matching this pattern without rewriting them
    #[arg(long = "copy-only", value_name = "RE")]
    copy_only: Vec<String>,

    /// Copy `.go` files not matching this pattern without rewriting them
    #[arg(long = "copy-only-not", value_name = "RE")]
    copy_only_not: Option<String>,

    /// List packages with `go list` instead of scanning the filesystem
    #[arg(long)]
    go_list: bool,
}

impl RewriteArgs {
    /// With no category flag given, every category is traced
    fn categories(&self) -> TraceCategories {
        if !(self.stmt || self.var || self.call || self.case) {
            return TraceCategories::all();
        }
        TraceCategories::none()
            .with_statement(self.stmt)
            .with_variable(self.var)
            .with_call(self.call)
            .with_clause(self.case)
    }

    fn display(&self) -> DisplayOptions {
        DisplayOptions::default()
            .with_timestamp(self.timestamp)
            .with_task_id(self.task_id)
            .with_line_width(self.line_width)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xtrace: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(command: Command) -> Result<(), Error> {
    match command {
        Command::Rewrite(args) => execute_rewrite(&args),
    }
}

fn execute_rewrite(args: &RewriteArgs) -> Result<(), Error> {
    let filter = CopyOnlyFilter::new(&args.copy_only, args.copy_only_not.as_deref())?;
    let loader: Box<dyn PackageLoader> = if args.go_list {
        Box::new(GoListLoader::default())
    } else {
        Box::new(FsLoader)
    };
    let resolved = resolve_package(&args.package, loader.as_ref())?;

    let mut namespace = Namespace::from_seed(args.seed.unwrap_or_else(clock_seed), resolved.mode);
    if let Some(module) = resolved.module() {
        namespace = namespace.with_module(module);
    }
    tracing::info!(token = namespace.token(), "generated namespace");
    let config = InstrumentationConfig::new(namespace)
        .with_categories(args.categories())
        .with_display(args.display());

    let summary = transform_tree(
        &config,
        &resolved.root,
        &resolved.files,
        &args.output_directory,
        &filter,
    )?;
    let support = write_support_files(&config, &args.output_directory)?;
    tracing::info!(
        rewritten = summary.rewritten,
        copied = summary.copied,
        support = support.len(),
        "done"
    );
    Ok(())
}
