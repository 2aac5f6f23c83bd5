mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Overrides the `-v`/`-q` log level, e.g. `MESHPACK_LOG=meshpack_core=trace`.
const LOG_ENV: &str = "MESHPACK_LOG";

#[derive(Parser)]
#[command(name = "meshpack")]
#[command(about = "Run package tasks in dependency order and link local packages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    workspace: WorkspaceArgs,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(short, long, action, global = true)]
    quiet: bool,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Directory containing the packages [default: from meshpack.toml, else ./packages]
    #[arg(long, global = true)]
    pub packages_dir: Option<PathBuf>,

    /// Only packages whose name matches this regex (repeatable)
    #[arg(short = 'i', long = "include", value_name = "PATTERN", global = true)]
    pub include: Vec<String>,

    /// Skip packages whose name matches this regex (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN", global = true)]
    pub exclude: Vec<String>,

    /// Also select everything that depends on the matched packages
    #[arg(long, action, global = true)]
    pub dependents: bool,

    /// Also select everything the matched packages depend on
    #[arg(long, action, global = true)]
    pub dependencies: bool,

    /// Maximum number of tasks running at once
    #[arg(short = 'j', long, global = true)]
    pub concurrency: Option<usize>,

    /// Stop starting new tasks after the first failure
    #[arg(long, action, global = true)]
    pub bail: bool,

    /// Do not link local packages before and after running
    #[arg(long, action, global = true)]
    pub no_link: bool,

    /// Package manager used for install and run [default: yarn]
    #[arg(long, global = true)]
    pub client: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install dependencies in every selected package
    Install {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run a package.json script in every selected package that defines it
    Run {
        script: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run an arbitrary binary in every selected package
    Exec {
        binary: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Link local packages into each other's node_modules
    Link,
    /// List selected packages in dependency order
    List {
        #[arg(long, action)]
        json: bool,
    },
    /// Show the dependency graph
    Graph {
        #[arg(long, action)]
        json: bool,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let ws = &cli.workspace;
    match cli.command {
        Commands::Install { args } => commands::cmd_install(ws, args)?,
        Commands::Run { script, args } => commands::cmd_run(ws, script, args)?,
        Commands::Exec { binary, args } => commands::cmd_exec(ws, binary, args)?,
        Commands::Link => commands::cmd_link(ws)?,
        Commands::List { json } => commands::cmd_list(ws, json)?,
        Commands::Graph { json } => commands::cmd_graph(ws, json)?,
    }

    Ok(())
}
