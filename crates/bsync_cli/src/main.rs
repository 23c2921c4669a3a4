//! bsync CLI: runs incremental Java syncs against a Blaze/Bazel workspace.
//!
//! `bsync sync` loads the rule graph reported by the build, runs one sync
//! against the state persisted by the previous run and saves the new state.
//! `bsync clean` throws the persisted state away so the next sync starts
//! from scratch.

#![warn(missing_docs)]

mod clean;
mod sync;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// bsync: incremental Java project sync for Blaze/Bazel workspaces.
#[derive(Parser, Debug)]
#[command(name = "bsync", version, about = "Incremental Blaze/Bazel Java sync")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `bsync.toml` to use instead of the workspace's own.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one sync and persist its state.
    Sync(SyncArgs),
    /// Delete persisted sync state.
    Clean(CleanArgs),
}

/// Arguments for the `bsync sync` subcommand.
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Workspace root directory.
    #[arg(long)]
    pub workspace: PathBuf,

    /// The build's execution root.
    #[arg(long)]
    pub execution_root: PathBuf,

    /// The build's output base, holding external repositories.
    #[arg(long)]
    pub output_base: PathBuf,

    /// JSON file with the rule graph.
    #[arg(long)]
    pub rules: PathBuf,

    /// JSON file with locally changed files.
    #[arg(long)]
    pub working_set: Option<PathBuf>,

    /// Where sync state is kept. Defaults to `<workspace>/.bsync`.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `bsync clean` subcommand.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Directory holding sync state. Defaults to `./.bsync`.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

/// Directory under the workspace holding sync state.
pub const DEFAULT_STATE_DIR: &str = ".bsync";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let color = match cli.color {
        ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Sync(ref args) => sync::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_sync_minimal() {
        let cli = Cli::parse_from([
            "bsync",
            "sync",
            "--workspace",
            "/ws",
            "--execution-root",
            "/exec",
            "--output-base",
            "/base",
            "--rules",
            "rules.json",
        ]);
        match cli.command {
            Command::Sync(ref args) => {
                assert_eq!(args.workspace, PathBuf::from("/ws"));
                assert_eq!(args.rules, PathBuf::from("rules.json"));
                assert!(args.working_set.is_none());
                assert!(args.state_dir.is_none());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn parse_sync_with_options() {
        let cli = Cli::parse_from([
            "bsync",
            "--verbose",
            "sync",
            "--workspace",
            "/ws",
            "--execution-root",
            "/exec",
            "--output-base",
            "/base",
            "--rules",
            "rules.json",
            "--working-set",
            "ws.json",
            "--state-dir",
            "/tmp/state",
            "--format",
            "json",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Sync(ref args) => {
                assert_eq!(args.working_set, Some(PathBuf::from("ws.json")));
                assert_eq!(args.state_dir, Some(PathBuf::from("/tmp/state")));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn sync_requires_rules() {
        let result = Cli::try_parse_from([
            "bsync",
            "sync",
            "--workspace",
            "/ws",
            "--execution-root",
            "/exec",
            "--output-base",
            "/base",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["bsync", "clean", "--state-dir", "/tmp/state"]);
        match cli.command {
            Command::Clean(ref args) => {
                assert_eq!(args.state_dir, Some(PathBuf::from("/tmp/state")));
            }
            _ => panic!("expected Clean command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "bsync",
            "--quiet",
            "--color",
            "never",
            "--config",
            "/etc/bsync.toml",
            "clean",
        ]);
        assert!(cli.quiet);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/bsync.toml")));
    }
}
