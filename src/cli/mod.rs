//! CLI shell for `testintel-cli`: argument parsing and output formatting
//! only. Every decision documented in spec §7/§9 (typed errors, no
//! exceptions, no exit-code logic inside the core) lives in [`testintel`];
//! this module is purely a consumer of the seven `api` operations.
//!
//! Grounded on the wider example ecosystem's `clap`-derive `Cli`/`Commands`
//! split (one subcommand per operation, a handful of shared global flags),
//! generalized from a single search-first `cqs` binary to seven explicit
//! subcommands mirroring spec §6 one-to-one.

mod commands;
mod display;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use testintel::api::{CacheAction, ConfidenceLevel};

#[derive(Parser)]
#[command(name = "testintel-cli")]
#[command(about = "Static analysis core for test intelligence: call graphs, coverage, and diff impact")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit debug-level logs (otherwise controlled by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit the canonical camelCase JSON schema instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize the tests discovered in a workspace (op 1: `analyze`).
    Analyze {
        /// Solution manifest, project manifest, directory, or file-list path.
        workspace: PathBuf,
    },
    /// Build the full method call graph and report node/edge counts (op 2).
    BuildGraph {
        workspace: PathBuf,
        /// Cap the number of sampled node ids printed.
        #[arg(long)]
        max_methods: Option<usize>,
    },
    /// Find tests exercising a method pattern (op 3: `find_tests`).
    FindTests {
        /// Method pattern: fully-qualified id, suffix, or bare method name.
        pattern: String,
        workspace: PathBuf,
    },
    /// Trace the production code a test method executes (op 4: `trace_execution`).
    Trace {
        /// Test method id or pattern.
        test_id: String,
        workspace: PathBuf,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Compute tests impacted by a diff (op 5: `diff_impact`).
    DiffImpact {
        workspace: PathBuf,
        /// Unified-diff text read from this file; `-` reads stdin.
        #[arg(long, conflicts_with = "revision_command")]
        diff_file: Option<PathBuf>,
        /// Shell command (run with cwd = workspace) whose stdout is a unified diff.
        #[arg(long, conflicts_with = "diff_file")]
        revision_command: Option<String>,
        #[arg(long, value_enum, default_value = "medium")]
        confidence_level: ConfidenceLevelArg,
    },
    /// Report which of a set of tests cover a diff's changes (op 6: `analyze_coverage`).
    Coverage {
        workspace: PathBuf,
        /// Test id/pattern to check; may be repeated.
        #[arg(long = "test", required = true)]
        test_ids: Vec<String>,
        #[arg(long, conflicts_with = "revision_command")]
        diff_file: Option<PathBuf>,
        #[arg(long, conflicts_with = "diff_file")]
        revision_command: Option<String>,
    },
    /// Inspect or manage the multi-tier cache (op 7: `cache`).
    Cache {
        workspace: PathBuf,
        #[arg(value_enum)]
        action: CacheActionArg,
    },
}

/// `clap::ValueEnum` mirror of [`ConfidenceLevel`] — kept separate from the
/// library type so the library never depends on `clap`.
#[derive(Clone, Copy, clap::ValueEnum)]
pub enum ConfidenceLevelArg {
    Fast,
    Medium,
    High,
    Full,
}

impl From<ConfidenceLevelArg> for ConfidenceLevel {
    fn from(v: ConfidenceLevelArg) -> Self {
        match v {
            ConfidenceLevelArg::Fast => ConfidenceLevel::Fast,
            ConfidenceLevelArg::Medium => ConfidenceLevel::Medium,
            ConfidenceLevelArg::High => ConfidenceLevel::High,
            ConfidenceLevelArg::Full => ConfidenceLevel::Full,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum CacheActionArg {
    Status,
    Clear,
    Init,
    WarmUp,
    Stats,
}

impl From<CacheActionArg> for CacheAction {
    fn from(v: CacheActionArg) -> Self {
        match v {
            CacheActionArg::Status => CacheAction::Status,
            CacheActionArg::Clear => CacheAction::Clear,
            CacheActionArg::Init => CacheAction::Init,
            CacheActionArg::WarmUp => CacheAction::WarmUp,
            CacheActionArg::Stats => CacheAction::Stats,
        }
    }
}

/// Install the §5 cancellation contract ("cancellation is checked... on
/// cancellation... batch APIs fail with `Cancelled`") for a single-shot
/// CLI invocation: there is no partial-results stream for the binary
/// protocol to preserve, so Ctrl-C maps directly to the `130` exit code
/// the cancelled-error variant already carries, rather than threading a
/// pollable `CancellationToken` (`testintel::concurrency`) through every
/// BFS call site for a process that is about to exit anyway.
fn install_cancellation_handler() {
    let _ = ctrlc::set_handler(|| {
        eprintln!("error: {}", testintel::error::AnalysisError::Cancelled);
        std::process::exit(testintel::error::AnalysisError::Cancelled.exit_code());
    });
}

/// Dispatches the parsed command, prints its result (text or JSON per
/// `cli.json`), and returns the process exit code from the §6 contract.
/// `AnalysisError::exit_code` is the single source of truth for the
/// mapping; this function never re-derives it.
pub fn run_with(cli: Cli) -> i32 {
    install_cancellation_handler();
    let json = cli.json;
    let outcome = commands::dispatch(cli);
    match outcome {
        Ok(rendered) => {
            println!("{rendered}");
            0
        }
        Err(err) => {
            if json {
                eprintln!("{}", display::error_json(&err));
            } else {
                eprintln!("error: {err}");
            }
            err.exit_code()
        }
    }
}
