//! # testintel — static analysis core for test intelligence
//!
//! Ingests a codebase, builds a persistent method-level call graph, and
//! answers three coupled questions over it:
//!
//! - which tests exercise a given production method (`find_tests`)
//! - what production code a given test actually executes (`trace_execution`)
//! - which tests are impacted by a set of source changes (`diff_impact`)
//!
//! Command dispatch, flag parsing, and output formatting live in the
//! `testintel-cli` binary crate; this library exposes the seven operations
//! in [`api`], the component types needed to construct and inspect them,
//! configuration loading ([`config`]), and logging setup ([`logging`]).
//!
//! ## Pipeline
//!
//! Six components, dependency order leaves-first:
//! [`source`] (Source Acquirer) → [`parser`] + [`semantic`]
//! (Syntax/Semantic Analyzer) → [`graph`] (Call Graph Builder) → [`diff`]
//! (Diff Parser) → [`coverage`] (Coverage Analyzer) → [`impact`] (Impact
//! Analyzer), with [`cache`] and [`classifier`] as supporting components.
//!
//! ```no_run
//! use testintel::api;
//! use std::path::Path;
//!
//! # fn main() -> testintel::error::Result<()> {
//! let report = api::build_call_graph(Path::new("."), Default::default())?;
//! println!("{} methods, {} edges", report.node_count, report.edge_count);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod classifier;
pub mod concurrency;
pub mod config;
pub mod diff;
pub mod error;
pub mod graph;
pub mod impact;
pub mod language;
pub mod logging;
pub mod methodid;
pub mod model;
pub mod parser;
pub mod semantic;
pub mod source;

pub mod coverage;

pub use error::{AnalysisError, Result};
pub use methodid::MethodId;
pub use model::{
    CallEdge, ChangeRecord, CoverageInfo, ExecutedMethod, ExecutionTrace, MethodCallGraph,
    MethodCategory, MethodNode, SourceFile, TestType, WorkspaceRoot, WorkspaceSnapshot,
};
