//! Core error type and diagnostics accumulator.
//!
//! Mirrors the per-module `thiserror` enums in the codebase this crate is
//! descended from (`ParserError`, `StoreError`): one flat, typed error enum
//! at the library boundary, with lower-level errors converting in via
//! `#[from]`. Bounds-related truncations (depth/visited limits) are never
//! represented as `Err` — they are diagnostics attached to results, per the
//! propagation policy in the error handling design.

use serde::Serialize;
use std::fmt;

/// Errors surfaced by the core to callers of the §6 external interface.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("workspace invalid: {0}")]
    WorkspaceInvalid(String),

    #[error("no method matched pattern {0:?}")]
    MethodNotFound(String),

    #[error("test not found: {0:?}")]
    TestNotFound(String),

    #[error("graph build exceeded the timeout budget")]
    BuildTimedOut,

    #[error("operation cancelled")]
    Cancelled,

    #[error("depth limit reached before the search completed")]
    DepthLimitReached,

    #[error("cache entry corrupt: {0}")]
    CacheCorrupt(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Parser(#[from] crate::parser::ParserError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Process exit code this error maps to, per the §6 CLI contract.
    /// Exposed here as a pure function so the CLI shell never re-derives it.
    pub fn exit_code(&self) -> i32 {
        match self {
            AnalysisError::WorkspaceInvalid(_) => 2,
            AnalysisError::TestNotFound(_) | AnalysisError::MethodNotFound(_) => 3,
            AnalysisError::BuildTimedOut => 124,
            AnalysisError::Cancelled => 130,
            AnalysisError::Internal(_)
            | AnalysisError::CacheCorrupt(_)
            | AnalysisError::DepthLimitReached
            | AnalysisError::Parser(_)
            | AnalysisError::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Accumulated non-fatal counters produced while serving a query or build.
///
/// Parse failures on individual files, unresolved call targets, and bounds
/// truncations never abort a higher-level operation; instead they increment
/// a counter here so the caller can inspect what was approximated without
/// the core ever raising (or swallowing) an exception for them.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub unresolved_calls: u64,
    pub skipped_files: u64,
    pub depth_limit_hits: u64,
    pub visited_limit_hits: u64,
}

impl Diagnostics {
    pub fn merge(&mut self, other: &Diagnostics) {
        self.unresolved_calls += other.unresolved_calls;
        self.skipped_files += other.skipped_files;
        self.depth_limit_hits += other.depth_limit_hits;
        self.visited_limit_hits += other.visited_limit_hits;
    }

    pub fn is_clean(&self) -> bool {
        *self == Diagnostics::default()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved_calls={} skipped_files={} depth_limit_hits={} visited_limit_hits={}",
            self.unresolved_calls, self.skipped_files, self.depth_limit_hits, self.visited_limit_hits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_external_contract() {
        assert_eq!(AnalysisError::WorkspaceInvalid("x".into()).exit_code(), 2);
        assert_eq!(AnalysisError::TestNotFound("x".into()).exit_code(), 3);
        assert_eq!(AnalysisError::BuildTimedOut.exit_code(), 124);
        assert_eq!(AnalysisError::Cancelled.exit_code(), 130);
        assert_eq!(AnalysisError::Internal("x".into()).exit_code(), 1);
    }

    #[test]
    fn merge_sums_each_counter() {
        let mut a = Diagnostics {
            unresolved_calls: 1,
            skipped_files: 2,
            depth_limit_hits: 0,
            visited_limit_hits: 0,
        };
        let b = Diagnostics {
            unresolved_calls: 5,
            skipped_files: 0,
            depth_limit_hits: 1,
            visited_limit_hits: 1,
        };
        a.merge(&b);
        assert_eq!(a.unresolved_calls, 6);
        assert_eq!(a.skipped_files, 2);
        assert_eq!(a.depth_limit_hits, 1);
        assert_eq!(a.visited_limit_hits, 1);
        assert!(!a.is_clean());
        assert!(Diagnostics::default().is_clean());
    }
}
