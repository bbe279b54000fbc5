//! External Interfaces (§6): the seven operations the outer shell (CLI, API
//! server, scripting) drives the core through. Everything below is a thin,
//! synchronous orchestration layer over [`source`], [`parser`]/[`semantic`],
//! [`graph`], [`diff`], [`coverage`], [`impact`], and [`cache`] — it holds
//! no state of its own beyond what a single call needs.

use crate::cache::CacheReport;
use crate::config::Config;
use crate::coverage::CoverageAnalyzer;
use crate::diff::{self, DiffSource};
use crate::error::{AnalysisError, Diagnostics, Result};
use crate::graph;
use crate::impact::{self, ImpactedTest};
use crate::methodid::MethodId;
use crate::model::{CoverageInfo, ExecutionTrace, MethodNode};
use crate::parser::Parser;
use crate::source;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Timestamp helper: every response type stamps its completion time in
/// RFC 3339 / ISO-8601 UTC, per §6.
fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Op 1: `analyze(workspace) -> AnalysisReport`. Builds the full graph and
/// reports how many discovered methods were classified as test candidates,
/// broken down by `TestType`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub workspace: PathBuf,
    pub total_methods: usize,
    pub test_candidates: usize,
    pub by_test_type: HashMap<String, usize>,
    pub diagnostics: Diagnostics,
    pub generated_at: String,
}

pub fn analyze(workspace: &Path) -> Result<AnalysisReport> {
    let snapshot = source::resolve(workspace)?;
    let config = Config::load(&snapshot.root.canonical_path);
    let parser = Parser::new();
    let graph = graph::build_cached(
        &snapshot,
        &parser,
        Some(&config.cache_root_or_default()),
        config.cache_ttl_or_default(),
    );

    let candidates: Vec<&MethodNode> = graph.nodes.values().filter(|n| n.is_test_candidate).collect();
    let mut by_test_type: HashMap<String, usize> = HashMap::new();
    for node in &candidates {
        let test_type =
            crate::classifier::classify_test_type(&node.simple_name, &node.containing_type, &node.namespace);
        *by_test_type.entry(format!("{test_type:?}")).or_insert(0) += 1;
    }

    Ok(AnalysisReport {
        workspace: snapshot.root.canonical_path,
        total_methods: graph.nodes.len(),
        test_candidates: candidates.len(),
        by_test_type,
        diagnostics: graph.diagnostics.clone(),
        generated_at: now_rfc3339(),
    })
}

/// Op 2: `build_call_graph(workspace, {verbose, max_methods}) -> CallGraphDigest`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallGraphDigest {
    pub node_count: usize,
    pub edge_count: usize,
    pub sampled_nodes: Vec<String>,
    pub diagnostics: Diagnostics,
    pub generated_at: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildCallGraphOptions {
    pub verbose: bool,
    pub max_methods: Option<usize>,
}

pub fn build_call_graph(workspace: &Path, options: BuildCallGraphOptions) -> Result<CallGraphDigest> {
    let snapshot = source::resolve(workspace)?;
    let config = Config::load(&snapshot.root.canonical_path);
    let parser = Parser::new();
    let graph = graph::build_cached(
        &snapshot,
        &parser,
        Some(&config.cache_root_or_default()),
        config.cache_ttl_or_default(),
    );

    let edge_count: usize = graph.forward.values().map(|callees| callees.len()).sum();
    let sample_limit = options.max_methods.unwrap_or(20);
    let mut ids: Vec<&MethodId> = graph.nodes.keys().collect();
    ids.sort();
    let sampled_nodes = ids
        .into_iter()
        .take(sample_limit)
        .map(|id| id.raw().to_string())
        .collect();

    if options.verbose {
        tracing::info!(node_count = graph.nodes.len(), edge_count, "built call graph");
    }

    Ok(CallGraphDigest {
        node_count: graph.nodes.len(),
        edge_count,
        sampled_nodes,
        diagnostics: graph.diagnostics.clone(),
        generated_at: now_rfc3339(),
    })
}

/// Op 3: `find_tests(method_pattern, workspace) -> stream<CoverageInfo>`.
/// The library boundary returns the fully-drained, ordered `Vec` rather
/// than a raw channel — the CLI and any future API server can re-stream it
/// at their own layer if a consumer genuinely needs incremental delivery.
pub fn find_tests(method_pattern: &str, workspace: &Path) -> Result<(Vec<CoverageInfo>, Diagnostics)> {
    let snapshot = source::resolve(workspace)?;
    let config = Config::load(&snapshot.root.canonical_path);
    let parser = Parser::new();
    let graph = graph::build_cached(
        &snapshot,
        &parser,
        Some(&config.cache_root_or_default()),
        config.cache_ttl_or_default(),
    );

    if !graph.nodes.keys().any(|id| id.matches_pattern(method_pattern)) {
        return Err(AnalysisError::MethodNotFound(method_pattern.to_string()));
    }

    let analyzer = CoverageAnalyzer::new();
    let (mut results, mut diagnostics) = analyzer.find_tests(
        &graph,
        method_pattern,
        config.max_depth_or_default(),
        config.max_visited_or_default(),
    );
    diagnostics.merge(&graph.diagnostics);

    // §5 ordering guarantee once fully consumed: confidence desc, then test_id.
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.test_id.cmp(&b.test_id))
    });

    Ok((results, diagnostics))
}

/// Op 4: `trace_execution(test_id, workspace, {max_depth}) -> ExecutionTrace`.
pub fn trace_execution(test_id: &str, workspace: &Path, max_depth: Option<usize>) -> Result<ExecutionTrace> {
    let snapshot = source::resolve(workspace)?;
    let config = Config::load(&snapshot.root.canonical_path);
    let parser = Parser::new();
    let graph = graph::build_cached(
        &snapshot,
        &parser,
        Some(&config.cache_root_or_default()),
        config.cache_ttl_or_default(),
    );

    let resolved = graph
        .nodes
        .iter()
        .find(|(id, node)| id.matches_pattern(test_id) && node.is_test_candidate)
        .map(|(id, _)| id.clone())
        .ok_or_else(|| AnalysisError::TestNotFound(test_id.to_string()))?;

    let analyzer = CoverageAnalyzer::new();
    analyzer.trace(
        &graph,
        &resolved,
        max_depth.unwrap_or_else(|| config.trace_max_depth_or_default()),
        config.max_visited_or_default(),
        config.trace_max_breadth_or_default(),
    )
}

/// §6 `diff_impact`'s confidence-level presets, each mapping to a `(time
/// budget, depth, breadth)` triple. Time budget is advisory here — there is
/// no per-call deadline enforcement below the global 3-minute build timeout
/// (`concurrency`) — but depth/breadth are applied directly to the bounded
/// BFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceLevel {
    Fast,
    Medium,
    High,
    Full,
}

struct Preset {
    max_expansion_depth: usize,
    max_depth: usize,
    max_visited: usize,
}

impl ConfidenceLevel {
    fn preset(self) -> Preset {
        match self {
            ConfidenceLevel::Fast => Preset {
                max_expansion_depth: 3,
                max_depth: 4,
                max_visited: 200,
            },
            ConfidenceLevel::Medium => Preset {
                max_expansion_depth: 6,
                max_depth: 8,
                max_visited: 1000,
            },
            ConfidenceLevel::High => Preset {
                max_expansion_depth: 12,
                max_depth: 12,
                max_visited: 2000,
            },
            ConfidenceLevel::Full => Preset {
                max_expansion_depth: 200,
                max_depth: 200,
                max_visited: 100_000,
            },
        }
    }
}

/// Op 5: `diff_impact(diff_source, workspace, {confidence_level}) -> list<ImpactedTest>`.
pub fn diff_impact(
    diff_source: DiffSource<'_>,
    workspace: &Path,
    confidence_level: ConfidenceLevel,
) -> Result<(Vec<ImpactedTest>, Diagnostics)> {
    let snapshot = source::resolve(workspace)?;
    let config = Config::load(&snapshot.root.canonical_path);
    let parser = Parser::new();
    let graph = graph::build_cached(
        &snapshot,
        &parser,
        Some(&config.cache_root_or_default()),
        config.cache_ttl_or_default(),
    );
    let diff_set = diff::resolve(diff_source, &snapshot.root.canonical_path)?;

    let preset = confidence_level.preset();
    let analyzer = CoverageAnalyzer::new();
    let (impacted, mut diagnostics) = impact::analyze(
        &graph,
        &diff_set,
        &analyzer,
        preset.max_expansion_depth,
        preset.max_depth,
        preset.max_visited,
    );
    diagnostics.merge(&graph.diagnostics);

    Ok((impacted, diagnostics))
}

/// Op 6: `analyze_coverage(workspace, test_ids, diff_source) -> CoverageReport`
/// — for a given set of tests, which of the diff's changed methods they cover.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub covered: Vec<ImpactedTest>,
    pub uncovered_tests: Vec<MethodId>,
    pub diagnostics: Diagnostics,
    pub generated_at: String,
}

pub fn analyze_coverage(
    workspace: &Path,
    test_ids: &[String],
    diff_source: DiffSource<'_>,
) -> Result<CoverageReport> {
    let snapshot = source::resolve(workspace)?;
    let config = Config::load(&snapshot.root.canonical_path);
    let parser = Parser::new();
    let graph = graph::build_cached(
        &snapshot,
        &parser,
        Some(&config.cache_root_or_default()),
        config.cache_ttl_or_default(),
    );
    let diff_set = diff::resolve(diff_source, &snapshot.root.canonical_path)?;

    let requested: Vec<MethodId> = test_ids
        .iter()
        .filter_map(|pattern| graph.nodes.keys().find(|id| id.matches_pattern(pattern)).cloned())
        .collect();

    let analyzer = CoverageAnalyzer::new();
    let (all_impacted, mut diagnostics) = impact::analyze(
        &graph,
        &diff_set,
        &analyzer,
        config.max_expansion_depth_or_default(),
        config.max_depth_or_default(),
        config.max_visited_or_default(),
    );
    diagnostics.merge(&graph.diagnostics);

    let requested_set: std::collections::HashSet<MethodId> = requested.iter().cloned().collect();
    let covered: Vec<ImpactedTest> = all_impacted
        .into_iter()
        .filter(|i| requested_set.contains(&i.coverage.test_id))
        .collect();

    let covered_ids: std::collections::HashSet<MethodId> =
        covered.iter().map(|i| i.coverage.test_id.clone()).collect();
    let uncovered_tests = requested
        .into_iter()
        .filter(|id| !covered_ids.contains(id))
        .collect();

    Ok(CoverageReport {
        covered,
        uncovered_tests,
        diagnostics,
        generated_at: now_rfc3339(),
    })
}

/// Op 7: `cache(workspace, action) -> CacheReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    Status,
    Clear,
    Init,
    WarmUp,
    Stats,
}

pub fn cache(workspace: &Path, action: CacheAction) -> Result<CacheReport> {
    let config = Config::load(workspace);
    let root = config.cache_root_or_default();

    match action {
        CacheAction::Clear => {
            if root.exists() {
                std::fs::remove_dir_all(&root)?;
            }
            Ok(CacheReport::default())
        }
        CacheAction::Init => {
            std::fs::create_dir_all(&root)?;
            Ok(CacheReport::default())
        }
        CacheAction::WarmUp => {
            let snapshot = source::resolve(workspace)?;
            let parser = Parser::new();
            let _ = graph::build_cached(&snapshot, &parser, Some(&root), config.cache_ttl_or_default());
            Ok(report_from_disk(&root))
        }
        CacheAction::Status | CacheAction::Stats => Ok(report_from_disk(&root)),
    }
}

fn report_from_disk(root: &Path) -> CacheReport {
    let mut entries = 0u64;
    let mut bytes = 0u64;
    if let Ok(shards) = std::fs::read_dir(root) {
        for shard in shards.flatten() {
            if let Ok(files) = std::fs::read_dir(shard.path()) {
                for file in files.flatten() {
                    entries += 1;
                    bytes += file.metadata().map(|m| m.len()).unwrap_or(0);
                }
            }
        }
    }
    CacheReport {
        tier2_entries: entries,
        tier2_bytes: bytes,
        ..CacheReport::default()
    }
}
