//! Core data-model types from the data model: `WorkspaceRoot`, `SourceFile`,
//! `MethodNode`, `CallEdge`, `MethodCallGraph`, `ChangeRecord`, `DiffSet`,
//! `CoverageInfo`, `ExecutionTrace`.

use crate::methodid::MethodId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Kind of input a `WorkspaceRoot` was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkspaceKind {
    SolutionManifest,
    ProjectManifest,
    Directory,
    FileList,
}

/// An immutable, canonical workspace root plus the fingerprint over its
/// included files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRoot {
    pub canonical_path: PathBuf,
    pub kind: WorkspaceKind,
    /// 128-bit fingerprint, rendered as a 32-hex-char string for portability.
    pub fingerprint: String,
}

/// A single source file's content snapshot. A `SourceFile` belongs to at
/// most one `WorkspaceSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub path: PathBuf,
    #[serde(skip)]
    pub content: String,
    pub content_hash: String,
    pub size: u64,
}

/// The resolved, ordered set of files plus fingerprint produced by the
/// Source Acquirer (§4.1).
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
    pub root: WorkspaceRoot,
    pub files: Vec<SourceFile>,
}

impl WorkspaceSnapshot {
    pub fn file_for(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// A test category assigned by the Method Classifier (§4.6), reused for
/// `CoverageInfo::test_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestType {
    Unit,
    Integration,
    EndToEnd,
    #[serde(rename = "ui")]
    UI,
    #[serde(rename = "api")]
    API,
    Database,
    Performance,
    Security,
    Unknown,
}

impl TestType {
    /// Multiplier from §4.5.1's confidence function.
    pub fn confidence_factor(self) -> f64 {
        match self {
            TestType::Unit => 1.00,
            TestType::Integration => 0.90,
            TestType::EndToEnd => 0.80,
            _ => 0.90,
        }
    }
}

/// Execution-category tag assigned to each node visited by a forward trace
/// (§3 `ExecutedMethod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodCategory {
    BusinessLogic,
    DataAccess,
    Infrastructure,
    Framework,
    ThirdParty,
    TestUtility,
}

/// `{ id, simple_name, containing_type, file, line, is_test_candidate,
/// attribute_tags }` from the data model, plus the directory-derived
/// pseudo-namespace the classifier's §4.6 namespace-token rule needs.
/// Immutable once the graph that contains it is sealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodNode {
    pub id: MethodId,
    pub simple_name: String,
    pub containing_type: String,
    pub namespace: String,
    pub file: PathBuf,
    pub line: u32,
    pub is_test_candidate: bool,
    /// `BTreeSet`, not `HashSet`: this node is serialized as part of a
    /// cached `MethodCallGraph`, and a `HashSet`'s iteration order (seeded
    /// per-process) would otherwise make the serialized bytes vary between
    /// two independent, content-identical builds (§8 "cache determinism").
    pub attribute_tags: BTreeSet<String>,
}

/// Directed `(caller, callee)` edge. Parallel edges are collapsed; self-loops
/// are permitted but must not extend BFS depth (enforced by the BFS
/// implementation in `coverage::bfs`, not by this type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: MethodId,
    pub callee: MethodId,
}

/// `{ nodes, forward, reverse }`. Invariant: `∀ (a,b) ∈ forward ⇒ (b,a) ∈
/// reverse`; enforced by construction in `graph::build` — there is no public
/// mutator that can add a forward edge without its transpose.
///
/// Backed by `BTreeMap`/`BTreeSet` rather than `HashMap`/`HashSet`: this type
/// is what the Tier 2 disk cache serializes (§4.8), and two independently
/// built graphs over identical content must serialize to byte-identical
/// `bincode` output (§8 "cache determinism"). A `HashMap`/`HashSet` orders
/// its entries by a per-process-random hasher seed, so the same logical
/// graph would serialize differently run to run; ordering every map/set by
/// `MethodId`'s `Ord` (itself defined over the normalized form) makes the
/// serialization a pure function of graph content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodCallGraph {
    pub nodes: BTreeMap<MethodId, MethodNode>,
    pub forward: BTreeMap<MethodId, BTreeSet<MethodId>>,
    pub reverse: BTreeMap<MethodId, BTreeSet<MethodId>>,
    /// Bounds-related and resolution diagnostics accumulated while building.
    pub diagnostics: crate::error::Diagnostics,
}

impl MethodCallGraph {
    pub fn node(&self, id: &MethodId) -> Option<&MethodNode> {
        self.nodes.get(id)
    }

    pub fn callees(&self, id: &MethodId) -> impl Iterator<Item = &MethodId> {
        self.forward.get(id).into_iter().flatten()
    }

    pub fn callers(&self, id: &MethodId) -> impl Iterator<Item = &MethodId> {
        self.reverse.get(id).into_iter().flatten()
    }

    /// Checks the §8 quantified invariant `∀ (a,b) ∈ forward ⇔ (b,a) ∈
    /// reverse`. Exercised by property tests; not called on the hot path.
    pub fn check_transpose_invariant(&self) -> bool {
        for (a, callees) in &self.forward {
            for b in callees {
                match self.reverse.get(b) {
                    Some(callers) if callers.contains(a) => {}
                    _ => return false,
                }
            }
        }
        for (b, callers) in &self.reverse {
            for a in callers {
                match self.forward.get(a) {
                    Some(callees) if callees.contains(b) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

/// Kind of change recorded for a file by the Diff Parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// An inclusive `[start, end]` line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn intersects(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// `{ file, kind, line_ranges, changed_methods, changed_types }`, derived
/// purely from diff text — never consults the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub file: PathBuf,
    pub kind: ChangeKind,
    pub line_ranges: Vec<LineRange>,
    pub changed_methods: Vec<String>,
    pub changed_types: Vec<String>,
}

/// Ordered `ChangeRecord`s plus the textual source hint they were parsed
/// from. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSet {
    pub records: Vec<ChangeRecord>,
    pub source_hint: String,
}

/// A single evidence record linking a test to a target method through a
/// bounded shortest path (§3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageInfo {
    pub test_id: MethodId,
    pub test_simple_name: String,
    pub test_class: String,
    pub test_assembly: String,
    /// `call_path[0] == test_id`, `call_path[last] == target_id`, all
    /// intermediate ids distinct, `len >= 2`.
    pub call_path: Vec<MethodId>,
    pub confidence: f64,
    pub test_type: TestType,
}

/// A single node visited during a forward trace, with its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedMethod {
    pub id: MethodId,
    pub is_production: bool,
    pub category: MethodCategory,
    pub call_depth: u32,
    pub call_path: Vec<MethodId>,
}

/// The bounded forward-reachable set from a test method, with per-node
/// classification (§3, §4.5 `trace`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrace {
    pub test_id: MethodId,
    pub executed: Vec<ExecutedMethod>,
    pub total_called: usize,
    pub production_called: usize,
    pub estimated_complexity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str) -> CallEdge {
        CallEdge {
            caller: MethodId::new(a),
            callee: MethodId::new(b),
        }
    }

    #[test]
    fn transpose_invariant_holds_for_a_correctly_built_graph() {
        let mut g = MethodCallGraph::default();
        let e = edge("A.Foo", "A.Bar");
        g.forward
            .entry(e.caller.clone())
            .or_default()
            .insert(e.callee.clone());
        g.reverse
            .entry(e.callee.clone())
            .or_default()
            .insert(e.caller.clone());
        assert!(g.check_transpose_invariant());
    }

    #[test]
    fn transpose_invariant_fails_when_reverse_edge_missing() {
        let mut g = MethodCallGraph::default();
        let e = edge("A.Foo", "A.Bar");
        g.forward
            .entry(e.caller)
            .or_default()
            .insert(e.callee);
        assert!(!g.check_transpose_invariant());
    }

    #[test]
    fn line_range_intersection() {
        let a = LineRange { start: 10, end: 20 };
        let b = LineRange { start: 20, end: 30 };
        let c = LineRange { start: 21, end: 30 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_type_confidence_factors_match_the_table() {
        assert_eq!(TestType::Unit.confidence_factor(), 1.00);
        assert_eq!(TestType::Integration.confidence_factor(), 0.90);
        assert_eq!(TestType::EndToEnd.confidence_factor(), 0.80);
        assert_eq!(TestType::API.confidence_factor(), 0.90);
    }
}
