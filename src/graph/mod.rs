//! Call Graph Builder (§4.3): turns a [`crate::semantic::SemanticModel`]
//! into a sealed [`MethodCallGraph`], plus the scoped/incremental variant
//! used for targeted coverage queries.

mod arena;

use crate::cache::Cache;
use crate::methodid::MethodId;
use crate::model::{MethodCallGraph, WorkspaceSnapshot};
use crate::parser::Parser;
use arena::Arena;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

/// Phase A (enumerate nodes), B (resolve edges), C (transpose), D (seal).
/// Parses the whole snapshot — callers needing a targeted subgraph should
/// use [`build_scoped`] instead.
pub fn build(snapshot: &WorkspaceSnapshot, parser: &Parser) -> MethodCallGraph {
    let model = crate::semantic::build(snapshot, parser);

    let mut arena = Arena::new();
    for node in model.nodes.into_values() {
        arena.insert_node(node);
    }
    for edge in &model.edges {
        if let (Some(caller), Some(callee)) =
            (arena.index_for(&edge.caller), arena.index_for(&edge.callee))
        {
            arena.add_edge(caller, callee);
        }
    }

    let mut graph = arena.seal();
    graph.diagnostics = model.diagnostics;
    graph
}

/// Scope-hash for a whole-workspace [`build`], as opposed to a
/// [`build_scoped`] neighborhood keyed by its own seed-derived hash. Used
/// as the second half of the `(workspace-fingerprint, scope-hash)` cache
/// key §4.8 specifies for graph artifacts.
pub const FULL_GRAPH_SCOPE: &str = "full";

fn cache_key(workspace_fingerprint: &str, scope_hash: &str) -> String {
    format!("{workspace_fingerprint}:{scope_hash}")
}

/// [`build`], but checked against and written through the multi-tier cache
/// (§4.8) before falling back to a real parse-and-resolve pass. The cache
/// key is `(workspace fingerprint, scope-hash)`; a full build always uses
/// [`FULL_GRAPH_SCOPE`] as its scope-hash. `cache_root = None` disables the
/// on-disk tier and behaves exactly like plain `build`.
///
/// This is what makes `CacheAction::WarmUp` (§6 op 7) actually warm
/// anything: without it, a graph built during warm-up was discarded the
/// moment the call returned, so a later `analyze`/`find_tests`/etc. against
/// the same workspace would rebuild from scratch regardless — no reuse, no
/// speedup, and §8's "warm-cache speedup" property unsatisfiable.
pub fn build_cached(
    snapshot: &WorkspaceSnapshot,
    parser: &Parser,
    cache_root: Option<&Path>,
    cache_ttl_secs: u64,
) -> MethodCallGraph {
    let cache: Cache<MethodCallGraph> = Cache::new(cache_root, cache_ttl_secs);
    let key = cache_key(&snapshot.root.fingerprint, FULL_GRAPH_SCOPE);

    if let Some(hit) = cache.get(&key) {
        return (*hit).clone();
    }

    let graph = build(snapshot, parser);
    cache.insert(&key, Arc::new(graph.clone()));
    graph
}

/// Targeted variant: build the full graph (parsing is the dominant cost
/// either way without a persisted method→file index to consult ahead of
/// time — see DESIGN.md), then restrict to the bidirectional
/// `max_expansion_depth`-bounded neighborhood of `seeds`.
///
/// Edges that would have left the kept neighborhood are recorded as
/// `Diagnostics::depth_limit_hits` rather than surfaced as an error — the
/// §9 Open Question resolution treats a scoped build's missing reverse
/// edges as a soft signal, not a failure.
pub fn build_scoped(
    snapshot: &WorkspaceSnapshot,
    parser: &Parser,
    seeds: &[MethodId],
    max_expansion_depth: usize,
) -> MethodCallGraph {
    let full = build(snapshot, parser);

    let mut keep: HashSet<MethodId> = seeds.iter().cloned().collect();
    let mut frontier: VecDeque<(MethodId, usize)> = seeds.iter().cloned().map(|s| (s, 0)).collect();

    while let Some((id, depth)) = frontier.pop_front() {
        if depth >= max_expansion_depth {
            continue;
        }
        let neighbors: Vec<MethodId> = full
            .callees(&id)
            .chain(full.callers(&id))
            .cloned()
            .collect();
        for n in neighbors {
            if keep.insert(n.clone()) {
                frontier.push_back((n, depth + 1));
            }
        }
    }

    let mut scoped = MethodCallGraph {
        diagnostics: full.diagnostics.clone(),
        ..Default::default()
    };

    for id in &keep {
        if let Some(node) = full.node(id) {
            scoped.nodes.insert(id.clone(), node.clone());
        }

        let callees: BTreeSet<MethodId> = full.callees(id).filter(|c| keep.contains(*c)).cloned().collect();
        if !callees.is_empty() {
            scoped.forward.insert(id.clone(), callees);
        }
        let callers: BTreeSet<MethodId> = full.callers(id).filter(|c| keep.contains(*c)).cloned().collect();
        if !callers.is_empty() {
            scoped.reverse.insert(id.clone(), callers);
        }

        let out_of_scope = full.callees(id).filter(|c| !keep.contains(*c)).count() as u64;
        scoped.diagnostics.depth_limit_hits += out_of_scope;
    }

    scoped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceFile, WorkspaceKind, WorkspaceRoot};
    use std::path::PathBuf;

    fn snapshot(files: Vec<(&str, &str)>) -> WorkspaceSnapshot {
        let files = files
            .into_iter()
            .map(|(path, content)| SourceFile {
                path: PathBuf::from(path),
                content_hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
                content: content.to_string(),
                size: content.len() as u64,
            })
            .collect();
        WorkspaceSnapshot {
            root: WorkspaceRoot {
                canonical_path: PathBuf::from("/ws"),
                kind: WorkspaceKind::Directory,
                fingerprint: "fp".into(),
            },
            files,
        }
    }

    #[test]
    #[cfg(feature = "lang-rust")]
    fn build_produces_a_transpose_consistent_graph() {
        let snap = snapshot(vec![("src/lib.rs", "fn bar() {}\nfn foo() {\n    bar();\n}\n")]);
        let parser = Parser::new();
        let graph = build(&snap, &parser);
        assert!(graph.check_transpose_invariant());
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    #[cfg(feature = "lang-rust")]
    fn build_scoped_restricts_to_the_seed_neighborhood() {
        let snap = snapshot(vec![(
            "src/lib.rs",
            "fn a() {}\nfn b() {\n    a();\n}\nfn c() {\n    b();\n}\nfn unrelated() {}\n",
        )]);
        let parser = Parser::new();
        let full = build(&snap, &parser);
        let a_id = full
            .nodes
            .keys()
            .find(|id| id.simple_name() == "a")
            .unwrap()
            .clone();

        let scoped = build_scoped(&snap, &parser, &[a_id], 1);
        assert!(scoped.nodes.keys().any(|id| id.simple_name() == "a"));
        assert!(scoped.nodes.keys().any(|id| id.simple_name() == "b"));
        assert!(!scoped.nodes.keys().any(|id| id.simple_name() == "unrelated"));
    }
}
