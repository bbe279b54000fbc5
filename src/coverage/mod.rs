//! Coverage Analyzer (§4.5): `find_tests` (reverse lookup — which tests
//! reach a method) and `trace` (forward lookup — what a test executes).
//!
//! Both operations fan the per-test-candidate or per-expansion work out
//! over the shared `rayon` pool and stream partial results back through a
//! bounded `crossbeam_channel`, the same pattern the original indexer used
//! for parallel chunk embedding — generalized here from "embed N chunks"
//! to "BFS from N test candidates".

pub mod bfs;
mod confidence;

use crate::classifier;
use crate::error::{AnalysisError, Diagnostics};
use crate::methodid::MethodId;
use crate::model::{CoverageInfo, ExecutedMethod, ExecutionTrace, MethodCallGraph};
use lru::LruCache;
use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Per-query result caches. `path_cache` remembers, for a `(test, target)`
/// pair already searched, either the shortest path found or that none
/// exists within the bound used at the time — a later call with a looser
/// bound will recompute rather than trust a stale negative, since the
/// cache key carries no bound information (documented limitation: bounds
/// are assumed stable for the lifetime of one `CoverageAnalyzer`).
pub struct CoverageAnalyzer {
    path_cache: Mutex<LruCache<(MethodId, MethodId), Option<Vec<MethodId>>>>,
    trace_cache: Mutex<LruCache<MethodId, Arc<ExecutionTrace>>>,
}

impl Default for CoverageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageAnalyzer {
    pub fn new() -> Self {
        CoverageAnalyzer {
            path_cache: Mutex::new(LruCache::new(NonZeroUsize::new(4096).unwrap())),
            trace_cache: Mutex::new(LruCache::new(NonZeroUsize::new(512).unwrap())),
        }
    }

    /// Reverse lookup: every test candidate in `graph` with a bounded call
    /// path to a method matching `pattern` (§4.5 `find_tests`). Pattern
    /// resolution uses [`MethodId::matches_pattern`] directly, so a pattern
    /// may resolve to more than one node (overloads, or a bare method name
    /// shared across types).
    pub fn find_tests(
        &self,
        graph: &MethodCallGraph,
        pattern: &str,
        max_depth: usize,
        max_visited: usize,
    ) -> (Vec<CoverageInfo>, Diagnostics) {
        let targets: HashSet<MethodId> = graph
            .nodes
            .keys()
            .filter(|id| id.matches_pattern(pattern))
            .cloned()
            .collect();

        if targets.is_empty() {
            return (Vec::new(), Diagnostics::default());
        }

        let candidates: Vec<&crate::model::MethodNode> =
            graph.nodes.values().filter(|n| n.is_test_candidate).collect();

        let (tx, rx) = crossbeam_channel::bounded::<(CoverageInfo, bool, bool)>(candidates.len().max(1));

        rayon::scope(|scope| {
            for test in &candidates {
                let tx = tx.clone();
                let targets = &targets;
                scope.spawn(move |_| {
                    if let Some(outcome) = self.path_to_any(graph, &test.id, targets, max_depth, max_visited) {
                        let (path, depth_hit, visited_hit) = outcome;
                        let test_type =
                            classifier::classify_test_type(&test.simple_name, &test.containing_type, &test.namespace);
                        let cc = classifier::classifier_confidence(&test.attribute_tags, &BTreeSet::new());
                        let conf = confidence::confidence(path.len(), test_type, cc);
                        let info = CoverageInfo {
                            test_id: test.id.clone(),
                            test_simple_name: test.simple_name.clone(),
                            test_class: test.containing_type.clone(),
                            test_assembly: top_level_component(&test.file),
                            call_path: path,
                            confidence: conf,
                            test_type,
                        };
                        let _ = tx.send((info, depth_hit, visited_hit));
                    }
                });
            }
        });
        drop(tx);

        let mut results = Vec::new();
        let mut diagnostics = Diagnostics::default();
        while let Ok((info, depth_hit, visited_hit)) = rx.recv() {
            if depth_hit {
                diagnostics.depth_limit_hits += 1;
            }
            if visited_hit {
                diagnostics.visited_limit_hits += 1;
            }
            results.push(info);
        }
        results.sort_by(|a, b| a.test_id.cmp(&b.test_id));
        (results, diagnostics)
    }

    /// Shortest bounded path from `start` to the single `target`, used by
    /// the Impact Analyzer to attach a `CoverageInfo` to a specific
    /// `(test, changed method)` pair rather than the "any target" search
    /// `find_tests` performs.
    pub fn path_between(
        &self,
        graph: &MethodCallGraph,
        start: &MethodId,
        target: &MethodId,
        max_depth: usize,
        max_visited: usize,
    ) -> Option<(Vec<MethodId>, bool, bool)> {
        let targets: HashSet<MethodId> = [target.clone()].into_iter().collect();
        self.path_to_any(graph, start, &targets, max_depth, max_visited)
    }

    /// Check the path cache before falling back to a bounded BFS, updating
    /// the cache with whatever the search discovered.
    fn path_to_any(
        &self,
        graph: &MethodCallGraph,
        start: &MethodId,
        targets: &HashSet<MethodId>,
        max_depth: usize,
        max_visited: usize,
    ) -> Option<(Vec<MethodId>, bool, bool)> {
        {
            let mut cache = self.path_cache.lock().unwrap_or_else(|p| p.into_inner());
            for target in targets {
                if let Some(hit) = cache.get(&(start.clone(), target.clone())) {
                    return hit.clone().map(|path| (path, false, false));
                }
            }
        }

        let outcome = bfs::shortest_path_to_any(graph, start, targets, max_depth, max_visited);
        let mut cache = self.path_cache.lock().unwrap_or_else(|p| p.into_inner());
        match &outcome.path {
            Some(path) => {
                let found_target = path.last().unwrap().clone();
                cache.put((start.clone(), found_target), Some(path.clone()));
            }
            None => {
                for target in targets {
                    cache.put((start.clone(), target.clone()), None);
                }
            }
        }
        outcome
            .path
            .map(|path| (path, outcome.depth_limit_hit, outcome.visited_limit_hit))
    }

    /// Forward lookup: the bounded reachable set from `test_id`, classified
    /// node by node (§4.5 `trace`).
    pub fn trace(
        &self,
        graph: &MethodCallGraph,
        test_id: &MethodId,
        max_depth: usize,
        max_visited: usize,
        max_breadth: usize,
    ) -> Result<ExecutionTrace, AnalysisError> {
        if let Some(cached) = {
            let mut cache = self.trace_cache.lock().unwrap_or_else(|p| p.into_inner());
            cache.get(test_id).cloned()
        } {
            return Ok((*cached).clone());
        }

        if graph.node(test_id).is_none() {
            return Err(AnalysisError::TestNotFound(test_id.raw().to_string()));
        }

        let (steps, depth_hit, visited_hit) = bfs::forward_trace(graph, test_id, max_depth, max_visited, max_breadth);
        if depth_hit || visited_hit {
            tracing::debug!(
                test = %test_id,
                depth_hit,
                visited_hit,
                "trace hit a search bound before exhausting the reachable set"
            );
        }

        let executed: Vec<ExecutedMethod> = steps
            .iter()
            .filter_map(|step| {
                graph.node(&step.id).map(|node| ExecutedMethod {
                    id: step.id.clone(),
                    is_production: !node.is_test_candidate,
                    category: classifier::classify_category(node),
                    call_depth: step.call_depth,
                    call_path: step.call_path.clone(),
                })
            })
            .collect();

        let total_called = executed.len();
        let production_called = executed.iter().filter(|e| e.is_production).count();
        // A linear function of the visited-node count (§4.5.1): coefficient 1.0,
        // i.e. one unit of estimated complexity per method transitively exercised.
        let estimated_complexity = total_called as f64;

        let trace = ExecutionTrace {
            test_id: test_id.clone(),
            executed,
            total_called,
            production_called,
            estimated_complexity,
        };

        let mut cache = self.trace_cache.lock().unwrap_or_else(|p| p.into_inner());
        cache.put(test_id.clone(), Arc::new(trace.clone()));
        Ok(trace)
    }
}

/// Combine the §4.5.1 confidence factors for a path of the given length,
/// shared with the Impact Analyzer so both components score `CoverageInfo`
/// identically.
pub fn estimate_confidence(path_len: usize, test_type: crate::model::TestType, classifier_confidence: f64) -> f64 {
    confidence::confidence(path_len, test_type, classifier_confidence)
}

/// Best-effort stand-in for "assembly" in languages with no assembly
/// concept: the first path component under the workspace root.
pub(crate) fn top_level_component(file: &Path) -> String {
    file.components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MethodNode;
    use std::path::PathBuf;

    fn node(id: &str, containing_type: &str, is_test: bool) -> MethodNode {
        MethodNode {
            id: MethodId::new(id),
            simple_name: id.rsplit('.').next().unwrap().to_string(),
            containing_type: containing_type.to_string(),
            namespace: "global".to_string(),
            file: PathBuf::from("src/thing.rs"),
            line: 1,
            is_test_candidate: is_test,
            attribute_tags: if is_test {
                ["Test".to_string()].into_iter().collect()
            } else {
                BTreeSet::new()
            },
        }
    }

    fn edge(g: &mut MethodCallGraph, a: &str, b: &str) {
        g.forward.entry(MethodId::new(a)).or_default().insert(MethodId::new(b));
        g.reverse.entry(MethodId::new(b)).or_default().insert(MethodId::new(a));
    }

    fn sample_graph() -> MethodCallGraph {
        let mut g = MethodCallGraph::default();
        g.nodes.insert(MethodId::new("T.TestFoo"), node("T.TestFoo", "T", true));
        g.nodes.insert(MethodId::new("A.Mid"), node("A.Mid", "A", false));
        g.nodes.insert(MethodId::new("A.Target"), node("A.Target", "A", false));
        edge(&mut g, "T.TestFoo", "A.Mid");
        edge(&mut g, "A.Mid", "A.Target");
        g
    }

    #[test]
    fn find_tests_locates_the_reverse_path_with_positive_confidence() {
        let g = sample_graph();
        let analyzer = CoverageAnalyzer::new();
        let (results, diagnostics) = analyzer.find_tests(&g, "Target", 12, 2000);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].test_id, MethodId::new("T.TestFoo"));
        assert!(results[0].confidence > 0.0);
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn find_tests_returns_nothing_for_an_unmatched_pattern() {
        let g = sample_graph();
        let analyzer = CoverageAnalyzer::new();
        let (results, _) = analyzer.find_tests(&g, "NoSuchMethod", 12, 2000);
        assert!(results.is_empty());
    }

    #[test]
    fn trace_excludes_the_starting_test_and_classifies_production_methods() {
        let g = sample_graph();
        let analyzer = CoverageAnalyzer::new();
        let trace = analyzer.trace(&g, &MethodId::new("T.TestFoo"), 20, 2000, 50).unwrap();
        assert_eq!(trace.total_called, 2);
        assert_eq!(trace.production_called, 2);
        assert!(trace.executed.iter().all(|e| e.id != MethodId::new("T.TestFoo")));
    }

    #[test]
    fn trace_of_an_unknown_method_is_test_not_found() {
        let g = sample_graph();
        let analyzer = CoverageAnalyzer::new();
        let err = analyzer.trace(&g, &MethodId::new("Nope.Nope"), 20, 2000, 50).unwrap_err();
        assert!(matches!(err, AnalysisError::TestNotFound(_)));
    }
}
