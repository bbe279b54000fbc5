//! Impact Analyzer (§4.7): from a [`DiffSet`], the set of tests that MAY be
//! affected by the change. Deliberately an over-approximation — a false
//! positive here just means an extra test runs; a false negative means a
//! regression ships unnoticed.
//!
//! Grounded on the original impact engine's `map_hunks_to_functions` /
//! `analyze_diff_impact` (`impact/diff.rs`), generalized from chunk/name
//! lookups to `MethodId`/`MethodCallGraph` lookups, and extended with the
//! file-level fallback the original skipped: a hunk with no recognized
//! method signature still contributes every method whose declared line
//! falls inside the hunk's line ranges, rather than being dropped.

use crate::coverage::CoverageAnalyzer;
use crate::error::Diagnostics;
use crate::methodid::MethodId;
use crate::model::{CoverageInfo, DiffSet, LineRange, MethodCallGraph};
use crate::{classifier, coverage};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// One `(changed method, covering test)` pair, with the bounded call path
/// and confidence that justify including the test.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedTest {
    pub changed_method: MethodId,
    pub coverage: CoverageInfo,
}

/// Run the four-step §4.7 algorithm against a sealed graph.
pub fn analyze(
    graph: &MethodCallGraph,
    diff: &DiffSet,
    analyzer: &CoverageAnalyzer,
    max_expansion_depth: usize,
    max_depth: usize,
    max_visited: usize,
) -> (Vec<ImpactedTest>, Diagnostics) {
    let changed = resolve_changed_methods(graph, diff);
    if changed.is_empty() {
        return (Vec::new(), Diagnostics::default());
    }

    let closure = reverse_transitive_closure(graph, &changed, max_expansion_depth);
    let affected_tests: Vec<MethodId> = closure
        .into_iter()
        .filter(|id| graph.node(id).is_some_and(|n| n.is_test_candidate))
        .collect();

    let mut diagnostics = Diagnostics::default();
    let mut results = Vec::new();

    for test_id in &affected_tests {
        let Some(test_node) = graph.node(test_id) else { continue };
        for changed_method in &changed {
            let Some((path, depth_hit, visited_hit)) =
                analyzer.path_between(graph, test_id, changed_method, max_depth, max_visited)
            else {
                continue;
            };
            if depth_hit {
                diagnostics.depth_limit_hits += 1;
            }
            if visited_hit {
                diagnostics.visited_limit_hits += 1;
            }

            let test_type = classifier::classify_test_type(
                &test_node.simple_name,
                &test_node.containing_type,
                &test_node.namespace,
            );
            let cc = classifier::classifier_confidence(&test_node.attribute_tags, &BTreeSet::new());
            let info = CoverageInfo {
                test_id: test_id.clone(),
                test_simple_name: test_node.simple_name.clone(),
                test_class: test_node.containing_type.clone(),
                test_assembly: coverage::top_level_component(&test_node.file),
                confidence: coverage::estimate_confidence(path.len(), test_type, cc),
                call_path: path,
                test_type,
            };
            results.push(ImpactedTest {
                changed_method: changed_method.clone(),
                coverage: info,
            });
        }
    }

    // §5 ordering guarantee: (confidence desc, then lexicographic test_id) when fully consumed.
    results.sort_by(|a, b| {
        b.coverage
            .confidence
            .partial_cmp(&a.coverage.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.coverage.test_id.cmp(&b.coverage.test_id))
    });

    (results, diagnostics)
}

/// Step 1: union of recognized `changed_methods` across all records, plus
/// the file-level line-range fallback for hunks with no recognized
/// signature.
fn resolve_changed_methods(graph: &MethodCallGraph, diff: &DiffSet) -> HashSet<MethodId> {
    let mut result = HashSet::new();
    for record in &diff.records {
        let mut matched_any = false;
        for name in &record.changed_methods {
            for node in graph.nodes.values() {
                if node.file == record.file && node.simple_name.eq_ignore_ascii_case(name) {
                    result.insert(node.id.clone());
                    matched_any = true;
                }
            }
        }
        if matched_any || record.line_ranges.is_empty() {
            continue;
        }
        for node in graph.nodes.values() {
            if node.file != record.file {
                continue;
            }
            let declared = LineRange {
                start: node.line,
                end: node.line,
            };
            if record.line_ranges.iter().any(|r| r.intersects(&declared)) {
                result.insert(node.id.clone());
            }
        }
    }
    result
}

/// Step 2: reverse-transitive closure of `seeds` over `graph.reverse`,
/// bounded by `max_expansion_depth`, including the seeds themselves.
fn reverse_transitive_closure(
    graph: &MethodCallGraph,
    seeds: &HashSet<MethodId>,
    max_expansion_depth: usize,
) -> HashSet<MethodId> {
    let mut visited: HashSet<MethodId> = seeds.clone();
    let mut frontier: VecDeque<(MethodId, usize)> = seeds.iter().cloned().map(|s| (s, 0)).collect();

    while let Some((id, depth)) = frontier.pop_front() {
        if depth >= max_expansion_depth {
            continue;
        }
        for caller in graph.callers(&id) {
            if visited.insert(caller.clone()) {
                frontier.push_back((caller.clone(), depth + 1));
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeKind, ChangeRecord, MethodNode};
    use std::path::PathBuf;

    fn node(id: &str, file: &str, line: u32, is_test: bool) -> MethodNode {
        MethodNode {
            id: MethodId::new(id),
            simple_name: id.rsplit('.').next().unwrap().trim_end_matches("()").to_string(),
            containing_type: id.split('.').nth(1).unwrap_or("Global").to_string(),
            namespace: "global".to_string(),
            file: PathBuf::from(file),
            line,
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

    fn sample() -> MethodCallGraph {
        let mut g = MethodCallGraph::default();
        g.nodes.insert(MethodId::new("T.TestCheckout()"), node("T.TestCheckout()", "tests/t.rs", 1, true));
        g.nodes.insert(MethodId::new("A.Checkout()"), node("A.Checkout()", "src/a.rs", 10, false));
        g.nodes.insert(MethodId::new("A.Unrelated()"), node("A.Unrelated()", "src/a.rs", 50, false));
        edge(&mut g, "T.TestCheckout()", "A.Checkout()");
        g
    }

    #[test]
    fn recognized_method_name_drives_impact() {
        let g = sample();
        let diff = DiffSet {
            records: vec![ChangeRecord {
                file: PathBuf::from("src/a.rs"),
                kind: ChangeKind::Modified,
                line_ranges: vec![LineRange { start: 10, end: 10 }],
                changed_methods: vec!["Checkout".to_string()],
                changed_types: vec![],
            }],
            source_hint: "literal".into(),
        };
        let analyzer = CoverageAnalyzer::new();
        let (impacted, _) = analyze(&g, &diff, &analyzer, 12, 12, 2000);
        assert_eq!(impacted.len(), 1);
        assert_eq!(impacted[0].coverage.test_id, MethodId::new("T.TestCheckout()"));
        assert_eq!(impacted[0].changed_method, MethodId::new("A.Checkout()"));
    }

    #[test]
    fn unrecognized_signature_falls_back_to_the_line_range() {
        let g = sample();
        let diff = DiffSet {
            records: vec![ChangeRecord {
                file: PathBuf::from("src/a.rs"),
                kind: ChangeKind::Modified,
                line_ranges: vec![LineRange { start: 9, end: 11 }],
                changed_methods: vec![],
                changed_types: vec![],
            }],
            source_hint: "literal".into(),
        };
        let analyzer = CoverageAnalyzer::new();
        let (impacted, _) = analyze(&g, &diff, &analyzer, 12, 12, 2000);
        assert_eq!(impacted.len(), 1);
        assert_eq!(impacted[0].changed_method, MethodId::new("A.Checkout()"));
    }

    #[test]
    fn unrelated_methods_are_not_impacted() {
        let g = sample();
        let diff = DiffSet {
            records: vec![ChangeRecord {
                file: PathBuf::from("src/a.rs"),
                kind: ChangeKind::Modified,
                line_ranges: vec![LineRange { start: 50, end: 50 }],
                changed_methods: vec!["Unrelated".to_string()],
                changed_types: vec![],
            }],
            source_hint: "literal".into(),
        };
        let analyzer = CoverageAnalyzer::new();
        let (impacted, _) = analyze(&g, &diff, &analyzer, 12, 12, 2000);
        assert!(impacted.is_empty());
    }

    #[test]
    fn no_matching_changes_yields_no_impact_and_clean_diagnostics() {
        let g = sample();
        let diff = DiffSet {
            records: vec![],
            source_hint: "literal".into(),
        };
        let analyzer = CoverageAnalyzer::new();
        let (impacted, diagnostics) = analyze(&g, &diff, &analyzer, 12, 12, 2000);
        assert!(impacted.is_empty());
        assert!(diagnostics.is_clean());
    }
}
