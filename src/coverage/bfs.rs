//! Bounded breadth-first search primitives shared by `find_tests` and
//! `trace` (§4.5).
//!
//! Neighbor expansion order is deterministic everywhere: callees whose
//! containing type matches one of the search's target types are visited
//! before all others (rank 0 vs. rank 1), and ties within a rank break on
//! the callee's normalized `MethodId` — so two runs over the same graph
//! always discover the same shortest path and the same trace, a property
//! the `§8` determinism scenario depends on.

use crate::methodid::MethodId;
use crate::model::MethodCallGraph;
use std::collections::{HashSet, VecDeque};

/// Outcome of a single bounded search: the shortest discovered path (if
/// any), and whether either bound was hit along the way — surfaced by the
/// caller as `Diagnostics::depth_limit_hits` / `visited_limit_hits`.
pub struct BfsOutcome {
    pub path: Option<Vec<MethodId>>,
    pub depth_limit_hit: bool,
    pub visited_limit_hit: bool,
}

/// Sort `neighbors` so that callees whose containing type appears in
/// `preferred_types` come first, then lexicographically by normalized id
/// within each rank.
fn order_neighbors(
    graph: &MethodCallGraph,
    neighbors: impl Iterator<Item = MethodId>,
    preferred_types: &HashSet<String>,
) -> Vec<MethodId> {
    let mut ranked: Vec<(u8, MethodId)> = neighbors
        .map(|id| {
            let rank = match graph.node(&id) {
                Some(n) if preferred_types.contains(&n.containing_type) => 0,
                _ => 1,
            };
            (rank, id)
        })
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    ranked.into_iter().map(|(_, id)| id).collect()
}

/// Bounded BFS from `start` over `graph.forward`, stopping at the first
/// node found in `targets`. Direct neighbors are checked against `targets`
/// before being enqueued, so a one-hop call is found without spending a
/// queue round on it (the §4.5 "early exit when the target is a direct
/// neighbor" rule).
pub fn shortest_path_to_any(
    graph: &MethodCallGraph,
    start: &MethodId,
    targets: &HashSet<MethodId>,
    max_depth: usize,
    max_visited: usize,
) -> BfsOutcome {
    let preferred_types: HashSet<String> = targets
        .iter()
        .filter_map(|t| graph.node(t).map(|n| n.containing_type.clone()))
        .collect();

    let mut visited: HashSet<MethodId> = HashSet::new();
    visited.insert(start.clone());
    let mut queue: VecDeque<Vec<MethodId>> = VecDeque::new();
    queue.push_back(vec![start.clone()]);

    let mut depth_limit_hit = false;
    let mut visited_limit_hit = false;

    while let Some(path) = queue.pop_front() {
        let current = path.last().unwrap().clone();
        let depth = path.len() - 1;

        if targets.contains(&current) && path.len() > 1 {
            return BfsOutcome {
                path: Some(path),
                depth_limit_hit,
                visited_limit_hit,
            };
        }

        if depth >= max_depth {
            depth_limit_hit = true;
            continue;
        }

        let neighbors = order_neighbors(graph, graph.callees(&current).cloned(), &preferred_types);
        for next in neighbors {
            if targets.contains(&next) {
                let mut hit = path.clone();
                hit.push(next);
                return BfsOutcome {
                    path: Some(hit),
                    depth_limit_hit,
                    visited_limit_hit,
                };
            }
            if visited.contains(&next) {
                continue;
            }
            if visited.len() >= max_visited {
                visited_limit_hit = true;
                continue;
            }
            visited.insert(next.clone());
            let mut extended = path.clone();
            extended.push(next);
            queue.push_back(extended);
        }
    }

    BfsOutcome {
        path: None,
        depth_limit_hit,
        visited_limit_hit,
    }
}

/// A node discovered by [`forward_trace`], before classification.
pub struct TraceStep {
    pub id: MethodId,
    pub call_depth: u32,
    pub call_path: Vec<MethodId>,
}

/// Bounded forward BFS from `start`, capping total visited nodes at
/// `max_visited` and per-node expansion breadth at `max_breadth` (§4.5
/// `trace`: "per-expansion breadth cap keeps a single fan-out heavy node
/// from dominating the budget"). The starting node itself is not included
/// in the returned steps.
pub fn forward_trace(
    graph: &MethodCallGraph,
    start: &MethodId,
    max_depth: usize,
    max_visited: usize,
    max_breadth: usize,
) -> (Vec<TraceStep>, bool, bool) {
    let mut visited: HashSet<MethodId> = HashSet::new();
    visited.insert(start.clone());
    let mut queue: VecDeque<(MethodId, u32, Vec<MethodId>)> = VecDeque::new();
    queue.push_back((start.clone(), 0, vec![start.clone()]));

    let mut steps = Vec::new();
    let mut depth_limit_hit = false;
    let mut visited_limit_hit = false;
    let empty_preference = HashSet::new();

    while let Some((current, depth, path)) = queue.pop_front() {
        if depth >= max_depth as u32 {
            depth_limit_hit = true;
            continue;
        }

        let neighbors = order_neighbors(graph, graph.callees(&current).cloned(), &empty_preference);
        for next in neighbors.into_iter().take(max_breadth) {
            if visited.contains(&next) {
                continue;
            }
            if visited.len() >= max_visited {
                visited_limit_hit = true;
                break;
            }
            visited.insert(next.clone());
            let mut next_path = path.clone();
            next_path.push(next.clone());
            steps.push(TraceStep {
                id: next.clone(),
                call_depth: depth + 1,
                call_path: next_path.clone(),
            });
            queue.push_back((next, depth + 1, next_path));
        }
    }

    (steps, depth_limit_hit, visited_limit_hit)
}
