//! Syntax/Semantic Analyzer, semantic half: builds a cross-file
//! [`SemanticModel`] — every method's [`MethodId`] and a best-effort
//! resolution of every call site to one — from the per-file
//! [`crate::parser::SyntaxTree`]s the parsing half produces.
//!
//! Call resolution is necessarily approximate without full type
//! information: a callee name is matched against every method sharing its
//! simple name, case-insensitively, preferring a candidate in the same
//! containing type as the caller, then the same file, then the
//! lexicographically-first `MethodId` for determinism. Unmatched calls are
//! dropped and counted in `Diagnostics::unresolved_calls` rather than
//! failing the build, per the error handling design's "approximate, never
//! abort" policy for call resolution.

use crate::error::Diagnostics;
use crate::methodid::MethodId;
use crate::model::{CallEdge, MethodNode, WorkspaceSnapshot};
use crate::parser::{Parser, SyntaxTree};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Every method found across a workspace, plus the call edges resolved
/// between them. The input to the Call Graph Builder's node/edge
/// enumeration phases (§4.4 Phase A/B).
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    pub nodes: HashMap<MethodId, MethodNode>,
    pub edges: Vec<CallEdge>,
    pub diagnostics: Diagnostics,
}

struct FileData {
    tree: Arc<SyntaxTree>,
    /// `(id, start_byte, end_byte)` per method, for mapping a call site's
    /// byte offset back to its enclosing method.
    spans: Vec<(MethodId, usize, usize)>,
}

pub fn build(snapshot: &WorkspaceSnapshot, parser: &Parser) -> SemanticModel {
    let mut nodes: HashMap<MethodId, MethodNode> = HashMap::new();
    let mut by_simple_name: HashMap<String, Vec<MethodId>> = HashMap::new();
    let mut diagnostics = Diagnostics::default();
    let mut files_data = Vec::with_capacity(snapshot.files.len());

    for file in &snapshot.files {
        let ext = file.path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let tree = match parser.parse(ext, &file.content, &file.content_hash) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("skipping {}: {e}", file.path.display());
                diagnostics.skipped_files += 1;
                continue;
            }
        };

        let namespace = namespace_for(&file.path);
        let mut spans = Vec::with_capacity(tree.methods.len());

        for raw in &tree.methods {
            let container = raw.container.clone().unwrap_or_else(|| "_".to_string());
            let raw_id = format!("{namespace}.{container}.{}{}", raw.simple_name, raw.param_list);
            let id = MethodId::new(raw_id);

            let own_tags: BTreeSet<String> = tree.tags_for_line(raw.start_line).into_iter().collect();
            let container_tags: BTreeSet<String> = raw
                .container_line
                .map(|l| tree.tags_for_line(l).into_iter().collect())
                .unwrap_or_default();

            let is_parameterless = is_empty_param_list(&raw.param_list);
            let is_test_candidate = crate::classifier::is_test_candidate(
                &raw.simple_name,
                &own_tags,
                &container_tags,
                raw.is_public,
                is_parameterless,
            );

            let node = MethodNode {
                id: id.clone(),
                simple_name: raw.simple_name.clone(),
                containing_type: container,
                namespace: namespace.clone(),
                file: file.path.clone(),
                line: raw.start_line,
                is_test_candidate,
                attribute_tags: own_tags,
            };

            by_simple_name
                .entry(raw.simple_name.to_ascii_lowercase())
                .or_default()
                .push(id.clone());
            spans.push((id.clone(), raw.start_byte, raw.end_byte));
            nodes.insert(id, node);
        }

        files_data.push(FileData { tree, spans });
    }

    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    for fd in &files_data {
        for call in &fd.tree.calls {
            let Some(caller_id) = enclosing_method(&fd.spans, call.byte_offset) else {
                continue;
            };
            let key = call.callee_name.to_ascii_lowercase();
            let Some(candidates) = by_simple_name.get(&key) else {
                diagnostics.unresolved_calls += 1;
                continue;
            };
            let Some(callee_id) = resolve_candidate(&nodes, candidates, &caller_id) else {
                diagnostics.unresolved_calls += 1;
                continue;
            };
            if seen.insert((caller_id.clone(), callee_id.clone())) {
                edges.push(CallEdge {
                    caller: caller_id,
                    callee: callee_id,
                });
            }
        }
    }

    SemanticModel {
        nodes,
        edges,
        diagnostics,
    }
}

fn is_empty_param_list(param_list: &str) -> bool {
    param_list.trim_start_matches('(').trim_end_matches(')').trim().is_empty()
}

/// Directory-derived pseudo-namespace: the relative path's parent
/// directory with components dotted, or `"global"` for a file at the
/// workspace root. No language here has true namespace declarations parsed
/// (C#'s `namespace` blocks included) — this is a deliberate, documented
/// simplification, not an attempt at full namespace resolution.
fn namespace_for(path: &Path) -> String {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let dotted: Vec<&str> = parent
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if dotted.is_empty() {
        "global".to_string()
    } else {
        dotted.join(".")
    }
}

fn enclosing_method(spans: &[(MethodId, usize, usize)], offset: usize) -> Option<MethodId> {
    spans
        .iter()
        .filter(|(_, start, end)| *start <= offset && offset < *end)
        .min_by_key(|(_, start, end)| end - start)
        .map(|(id, _, _)| id.clone())
}

fn resolve_candidate(
    nodes: &HashMap<MethodId, MethodNode>,
    candidates: &[MethodId],
    caller_id: &MethodId,
) -> Option<MethodId> {
    if candidates.len() == 1 {
        return Some(candidates[0].clone());
    }
    let caller_node = nodes.get(caller_id)?;

    if let Some(same_container) = candidates.iter().find(|id| {
        nodes
            .get(*id)
            .is_some_and(|n| n.containing_type == caller_node.containing_type)
    }) {
        return Some(same_container.clone());
    }
    if let Some(same_file) = candidates
        .iter()
        .find(|id| nodes.get(*id).is_some_and(|n| n.file == caller_node.file))
    {
        return Some(same_file.clone());
    }
    candidates.iter().min().cloned()
}
