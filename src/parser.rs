//! Syntax/Semantic Analyzer, parsing half (§4.2).
//!
//! Parses one file's content into a [`SyntaxTree`]: the raw method
//! declarations, call sites, and attribute/annotation tags a tree-sitter
//! query pass can extract, with no cross-file knowledge yet — that layer
//! (symbol resolution into [`crate::methodid::MethodId`]s) lives in
//! [`crate::semantic`].
//!
//! Grounded on the tree-sitter query-compilation and `tree.root_node()`
//! walk this crate's parser always used, generalized from chunk extraction
//! (whole function/class bodies for indexing) to the three query families
//! [`crate::language::LanguageDef`] now exposes: method declarations, call
//! sites, and test-attribute tags.
//!
//! Trees are pooled by content hash (`blake3` of the normalized source
//! text) in a Tier 1 [`crate::cache::MemoryCache`], with a per-hash
//! single-flight `OnceCell` guard so concurrent callers parsing the same
//! content block on one parse rather than racing duplicate work.

use crate::cache::MemoryCache;
use crate::language::{LanguageDef, REGISTRY};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tree_sitter::StreamingIterator;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("failed to parse {0}")]
    ParseFailed(String),
    #[error("failed to compile query for {0}: {1}")]
    QueryCompileFailed(String, String),
}

/// A single method/function declaration found by the method query.
#[derive(Debug, Clone)]
pub struct RawMethod {
    pub simple_name: String,
    /// Enclosing class/struct/impl name, if the declaration sits inside one.
    pub container: Option<String>,
    /// Line of the container's name token, used to window-match attribute
    /// tags attached to the containing type rather than the method itself.
    pub container_line: Option<u32>,
    /// Canonical parenthesized parameter-list text, e.g. `"(x: i32, y: String)"`.
    pub param_list: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: u32,
    pub end_line: u32,
    /// Best-effort externally-visible heuristic (`pub `/`public `/no leading
    /// underscore), used by the classifier's test-candidate rule.
    pub is_public: bool,
}

/// A call-expression site found by the call query, not yet resolved to a
/// [`crate::methodid::MethodId`] — that happens in [`crate::semantic`]
/// once every file's methods are known.
#[derive(Debug, Clone)]
pub struct RawCall {
    pub callee_name: String,
    pub byte_offset: usize,
    pub line: u32,
}

/// An attribute/annotation/decorator tag, with the line it was found on.
/// Association to a method or containing type is proximity-based (within
/// a small line window immediately above the declaration) since tree-sitter
/// queries surface tags and declarations as independent matches.
#[derive(Debug, Clone)]
pub struct RawTag {
    pub name: String,
    pub line: u32,
}

/// Parsed, per-file syntax information: a pure function of file content
/// (§4.2 "`parse(file) -> SyntaxTree` — pure function of file content").
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub methods: Vec<RawMethod>,
    pub calls: Vec<RawCall>,
    pub tags: Vec<RawTag>,
}

/// How many lines above a declaration to scan for attached attribute tags.
/// Generous enough for a handful of stacked attributes
/// (`[Test] [Category("slow")] public void Foo()`) plus a blank line.
const ATTRIBUTE_WINDOW: u32 = 6;

impl SyntaxTree {
    /// Tags attached to the method starting at `start_line` (1-indexed):
    /// any tag within [`ATTRIBUTE_WINDOW`] lines immediately above it.
    pub fn tags_for_line(&self, start_line: u32) -> Vec<String> {
        let floor = start_line.saturating_sub(ATTRIBUTE_WINDOW);
        self.tags
            .iter()
            .filter(|t| t.line >= floor && t.line < start_line)
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Parses source files into [`SyntaxTree`]s, pooling results by content
/// hash so identical content (duplicated vendored files, repeated builds
/// of an unchanged workspace) is parsed once.
pub struct Parser {
    pool: MemoryCache<SyntaxTree>,
    inflight: Mutex<HashMap<String, Arc<OnceCell<Result<Arc<SyntaxTree>, String>>>>>,
    queries: Mutex<HashMap<&'static str, Arc<CompiledQueries>>>,
}

struct CompiledQueries {
    method: tree_sitter::Query,
    call: tree_sitter::Query,
    attribute: Option<tree_sitter::Query>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            pool: MemoryCache::new(512, 64 * 1024 * 1024),
            inflight: Mutex::new(HashMap::new()),
            queries: Mutex::new(HashMap::new()),
        }
    }

    /// Parse `content` (already read and line-ending-normalized by the
    /// Source Acquirer) for the language matching `ext`. Single-flights
    /// concurrent calls for the same `content_hash`.
    pub fn parse(
        &self,
        ext: &str,
        content: &str,
        content_hash: &str,
    ) -> Result<Arc<SyntaxTree>, ParserError> {
        if let Some(hit) = self.pool.get(content_hash) {
            return Ok(hit);
        }

        let cell = {
            let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
            inflight
                .entry(content_hash.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_init(|| {
            self.parse_uncached(ext, content)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        });

        // Drop the single-flight entry once resolved so the guard table
        // doesn't grow unbounded across a long-running process.
        self.inflight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(content_hash);

        match result {
            Ok(tree) => {
                self.pool.insert(content_hash.to_string(), tree.clone(), approx_size(tree));
                Ok(tree.clone())
            }
            Err(msg) => Err(ParserError::ParseFailed(msg.clone())),
        }
    }

    fn parse_uncached(&self, ext: &str, content: &str) -> Result<SyntaxTree, ParserError> {
        let def = REGISTRY
            .from_extension(ext)
            .ok_or_else(|| ParserError::UnsupportedFileType(ext.to_string()))?;

        let queries = self.compiled_queries(def)?;

        let grammar = (def.grammar)();
        let mut ts_parser = tree_sitter::Parser::new();
        ts_parser
            .set_language(&grammar)
            .map_err(|e| ParserError::ParseFailed(format!("{e:?}")))?;
        let tree = ts_parser
            .parse(content, None)
            .ok_or_else(|| ParserError::ParseFailed(def.name.to_string()))?;

        let methods = extract_methods(&tree, content, &queries.method);
        let calls = extract_calls(&tree, content, &queries.call);
        let tags = queries
            .attribute
            .as_ref()
            .map(|q| extract_tags(&tree, content, q))
            .unwrap_or_default();

        Ok(SyntaxTree {
            methods,
            calls,
            tags,
        })
    }

    fn compiled_queries(&self, def: &'static LanguageDef) -> Result<Arc<CompiledQueries>, ParserError> {
        let mut cache = self.queries.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(q) = cache.get(def.name) {
            return Ok(q.clone());
        }
        let grammar = (def.grammar)();
        let method = tree_sitter::Query::new(&grammar, def.method_query)
            .map_err(|e| ParserError::QueryCompileFailed(def.name.to_string(), format!("{e:?}")))?;
        let call = tree_sitter::Query::new(&grammar, def.call_query)
            .map_err(|e| ParserError::QueryCompileFailed(def.name.to_string(), format!("{e:?}")))?;
        let attribute = def
            .attribute_query
            .map(|pattern| tree_sitter::Query::new(&grammar, pattern))
            .transpose()
            .map_err(|e| ParserError::QueryCompileFailed(def.name.to_string(), format!("{e:?}")))?;

        let compiled = Arc::new(CompiledQueries {
            method,
            call,
            attribute,
        });
        cache.insert(def.name, compiled.clone());
        Ok(compiled)
    }
}

fn approx_size(tree: &SyntaxTree) -> usize {
    (tree.methods.len() + tree.calls.len() + tree.tags.len()) * 96 + 64
}

fn extract_methods(
    tree: &tree_sitter::Tree,
    source: &str,
    query: &tree_sitter::Query,
) -> Vec<RawMethod> {
    let name_idx = query.capture_index_for_name("name");
    let container_idx = query.capture_index_for_name("container");
    let method_idx = query.capture_index_for_name("method");

    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());

    let mut out = Vec::new();
    while let Some(m) = matches.next() {
        let name = name_idx.and_then(|i| find_capture(m, i)).and_then(|n| {
            n.utf8_text(source.as_bytes()).ok().map(str::to_string)
        });
        let Some(simple_name) = name else { continue };

        let container_node = container_idx.and_then(|i| find_capture(m, i));
        let container = container_node
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            .map(str::to_string);
        let container_line = container_node.map(|n| n.start_position().row as u32 + 1);

        let method_node = method_idx.and_then(|i| find_capture(m, i));
        let Some(method_node) = method_node else { continue };

        let param_list = method_node
            .child_by_field_name("parameters")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            .map(normalize_param_text)
            .unwrap_or_else(|| "()".to_string());

        let prefix_end = method_node.end_byte().min(method_node.start_byte() + 24);
        let prefix = &source.as_bytes()[method_node.start_byte()..prefix_end];
        let prefix = std::str::from_utf8(prefix).unwrap_or("");
        let is_public = looks_public(prefix, &simple_name);

        out.push(RawMethod {
            simple_name,
            container,
            container_line,
            param_list,
            start_byte: method_node.start_byte(),
            end_byte: method_node.end_byte(),
            start_line: method_node.start_position().row as u32 + 1,
            end_line: method_node.end_position().row as u32 + 1,
            is_public,
        });
    }
    out
}

fn extract_calls(
    tree: &tree_sitter::Tree,
    source: &str,
    query: &tree_sitter::Query,
) -> Vec<RawCall> {
    let callee_idx = query.capture_index_for_name("callee");
    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());

    let mut out = Vec::new();
    while let Some(m) = matches.next() {
        let Some(idx) = callee_idx else { continue };
        let Some(node) = find_capture(m, idx) else {
            continue;
        };
        let Ok(text) = node.utf8_text(source.as_bytes()) else {
            continue;
        };
        out.push(RawCall {
            callee_name: text.to_string(),
            byte_offset: node.start_byte(),
            line: node.start_position().row as u32 + 1,
        });
    }
    out
}

fn extract_tags(
    tree: &tree_sitter::Tree,
    source: &str,
    query: &tree_sitter::Query,
) -> Vec<RawTag> {
    let tag_idx = query.capture_index_for_name("tag");
    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());

    let mut out = Vec::new();
    while let Some(m) = matches.next() {
        let Some(idx) = tag_idx else { continue };
        let Some(node) = find_capture(m, idx) else {
            continue;
        };
        let Ok(text) = node.utf8_text(source.as_bytes()) else {
            continue;
        };
        out.push(RawTag {
            name: text.to_string(),
            line: node.start_position().row as u32 + 1,
        });
    }
    out
}

fn find_capture<'a>(m: &'a tree_sitter::QueryMatch<'a, 'a>, index: u32) -> Option<tree_sitter::Node<'a>> {
    m.captures
        .iter()
        .find(|c| c.index == index)
        .map(|c| c.node)
}

/// Collapse interior whitespace in a raw parameter-list slice so the text
/// that eventually forms `MethodId`'s `(paramTypeList)` suffix is stable
/// regardless of source formatting. Final case/whitespace canonicalization
/// still happens inside `MethodId::new`.
fn normalize_param_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

fn looks_public(prefix: &str, simple_name: &str) -> bool {
    let p = prefix.trim_start();
    if p.starts_with("pub ") || p.starts_with("pub(") || p.starts_with("public ") {
        return true;
    }
    if p.starts_with("private ") || p.starts_with("protected ") || p.starts_with("internal ") {
        return false;
    }
    // Languages with no visibility keyword in the declaration prefix
    // (Python, JS/TS, Go by capitalization): fall back to a leading
    // underscore / lowercase-first-letter convention.
    !simple_name.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "lang-rust")]
    fn parses_a_simple_rust_function_and_its_call() {
        let parser = Parser::new();
        let source = "fn bar() {}\nfn foo() {\n    bar();\n}\n";
        let hash = blake3::hash(source.as_bytes()).to_hex().to_string();
        let tree = parser.parse("rs", source, &hash).unwrap();
        assert_eq!(tree.methods.len(), 2);
        assert!(tree.calls.iter().any(|c| c.callee_name == "bar"));
    }

    #[test]
    #[cfg(feature = "lang-rust")]
    fn parse_is_pooled_by_content_hash() {
        let parser = Parser::new();
        let source = "fn foo() {}\n";
        let hash = blake3::hash(source.as_bytes()).to_hex().to_string();
        let a = parser.parse("rs", source, &hash).unwrap();
        let b = parser.parse("rs", source, &hash).unwrap();
        assert!(Arc::ptr_eq(&a, &b), "second parse should hit the pool");
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let parser = Parser::new();
        let err = parser.parse("xyz", "", "h").unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFileType(_)));
    }

    #[test]
    fn attribute_window_associates_tags_immediately_above_a_method() {
        let tree = SyntaxTree {
            methods: vec![],
            calls: vec![],
            tags: vec![
                RawTag {
                    name: "Test".into(),
                    line: 10,
                },
                RawTag {
                    name: "TooFar".into(),
                    line: 1,
                },
            ],
        };
        let tags = tree.tags_for_line(12);
        assert_eq!(tags, vec!["Test".to_string()]);
    }
}
