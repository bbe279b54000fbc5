//! `MethodId`: the normalized, case-insensitive join key for every graph
//! operation.
//!
//! The codebase this crate descends from keys call-graph lookups by raw
//! `String`s (see its `store/calls.rs`), compared with ad-hoc
//! case-sensitive equality. §4.3's normalization rules and §9's redesign
//! note ("string-keyed, case-insensitive maps of MethodId everywhere...
//! centralize in a MethodId type whose equality/hash are the normalization
//! rules; forbid ad-hoc string comparisons elsewhere") require replacing
//! that with a dedicated type. This module is that type.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A globally unique textual method identity of the form
/// `Namespace.Type.Method(paramTypeList)`, optionally prefixed by a
/// global-namespace marker (`global::`) which is stripped during
/// normalization.
///
/// Equality and hashing operate on the normalized form: the global-namespace
/// prefix is stripped, the parameter-type list is kept in canonical form,
/// and comparison is case-insensitive. Two `MethodId`s are equal iff their
/// normalized forms are equal — this is the sole join key used across the
/// call graph, the classifier, and the coverage/impact analyzers.
#[derive(Debug, Clone)]
pub struct MethodId {
    /// Original, display-preserving text as encountered in source.
    raw: String,
    /// Cached normalized form used for equality, hashing, and ordering.
    normalized: String,
}

const GLOBAL_PREFIX: &str = "global::";

impl MethodId {
    /// Construct a `MethodId` from raw text, normalizing eagerly so equality
    /// and hashing never have to re-derive it.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    /// The text as originally encountered (for display purposes only — never
    /// compare on this).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized join key. Idempotent: `normalize(normalize(id)) ==
    /// normalize(id)`.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Parameter-type list in canonical form, e.g. `"(Int32,String)"`, or
    /// `""` if the id carries no parameter list.
    pub fn param_list(&self) -> &str {
        match self.normalized.find('(') {
            Some(idx) => &self.normalized[idx..],
            None => "",
        }
    }

    /// The normalized form with any trailing parameter-type list stripped.
    pub fn without_params(&self) -> &str {
        match self.normalized.find('(') {
            Some(idx) => &self.normalized[..idx],
            None => &self.normalized,
        }
    }

    /// The final dotted segment (the bare method name), case-normalized,
    /// with no containing type/namespace and no parameter list. Used by the
    /// "method-name-only" fuzzy-match rule in §4.5.
    pub fn simple_name(&self) -> &str {
        let without_params = self.without_params();
        match without_params.rfind('.') {
            Some(idx) => &without_params[idx + 1..],
            None => without_params,
        }
    }

    /// True if `pattern`, after the same normalization, resolves to this id
    /// under one of the three §4.5 matching rules: exact match, equal after
    /// stripping the parameter list, or equal suffix on the final segment
    /// (method name only).
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        let pattern_norm = normalize(pattern);
        if pattern_norm == self.normalized {
            return true;
        }
        let pattern_no_params = strip_params(&pattern_norm);
        if pattern_no_params == self.without_params() {
            return true;
        }
        let pattern_simple = pattern_no_params
            .rfind('.')
            .map(|idx| &pattern_no_params[idx + 1..])
            .unwrap_or(pattern_no_params.as_str());
        pattern_simple == self.simple_name()
    }
}

/// Strip a `global::` prefix, canonicalize the parameter-type list, and
/// lowercase the whole thing. Idempotent by construction: running it twice
/// produces the same output as running it once, since every step is itself
/// idempotent (a second strip of an already-stripped prefix, lowercase, or
/// whitespace collapse is a no-op).
fn normalize(input: &str) -> String {
    let mut s = input.trim();
    if let Some(stripped) = s.strip_prefix(GLOBAL_PREFIX) {
        s = stripped;
    }
    let mut out = String::with_capacity(s.len());
    let mut in_params = false;
    let mut last_was_space = false;
    for ch in s.chars() {
        match ch {
            '(' => {
                in_params = true;
                out.push('(');
            }
            ')' => {
                in_params = false;
                out.push(')');
            }
            ',' if in_params => {
                // canonical separator: no surrounding whitespace
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push(',');
                last_was_space = true; // suppress a following space
            }
            c if c.is_whitespace() => {
                if in_params {
                    if !last_was_space {
                        last_was_space = true;
                    }
                    continue;
                }
                out.push(' ');
            }
            c => {
                last_was_space = false;
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

fn strip_params(normalized: &str) -> String {
    match normalized.find('(') {
        Some(idx) => normalized[..idx].to_string(),
        None => normalized.to_string(),
    }
}

impl PartialEq for MethodId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}
impl Eq for MethodId {}

impl Hash for MethodId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for MethodId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for MethodId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for MethodId {
    fn from(s: &str) -> Self {
        MethodId::new(s)
    }
}
impl From<String> for MethodId {
    fn from(s: String) -> Self {
        MethodId::new(s)
    }
}

/// `MethodId` serializes as its raw display string — not as a `{raw,
/// normalized}` object — so it reads the same whether it appears as a JSON
/// field value or (via `bincode`) as a `HashMap` key in a cached graph.
impl serde::Serialize for MethodId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

struct MethodIdVisitor;

impl<'de> Visitor<'de> for MethodIdVisitor {
    type Value = MethodId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a method id string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MethodId::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MethodId::new(v))
    }
}

impl<'de> serde::Deserialize<'de> for MethodId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(MethodIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_global_prefix() {
        let a = MethodId::new("global::Ns.Cls.Foo(Int32)");
        let b = MethodId::new("Ns.Cls.Foo(Int32)");
        assert_eq!(a, b);
    }

    #[test]
    fn case_insensitive_equality() {
        let a = MethodId::new("Ns.Cls.Foo(Int32)");
        let b = MethodId::new("NS.CLS.FOO(int32)");
        assert_eq!(a, b);
    }

    #[test]
    fn normalization_is_idempotent() {
        let cases = [
            "global::Ns.Cls.Foo(Int32, String)",
            "Foo",
            "A.B.Bar()",
            "  global::Weird.Spacing ( Int32 , String )  ",
        ];
        for c in cases {
            let once = normalize(c);
            let twice = normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {c:?}");
        }
    }

    #[test]
    fn matches_pattern_end_to_end_scenario_3() {
        let id = MethodId::new("global::Ns.Cls.Foo(Int32)");
        assert!(id.matches_pattern("Ns.Cls.Foo"));
        assert!(id.matches_pattern("Cls.Foo"));
        assert!(id.matches_pattern("Foo"));
        assert!(id.matches_pattern("global::Ns.Cls.Foo(Int32)"));
        assert!(!id.matches_pattern("Other.Foo"));
    }

    #[test]
    fn param_list_canonical_form_ignores_whitespace() {
        let a = MethodId::new("Ns.Cls.Foo(Int32, String)");
        let b = MethodId::new("Ns.Cls.Foo(Int32,String)");
        assert_eq!(a.param_list(), b.param_list());
        assert_eq!(a.param_list(), "(int32,string)");
    }

    #[test]
    fn simple_name_strips_params_and_qualification() {
        let id = MethodId::new("Ns.Cls.Foo(Int32)");
        assert_eq!(id.simple_name(), "foo");
    }

    #[test]
    fn ordering_is_lexicographic_on_normalized_form() {
        let mut ids = vec![
            MethodId::new("B.Bar()"),
            MethodId::new("A.Foo()"),
            MethodId::new("A.Bar()"),
        ];
        ids.sort();
        let rendered: Vec<_> = ids.iter().map(|i| i.normalized().to_string()).collect();
        assert_eq!(rendered, vec!["a.bar()", "a.foo()", "b.bar()"]);
    }

    use proptest::prelude::*;

    proptest! {
        /// Property: `normalize` is idempotent for any input, not just the
        /// hand-picked cases above.
        #[test]
        fn prop_normalize_is_idempotent(raw in "[A-Za-z0-9_:. ()]{0,40}") {
            let once = normalize(&raw);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: case is never significant to identity.
        #[test]
        fn prop_case_never_affects_equality(raw in "[A-Za-z]{1,16}\\.[A-Za-z]{1,16}\\([A-Za-z0-9]{0,12}\\)") {
            let lower = MethodId::new(&raw.to_lowercase());
            let upper = MethodId::new(&raw.to_uppercase());
            prop_assert_eq!(lower, upper);
        }
    }
}
