//! Language registry for the syntax/semantic analyzer.
//!
//! Each supported language contributes a [`LanguageDef`]: a tree-sitter
//! grammar plus three queries used by the parser (method declarations, call
//! sites, and test-attribute/annotation nodes). Languages are registered at
//! compile time based on `lang-*` feature flags, the same convention the
//! wider parsing stack this crate descends from uses.

use std::collections::HashMap;
use std::sync::LazyLock;

#[cfg(feature = "lang-csharp")]
mod csharp;
#[cfg(feature = "lang-go")]
mod go;
#[cfg(feature = "lang-java")]
mod java;
#[cfg(feature = "lang-javascript")]
mod javascript;
#[cfg(feature = "lang-python")]
mod python;
#[cfg(feature = "lang-rust")]
mod rust;
#[cfg(feature = "lang-typescript")]
mod typescript;

/// A language definition with all parsing configuration needed to build
/// method nodes and call edges for one source language.
pub struct LanguageDef {
    /// Language name (e.g. "rust", "csharp").
    pub name: &'static str,
    /// Tree-sitter grammar constructor.
    pub grammar: fn() -> tree_sitter::Language,
    /// File extensions routed to this language.
    pub extensions: &'static [&'static str],
    /// Query matching method/function declarations; must capture `@name`
    /// (the method's simple name) and may capture `@container` (enclosing
    /// type) and `@method` (the whole declaration node).
    pub method_query: &'static str,
    /// Query matching call-expression sites; must capture `@callee`.
    pub call_query: &'static str,
    /// Query matching test-attribute/annotation nodes attached to a method
    /// or its containing type; must capture `@tag`. `None` for languages
    /// with no attribute syntax recognized here.
    pub attribute_query: Option<&'static str>,
    /// Node kinds that introduce a named containing type (class/struct/impl).
    pub container_kinds: &'static [&'static str],
}

/// Global language registry, populated once from the enabled `lang-*` features.
pub static REGISTRY: LazyLock<LanguageRegistry> = LazyLock::new(LanguageRegistry::new);

pub struct LanguageRegistry {
    by_name: HashMap<&'static str, &'static LanguageDef>,
    by_extension: HashMap<&'static str, &'static LanguageDef>,
}

impl LanguageRegistry {
    fn new() -> Self {
        let mut reg = Self {
            by_name: HashMap::new(),
            by_extension: HashMap::new(),
        };

        #[cfg(feature = "lang-rust")]
        reg.register(rust::definition());
        #[cfg(feature = "lang-python")]
        reg.register(python::definition());
        #[cfg(feature = "lang-typescript")]
        reg.register(typescript::definition());
        #[cfg(feature = "lang-javascript")]
        reg.register(javascript::definition());
        #[cfg(feature = "lang-go")]
        reg.register(go::definition());
        #[cfg(feature = "lang-java")]
        reg.register(java::definition());
        #[cfg(feature = "lang-csharp")]
        reg.register(csharp::definition());

        reg
    }

    fn register(&mut self, def: &'static LanguageDef) {
        self.by_name.insert(def.name, def);
        for ext in def.extensions {
            self.by_extension.insert(*ext, def);
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static LanguageDef> {
        self.by_name.get(name).copied()
    }

    pub fn from_extension(&self, ext: &str) -> Option<&'static LanguageDef> {
        self.by_extension.get(ext).copied()
    }

    pub fn all(&self) -> impl Iterator<Item = &'static LanguageDef> + '_ {
        self.by_name.values().copied()
    }

    pub fn supported_extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_extension.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "lang-rust")]
    fn registry_resolves_rust_by_name_and_extension() {
        let def = REGISTRY.get("rust").expect("rust registered");
        assert_eq!(def.extensions, &["rs"]);
        assert!(REGISTRY.from_extension("rs").is_some());
    }

    #[test]
    fn unknown_extension_returns_none() {
        assert!(REGISTRY.from_extension("not-a-real-ext").is_none());
    }

    #[test]
    #[cfg(feature = "lang-rust")]
    fn grammar_constructor_is_callable() {
        let def = REGISTRY.get("rust").unwrap();
        let grammar = (def.grammar)();
        assert!(grammar.abi_version() > 0);
    }
}
