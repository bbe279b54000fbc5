//! Rust language definition.

use super::LanguageDef;

const METHOD_QUERY: &str = r#"
(function_item
  name: (identifier) @name) @method

(impl_item
  type: (type_identifier) @container
  body: (declaration_list
    (function_item name: (identifier) @name) @method))
"#;

const CALL_QUERY: &str = r#"
(call_expression
  function: (identifier) @callee)

(call_expression
  function: (field_expression
    field: (field_identifier) @callee))

(call_expression
  function: (scoped_identifier
    name: (identifier) @callee))

(macro_invocation
  macro: (identifier) @callee)
"#;

const ATTRIBUTE_QUERY: &str = r#"
(attribute_item
  (attribute (identifier) @tag))
"#;

const CONTAINER_KINDS: &[&str] = &["impl_item", "trait_item"];

static DEFINITION: LanguageDef = LanguageDef {
    name: "rust",
    grammar: || tree_sitter_rust::LANGUAGE.into(),
    extensions: &["rs"],
    method_query: METHOD_QUERY,
    call_query: CALL_QUERY,
    attribute_query: Some(ATTRIBUTE_QUERY),
    container_kinds: CONTAINER_KINDS,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
