//! JavaScript language definition.

use super::LanguageDef;

const METHOD_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @method

(class_declaration
  name: (identifier) @container
  body: (class_body
    (method_definition name: (property_identifier) @name) @method))
"#;

const CALL_QUERY: &str = r#"
(call_expression
  function: (identifier) @callee)

(call_expression
  function: (member_expression
    property: (property_identifier) @callee))
"#;

const ATTRIBUTE_QUERY: &str = r#"
(call_expression
  function: (identifier) @tag
  arguments: (arguments (string) (function)))
"#;

const CONTAINER_KINDS: &[&str] = &["class_declaration"];

static DEFINITION: LanguageDef = LanguageDef {
    name: "javascript",
    grammar: || tree_sitter_javascript::LANGUAGE.into(),
    extensions: &["js", "jsx", "mjs", "cjs"],
    method_query: METHOD_QUERY,
    call_query: CALL_QUERY,
    attribute_query: Some(ATTRIBUTE_QUERY),
    container_kinds: CONTAINER_KINDS,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
