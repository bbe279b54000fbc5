//! Go language definition.

use super::LanguageDef;

const METHOD_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @method

(method_declaration
  receiver: (parameter_list
    (parameter_declaration type: (type_identifier) @container))
  name: (field_identifier) @name) @method

(method_declaration
  receiver: (parameter_list
    (parameter_declaration type: (pointer_type (type_identifier) @container)))
  name: (field_identifier) @name) @method
"#;

const CALL_QUERY: &str = r#"
(call_expression
  function: (identifier) @callee)

(call_expression
  function: (selector_expression
    field: (field_identifier) @callee))
"#;

const CONTAINER_KINDS: &[&str] = &["type_declaration"];

static DEFINITION: LanguageDef = LanguageDef {
    name: "go",
    grammar: || tree_sitter_go::LANGUAGE.into(),
    extensions: &["go"],
    method_query: METHOD_QUERY,
    call_query: CALL_QUERY,
    attribute_query: None,
    container_kinds: CONTAINER_KINDS,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
