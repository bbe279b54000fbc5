//! Python language definition.

use super::LanguageDef;

const METHOD_QUERY: &str = r#"
(function_definition
  name: (identifier) @name) @method

(class_definition
  name: (identifier) @container
  body: (block
    (function_definition name: (identifier) @name) @method))
"#;

const CALL_QUERY: &str = r#"
(call
  function: (identifier) @callee)

(call
  function: (attribute
    attribute: (identifier) @callee))
"#;

const ATTRIBUTE_QUERY: &str = r#"
(decorator (identifier) @tag)
(decorator (attribute attribute: (identifier) @tag))
(decorator (call function: (identifier) @tag))
"#;

const CONTAINER_KINDS: &[&str] = &["class_definition"];

static DEFINITION: LanguageDef = LanguageDef {
    name: "python",
    grammar: || tree_sitter_python::LANGUAGE.into(),
    extensions: &["py", "pyi"],
    method_query: METHOD_QUERY,
    call_query: CALL_QUERY,
    attribute_query: Some(ATTRIBUTE_QUERY),
    container_kinds: CONTAINER_KINDS,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
