//! Java language definition.

use super::LanguageDef;

const METHOD_QUERY: &str = r#"
(class_declaration
  name: (identifier) @container
  body: (class_body
    (method_declaration name: (identifier) @name) @method))

(class_declaration
  name: (identifier) @container
  body: (class_body
    (constructor_declaration name: (identifier) @name) @method))
"#;

const CALL_QUERY: &str = r#"
(method_invocation
  name: (identifier) @callee)

(object_creation_expression
  type: (type_identifier) @callee)
"#;

const ATTRIBUTE_QUERY: &str = r#"
(marker_annotation name: (identifier) @tag)
(annotation name: (identifier) @tag)
"#;

const CONTAINER_KINDS: &[&str] = &["class_declaration"];

static DEFINITION: LanguageDef = LanguageDef {
    name: "java",
    grammar: || tree_sitter_java::LANGUAGE.into(),
    extensions: &["java"],
    method_query: METHOD_QUERY,
    call_query: CALL_QUERY,
    attribute_query: Some(ATTRIBUTE_QUERY),
    container_kinds: CONTAINER_KINDS,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
