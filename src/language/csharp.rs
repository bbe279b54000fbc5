//! C# language definition.
//!
//! C# is the primary grounding target for `MethodId` shape
//! (`Namespace.Type.Method(ParamTypeList)`, optional `global::` prefix) and
//! for the mainstream test-attribute families (`[Test]`, `[Fact]`,
//! `[TestMethod]`) the classifier's test-candidate rule looks for.

use super::LanguageDef;

const METHOD_QUERY: &str = r#"
(class_declaration
  name: (identifier) @container
  body: (declaration_list
    (method_declaration name: (identifier) @name) @method))

(class_declaration
  name: (identifier) @container
  body: (declaration_list
    (constructor_declaration name: (identifier) @name) @method))

(struct_declaration
  name: (identifier) @container
  body: (declaration_list
    (method_declaration name: (identifier) @name) @method))

(record_declaration
  name: (identifier) @container
  body: (declaration_list
    (method_declaration name: (identifier) @name) @method))
"#;

const CALL_QUERY: &str = r#"
(invocation_expression
  function: (member_access_expression name: (identifier) @callee))
(invocation_expression
  function: (identifier) @callee)
(object_creation_expression type: (identifier) @callee)
(object_creation_expression type: (generic_name (identifier) @callee))
(object_creation_expression type: (qualified_name (identifier) @callee))
"#;

const ATTRIBUTE_QUERY: &str = r#"
(attribute_list
  (attribute name: (identifier) @tag))
(attribute_list
  (attribute name: (qualified_name (identifier) @tag)))
"#;

const CONTAINER_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "record_declaration",
    "interface_declaration",
];

static DEFINITION: LanguageDef = LanguageDef {
    name: "csharp",
    grammar: || tree_sitter_c_sharp::LANGUAGE.into(),
    extensions: &["cs"],
    method_query: METHOD_QUERY,
    call_query: CALL_QUERY,
    attribute_query: Some(ATTRIBUTE_QUERY),
    container_kinds: CONTAINER_KINDS,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
