//! Method Classifier (§4.6): test-candidate detection, test-type
//! assignment, and production-method categorization.
//!
//! Test-type assignment is priority-ordered token matching over the
//! lowercased `containing_type.method_name` text, using one small
//! `aho-corasick` automaton per tier rather than one combined automaton,
//! so higher-priority tiers are checked — and can win — before lower ones
//! even see the haystack. Grounded on the original indexer's multi-pattern
//! `aho_corasick::AhoCorasick` use for tokenizing identifiers during
//! chunk extraction, repurposed here for tier matching instead of
//! tokenization.

use crate::model::{MethodCategory, MethodNode, TestType};
use aho_corasick::AhoCorasick;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `(priority, TestType, tokens)`, checked highest priority first. The
/// first tier whose automaton matches anywhere in the haystack wins;
/// `Unit` (priority 10) is the fallback when nothing else matches.
struct Tier {
    test_type: TestType,
    automaton: AhoCorasick,
}

static TIERS: LazyLock<Vec<Tier>> = LazyLock::new(|| {
    let build = |tokens: &[&str]| AhoCorasick::new(tokens).expect("token list compiles");
    vec![
        Tier {
            test_type: TestType::EndToEnd,
            automaton: build(&["e2e", "endtoend"]),
        },
        Tier {
            test_type: TestType::UI,
            automaton: build(&["ui", "selenium", "webdriver", "browser"]),
        },
        Tier {
            test_type: TestType::Database,
            automaton: build(&[
                "database", "db", "sql", "entity", "repository", "entityframework", "dapper", "nhibernate",
            ]),
        },
        Tier {
            test_type: TestType::API,
            automaton: build(&["api", "http", "rest", "controller", "endpoint"]),
        },
        Tier {
            test_type: TestType::Performance,
            automaton: build(&["performance", "load", "stress", "benchmark"]),
        },
        Tier {
            test_type: TestType::Security,
            automaton: build(&["security", "auth", "authorization", "authentication", "permission"]),
        },
        Tier {
            test_type: TestType::Integration,
            automaton: build(&["integration"]),
        },
    ]
});

/// Attribute/annotation names recognized as marking a test method, across
/// the xUnit/NUnit/MSTest/pytest/JUnit/Jest families this crate's
/// `attribute_query`s target.
const TEST_TAGS: &[&str] = &[
    "test", "fact", "theory", "testmethod", "testcase", "pytest", "it", "describe",
];

/// Tags that additionally mark a test method as data-driven (parameters
/// supplied by the framework rather than by the caller).
const DATA_DRIVEN_TAGS: &[&str] = &["testcase", "theory", "parameterize", "inlinedata", "datapoint"];

/// Tags that mark a *containing type* as a test fixture.
const TEST_CONTAINER_TAGS: &[&str] = &["testfixture", "testclass"];

fn has_tag(tags: &BTreeSet<String>, known: &[&str]) -> bool {
    tags.iter()
        .any(|t| known.iter().any(|k| t.eq_ignore_ascii_case(k)))
}

/// §4.6 test-candidate rule: the method (or its containing type) carries a
/// recognized test attribute, or follows the `test`-prefixed naming
/// convention used where the target language has no attribute system
/// exercised here (Go's `func TestXxx`, Python's `def test_xxx`), and the
/// method is externally visible and either parameterless or explicitly
/// data-driven.
pub fn is_test_candidate(
    simple_name: &str,
    tags: &BTreeSet<String>,
    container_tags: &BTreeSet<String>,
    is_public: bool,
    is_parameterless: bool,
) -> bool {
    if !is_public {
        return false;
    }
    let tagged = has_tag(tags, TEST_TAGS) || has_tag(container_tags, TEST_CONTAINER_TAGS);
    let by_convention = simple_name.to_ascii_lowercase().starts_with("test");
    let data_driven = has_tag(tags, DATA_DRIVEN_TAGS);

    (tagged || by_convention) && (is_parameterless || data_driven)
}

/// §4.6 test-type assignment: priority-ordered token match over
/// `namespace.containing_type.method_name`, falling back to `Unit`. The
/// namespace segment is what lets the API tier's "also namespaces `api`,
/// `controllers`" rule fire for a method whose name and class carry no
/// recognizable token of their own but live under e.g. `Api.Checkout` or
/// `Controllers.Orders`.
pub fn classify_test_type(simple_name: &str, containing_type: &str, namespace: &str) -> TestType {
    let haystack = format!("{namespace}.{containing_type}.{simple_name}").to_ascii_lowercase();
    for tier in TIERS.iter() {
        if tier.automaton.is_match(&haystack) {
            return tier.test_type;
        }
    }
    TestType::Unit
}

/// §4.5.1's classifier-confidence term: 1.0 when the method carries an
/// explicit test tag (high confidence in the type assignment), 0.6 when
/// the type was assigned purely by naming convention.
pub fn classifier_confidence(tags: &BTreeSet<String>, container_tags: &BTreeSet<String>) -> f64 {
    if has_tag(tags, TEST_TAGS) || has_tag(container_tags, TEST_CONTAINER_TAGS) {
        1.0
    } else {
        0.6
    }
}

/// Execution-category assignment for a node visited during a forward
/// trace (§3 `ExecutedMethod::category`). Best-effort, based on the same
/// token families used for test typing plus a test-candidate check for
/// `TestUtility`.
pub fn classify_category(node: &MethodNode) -> MethodCategory {
    if node.is_test_candidate {
        return MethodCategory::TestUtility;
    }
    let haystack = format!("{}.{}", node.containing_type, node.simple_name).to_ascii_lowercase();
    if haystack.contains("repository") || haystack.contains("database") || haystack.contains("dao") {
        MethodCategory::DataAccess
    } else if haystack.contains("client") || haystack.contains("http") || haystack.contains("config")
        || haystack.contains("logger") || haystack.contains("cache")
    {
        MethodCategory::Infrastructure
    } else if is_likely_third_party(&node.file) {
        MethodCategory::ThirdParty
    } else if is_likely_framework(&haystack) {
        MethodCategory::Framework
    } else {
        MethodCategory::BusinessLogic
    }
}

fn is_likely_third_party(file: &std::path::Path) -> bool {
    let s = file.to_string_lossy();
    s.contains("/vendor/") || s.contains("/node_modules/") || s.contains("/target/") || s.contains("\\vendor\\")
}

fn is_likely_framework(haystack: &str) -> bool {
    ["startup", "middleware", "dependencyinjection", "bootstrap"]
        .iter()
        .any(|k| haystack.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tagged_parameterless_public_method_is_a_test_candidate() {
        assert!(is_test_candidate("Foo", &tags(&["Test"]), &BTreeSet::new(), true, true));
    }

    #[test]
    fn untagged_non_conventional_method_is_not_a_test_candidate() {
        assert!(!is_test_candidate("Compute", &tags(&[]), &BTreeSet::new(), true, true));
    }

    #[test]
    fn private_methods_are_never_test_candidates() {
        assert!(!is_test_candidate("TestFoo", &tags(&["Test"]), &BTreeSet::new(), false, true));
    }

    #[test]
    fn parameterized_method_needs_a_data_driven_tag() {
        assert!(!is_test_candidate("Foo", &tags(&["Test"]), &BTreeSet::new(), true, false));
        assert!(is_test_candidate(
            "Foo",
            &tags(&["TestCase"]),
            &BTreeSet::new(),
            true,
            false
        ));
    }

    #[test]
    fn go_style_naming_convention_is_recognized_without_tags() {
        assert!(is_test_candidate("TestSomething", &tags(&[]), &BTreeSet::new(), true, true));
    }

    #[test]
    fn test_type_priority_prefers_end_to_end_over_database() {
        assert_eq!(
            classify_test_type("E2E_DatabaseFlow", "CheckoutTests", "global"),
            TestType::EndToEnd
        );
    }

    #[test]
    fn test_type_falls_back_to_unit() {
        assert_eq!(
            classify_test_type("AddsTwoNumbers", "MathTests", "global"),
            TestType::Unit
        );
    }

    /// §4.6's API row: "also namespaces `api`, `controllers`" — a method
    /// and class with no token of their own still classify as API when the
    /// namespace alone carries one.
    #[test]
    fn test_type_is_driven_by_namespace_alone_for_the_api_tier() {
        assert_eq!(
            classify_test_type("CreatesWidget", "WidgetTests", "Controllers"),
            TestType::API
        );
        assert_eq!(
            classify_test_type("CreatesWidget", "WidgetTests", "Api.V2"),
            TestType::API
        );
    }

    #[test]
    fn classifier_confidence_is_lower_for_convention_only_matches() {
        assert_eq!(classifier_confidence(&tags(&["Test"]), &BTreeSet::new()), 1.0);
        assert_eq!(classifier_confidence(&tags(&[]), &BTreeSet::new()), 0.6);
    }
}
