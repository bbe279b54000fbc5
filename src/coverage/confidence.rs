//! §4.5.1's confidence function: `base(path_length) × type_factor ×
//! (0.5 + 0.5 × classifier_confidence)`, clamped to `[0, 1]`.

use crate::model::TestType;

/// Base confidence by path length (`d = len(path) - 1`, i.e. the number of
/// call-edges the path crosses): a direct call is near-certain evidence, a
/// long indirect chain much less so.
fn base_confidence(path_len: usize) -> f64 {
    let d = path_len.saturating_sub(1);
    match d {
        0 | 1 => 1.00,
        2 | 3 => 0.80,
        4..=6 => 0.60,
        _ => 0.40,
    }
}

/// Combine the three §4.5.1 factors and clamp to `[0, 1]`.
pub fn confidence(path_len: usize, test_type: TestType, classifier_confidence: f64) -> f64 {
    let value = base_confidence(path_len) * test_type.confidence_factor()
        * (0.5 + 0.5 * classifier_confidence);
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_confidence_matches_the_spec_table() {
        assert_eq!(base_confidence(2), 1.00);
        assert_eq!(base_confidence(3), 0.80);
        assert_eq!(base_confidence(4), 0.80);
        assert_eq!(base_confidence(5), 0.60);
        assert_eq!(base_confidence(7), 0.60);
        assert_eq!(base_confidence(8), 0.40);
    }

    #[test]
    fn confidence_is_always_in_range() {
        for len in 0..20 {
            for factor in [TestType::Unit, TestType::Integration, TestType::EndToEnd] {
                for cc in [0.0, 0.6, 1.0] {
                    let c = confidence(len, factor, cc);
                    assert!((0.0..=1.0).contains(&c), "{c} out of range for len={len}");
                }
            }
        }
    }

    #[test]
    fn a_direct_unit_test_call_with_a_tagged_classification_is_maximally_confident() {
        assert_eq!(confidence(2, TestType::Unit, 1.0), 1.0);
    }

    #[test]
    fn convention_only_classification_halves_the_confidence_bonus() {
        let tagged = confidence(2, TestType::Unit, 1.0);
        let convention = confidence(2, TestType::Unit, 0.6);
        assert!(convention < tagged);
    }
}
