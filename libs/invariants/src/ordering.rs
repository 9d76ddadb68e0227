//! Pod listing ordering checks.

use std::collections::BTreeMap;

use crate::error::InvariantViolation;

/// Validates the canonical ordering of a `pods list` response.
///
/// The listing must contain exactly `sum(expected_counts)` entries,
/// grouped type-major with types in lexicographic order, and within
/// each type ordinals `0..count` ascending with no gaps, each entry
/// spelled `{type}-{ordinal}`. The expected sequence is fully
/// determined by `expected_counts`, so the check is an element-wise
/// comparison against it.
pub fn check_pod_list_order(
    list: &[String],
    expected_counts: &BTreeMap<String, u32>,
) -> Result<(), InvariantViolation> {
    let expected_len: usize = expected_counts.values().map(|&c| c as usize).sum();
    if list.len() != expected_len {
        return Err(InvariantViolation::LengthMismatch {
            expected: expected_len,
            actual: list.len(),
        });
    }

    // BTreeMap iteration is already lexicographic by type.
    let expected = expected_counts
        .iter()
        .flat_map(|(pod_type, &count)| (0..count).map(move |i| format!("{pod_type}-{i}")));

    for (index, (expected, actual)) in expected.zip(list).enumerate() {
        if *actual != expected {
            return Err(InvariantViolation::OutOfOrder {
                index,
                expected,
                actual: actual.clone(),
            });
        }
    }

    Ok(())
}
