//! Delta computation between a source listing and a destination listing.

use std::collections::BTreeSet;

/// Names present at the source but absent from the destination.
///
/// Comparison is exact and case-sensitive. `"a.pdf"` and `"A.pdf"` are two
/// different deliverables, and so are names differing only in whitespace.
pub fn compute_missing(
    source_names: &BTreeSet<String>,
    dest_names: &BTreeSet<String>,
) -> BTreeSet<String> {
    source_names.difference(dest_names).cloned().collect()
}
