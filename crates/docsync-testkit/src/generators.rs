//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use docsync_core::{ListingEntry, ListingSnapshot};

/// Generate a deliverable file name.
pub fn deliverable_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 _-]{0,15}\\.(pdf|docx|xlsx)".prop_map(String::from)
}

/// Generate a set of up to `max` distinct names.
pub fn name_set(max: usize) -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(deliverable_name(), 0..=max)
}

/// Generate raw listing entries, possibly with repeated names.
pub fn listing_entries(max: usize) -> impl Strategy<Value = Vec<ListingEntry>> {
    prop::collection::vec(deliverable_name(), 0..=max).prop_map(|names| {
        names
            .into_iter()
            .map(|name| {
                let path = format!("/sites/docs/{}", name);
                ListingEntry::new(name, path)
            })
            .collect()
    })
}

/// Generate a listing snapshot.
pub fn listing_snapshot(max: usize) -> impl Strategy<Value = ListingSnapshot> {
    (listing_entries(max), 0i64..=1_700_000_000_000i64)
        .prop_map(|(entries, taken_at)| ListingSnapshot::from_entries(entries, taken_at))
}

/// Generate a property bag with `Key:SW|value` lines.
pub fn property_bag() -> impl Strategy<Value = String> {
    let key = prop_oneof![
        Just("Name"),
        Just("Number"),
        Just("First issued"),
        Just("Contents (1)"),
        Just("Contents (2)"),
        Just("Modifications (1)"),
        Just("vti_title"),
    ];
    prop::collection::vec((key, "[A-Za-z0-9][A-Za-z0-9 .]{0,20}"), 0..8).prop_map(|lines| {
        lines
            .into_iter()
            .map(|(k, v)| format!("{}:SW|{}", k, v))
            .collect::<Vec<_>>()
            .join("\r\n")
    })
}
