//! Property bag parsing.
//!
//! Listing services attach a free-text "property bag" to each document, one
//! `Key:type|value` triple per line. Only a fixed set of keys is of
//! interest; the numbered `Contents (n)` and `Modifications (n)` keys are
//! folded into single multi-line fields.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Keys kept from a property bag, in output order.
pub const KEPT_KEYS: &[&str] = &[
    "Name",
    "Last modified0",
    "First issued",
    "Number",
    "_Author",
    "Expert affiliation",
    "Technical area",
    "Field",
    "Kind",
    "Project ID",
    "First author",
    "Affiliation",
];

const CONTENTS_KEYS: &[&str] = &[
    "Contents (1)",
    "Contents (2)",
    "Contents (3)",
    "Contents (4)",
];

const MODIFICATIONS_KEYS: &[&str] = &[
    "Modifications (1)",
    "Modifications (2)",
    "Modifications (3)",
    "Modifications (4)",
];

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([\w\s\(\)]+):(\w+)\|(.+)").expect("property bag pattern is valid")
    })
}

/// Metadata extracted from a property bag, in a stable field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    fields: Vec<(String, String)>,
}

impl Metadata {
    /// Look up a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Fields in output order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse raw `Key:type|value` lines into a key/value map.
///
/// Lines may end in `\n`, `\r\n` or a lone `\r`. Later lines win when a
/// key repeats. The type tag is discarded.
pub fn parse_entries(data: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for line in data.split(['\r', '\n']) {
        for caps in entry_pattern().captures_iter(line) {
            entries.insert(caps[1].to_string(), caps[3].to_string());
        }
    }
    entries
}

/// Reduce a property bag to the kept keys plus folded `Contents` and
/// `Modifications` fields.
///
/// `Contents` and `Modifications` are always present, empty when none of
/// their numbered keys were found.
pub fn rationalise(data: &str) -> Metadata {
    let entries = parse_entries(data);

    let mut fields: Vec<(String, String)> = KEPT_KEYS
        .iter()
        .filter_map(|key| entries.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect();

    fields.push(("Contents".to_string(), fold(&entries, CONTENTS_KEYS)));
    fields.push(("Modifications".to_string(), fold(&entries, MODIFICATIONS_KEYS)));

    Metadata { fields }
}

fn fold(entries: &HashMap<String, String>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| entries.get(*key).map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
