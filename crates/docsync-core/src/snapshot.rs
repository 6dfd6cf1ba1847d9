//! Immutable listing snapshots.
//!
//! A snapshot is taken once per sync run and passed through every later
//! step. Name lookup and path resolution read from it instead of asking the
//! source again, so a run never acts on two different views of the listing.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{DeliverableRef, ItemId};

/// One raw listing entry, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub source_path: String,
    pub property_bag: Option<String>,
}

impl ListingEntry {
    pub fn new(name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            property_bag: None,
        }
    }
}

/// A listing entry left out of a snapshot because it cannot be transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Position of the entry in the raw listing.
    pub position: ItemId,
    /// The name as listed, possibly empty.
    pub name: String,
    pub reason: String,
}

/// The refs returned by one `list_items` call, in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    items: Vec<DeliverableRef>,
    /// Entries dropped while building the snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedEntry>,
    /// When the listing was read (Unix ms).
    taken_at: i64,
}

impl ListingSnapshot {
    /// Build a snapshot from raw entries, assigning ids by position.
    ///
    /// Entries without a name or a source path are skipped and kept aside;
    /// one bad row never hides the rest of the listing. Ids keep the raw
    /// listing position, so they may have gaps.
    pub fn from_entries<I>(entries: I, taken_at: i64) -> Self
    where
        I: IntoIterator<Item = ListingEntry>,
    {
        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let id = ItemId(index);
            let problem = if entry.name.trim().is_empty() {
                Some(CoreError::EmptyName(id))
            } else if entry.source_path.trim().is_empty() {
                Some(CoreError::MissingPath(id))
            } else {
                None
            };

            match problem {
                Some(e) => {
                    tracing::warn!(
                        position = index,
                        name = %entry.name,
                        error = %e,
                        "skipping listing entry"
                    );
                    skipped.push(SkippedEntry {
                        position: id,
                        name: entry.name,
                        reason: e.to_string(),
                    });
                }
                None => items.push(DeliverableRef {
                    id,
                    name: entry.name,
                    source_path: entry.source_path,
                    property_bag: entry.property_bag,
                }),
            }
        }

        let snapshot = Self {
            items,
            skipped,
            taken_at,
        };
        for name in snapshot.duplicate_names() {
            tracing::warn!(%name, "listing contains duplicate name, first entry wins");
        }
        snapshot
    }

    /// When the listing was read (Unix ms).
    pub fn taken_at(&self) -> i64 {
        self.taken_at
    }

    /// Number of usable entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries that were left out, in listing order.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// All refs in listing order.
    pub fn items(&self) -> &[DeliverableRef] {
        &self.items
    }

    /// Look up a ref by id.
    pub fn get(&self, id: ItemId) -> Result<&DeliverableRef> {
        self.items
            .binary_search_by_key(&id, |item| item.id)
            .map(|index| &self.items[index])
            .map_err(|_| CoreError::UnknownItem(id))
    }

    /// The set of names in this listing.
    pub fn names(&self) -> BTreeSet<String> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }

    /// The first ref carrying `name`, in listing order.
    pub fn first_by_name(&self, name: &str) -> Option<&DeliverableRef> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Map names back to refs, one ref per name, in listing order.
    ///
    /// Names absent from the snapshot are skipped. When several entries
    /// share a name only the first is returned.
    pub fn refs_for(&self, names: &BTreeSet<String>) -> Vec<DeliverableRef> {
        let mut seen = BTreeSet::new();
        self.items
            .iter()
            .filter(|item| names.contains(&item.name) && seen.insert(item.name.as_str()))
            .cloned()
            .collect()
    }

    /// Names that appear more than once.
    pub fn duplicate_names(&self) -> BTreeSet<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in &self.items {
            *counts.entry(item.name.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
