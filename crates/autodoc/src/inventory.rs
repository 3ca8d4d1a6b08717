//! Cross-reference stores shared across documents.
//!
//! - [`Inventory`]: objects with domain, role and priority, as exported for
//!   other projects to link against.
//! - [`CrossRefs`]: anchor name to page URL, used to resolve links within
//!   the site.
//!
//! Both are first-writer-wins: once a name is registered, later
//! registrations of that name are ignored whatever their priority. Writes go
//! through a single write-locked entry point, so the rule holds when several
//! documents register concurrently.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{PoisonError, RwLock};

/// Inventory priority of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// The object's own heading.
    Standard = 1,
    /// An alias of an object documented elsewhere on the page.
    Secondary = 2,
}

impl Priority {
    /// Numeric value as written in inventories.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// One inventory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    /// Object name (usually the anchor).
    pub name: String,
    /// Domain (e.g., "py").
    pub domain: String,
    /// Role within the domain (e.g., "class").
    pub role: String,
    /// Priority metadata for consumers.
    pub priority: Priority,
    /// Page-relative URI (`page#anchor`).
    pub uri: String,
}

/// Inventory of documented objects.
#[derive(Debug, Default)]
pub struct Inventory {
    items: RwLock<BTreeMap<String, InventoryItem>>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` unless its name is already present.
    ///
    /// Returns `true` if the item was inserted.
    pub fn register(&self, item: InventoryItem) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.entry(item.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(item);
                true
            }
        }
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Entry registered under `name`.
    pub fn get(&self, name: &str) -> Option<InventoryItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All entries, sorted by name.
    pub fn items(&self) -> Vec<InventoryItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anchor name to URL map for in-site cross-references.
#[derive(Debug, Default)]
pub struct CrossRefs {
    urls: RwLock<BTreeMap<String, String>>,
}

impl CrossRefs {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `anchor` at `page#anchor` unless it already points somewhere.
    ///
    /// Returns `true` if the anchor was inserted.
    pub fn register_anchor(&self, page: &str, anchor: &str) -> bool {
        let mut urls = self.urls.write().unwrap_or_else(PoisonError::into_inner);
        match urls.entry(anchor.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(format!("{page}#{anchor}"));
                true
            }
        }
    }

    /// URL registered for `anchor`.
    pub fn url_for(&self, anchor: &str) -> Option<String> {
        self.urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(anchor)
            .cloned()
    }

    /// Number of registered anchors.
    pub fn len(&self) -> usize {
        self.urls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no anchor is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
