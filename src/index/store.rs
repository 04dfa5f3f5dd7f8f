//! # Reference Store
//!
//! Key-addressable storage for reference items. The index only depends on the
//! [`ReferenceStore`] trait; [`InMemoryReferenceStore`] is the bundled
//! implementation and the one snapshots load into.

use parking_lot::RwLock;
use tracing::trace;

use super::item::{ItemId, NewReferenceItem, ReferenceItem};
use crate::errors::{AppError, AppResult};

/// Storage backend consumed by the visual match index
///
/// Implementations must return items from [`get_all`](Self::get_all) in
/// insertion order; ranking ties in the index are broken by that order.
pub trait ReferenceStore: Send + Sync {
    /// Store a new item and return it with its assigned id
    fn insert(&self, item: NewReferenceItem) -> AppResult<ReferenceItem>;

    /// Look up an item by id
    fn get(&self, id: ItemId) -> AppResult<Option<ReferenceItem>>;

    /// First stored item with the given content hash
    fn get_by_hash(&self, content_hash: &str) -> AppResult<Option<ReferenceItem>>;

    /// Every stored item, oldest first
    fn get_all(&self) -> AppResult<Vec<ReferenceItem>>;

    /// Items whose name equals `name`, ignoring case
    fn get_by_name(&self, name: &str) -> AppResult<Vec<ReferenceItem>>;

    /// Remove an item, returning it if it existed
    fn remove(&self, id: ItemId) -> AppResult<Option<ReferenceItem>>;

    /// Number of stored items
    fn len(&self) -> AppResult<usize>;

    fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    items: Vec<ReferenceItem>,
    next_id: ItemId,
}

/// Thread-safe in-memory store
///
/// Writers are serialized behind a `parking_lot::RwLock`; readers receive
/// cloned snapshots so scans never hold the lock.
#[derive(Debug)]
pub struct InMemoryReferenceStore {
    state: RwLock<StoreState>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Rebuild a store from previously saved items
    ///
    /// Items keep their ids and order; new ids continue after the largest
    /// one. Duplicate ids are rejected as a corrupt snapshot.
    pub fn from_items(items: Vec<ReferenceItem>) -> AppResult<Self> {
        let mut seen = std::collections::HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(AppError::Storage(format!(
                    "Duplicate reference item id {} in snapshot",
                    item.id
                )));
            }
        }

        let next_id = items.iter().map(|item| item.id).max().unwrap_or(0) + 1;
        Ok(Self {
            state: RwLock::new(StoreState { items, next_id }),
        })
    }
}

impl Default for InMemoryReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn insert(&self, item: NewReferenceItem) -> AppResult<ReferenceItem> {
        item.validate()?;

        let mut state = self.state.write();
        let id = state.next_id;
        state.next_id += 1;

        let stored = ReferenceItem::from_new(id, item);
        trace!(target: "visual_index", id, name = %stored.name, "Stored reference item");
        state.items.push(stored.clone());
        Ok(stored)
    }

    fn get(&self, id: ItemId) -> AppResult<Option<ReferenceItem>> {
        Ok(self.state.read().items.iter().find(|item| item.id == id).cloned())
    }

    fn get_by_hash(&self, content_hash: &str) -> AppResult<Option<ReferenceItem>> {
        Ok(self
            .state
            .read()
            .items
            .iter()
            .find(|item| item.content_hash == content_hash)
            .cloned())
    }

    fn get_all(&self) -> AppResult<Vec<ReferenceItem>> {
        Ok(self.state.read().items.clone())
    }

    fn get_by_name(&self, name: &str) -> AppResult<Vec<ReferenceItem>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .state
            .read()
            .items
            .iter()
            .filter(|item| item.name.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    fn remove(&self, id: ItemId) -> AppResult<Option<ReferenceItem>> {
        let mut state = self.state.write();
        let position = state.items.iter().position(|item| item.id == id);
        // Vec::remove keeps insertion order for the remaining items
        Ok(position.map(|index| state.items.remove(index)))
    }

    fn len(&self) -> AppResult<usize> {
        Ok(self.state.read().items.len())
    }
}
