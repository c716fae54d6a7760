//! Entry dataset access
//!
//! The engine never talks to a concrete database; it goes through the
//! [`Dataset`] trait. `scan_page` is keyset-based: strictly-descending ids
//! below `after_key`, so concurrent inserts and deletes of *other* rows
//! cannot cause skips or duplicates across calls.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// One form entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Monotonic primary key
    pub id: i64,
    /// Owning form
    pub form_id: i64,
    /// Entry status ("active", "trash", ...; empty on legacy rows)
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Legacy serialized field blob (JSON object), present until expanded
    pub raw_fields: Option<String>,
    /// Keyed meta values (the variable-schema payload column)
    pub meta: BTreeMap<String, String>,
}

impl Entry {
    /// Whether the serialized field blob still needs expansion into meta rows.
    pub fn needs_field_expansion(&self) -> bool {
        self.meta.is_empty()
            && self
                .raw_fields
                .as_ref()
                .map(|raw| !raw.is_empty())
                .unwrap_or(false)
    }
}

/// Filter criteria for counting and scanning entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Restrict to one form
    pub form_id: Option<i64>,
    /// Restrict to one status
    pub status: Option<String>,
    /// Entries created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Entries created at or before this instant
    pub created_before: Option<DateTime<Utc>>,
    /// Only rows with an empty status (status backfill migration)
    #[serde(default)]
    pub missing_status: bool,
    /// Only rows whose field blob has not been expanded into meta
    #[serde(default)]
    pub unexpanded_fields: bool,
}

impl EntryFilter {
    /// Filter matching every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter for one form.
    pub fn for_form(form_id: i64) -> Self {
        Self {
            form_id: Some(form_id),
            ..Self::default()
        }
    }

    /// Whether `entry` satisfies this filter.
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(form_id) = self.form_id {
            if entry.form_id != form_id {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &entry.status != status {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if entry.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if entry.created_at > before {
                return false;
            }
        }
        if self.missing_status && !entry.status.is_empty() {
            return false;
        }
        if self.unexpanded_fields && !entry.needs_field_expansion() {
            return false;
        }
        true
    }
}

/// Dataset access used by migrations and exports
#[async_trait]
pub trait Dataset: Send + Sync {
    /// Count entries matching `filter`.
    async fn count(&self, filter: &EntryFilter) -> Result<u64>;

    /// Fetch up to `limit` matching entries with `id` strictly below
    /// `after_key`, in descending id order. `None` means the `i64::MAX`
    /// sentinel, so the first page needs no special case. An empty page
    /// signals exhaustion.
    async fn scan_page(
        &self,
        filter: &EntryFilter,
        after_key: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Entry>>;

    /// Persist a mutated entry.
    async fn update(&self, entry: Entry) -> Result<()>;

    /// Whether the dataset exposes a keyed meta store. Migrations that
    /// write meta rows check this as a precondition.
    fn has_meta_store(&self) -> bool;
}

/// In-memory dataset backed by an ordered map
///
/// Backs the test suite and the dev server. The `BTreeMap` keeps entries
/// in id order so keyset scans behave exactly like an indexed table.
pub struct MemoryDataset {
    entries: RwLock<BTreeMap<i64, Entry>>,
    next_id: AtomicI64,
    meta_store: bool,
}

impl MemoryDataset {
    /// Create an empty dataset with a meta store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            meta_store: true,
        }
    }

    /// Create a dataset without a meta store, for precondition tests.
    pub fn without_meta_store() -> Self {
        Self {
            meta_store: false,
            ..Self::new()
        }
    }

    /// Insert an entry, assigning the next id. Returns the assigned id.
    pub fn insert(&self, mut entry: Entry) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        entry.id = id;
        self.entries.write().insert(id, entry);
        id
    }

    /// Remove an entry by id.
    pub fn remove(&self, id: i64) -> Option<Entry> {
        self.entries.write().remove(&id)
    }

    /// Fetch a snapshot of one entry.
    pub fn get(&self, id: i64) -> Option<Entry> {
        self.entries.read().get(&id).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryDataset {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dataset for MemoryDataset {
    async fn count(&self, filter: &EntryFilter) -> Result<u64> {
        let entries = self.entries.read();
        Ok(entries.values().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn scan_page(
        &self,
        filter: &EntryFilter,
        after_key: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Entry>> {
        let after = after_key.unwrap_or(i64::MAX);
        let entries = self.entries.read();
        let page = entries
            .range((Bound::Unbounded, Bound::Excluded(after)))
            .rev()
            .filter(|(_, e)| filter.matches(e))
            .take(limit)
            .map(|(_, e)| e.clone())
            .collect();
        Ok(page)
    }

    async fn update(&self, entry: Entry) -> Result<()> {
        self.entries.write().insert(entry.id, entry);
        Ok(())
    }

    fn has_meta_store(&self) -> bool {
        self.meta_store
    }
}
