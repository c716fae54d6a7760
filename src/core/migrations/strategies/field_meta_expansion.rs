//! Field meta expansion migration
//!
//! Early versions stored all submitted field values as one serialized
//! JSON blob per entry. This migration expands the blob into keyed meta
//! rows so fields can be queried and exported individually.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::budget::CallBudget;
use crate::core::migrations::definition::MigrationDefinition;
use crate::core::migrations::strategy::MigrationStrategy;
use crate::core::migrations::types::{ExecutionResult, StatusSnapshot};
use crate::storage::{Dataset, Entry, EntryFilter};
use crate::utils::error::{EngineError, Result};

/// Meta key recorded on rows whose blob could not be parsed
const EXPANSION_ERROR_KEY: &str = "_expansion_error";

/// Expands legacy serialized field blobs into keyed meta rows
pub struct FieldMetaExpansion {
    dataset: Arc<dyn Dataset>,
    call_budget: Duration,
}

impl FieldMetaExpansion {
    /// Migration key.
    pub const KEY: &'static str = "field_meta_expansion";

    /// Create the strategy against a dataset.
    pub fn new(dataset: Arc<dyn Dataset>, call_budget: Duration) -> Self {
        Self {
            dataset,
            call_budget,
        }
    }

    /// Static definition registered at startup.
    pub fn definition() -> MigrationDefinition {
        MigrationDefinition {
            key: Self::KEY,
            name: "Field meta expansion",
            description: "Expands serialized field blobs into keyed meta values",
            batch_size: 100,
            order: 20,
            requires_precondition: true,
        }
    }

    fn pending_filter() -> EntryFilter {
        EntryFilter {
            unexpanded_fields: true,
            ..EntryFilter::default()
        }
    }

    fn expand_blob(raw: &str) -> std::result::Result<BTreeMap<String, String>, String> {
        let parsed: serde_json::Map<String, Value> =
            serde_json::from_str(raw).map_err(|e| format!("malformed field blob: {}", e))?;

        let mut meta = BTreeMap::new();
        for (key, value) in parsed {
            let rendered = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            meta.insert(key, rendered);
        }
        if meta.is_empty() {
            return Err("field blob contains no fields".to_string());
        }
        Ok(meta)
    }

    /// Quarantine a row whose blob cannot be expanded so it leaves the
    /// pending filter instead of being retried on every batch.
    fn quarantine(entry: &mut Entry, reason: &str) {
        entry
            .meta
            .insert(EXPANSION_ERROR_KEY.to_string(), reason.to_string());
    }
}

#[async_trait]
impl MigrationStrategy for FieldMetaExpansion {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    async fn calculate_status(&self, _definition: &MigrationDefinition) -> Result<StatusSnapshot> {
        let total = self.dataset.count(&EntryFilter::all()).await?;
        let pending = self.dataset.count(&Self::pending_filter()).await?;
        Ok(StatusSnapshot::from_counts(
            total,
            total.saturating_sub(pending),
        ))
    }

    async fn can_run(&self, _definition: &MigrationDefinition) -> Result<()> {
        if !self.dataset.has_meta_store() {
            return Err(EngineError::precondition(
                "field_meta_expansion requires a keyed meta store, which this dataset does not expose",
            ));
        }
        Ok(())
    }

    async fn execute(
        &self,
        definition: &MigrationDefinition,
        batch_number: u32,
    ) -> Result<ExecutionResult> {
        let budget = CallBudget::start(self.call_budget);
        let filter = Self::pending_filter();

        let page = self
            .dataset
            .scan_page(&filter, None, definition.batch_size)
            .await?;

        let mut processed = 0u64;
        let mut errors = Vec::new();
        for mut entry in page {
            if processed > 0 && budget.exhausted() {
                debug!(
                    batch_number,
                    processed, "call budget exhausted, ending batch early"
                );
                break;
            }

            let raw = entry.raw_fields.clone().unwrap_or_default();
            match Self::expand_blob(&raw) {
                Ok(meta) => {
                    entry.meta = meta;
                }
                Err(reason) => {
                    // Per-row failure: record it and keep going with the
                    // rest of the batch.
                    warn!(entry_id = entry.id, %reason, "field blob expansion failed");
                    errors.push(format!("entry {}: {}", entry.id, reason));
                    Self::quarantine(&mut entry, &reason);
                }
            }
            // Dataset write failures are fatal for the call; rows already
            // updated stay migrated and the retry resumes after them.
            self.dataset.update(entry).await?;
            processed += 1;
        }

        let remaining = self.dataset.count(&filter).await?;
        info!(
            migration = Self::KEY,
            batch_number,
            processed,
            failed = errors.len(),
            remaining,
            "expansion batch complete"
        );

        Ok(ExecutionResult {
            success: true,
            processed,
            has_more: remaining > 0,
            message: format!("batch {}: expanded {} entries", batch_number, processed),
            errors,
        })
    }
}
