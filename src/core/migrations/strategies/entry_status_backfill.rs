//! Entry status backfill migration
//!
//! Legacy rows were stored with an empty status column. This migration
//! assigns them the canonical default status, one bounded batch per call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::budget::CallBudget;
use crate::core::migrations::definition::MigrationDefinition;
use crate::core::migrations::strategy::MigrationStrategy;
use crate::core::migrations::types::{ExecutionResult, StatusSnapshot};
use crate::storage::{Dataset, EntryFilter};
use crate::utils::error::Result;

/// Status written to legacy rows
pub const DEFAULT_STATUS: &str = "active";

/// Backfills the canonical default status onto legacy rows
pub struct EntryStatusBackfill {
    dataset: Arc<dyn Dataset>,
    call_budget: Duration,
}

impl EntryStatusBackfill {
    /// Migration key.
    pub const KEY: &'static str = "entry_status_backfill";

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
            name: "Entry status backfill",
            description: "Assigns the default status to entries stored without one",
            batch_size: 200,
            order: 10,
            requires_precondition: false,
        }
    }

    fn pending_filter() -> EntryFilter {
        EntryFilter {
            missing_status: true,
            ..EntryFilter::default()
        }
    }
}

#[async_trait]
impl MigrationStrategy for EntryStatusBackfill {
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
        // Writes only to a column that always exists.
        Ok(())
    }

    async fn execute(
        &self,
        definition: &MigrationDefinition,
        batch_number: u32,
    ) -> Result<ExecutionResult> {
        let budget = CallBudget::start(self.call_budget);
        let filter = Self::pending_filter();

        // Remaining work is re-derived from the dataset: migrated rows
        // leave the filter, so every call just takes the first pending
        // page regardless of batch_number.
        let page = self
            .dataset
            .scan_page(&filter, None, definition.batch_size)
            .await?;

        let mut processed = 0u64;
        for mut entry in page {
            if processed > 0 && budget.exhausted() {
                debug!(
                    batch_number,
                    processed, "call budget exhausted, ending batch early"
                );
                break;
            }
            entry.status = DEFAULT_STATUS.to_string();
            self.dataset.update(entry).await?;
            processed += 1;
        }

        let remaining = self.dataset.count(&filter).await?;
        info!(
            migration = Self::KEY,
            batch_number, processed, remaining, "backfill batch complete"
        );

        Ok(ExecutionResult {
            success: true,
            processed,
            has_more: remaining > 0,
            message: format!("batch {}: backfilled {} entries", batch_number, processed),
            errors: Vec::new(),
        })
    }
}
