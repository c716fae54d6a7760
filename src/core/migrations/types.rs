//! Migration status and execution result types

use serde::{Deserialize, Serialize};

/// Point-in-time progress of a migration
///
/// Recomputed from the dataset on every call, never cached, so the
/// percentage always reflects the latest mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Total rows in scope
    pub total: u64,
    /// Rows already in the target shape
    pub migrated: u64,
    /// Rows still in the legacy shape
    pub pending: u64,
    /// Completion percentage (0.0–100.0)
    pub percent: f64,
    /// Whether nothing is left to do
    pub is_complete: bool,
}

impl StatusSnapshot {
    /// Build a snapshot from counted totals. An empty scope is complete.
    pub fn from_counts(total: u64, migrated: u64) -> Self {
        let pending = total.saturating_sub(migrated);
        let percent = if total == 0 {
            100.0
        } else {
            (migrated as f64 / total as f64) * 100.0
        };
        Self {
            total,
            migrated,
            pending,
            percent,
            is_complete: pending == 0,
        }
    }
}

/// Outcome of one execute call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the batch ran (individual rows may still have failed)
    pub success: bool,
    /// Rows processed in this batch
    pub processed: u64,
    /// Whether the caller must invoke execute again
    pub has_more: bool,
    /// Diagnostic summary of the batch
    pub message: String,
    /// Per-row failures, collected without aborting the batch
    pub errors: Vec<String>,
}
