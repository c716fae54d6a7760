//! Migration strategy interface

use async_trait::async_trait;

use super::definition::MigrationDefinition;
use super::types::{ExecutionResult, StatusSnapshot};
use crate::utils::error::Result;

/// A pluggable unit of batched migration work
///
/// All three operations are pure with respect to the strategy instance:
/// no fields are mutated across calls, and "remaining work" is always
/// re-derived from the dataset rather than trusted from the caller. That
/// is what makes replaying a `batch_number` after a crash idempotent:
/// the replay simply processes the next outstanding chunk.
#[async_trait]
pub trait MigrationStrategy: Send + Sync {
    /// Key this strategy is registered under.
    fn key(&self) -> &'static str;

    /// Recompute progress by querying the dataset. A partially-migrated
    /// dataset is the normal case, not an error.
    async fn calculate_status(&self, definition: &MigrationDefinition) -> Result<StatusSnapshot>;

    /// Check preconditions. Returns a structured error naming exactly
    /// which precondition failed; never silently refuses.
    async fn can_run(&self, definition: &MigrationDefinition) -> Result<()>;

    /// Process up to `batch_size` units of remaining work. `batch_number`
    /// is diagnostic only.
    async fn execute(
        &self,
        definition: &MigrationDefinition,
        batch_number: u32,
    ) -> Result<ExecutionResult>;
}
