//! Migration orchestration
//!
//! Resolves a migration key to its definition and strategy, enforces
//! preconditions, and forwards calculate/execute calls. Unknown keys are
//! rejected at this boundary with a typed error instead of being
//! propagated deeper.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::definition::MigrationDefinition;
use super::registry::MigrationRegistry;
use super::strategy::MigrationStrategy;
use super::types::{ExecutionResult, StatusSnapshot};
use crate::utils::error::{EngineError, Result};

/// Orchestrator pairing the registry with a key→strategy map
pub struct StatusCalculator {
    registry: MigrationRegistry,
    strategies: HashMap<&'static str, Arc<dyn MigrationStrategy>>,
}

impl StatusCalculator {
    /// Build the orchestrator from a populated registry and the matching
    /// strategy instances. Both maps are fixed after construction.
    pub fn new(registry: MigrationRegistry, strategies: Vec<Arc<dyn MigrationStrategy>>) -> Self {
        let strategies = strategies
            .into_iter()
            .map(|s| (s.key(), s))
            .collect::<HashMap<_, _>>();
        Self {
            registry,
            strategies,
        }
    }

    /// Registry backing this orchestrator.
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    fn resolve(&self, key: &str) -> Result<(&MigrationDefinition, &Arc<dyn MigrationStrategy>)> {
        let definition = self
            .registry
            .get(key)
            .ok_or_else(|| EngineError::not_found(format!("unknown migration: {}", key)))?;
        let strategy = self
            .strategies
            .get(key)
            .ok_or_else(|| EngineError::not_found(format!("no strategy registered for: {}", key)))?;
        Ok((definition, strategy))
    }

    /// Recompute the status snapshot for one migration.
    pub async fn calculate(&self, key: &str) -> Result<StatusSnapshot> {
        let (definition, strategy) = self.resolve(key)?;
        debug!(migration = key, "calculating migration status");
        strategy.calculate_status(definition).await
    }

    /// Check whether a migration's preconditions are satisfied.
    pub async fn can_run(&self, key: &str) -> Result<()> {
        let (definition, strategy) = self.resolve(key)?;
        strategy.can_run(definition).await
    }

    /// Execute one batch. Preconditions are always checked first;
    /// execution is never attempted against a dataset that fails them.
    pub async fn execute(&self, key: &str, batch_number: u32) -> Result<ExecutionResult> {
        let (definition, strategy) = self.resolve(key)?;
        strategy.can_run(definition).await?;

        info!(migration = key, batch_number, "executing migration batch");
        strategy.execute(definition, batch_number).await
    }
}
