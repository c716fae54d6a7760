//! Migration manager facade
//!
//! The single entry point presentation code talks to. Wires the built-in
//! registry and strategies once at construction and passes every call
//! through to the orchestrator; carries no logic of its own.

use std::sync::Arc;
use std::time::Duration;

use super::definition::MigrationDefinition;
use super::registry::MigrationRegistry;
use super::status::StatusCalculator;
use super::strategies::{EntryStatusBackfill, FieldMetaExpansion};
use super::strategy::MigrationStrategy;
use super::types::{ExecutionResult, StatusSnapshot};
use crate::storage::Dataset;
use crate::utils::error::Result;

/// Facade over the migration registry and orchestrator
pub struct MigrationManager {
    calculator: StatusCalculator,
}

impl MigrationManager {
    /// Build the manager with the built-in migrations.
    pub fn new(dataset: Arc<dyn Dataset>, call_budget: Duration) -> Self {
        Self::with_extensions(dataset, call_budget, Vec::new())
    }

    /// Build the manager with the built-in migrations plus externally
    /// registered ones. This is the extension point for new migration
    /// kinds.
    pub fn with_extensions(
        dataset: Arc<dyn Dataset>,
        call_budget: Duration,
        extensions: Vec<(MigrationDefinition, Arc<dyn MigrationStrategy>)>,
    ) -> Self {
        let mut registry = MigrationRegistry::new();
        registry.register(EntryStatusBackfill::definition());
        registry.register(FieldMetaExpansion::definition());

        let mut strategies: Vec<Arc<dyn MigrationStrategy>> = vec![
            Arc::new(EntryStatusBackfill::new(Arc::clone(&dataset), call_budget)),
            Arc::new(FieldMetaExpansion::new(dataset, call_budget)),
        ];

        for (definition, strategy) in extensions {
            registry.register(definition);
            strategies.push(strategy);
        }

        Self {
            calculator: StatusCalculator::new(registry, strategies),
        }
    }

    /// All known migration definitions, in display order.
    pub fn get_migrations(&self) -> Vec<&MigrationDefinition> {
        self.calculator.registry().get_all()
    }

    /// Status snapshot for one migration.
    pub async fn get_migration_status(&self, key: &str) -> Result<StatusSnapshot> {
        self.calculator.calculate(key).await
    }

    /// Whether a migration may run. `Ok(true)` or a structured error,
    /// never a silent `false`.
    pub async fn can_run_migration(&self, key: &str) -> Result<bool> {
        self.calculator.can_run(key).await?;
        Ok(true)
    }

    /// Run one batch of a migration.
    pub async fn run_migration(&self, key: &str, batch_number: u32) -> Result<ExecutionResult> {
        self.calculator.execute(key, batch_number).await
    }
}
