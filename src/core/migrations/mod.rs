//! Batched data migrations
//!
//! Each migration kind is a [`MigrationStrategy`] cataloged by the
//! [`MigrationRegistry`] and driven through the [`StatusCalculator`].
//! Presentation code only ever touches the [`MigrationManager`] facade.
//! Progress is never stored: status is recomputed from the dataset on
//! every call, which is what makes re-entry idempotent.

pub mod definition;
pub mod manager;
pub mod registry;
pub mod status;
pub mod strategies;
pub mod strategy;
pub mod types;

pub use definition::MigrationDefinition;
pub use manager::MigrationManager;
pub use registry::MigrationRegistry;
pub use status::StatusCalculator;
pub use strategy::MigrationStrategy;
pub use types::{ExecutionResult, StatusSnapshot};
