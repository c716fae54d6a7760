//! Static migration metadata

use serde::Serialize;

/// Static configuration for one migration kind
///
/// Compiled into the registry at process start; immutable after
/// registration and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationDefinition {
    /// Unique migration key, used for lookup and routing
    pub key: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// What the migration does
    pub description: &'static str,
    /// Rows processed per execute call
    pub batch_size: usize,
    /// Display/run ordering among migrations
    pub order: u32,
    /// Whether `can_run` performs a real precondition check
    pub requires_precondition: bool,
}
