//! Migration registry
//!
//! Catalog of known migration definitions. Populated once at process
//! start from the built-in list plus whatever external collaborators
//! register; an explicit dependency passed by reference, not a global.

use std::collections::HashMap;

use super::definition::MigrationDefinition;

/// Registry of migration definitions keyed by migration key
pub struct MigrationRegistry {
    definitions: HashMap<&'static str, MigrationDefinition>,
}

impl MigrationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Register a definition. Last registration for a key wins.
    pub fn register(&mut self, definition: MigrationDefinition) {
        self.definitions.insert(definition.key, definition);
    }

    /// Get a definition by key.
    pub fn get(&self, key: &str) -> Option<&MigrationDefinition> {
        self.definitions.get(key)
    }

    /// Whether a key is registered.
    pub fn exists(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    /// All definitions, sorted by display order then key.
    pub fn get_all(&self) -> Vec<&MigrationDefinition> {
        let mut all: Vec<&MigrationDefinition> = self.definitions.values().collect();
        all.sort_by_key(|d| (d.order, d.key));
        all
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("count", &self.definitions.len())
            .field("keys", &self.definitions.keys().collect::<Vec<_>>())
            .finish()
    }
}
