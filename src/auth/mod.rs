//! Authentication and authorization
//!
//! Operators are configured statically with SHA-256 hashed API keys. A
//! request is first identified from its API key, then authorized for the
//! action it attempts. Per-call tokens for the export phases live in
//! [`token`].

pub mod token;

pub use token::{TokenValidator, SCOPE_DOWNLOAD, SCOPE_EXPORT};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::utils::error::{EngineError, Result};

/// Authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Stable operator id; export jobs record this as their owner
    pub id: String,
    /// Display name
    pub name: String,
}

/// Actions a caller may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List migrations and read their status
    ViewMigrations,
    /// Execute a migration batch
    RunMigration,
    /// Start, continue or download an export
    Export,
    /// Issue a short-lived phase token
    IssueToken,
}

struct Operator {
    identity: Identity,
    admin: bool,
}

/// API-key based authentication system
pub struct AuthSystem {
    // keyed by lowercase hex SHA-256 of the operator API key
    operators: HashMap<String, Operator>,
}

impl AuthSystem {
    /// Build the system from configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut operators = HashMap::new();
        for op in &config.operators {
            operators.insert(
                op.api_key_sha256.to_lowercase(),
                Operator {
                    identity: Identity {
                        id: op.id.clone(),
                        name: op.name.clone(),
                    },
                    admin: op.admin,
                },
            );
        }
        info!("Auth system initialized with {} operator(s)", operators.len());
        Self { operators }
    }

    /// Resolve an API key to an identity.
    pub fn identify(&self, api_key: &str) -> Result<Identity> {
        let digest = hex::encode(Sha256::digest(api_key.as_bytes()));
        match self.operators.get(&digest) {
            Some(op) => {
                debug!(operator = %op.identity.id, "request identified");
                Ok(op.identity.clone())
            }
            None => {
                warn!("request with unknown API key rejected");
                Err(EngineError::unauthorized("invalid API key"))
            }
        }
    }

    /// Check that an identity may perform an action. Migration execution
    /// is restricted to admin operators; everything else is open to any
    /// identified caller.
    pub fn authorize(&self, identity: &Identity, action: Action) -> Result<()> {
        match action {
            Action::RunMigration => {
                let admin = self
                    .operators
                    .values()
                    .any(|op| op.identity.id == identity.id && op.admin);
                if admin {
                    Ok(())
                } else {
                    warn!(operator = %identity.id, "migration run denied");
                    Err(EngineError::unauthorized(
                        "operator is not allowed to run migrations",
                    ))
                }
            }
            Action::ViewMigrations | Action::Export | Action::IssueToken => Ok(()),
        }
    }
}
