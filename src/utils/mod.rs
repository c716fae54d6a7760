//! Shared utilities
//!
//! Error types and small helpers used across the engine.

pub mod error;
