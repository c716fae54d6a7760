//! Integration tests

pub mod export_tests;
pub mod migration_tests;
