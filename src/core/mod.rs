//! Core engine
//!
//! The batched resumable data-processing machinery: keyset cursor
//! iteration, migration strategies with their registry and orchestrator,
//! and the three-phase CSV export controller.

pub mod budget;
pub mod cursor;
pub mod export;
pub mod migrations;

pub use budget::CallBudget;
pub use cursor::{CursorPage, EntryCursor};
