//! Built-in migration strategies

pub mod entry_status_backfill;
pub mod field_meta_expansion;

pub use entry_status_backfill::EntryStatusBackfill;
pub use field_meta_expansion::FieldMetaExpansion;
