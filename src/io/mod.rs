//! CSV ingest and JSON/CSV export.

pub mod export;
pub mod ingest;
