//! Normalizes GPS activity files (GPX and FIT) into a neutral in-memory
//! model and imports them through a pluggable storage backend.
//!
//! The flow is: [`pipeline::parse_bytes`] turns file bytes into a
//! [`types::record::Record`], then an importer from [`import`] deduplicates
//! and persists it against an [`storage::ActivityStore`], streaming
//! [`types::result::ImportResult`] snapshots back to the caller.

pub mod config;
pub mod error;
pub mod geo;
pub mod import;
pub mod pipeline;
pub mod storage;
pub mod types;
