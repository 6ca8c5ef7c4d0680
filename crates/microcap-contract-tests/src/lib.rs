#![warn(missing_docs)]
//! Frozen JSON-schema contracts for files `microcap` persists.
//!
//! Validation lives in `tests/contract_validation.rs`.

/// Schema for `captures/metadata.json`.
pub const METADATA_INDEX_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/metadata-index.schema.json"
);

/// Directory holding valid and invalid contract fixtures.
pub const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts/fixtures");
