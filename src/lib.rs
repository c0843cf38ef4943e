//! Azure Cosmos DB Mongo API collections as a queryable table.
//!
//! A host query engine supplies parent accounts and key constraints; this
//! crate lists or looks up collections through Azure Resource Manager and
//! streams back one flat row per collection.

pub mod azure;
pub mod config;
pub mod resource;

/// Version injected at compile time via COSMOS_COLLECTIONS_VERSION env var
/// (set by CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("COSMOS_COLLECTIONS_VERSION") {
    Some(v) => v,
    None => "dev",
};
