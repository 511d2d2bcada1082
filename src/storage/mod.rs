//! Persistence contracts for the engine collections.

pub mod json_backend;

pub use json_backend::JsonFileStore;

use crate::errors::Result;

/// Key-addressed blob storage for engine collections.
///
/// Engines treat a `load` failure and a missing key the same way: start from
/// an empty collection. A `save` failure is logged by the caller, never
/// propagated to the user operation that triggered it.
pub trait StateStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, blob: &str) -> Result<()>;
}
