pub mod chain;
pub mod dir;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use chain::StoreChain;
pub use dir::DirStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;

/// A string key/value backend.
///
/// Backends report whether they can currently be used instead of failing
/// every call; `StoreChain` skips the ones that are unavailable.
pub trait Store: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// All keys starting with `prefix`.
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}
