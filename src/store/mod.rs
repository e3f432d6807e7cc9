mod sqlite;

pub use sqlite::SqliteIndexStore;

use crate::error::Result;

/// Persistence boundary consumed by the pipeline. One concrete adapter,
/// [`SqliteIndexStore`], ships with this crate; the trait exists so the
/// core never depends on a specific storage engine.
pub trait IndexStore: Send + Sync {
    /// Idempotent schema initialization.
    fn create_schema(&self) -> Result<()>;

    /// Drops and recreates the schema, discarding any previously indexed
    /// tones and address/couple rows.
    fn reset_schema(&self) -> Result<()>;

    fn tone_exists(&self, tone_id: u32) -> Result<bool>;

    /// Idempotent under `tone_id` uniqueness; duplicates are no-ops.
    fn store_tone(&self, tone_id: u32, name: &str) -> Result<()>;

    /// Bulk insert in one transaction; duplicates on `(address, couple)`
    /// are silently dropped.
    fn store_address_couples(&self, entries: &[(u32, u64)]) -> Result<()>;

    fn lookup_couples_by_address(&self, address: u32) -> Result<Vec<(u32, u64)>>;

    fn get_tone(&self, tone_id: u32) -> Result<Option<(u32, String)>>;
}
