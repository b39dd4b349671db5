//! Record store implementations for LifeChat.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Storage format for timestamps: fixed width, so text order is time order.
/// Nanosecond precision matches `NaiveDateTime`, so stored records read back
/// unchanged.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";
