//! Storage abstraction layer.
//!
//! The vault talks to storage only through the `CommandStore` trait, so
//! backends can be swapped without touching the crypto or process code.

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CommandStore, StoredCommand};
