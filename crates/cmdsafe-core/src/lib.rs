//! # cmdsafe core
//!
//! Core library for cmdsafe: encrypted storage of command lines that carry
//! secrets, and supervised execution of those commands once decrypted.
//!
//! This crate holds the domain logic independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: scrypt key derivation and the authenticated envelope
//! - **record**: the command payload sealed inside an envelope
//! - **storage**: the `CommandStore` trait with SQLite and in-memory backends
//! - **supervisor**: attached and detached child process launching
//! - **vault**: ties the above together for save, load, and run

pub mod crypto;
pub mod error;
pub mod fs;
pub mod record;
pub mod storage;
pub mod supervisor;
pub mod vault;

pub use error::{CmdsafeError, Result};
pub use record::CommandRecord;
pub use storage::{CommandStore, MemoryStore, SqliteStore, StoredCommand};
pub use supervisor::{ChildExit, ProcessSupervisor, RunMode, RunOutcome};
pub use vault::Vault;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
