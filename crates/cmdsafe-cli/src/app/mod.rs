//! Application-level utilities for the cmdsafe CLI.
//!
//! This module provides:
//! - Application context for unified CLI + config handling
//! - Path resolution for config and store files
//! - Passphrase handling with retry logic

mod context;
mod passphrase;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use passphrase::{read_new_passphrase, unlock_record};
