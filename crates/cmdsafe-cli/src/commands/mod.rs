//! Subcommand handlers.
//!
//! Each handler returns the process exit code on success.

pub mod delete;
pub mod list;
pub mod misc;
pub mod print;
pub mod run;
pub mod save;
