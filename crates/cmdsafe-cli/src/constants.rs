//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// A successful attached `run` exits with the child's own code instead.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;

    /// Any operational error: missing handle, wrong passphrase, tampering.
    pub const FAILURE: i32 = 1;

    /// Malformed command line.
    pub const USAGE: i32 = 2;
}

/// Environment variable holding the passphrase for non-interactive use.
pub const PASSPHRASE_ENV: &str = "CMDSAFE_PASSPHRASE";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CMDSAFE_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "CMDSAFE_LOG";

/// Passphrase attempts allowed at an interactive prompt.
pub const MAX_PASSPHRASE_ATTEMPTS: usize = 3;
