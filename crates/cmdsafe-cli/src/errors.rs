//! CLI error types for structured error handling.
//!
//! Typed errors carry a hint for the user. Every variant exits with the same
//! failure code so scripts only need to tell success from failure.

use std::fmt;

use cmdsafe_core::CmdsafeError;

/// CLI-specific errors with associated hints.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (saved handle, config file)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong passphrase, too many attempts)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput { message: String, hint: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } | CliError::InvalidInput { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: None,
        }
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        super::constants::exit_codes::FAILURE
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}

/// Attach user-facing hints to the core errors that have an obvious fix.
pub fn from_core(err: CmdsafeError) -> anyhow::Error {
    match err {
        CmdsafeError::HandleNotFound(_) => CliError::not_found(
            err.to_string(),
            "Hint: Run `cmdsafe list` to see saved handles.",
        )
        .into(),
        CmdsafeError::HandleExists(_) => CliError::invalid_input(
            format!("{} without -r flag", err),
            "Hint: Pass -r to replace the saved command.",
        )
        .into(),
        CmdsafeError::IncorrectPassphrase => CliError::auth_failed(err.to_string()).into(),
        CmdsafeError::InvalidInput(ref message) => CliError::invalid_input(
            message.clone(),
            "Hint: Run `cmdsafe --help` for usage.",
        )
        .into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_hint() {
        let err = CliError::not_found("db not found", "Hint: Run `cmdsafe list`.");
        assert_eq!(err.to_string(), "db not found\nHint: Run `cmdsafe list`.");
    }

    #[test]
    fn test_auth_failed_without_hint() {
        let err = CliError::auth_failed("Incorrect passphrase");
        assert_eq!(err.to_string(), "Incorrect passphrase");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exists_mentions_replace_flag() {
        let err = from_core(CmdsafeError::HandleExists("db".to_string()));
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert!(cli_err
            .to_string()
            .starts_with("Cannot replace existing entry for db without -r flag"));
    }

    #[test]
    fn test_tampering_passes_through() {
        let err = from_core(CmdsafeError::Integrity);
        assert!(err.downcast_ref::<CliError>().is_none());
        assert!(err.downcast_ref::<CmdsafeError>().is_some());
    }
}
