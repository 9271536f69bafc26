//! The protected command payload.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CmdsafeError, Result};

/// A saved command: what to execute, and under which handle it was saved.
///
/// `name` duplicates the storage handle inside the ciphertext so a record
/// moved to another handle is detected after decryption.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CommandRecord {
    pub name: String,
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandRecord {
    pub fn new(
        name: impl Into<String>,
        executable: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let record = Self {
            name: name.into(),
            executable: executable.into(),
            args: args.into_iter().map(Into::into).collect(),
        };
        if record.name.trim().is_empty() {
            return Err(CmdsafeError::InvalidInput(
                "Command name cannot be empty".to_string(),
            ));
        }
        if record.executable.is_empty() {
            return Err(CmdsafeError::InvalidInput(
                "Executable cannot be empty".to_string(),
            ));
        }
        Ok(record)
    }

    /// Serialize for encryption.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(serde_json::to_vec(self)?))
    }

    /// Parse a decrypted payload.
    ///
    /// Parser details are dropped from the error so no plaintext leaks into it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|_| CmdsafeError::Crypto("Decrypted command data is malformed".to_string()))
    }

    /// Reject a record that was not saved under `handle`.
    pub fn verify_handle(&self, handle: &str) -> Result<()> {
        if self.name != handle {
            return Err(CmdsafeError::HandleMismatch(handle.to_string()));
        }
        Ok(())
    }

    /// Stored arguments followed by `extra`.
    pub fn args_with<'a>(&'a self, extra: &'a [String]) -> impl Iterator<Item = &'a String> {
        self.args.iter().chain(extra.iter())
    }
}

impl std::fmt::Debug for CommandRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRecord")
            .field("name", &self.name)
            .field("executable", &self.executable)
            .field("args", &format_args!("[{} REDACTED]", self.args.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_round_trip() {
        let record = CommandRecord::new("db", "psql", ["-h", "localhost"]).unwrap();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(CommandRecord::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn test_missing_args_default_to_empty() {
        let record =
            CommandRecord::from_bytes(br#"{"name":"ls","executable":"/bin/ls"}"#).unwrap();
        assert!(record.args.is_empty());
    }

    #[test]
    fn test_malformed_payload_error_has_no_content() {
        let err = CommandRecord::from_bytes(b"{\"name\": 5, \"secret\": \"hunter2\"}").unwrap_err();
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(CommandRecord::new("", "ls", Vec::<String>::new()).is_err());
        assert!(CommandRecord::new("ls", "", Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_verify_handle() {
        let record = CommandRecord::new("deploy", "make", ["deploy"]).unwrap();
        assert!(record.verify_handle("deploy").is_ok());
        assert!(matches!(
            record.verify_handle("other"),
            Err(CmdsafeError::HandleMismatch(handle)) if handle == "other"
        ));
    }

    #[test]
    fn test_args_with_appends_extra() {
        let record = CommandRecord::new("grep", "grep", ["-r"]).unwrap();
        let extra = vec!["TODO".to_string(), "src".to_string()];
        let all: Vec<&String> = record.args_with(&extra).collect();
        assert_eq!(all, ["-r", "TODO", "src"]);
    }

    #[test]
    fn test_debug_hides_args() {
        let record = CommandRecord::new("db", "psql", ["--password=hunter2"]).unwrap();
        let debug_output = format!("{:?}", record);
        assert!(!debug_output.contains("hunter2"));
        assert!(debug_output.contains("psql"));
    }
}
