//! Save, load, and launch commands through a [`CommandStore`].
//!
//! The vault is the only place where the crypto engine, the store, and the
//! supervisor meet. A record reaches the supervisor only after its envelope
//! has passed the HMAC check and its embedded name matches the handle it was
//! loaded from.

use crate::crypto::{
    self, derive_key, generate_salt, CryptoEnvelope, ScryptParams, UserKey, UserKeyMeta,
};
use crate::error::{CmdsafeError, Result};
use crate::record::CommandRecord;
use crate::storage::{CommandStore, StoredCommand};
use crate::supervisor::{ProcessSupervisor, RunMode, RunOutcome};

/// Encrypted command storage over a backend `S`.
#[derive(Debug)]
pub struct Vault<S: CommandStore> {
    store: S,
    params: ScryptParams,
}

impl<S: CommandStore> Vault<S> {
    /// A vault using the default scrypt cost parameters for new records.
    pub fn new(store: S) -> Self {
        Self {
            store,
            params: ScryptParams::default(),
        }
    }

    /// Use `params` when sealing new records. Existing records keep theirs.
    pub fn with_params(mut self, params: ScryptParams) -> Self {
        self.params = params;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> ScryptParams {
        self.params
    }

    /// Encrypt `record` under `password` and store it under `record.name`.
    ///
    /// # Errors
    ///
    /// Returns `CmdsafeError::HandleExists` if the handle is taken and
    /// `replace` is false.
    pub fn save(&self, record: &CommandRecord, password: &str, replace: bool) -> Result<()> {
        let handle = record.name.as_str();
        self.params.validate()?;
        // Checked up front to skip the KDF; `put` enforces it again atomically.
        if !replace && self.store.get(handle)?.is_some() {
            return Err(CmdsafeError::HandleExists(handle.to_string()));
        }

        let salt = generate_salt()?;
        let key = derive_key(password.as_bytes(), &salt, &self.params)?;
        let meta = UserKeyMeta::scrypt(&salt, self.params, &key);
        let plaintext = record.to_bytes()?;
        let envelope = crypto::encrypt(&plaintext, &key, meta)?;

        self.store.put(handle, &envelope.to_bytes()?, replace)?;
        tracing::info!(handle, replace, "saved command");
        Ok(())
    }

    /// Fetch and parse the stored envelope for `handle`.
    pub fn fetch_envelope(&self, handle: &str) -> Result<CryptoEnvelope> {
        let bytes = self
            .store
            .get(handle)?
            .ok_or_else(|| CmdsafeError::HandleNotFound(handle.to_string()))?;
        CryptoEnvelope::from_bytes(&bytes)
    }

    /// Re-derive the user key for `envelope` and run the fast hash check.
    ///
    /// # Errors
    ///
    /// Returns `CmdsafeError::IncorrectPassphrase` if the derived key does
    /// not match the stored hash. This never replaces the HMAC check.
    pub fn unlock(&self, envelope: &CryptoEnvelope, password: &str) -> Result<UserKey> {
        let key = envelope.user_key.derive(password.as_bytes())?;
        if !envelope.user_key.matches(&key) {
            return Err(CmdsafeError::IncorrectPassphrase);
        }
        Ok(key)
    }

    /// Verify and decrypt `envelope`, then bind the record to `handle`.
    pub fn open_record(
        &self,
        handle: &str,
        envelope: &CryptoEnvelope,
        key: &UserKey,
    ) -> Result<CommandRecord> {
        let plaintext = crypto::decrypt(envelope, key).inspect_err(|e| {
            tracing::warn!(handle, error = %e, "envelope rejected");
        })?;
        let record = CommandRecord::from_bytes(&plaintext)?;
        record.verify_handle(handle).inspect_err(|_| {
            tracing::warn!(handle, "decrypted record names a different handle");
        })?;
        Ok(record)
    }

    /// Fetch, unlock, and open the record stored under `handle`.
    pub fn load(&self, handle: &str, password: &str) -> Result<CommandRecord> {
        let envelope = self.fetch_envelope(handle)?;
        let key = self.unlock(&envelope, password)?;
        self.open_record(handle, &envelope, &key)
    }

    /// Load `handle` and launch it with `extra_args` appended.
    pub async fn run(
        &self,
        handle: &str,
        password: &str,
        extra_args: &[String],
        mode: RunMode,
    ) -> Result<RunOutcome> {
        let record = self.load(handle, password)?;
        launch(&record, extra_args, mode).await
    }

    pub fn delete(&self, handle: &str) -> Result<()> {
        self.store.delete(handle)?;
        tracing::info!(handle, "deleted command");
        Ok(())
    }

    pub fn handles(&self) -> Result<Vec<String>> {
        self.store.list_handles()
    }

    pub fn entries(&self) -> Result<Vec<StoredCommand>> {
        self.store.list_entries()
    }
}

/// Launch an already verified record.
pub async fn launch(
    record: &CommandRecord,
    extra_args: &[String],
    mode: RunMode,
) -> Result<RunOutcome> {
    ProcessSupervisor::new(record.name.as_str())
        .run(&record.executable, record.args_with(extra_args), mode)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn fast_vault() -> Vault<MemoryStore> {
        Vault::new(MemoryStore::new()).with_params(ScryptParams::new(1024, 8, 1))
    }

    fn record(name: &str) -> CommandRecord {
        CommandRecord::new(name, "mysql", ["-u", "root", "-pS3cret"]).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let vault = fast_vault();
        vault.save(&record("db"), "correct horse", false).unwrap();

        let loaded = vault.load("db", "correct horse").unwrap();
        assert_eq!(loaded, record("db"));
    }

    #[test]
    fn test_stored_bytes_hide_arguments() {
        let vault = fast_vault();
        vault.save(&record("db"), "correct horse", false).unwrap();

        let stored = vault.store().get("db").unwrap().unwrap();
        let text = String::from_utf8_lossy(&stored);
        assert!(!text.contains("S3cret"));
        assert!(!text.contains("mysql"));
    }

    #[test]
    fn test_wrong_password_is_incorrect_passphrase() {
        let vault = fast_vault();
        vault.save(&record("db"), "correct horse", false).unwrap();

        assert!(matches!(
            vault.load("db", "battery staple"),
            Err(CmdsafeError::IncorrectPassphrase)
        ));
    }

    #[test]
    fn test_save_refuses_existing_without_replace() {
        let vault = fast_vault();
        vault.save(&record("db"), "correct horse", false).unwrap();

        let replacement = CommandRecord::new("db", "psql", ["-h", "localhost"]).unwrap();
        assert!(matches!(
            vault.save(&replacement, "correct horse", false),
            Err(CmdsafeError::HandleExists(_))
        ));
        assert_eq!(vault.load("db", "correct horse").unwrap(), record("db"));

        vault.save(&replacement, "new password", true).unwrap();
        assert_eq!(vault.load("db", "new password").unwrap(), replacement);
    }

    #[test]
    fn test_record_moved_to_other_handle_is_rejected() {
        let vault = fast_vault();
        vault.save(&record("db"), "correct horse", false).unwrap();

        let bytes = vault.store().get("db").unwrap().unwrap();
        vault.store().put("prod", &bytes, false).unwrap();

        assert!(matches!(
            vault.load("prod", "correct horse"),
            Err(CmdsafeError::HandleMismatch(_))
        ));
    }

    #[test]
    fn test_load_missing_handle() {
        let vault = fast_vault();
        assert!(matches!(
            vault.load("nope", "correct horse"),
            Err(CmdsafeError::HandleNotFound(_))
        ));
    }

    #[test]
    fn test_record_keeps_its_own_params() {
        let vault = fast_vault();
        vault.save(&record("db"), "correct horse", false).unwrap();

        let envelope = vault.fetch_envelope("db").unwrap();
        assert_eq!(envelope.user_key.params(), ScryptParams::new(1024, 8, 1));
    }

    #[test]
    fn test_invalid_params_rejected_before_storing() {
        let vault = Vault::new(MemoryStore::new()).with_params(ScryptParams::new(1000, 8, 1));
        assert!(matches!(
            vault.save(&record("db"), "correct horse", false),
            Err(CmdsafeError::KeyDerivation(_))
        ));
        assert!(vault.handles().unwrap().is_empty());
    }

    #[test]
    fn test_delete_and_handles() {
        let vault = fast_vault();
        vault.save(&record("b"), "correct horse", false).unwrap();
        vault.save(&record("a"), "correct horse", false).unwrap();
        assert_eq!(vault.handles().unwrap(), ["a", "b"]);

        vault.delete("a").unwrap();
        assert_eq!(vault.handles().unwrap(), ["b"]);
        assert!(matches!(
            vault.delete("a"),
            Err(CmdsafeError::HandleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_appends_extra_args() {
        let vault = fast_vault();
        let record = CommandRecord::new("exit", "sh", ["-c", "exit \"$1\"", "sh"]).unwrap();
        vault.save(&record, "correct horse", false).unwrap();

        let outcome = vault
            .run("exit", "correct horse", &["5".to_string()], RunMode::Attached)
            .await
            .unwrap();
        assert_eq!(outcome.exit_code(), 5);
    }
}
