//! Unified key-loading path
//!
//! Every decrypted key enters the process through the `Unlocker`, whether
//! the caller unlocks the whole account set, a single account into the
//! shared vault, or one account scoped to a single call. Key derivation and
//! decryption themselves live behind the `KeyCipher` seam.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::accounts::{AccountStore, PersistedAccount};
use crate::errors::{CustodyError, CustodyResult};
use crate::vault::credentials::{CredentialEntry, CredentialVault};
use crate::vault::secret::SigningKey;

/// Failure inside a cipher implementation
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CipherError(pub String);

/// Key-derivation and decryption backend.
///
/// Implementations belong to the application's crypto layer; tests provide
/// their own.
pub trait KeyCipher: Send + Sync {
    /// Derive a symmetric key from a password and per-account salt
    fn derive_key(&self, password: &str, salt: &[u8]) -> Vec<u8>;

    /// Decrypt an encrypted key blob
    fn decrypt(&self, ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// Decrypts persisted account records into vault entries
pub struct Unlocker {
    cipher: Arc<dyn KeyCipher>,
}

impl Unlocker {
    pub fn new(cipher: Arc<dyn KeyCipher>) -> Self {
        Self { cipher }
    }

    /// Bulk unlock: decrypt every record in the store and install the batch.
    ///
    /// Fail-fast: the vault is only touched after every record decrypted,
    /// so a wrong password leaves the previous vault state intact. Returns
    /// the number of accounts installed.
    pub fn unlock_all(
        &self,
        vault: &CredentialVault,
        store: &dyn AccountStore,
        password: &str,
    ) -> CustodyResult<usize> {
        let records = store.list()?;
        let mut entries = Vec::with_capacity(records.len());
        for record in &records {
            entries.push(self.decrypt_record(record, password)?);
        }
        let count = entries.len();
        vault.load_accounts(entries);
        info!(accounts = count, "Bulk unlock complete");
        Ok(count)
    }

    /// Decrypt one account and install it into the shared vault
    pub fn unlock_single(
        &self,
        vault: &CredentialVault,
        store: &dyn AccountStore,
        account_id: &str,
        password: &str,
    ) -> CustodyResult<CredentialEntry> {
        let entry = self.decrypt_scoped(store, account_id, password)?;
        vault.unlock_account(entry.clone());
        Ok(entry)
    }

    /// Decrypt one account without touching the vault.
    ///
    /// The entry lives only as long as the caller keeps it; its key wipes
    /// itself on drop.
    pub fn decrypt_scoped(
        &self,
        store: &dyn AccountStore,
        account_id: &str,
        password: &str,
    ) -> CustodyResult<CredentialEntry> {
        let record = store
            .get(account_id)?
            .ok_or_else(|| CustodyError::AccountNotFound(account_id.to_string()))?;
        let entry = self.decrypt_record(&record, password)?;
        debug!(account_id = %account_id, "Account decrypted (execution-local)");
        Ok(entry)
    }

    fn decrypt_record(
        &self,
        record: &PersistedAccount,
        password: &str,
    ) -> CustodyResult<CredentialEntry> {
        let decrypt_err = |message: String| CustodyError::Decrypt {
            account_id: record.account_id.clone(),
            message,
        };

        let salt = BASE64
            .decode(&record.key_salt)
            .map_err(|e| decrypt_err(format!("invalid salt encoding: {}", e)))?;
        let ciphertext = BASE64
            .decode(&record.encrypted_key)
            .map_err(|e| decrypt_err(format!("invalid key blob encoding: {}", e)))?;

        let mut derived = self.cipher.derive_key(password, &salt);
        let result = self.cipher.decrypt(&ciphertext, &derived);
        derived.zeroize();

        let plaintext = result.map_err(|e| decrypt_err(e.to_string()))?;
        let signing_key = SigningKey::new(plaintext)?;

        Ok(CredentialEntry::new(
            record.account_id.clone(),
            record.account_name.clone(),
            record.address.clone(),
            signing_key,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::FileAccountStore;

    /// Identity cipher: ciphertext is the key material, key ignored
    struct PassthroughCipher;

    impl KeyCipher for PassthroughCipher {
        fn derive_key(&self, password: &str, _salt: &[u8]) -> Vec<u8> {
            password.as_bytes().to_vec()
        }

        fn decrypt(&self, ciphertext: &[u8], _key: &[u8]) -> Result<Vec<u8>, CipherError> {
            Ok(ciphertext.to_vec())
        }
    }

    /// Cipher that always rejects, as a wrong password would
    struct RejectingCipher;

    impl KeyCipher for RejectingCipher {
        fn derive_key(&self, password: &str, _salt: &[u8]) -> Vec<u8> {
            password.as_bytes().to_vec()
        }

        fn decrypt(&self, _ciphertext: &[u8], _key: &[u8]) -> Result<Vec<u8>, CipherError> {
            Err(CipherError("authentication failed".to_string()))
        }
    }

    fn store_with(ids: &[&str]) -> FileAccountStore {
        let records = ids
            .iter()
            .map(|id| PersistedAccount {
                account_id: id.to_string(),
                account_name: format!("{} name", id),
                address: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
                key_salt: BASE64.encode(b"salt"),
                encrypted_key: BASE64.encode(format!("key-{}", id).as_bytes()),
            })
            .collect();
        FileAccountStore::from_records(records).unwrap()
    }

    #[test]
    fn test_unlock_all_installs_batch() {
        let vault = CredentialVault::new();
        let store = store_with(&["acc1", "acc2"]);
        let unlocker = Unlocker::new(Arc::new(PassthroughCipher));

        let count = unlocker.unlock_all(&vault, &store, "pw").unwrap();
        assert_eq!(count, 2);
        assert!(vault.is_unlocked());
        assert_eq!(
            vault.get_account("acc1").unwrap().signing_key().expose(),
            b"key-acc1"
        );
    }

    #[test]
    fn test_failed_unlock_leaves_vault_untouched() {
        let vault = CredentialVault::new();
        let store = store_with(&["acc1"]);

        // Seed the vault with a previous successful unlock
        Unlocker::new(Arc::new(PassthroughCipher))
            .unlock_all(&vault, &store, "pw")
            .unwrap();

        let err = Unlocker::new(Arc::new(RejectingCipher))
            .unlock_all(&vault, &store, "wrong")
            .unwrap_err();
        assert!(matches!(err, CustodyError::Decrypt { .. }));

        // Previous batch still present
        assert!(vault.is_unlocked());
        assert_eq!(vault.account_count(), 1);
    }

    #[test]
    fn test_unlock_single_updates_vault() {
        let vault = CredentialVault::new();
        let store = store_with(&["acc1", "acc2"]);
        let unlocker = Unlocker::new(Arc::new(PassthroughCipher));

        let entry = unlocker
            .unlock_single(&vault, &store, "acc2", "pw")
            .unwrap();
        assert_eq!(entry.account_id, "acc2");
        assert!(vault.is_unlocked());
        assert_eq!(vault.account_count(), 1);
        assert!(vault.get_account("acc1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_decrypt_scoped_leaves_vault_locked() {
        let vault = CredentialVault::new();
        let store = store_with(&["acc1"]);
        let unlocker = Unlocker::new(Arc::new(PassthroughCipher));

        let entry = unlocker.decrypt_scoped(&store, "acc1", "pw").unwrap();
        assert_eq!(entry.signing_key().expose(), b"key-acc1");
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn test_unknown_account_fails() {
        let store = store_with(&["acc1"]);
        let unlocker = Unlocker::new(Arc::new(PassthroughCipher));
        let err = unlocker.decrypt_scoped(&store, "ghost", "pw").unwrap_err();
        assert_eq!(err, CustodyError::AccountNotFound("ghost".to_string()));
    }
}
