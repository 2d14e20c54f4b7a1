//! In-memory credential vault gated by an unlock/lock lifecycle
//!
//! Single source of truth for "is signing material currently available" and
//! the only place decrypted keys are held at rest in process memory. Entries
//! exist only while the vault is unlocked; both lock transitions happen
//! under one write lock so no reader ever observes a partial batch.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::errors::{CustodyError, CustodyResult};
use crate::metrics;
use crate::vault::secret::SigningKey;

/// One decrypted account held by the vault
#[derive(Debug, Clone)]
pub struct CredentialEntry {
    /// Opaque identifier matching the persisted account record
    pub account_id: String,
    /// Human-readable label
    pub account_name: String,
    /// Public chain address derived from the key (not secret)
    pub address: String,
    signing_key: SigningKey,
}

impl CredentialEntry {
    pub fn new(
        account_id: impl Into<String>,
        account_name: impl Into<String>,
        address: impl Into<String>,
        signing_key: SigningKey,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            account_name: account_name.into(),
            address: address.into(),
            signing_key,
        }
    }

    /// The decrypted signing key bound to this account
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    fn wipe(&mut self) {
        self.signing_key.wipe();
    }
}

#[derive(Default)]
struct VaultInner {
    unlocked: bool,
    entries: HashMap<String, CredentialEntry>,
}

impl VaultInner {
    /// Wipe and discard every entry. Old keys are overwritten before the
    /// map slots are dropped.
    fn wipe_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.wipe();
        }
        self.entries.clear();
    }
}

/// In-memory store of decrypted signing keys.
///
/// All operations are synchronous; nothing awaits while holding the lock.
/// Callers receive copies of entries, never references into the map, so a
/// later `clear()` cannot invalidate material already handed out.
pub struct CredentialVault {
    inner: RwLock<VaultInner>,
}

impl CredentialVault {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(VaultInner::default()),
        }
    }

    /// Install a freshly decrypted batch of accounts and mark the vault
    /// unlocked.
    ///
    /// Idempotent under repeated unlock calls: any existing entries are
    /// wiped and fully discarded before the new set is installed, so a
    /// re-unlock can never leak keys from the previous batch. Readers see
    /// either the old set or the complete new one, nothing in between.
    pub fn load_accounts(&self, entries: Vec<CredentialEntry>) {
        let count = entries.len();
        let mut inner = self.inner.write();
        inner.wipe_all();
        for entry in entries {
            inner.entries.insert(entry.account_id.clone(), entry);
        }
        inner.unlocked = true;
        drop(inner);

        metrics::metrics().vault_unlocks_total.inc();
        metrics::metrics().vault_accounts.set(count as i64);
        info!(accounts = count, "Vault unlocked");
    }

    /// Install or replace a single decrypted account and mark the vault
    /// unlocked.
    ///
    /// This is the unified form of the on-demand decrypt path: unlocking
    /// one account is still an unlock. A previous entry under the same id
    /// is wiped before the replacement lands.
    pub fn unlock_account(&self, entry: CredentialEntry) {
        let account_id = entry.account_id.clone();
        let mut inner = self.inner.write();
        if let Some(old) = inner.entries.get_mut(&account_id) {
            old.wipe();
        }
        inner.entries.insert(account_id.clone(), entry);
        inner.unlocked = true;
        let count = inner.entries.len();
        drop(inner);

        metrics::metrics().vault_accounts.set(count as i64);
        debug!(account_id = %account_id, "Single account unlocked into vault");
    }

    /// Look up one account by id.
    ///
    /// Fails with `AppLocked` while locked (a hard typed failure, never a
    /// silent empty result) and `AccountNotFound` for an unknown id.
    /// Returns a copy of the entry.
    pub fn get_account(&self, account_id: &str) -> CustodyResult<CredentialEntry> {
        let inner = self.inner.read();
        if !inner.unlocked {
            return Err(CustodyError::AppLocked);
        }
        inner
            .entries
            .get(account_id)
            .cloned()
            .ok_or_else(|| CustodyError::AccountNotFound(account_id.to_string()))
    }

    /// All currently loaded accounts. Same locked precondition as
    /// `get_account`.
    pub fn get_all_accounts(&self) -> CustodyResult<Vec<CredentialEntry>> {
        let inner = self.inner.read();
        if !inner.unlocked {
            return Err(CustodyError::AppLocked);
        }
        Ok(inner.entries.values().cloned().collect())
    }

    /// Whether signing material is currently available. Always safe to call.
    pub fn is_unlocked(&self) -> bool {
        self.inner.read().unlocked
    }

    /// Number of loaded accounts; 0 while locked. Always safe to call.
    pub fn account_count(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Overwrite every entry's secret material and drop the set, then mark
    /// the vault locked.
    ///
    /// Safe to call when already locked. No reader can observe the map
    /// mid-clear: the wipe and the flag flip happen under one write lock.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let had_entries = !inner.entries.is_empty();
        inner.wipe_all();
        inner.unlocked = false;
        drop(inner);

        metrics::metrics().vault_accounts.set(0);
        if had_entries {
            metrics::metrics().vault_clears_total.inc();
            info!("Vault locked, all signing material wiped");
        }
    }
}

impl Default for CredentialVault {
    fn default() -> Self {
        Self::new()
    }
}
