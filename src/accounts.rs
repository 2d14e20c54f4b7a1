//! Persisted account store
//!
//! Read-only access to the encrypted account records the unlock path
//! decrypts from. Key material in a `PersistedAccount` is ciphertext; this
//! crate never writes secrets back to disk.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::{CustodyError, CustodyResult};

/// One encrypted account record as persisted by the account store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedAccount {
    /// Opaque unique identifier
    pub account_id: String,
    /// Human-readable label
    pub account_name: String,
    /// Public chain address (0x-prefixed hex)
    pub address: String,
    /// Per-account key-derivation salt, base64
    pub key_salt: String,
    /// Encrypted signing key, base64
    pub encrypted_key: String,
}

impl PersistedAccount {
    /// Validate the non-secret fields of a record
    pub fn validate(&self) -> CustodyResult<()> {
        if self.account_id.is_empty() {
            return Err(CustodyError::Storage(
                "persisted account with empty account_id".to_string(),
            ));
        }
        let hex_part = self.address.strip_prefix("0x").ok_or_else(|| {
            CustodyError::Storage(format!(
                "account {}: address must be 0x-prefixed",
                self.account_id
            ))
        })?;
        if hex_part.is_empty() || hex::decode(hex_part).is_err() {
            return Err(CustodyError::Storage(format!(
                "account {}: address is not valid hex",
                self.account_id
            )));
        }
        Ok(())
    }
}

/// Source of persisted (still encrypted) account records
pub trait AccountStore: Send + Sync {
    /// Fetch one record by id; `None` when the id is unknown
    fn get(&self, account_id: &str) -> CustodyResult<Option<PersistedAccount>>;

    /// All records in the store
    fn list(&self) -> CustodyResult<Vec<PersistedAccount>>;
}

/// File-backed account store: a JSON array of records, loaded once
pub struct FileAccountStore {
    accounts: HashMap<String, PersistedAccount>,
}

impl FileAccountStore {
    /// Load and validate all records from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read account store file: {}", path))?;
        let records: Vec<PersistedAccount> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse account store file: {}", path))?;
        Self::from_records(records)
            .with_context(|| format!("Invalid account store file: {}", path))
    }

    /// Build a store from already-loaded records
    pub fn from_records(records: Vec<PersistedAccount>) -> Result<Self> {
        let mut accounts = HashMap::with_capacity(records.len());
        for record in records {
            record.validate().map_err(|e| anyhow::anyhow!(e))?;
            if accounts.insert(record.account_id.clone(), record).is_some() {
                anyhow::bail!("duplicate account_id in account store");
            }
        }
        Ok(Self { accounts })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountStore for FileAccountStore {
    fn get(&self, account_id: &str) -> CustodyResult<Option<PersistedAccount>> {
        Ok(self.accounts.get(account_id).cloned())
    }

    fn list(&self) -> CustodyResult<Vec<PersistedAccount>> {
        Ok(self.accounts.values().cloned().collect())
    }
}
