//! Zeroizing wrapper for decrypted signing material

use tracing::debug;
use zeroize::Zeroize;

use crate::errors::{CustodyError, CustodyResult};

/// Decrypted signing key material.
///
/// The backing buffer is wiped on drop. The type never implements
/// `Serialize` and its `Debug` output is redacted, so the raw bytes cannot
/// reach a log line or a wire format through this crate.
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Create from owned bytes. Empty and all-zero material is rejected.
    pub fn new(bytes: Vec<u8>) -> CustodyResult<Self> {
        if bytes.is_empty() {
            return Err(CustodyError::InvalidKey("empty key material".to_string()));
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(CustodyError::InvalidKey(
                "all-zero key rejected".to_string(),
            ));
        }
        Ok(Self { bytes })
    }

    /// Read-only access to the raw key bytes
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the key material in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True once the buffer has been wiped
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Overwrite the buffer with zeroes ahead of drop.
    ///
    /// Used by the vault's clear path so secret bytes are gone before the
    /// entry leaves the backing map.
    pub fn wipe(&mut self) {
        self.bytes.zeroize();
        self.bytes.clear();
    }
}

impl Clone for SigningKey {
    /// Duplicates the key material. Each copy wipes itself on drop;
    /// callers use this to resolve keys into local copies before any
    /// suspension point.
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
        }
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        if !self.bytes.is_empty() {
            self.bytes.zeroize();
            debug!(operation = "zeroize", "Signing key memory wiped on drop");
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<{} bytes redacted>)", self.bytes.len())
    }
}
