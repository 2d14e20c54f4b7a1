//! Credential Vault
//!
//! Unlock/lock lifecycle for decrypted signing material.

pub mod credentials;
pub mod secret;
pub mod unlock;

pub use credentials::{CredentialEntry, CredentialVault};
pub use secret::SigningKey;
pub use unlock::{CipherError, KeyCipher, Unlocker};
