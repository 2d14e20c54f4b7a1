//! Custody - in-memory credential and execution lifecycle core
//!
//! Two cooperating in-process registries: the credential vault holds
//! decrypted signing keys only while the application is unlocked, and the
//! execution registry owns the live trading sessions constructed from
//! those keys. Everything here is process-memory-only and intentionally
//! lost on restart.

pub mod accounts;
pub mod config;
pub mod errors;
pub mod execution;
pub mod metrics;
pub mod observability;
pub mod vault;

// Re-export commonly used types
pub use accounts::{AccountStore, FileAccountStore, PersistedAccount};
pub use config::Config;
pub use errors::{CustodyError, CustodyResult, ErrorClass};
pub use execution::{
    ChainConfig, ChainKeyMap, CredentialSource, ExecutionRecord, ExecutionRegistry, SessionError,
    SessionFactory, TradingSession, UnlockScope,
};
pub use vault::{CipherError, CredentialEntry, CredentialVault, KeyCipher, SigningKey, Unlocker};
