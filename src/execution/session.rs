//! Trading-session seam
//!
//! The session itself belongs to the trading-protocol layer. This module
//! only fixes the contract the registry drives: synchronous construction
//! from a chain→key mapping, async initialize, async close.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{CustodyError, CustodyResult};
use crate::vault::secret::SigningKey;

/// Failure reported by a session implementation
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SessionError(pub String);

/// Chain name → signing key material handed to a session at construction.
///
/// The keys are the session's own copies; clearing the vault afterwards
/// does not invalidate a running session.
pub type ChainKeyMap = HashMap<String, SigningKey>;

/// One (chain, account) binding requested for an execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_name: String,
    pub account_id: String,
}

impl ChainConfig {
    pub fn new(chain_name: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            chain_name: chain_name.into(),
            account_id: account_id.into(),
        }
    }

    /// Request-schema check applied before any key is resolved
    pub fn validate(&self) -> CustodyResult<()> {
        if self.chain_name.is_empty() {
            return Err(CustodyError::InvalidRequest(
                "chain config with empty chain_name".to_string(),
            ));
        }
        if self.account_id.is_empty() {
            return Err(CustodyError::InvalidRequest(
                "chain config with empty account_id".to_string(),
            ));
        }
        Ok(())
    }
}

/// A live trading session bound to specific chain accounts
#[async_trait]
pub trait TradingSession: Send + Sync {
    /// Async setup after construction (provider connections, warm-up)
    async fn initialize(&self) -> Result<(), SessionError>;

    /// Release the session's own resources; may perform network calls
    async fn close(&self) -> Result<(), SessionError>;
}

/// Constructs sessions for the registry
pub trait SessionFactory: Send + Sync {
    fn create_session(
        &self,
        execution_id: &str,
        strategy_id: &str,
        execution_type: &str,
        keys: ChainKeyMap,
    ) -> CustodyResult<Arc<dyn TradingSession>>;
}
