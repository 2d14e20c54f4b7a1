//! Execution Registry
//!
//! Lifecycle of live trading sessions bound to vault credentials.

pub mod registry;
pub mod session;

pub use registry::{CredentialSource, ExecutionRecord, ExecutionRegistry, UnlockScope};
pub use session::{ChainConfig, ChainKeyMap, SessionError, SessionFactory, TradingSession};
