//! Execution registry
//!
//! Owns the set of currently-running trading sessions. A session is
//! constructed from credentials exactly once and stays reachable by a
//! stable identifier until explicitly closed. The registry never retains
//! raw key material beyond the construction call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::accounts::AccountStore;
use crate::config::ExecutionConfig;
use crate::errors::{CustodyError, CustodyResult};
use crate::execution::session::{ChainConfig, ChainKeyMap, SessionFactory, TradingSession};
use crate::metrics;
use crate::vault::credentials::{CredentialEntry, CredentialVault};
use crate::vault::unlock::Unlocker;

/// Whether an execution-time decrypt updates the shared vault or stays
/// local to the one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockScope {
    /// Install the decrypted entry into the shared vault
    SharedVault,
    /// Keep the decrypted entry local to this execution
    ExecutionLocal,
}

/// Where `initialize_execution` resolves signing keys from
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// The vault must already be unlocked
    Vault,
    /// Use the vault when it is unlocked and has the account; otherwise
    /// decrypt on demand from the persisted store with this password
    Password { password: String, scope: UnlockScope },
}

/// One registered execution
#[derive(Clone)]
pub struct ExecutionRecord {
    /// Process-unique identifier, stable until close
    pub execution_id: String,
    /// Reference to the persisted strategy definition
    pub strategy_id: String,
    pub execution_type: String,
    /// The (chain, account) bindings the session was constructed from.
    /// Retained for diagnostics; never used to re-derive keys.
    pub chain_configs: Vec<ChainConfig>,
    pub created_at: DateTime<Utc>,
    session: Arc<dyn TradingSession>,
}

impl ExecutionRecord {
    pub fn session(&self) -> &Arc<dyn TradingSession> {
        &self.session
    }
}

impl std::fmt::Debug for ExecutionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRecord")
            .field("execution_id", &self.execution_id)
            .field("strategy_id", &self.strategy_id)
            .field("execution_type", &self.execution_type)
            .field("chain_configs", &self.chain_configs)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Registry of live trading sessions.
///
/// Constructed once at process start and passed by reference to the
/// request handlers; all collaborators are injected.
pub struct ExecutionRegistry {
    vault: Arc<CredentialVault>,
    store: Arc<dyn AccountStore>,
    unlocker: Arc<Unlocker>,
    factory: Arc<dyn SessionFactory>,
    executions: DashMap<String, ExecutionRecord>,
    cleanup_timeout: Duration,
}

impl ExecutionRegistry {
    pub fn new(
        vault: Arc<CredentialVault>,
        store: Arc<dyn AccountStore>,
        unlocker: Arc<Unlocker>,
        factory: Arc<dyn SessionFactory>,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            vault,
            store,
            unlocker,
            factory,
            executions: DashMap::new(),
            cleanup_timeout: Duration::from_secs(config.cleanup_timeout_secs),
        }
    }

    /// Create and activate a new execution.
    ///
    /// Every key is resolved into a local copy before the first suspension
    /// point, so an interleaved vault `clear()` cannot corrupt in-flight
    /// construction. Fail-fast: any resolution or initialize failure leaves
    /// no record behind.
    pub async fn initialize_execution(
        &self,
        execution_type: &str,
        strategy_id: &str,
        chain_configs: Vec<ChainConfig>,
        source: CredentialSource,
    ) -> CustodyResult<String> {
        let started = Instant::now();
        self.validate_request(execution_type, strategy_id, &chain_configs)?;

        let mut keys = ChainKeyMap::with_capacity(chain_configs.len());
        for cfg in &chain_configs {
            let entry = self.resolve_entry(cfg, &source)?;
            keys.insert(cfg.chain_name.clone(), entry.signing_key().clone());
        }

        let execution_id = next_execution_id();
        let session =
            self.factory
                .create_session(&execution_id, strategy_id, execution_type, keys)?;

        session
            .initialize()
            .await
            .map_err(|e| CustodyError::SessionInit {
                execution_id: execution_id.clone(),
                message: e.to_string(),
            })?;

        let record = ExecutionRecord {
            execution_id: execution_id.clone(),
            strategy_id: strategy_id.to_string(),
            execution_type: execution_type.to_string(),
            chain_configs,
            created_at: Utc::now(),
            session,
        };
        self.executions.insert(execution_id.clone(), record);

        metrics::metrics().executions_opened_total.inc();
        metrics::metrics()
            .active_executions
            .set(self.executions.len() as i64);
        metrics::metrics()
            .execution_init_latency
            .observe(started.elapsed().as_secs_f64());

        info!(
            execution_id = %execution_id,
            strategy_id = %strategy_id,
            execution_type = %execution_type,
            "Execution initialized"
        );
        Ok(execution_id)
    }

    /// Fetch a record by id. Absence is an expected, checkable condition.
    pub fn get_execution(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.executions.get(execution_id).map(|e| e.value().clone())
    }

    /// Close one execution.
    ///
    /// Remove-then-act: the record leaves the map before the session's
    /// close is awaited, so a concurrent second close observes
    /// `ExecutionNotFound` and the close runs at most once. A close failure
    /// is surfaced after the record is already gone; the registry never
    /// leaks a stale record.
    pub async fn close_execution(&self, execution_id: &str) -> CustodyResult<()> {
        let (_, record) = self
            .executions
            .remove(execution_id)
            .ok_or_else(|| CustodyError::ExecutionNotFound(execution_id.to_string()))?;
        metrics::metrics()
            .active_executions
            .set(self.executions.len() as i64);

        let started = Instant::now();
        let result = record.session().close().await;
        metrics::metrics()
            .session_close_latency
            .observe(started.elapsed().as_secs_f64());
        metrics::metrics().executions_closed_total.inc();

        match result {
            Ok(()) => {
                info!(execution_id = %execution_id, "Execution closed");
                Ok(())
            }
            Err(e) => {
                metrics::metrics().execution_close_failures.inc();
                warn!(
                    execution_id = %execution_id,
                    error = %e,
                    "Session close failed; record already removed"
                );
                Err(CustodyError::SessionClose {
                    execution_id: execution_id.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// All currently registered executions
    pub fn active_executions(&self) -> Vec<ExecutionRecord> {
        self.executions.iter().map(|e| e.value().clone()).collect()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.len()
    }

    /// Close every active execution concurrently.
    ///
    /// Shutdown path: individual failures and timeouts are logged, never
    /// thrown, so one misbehaving session cannot block the rest. Waits for
    /// all closes (each bounded by the configured timeout) before
    /// returning. Returns the number of records drained.
    pub async fn cleanup(&self) -> usize {
        let ids: Vec<String> = self.executions.iter().map(|e| e.key().clone()).collect();
        let drained: Vec<ExecutionRecord> = ids
            .into_iter()
            .filter_map(|id| self.executions.remove(&id).map(|(_, record)| record))
            .collect();
        let count = drained.len();
        metrics::metrics()
            .active_executions
            .set(self.executions.len() as i64);

        let timeout = self.cleanup_timeout;
        let closes = drained.into_iter().map(|record| async move {
            let execution_id = record.execution_id.clone();
            match tokio::time::timeout(timeout, record.session().close()).await {
                Ok(Ok(())) => {
                    debug!(execution_id = %execution_id, "Execution closed during cleanup");
                }
                Ok(Err(e)) => {
                    metrics::metrics().execution_close_failures.inc();
                    warn!(
                        execution_id = %execution_id,
                        error = %e,
                        "Session close failed during cleanup"
                    );
                }
                Err(_) => {
                    metrics::metrics().execution_close_failures.inc();
                    warn!(
                        execution_id = %execution_id,
                        timeout_secs = timeout.as_secs(),
                        "Session close timed out during cleanup"
                    );
                }
            }
            metrics::metrics().executions_closed_total.inc();
        });
        futures::future::join_all(closes).await;

        info!(closed = count, "Execution registry cleanup complete");
        count
    }

    fn validate_request(
        &self,
        execution_type: &str,
        strategy_id: &str,
        chain_configs: &[ChainConfig],
    ) -> CustodyResult<()> {
        if execution_type.is_empty() {
            return Err(CustodyError::InvalidRequest(
                "empty execution_type".to_string(),
            ));
        }
        if strategy_id.is_empty() {
            return Err(CustodyError::InvalidRequest(
                "empty strategy_id".to_string(),
            ));
        }
        for cfg in chain_configs {
            cfg.validate()?;
        }
        let mut seen = std::collections::HashSet::new();
        for cfg in chain_configs {
            if !seen.insert(cfg.chain_name.as_str()) {
                return Err(CustodyError::InvalidRequest(format!(
                    "duplicate chain_name in request: {}",
                    cfg.chain_name
                )));
            }
        }
        Ok(())
    }

    /// Resolve one (chain, account) binding to a decrypted entry.
    ///
    /// Synchronous by design: no suspension point between resolution and
    /// the local key copy.
    fn resolve_entry(
        &self,
        cfg: &ChainConfig,
        source: &CredentialSource,
    ) -> CustodyResult<CredentialEntry> {
        match source {
            CredentialSource::Vault => self.vault.get_account(&cfg.account_id),
            CredentialSource::Password { password, scope } => {
                if self.vault.is_unlocked() {
                    match self.vault.get_account(&cfg.account_id) {
                        Ok(entry) => return Ok(entry),
                        // Not in the vault; fall through to the decrypt path
                        Err(CustodyError::AccountNotFound(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
                match scope {
                    UnlockScope::SharedVault => self.unlocker.unlock_single(
                        &self.vault,
                        self.store.as_ref(),
                        &cfg.account_id,
                        password,
                    ),
                    UnlockScope::ExecutionLocal => {
                        self.unlocker
                            .decrypt_scoped(self.store.as_ref(), &cfg.account_id, password)
                    }
                }
            }
        }
    }
}

/// Process-unique execution identifier: millisecond timestamp plus a UUID
/// suffix, collision-resistant under concurrent creation.
fn next_execution_id() -> String {
    format!(
        "exec-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}
