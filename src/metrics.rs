//! Metrics collection and export module

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

static METRICS: Lazy<Metrics> = Lazy::new(Metrics::default);

/// Process-wide metrics accessor
pub fn metrics() -> &'static Metrics {
    &METRICS
}

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub vault_unlocks_total: IntCounter,
    pub vault_clears_total: IntCounter,
    pub executions_opened_total: IntCounter,
    pub executions_closed_total: IntCounter,
    pub execution_close_failures: IntCounter,

    // Gauges
    pub vault_accounts: IntGauge,
    pub active_executions: IntGauge,

    // Histograms
    pub execution_init_latency: Histogram,
    pub session_close_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let vault_unlocks_total = IntCounter::with_opts(Opts::new(
            "vault_unlocks_total",
            "Number of vault unlock (bulk load) operations",
        ))?;

        let vault_clears_total = IntCounter::with_opts(Opts::new(
            "vault_clears_total",
            "Number of vault clear (lock) operations that wiped entries",
        ))?;

        let executions_opened_total = IntCounter::with_opts(Opts::new(
            "executions_opened_total",
            "Number of executions initialized",
        ))?;

        let executions_closed_total = IntCounter::with_opts(Opts::new(
            "executions_closed_total",
            "Number of executions closed (including failed closes)",
        ))?;

        let execution_close_failures = IntCounter::with_opts(Opts::new(
            "execution_close_failures",
            "Number of session close operations that returned an error",
        ))?;

        let vault_accounts = IntGauge::with_opts(Opts::new(
            "vault_accounts",
            "Number of decrypted accounts currently held by the vault",
        ))?;

        let active_executions = IntGauge::with_opts(Opts::new(
            "active_executions",
            "Number of currently registered executions",
        ))?;

        let execution_init_latency = Histogram::with_opts(
            HistogramOpts::new(
                "execution_init_latency_seconds",
                "Execution initialization latency",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        )?;

        let session_close_latency = Histogram::with_opts(
            HistogramOpts::new("session_close_latency_seconds", "Session close latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(vault_unlocks_total.clone()))?;
        registry.register(Box::new(vault_clears_total.clone()))?;
        registry.register(Box::new(executions_opened_total.clone()))?;
        registry.register(Box::new(executions_closed_total.clone()))?;
        registry.register(Box::new(execution_close_failures.clone()))?;
        registry.register(Box::new(vault_accounts.clone()))?;
        registry.register(Box::new(active_executions.clone()))?;
        registry.register(Box::new(execution_init_latency.clone()))?;
        registry.register(Box::new(session_close_latency.clone()))?;

        Ok(Self {
            registry,
            vault_unlocks_total,
            vault_clears_total,
            executions_opened_total,
            executions_closed_total,
            execution_close_failures,
            vault_accounts,
            active_executions,
            execution_init_latency,
            session_close_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
