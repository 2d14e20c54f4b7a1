//! Logging initialization

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbosity picks the fallback
/// filter. Secret material never reaches a log line: the signing-key type
/// redacts itself and no vault or registry event carries key bytes.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let env_filter = if verbose {
        "custody=debug,info"
    } else {
        "custody=info,warn,error"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}
