use anyhow::anyhow;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Installs the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
