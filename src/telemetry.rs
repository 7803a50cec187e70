use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("warn,logistic_sim={default_level}")))
        .map_err(|err| anyhow!("invalid log level '{default_level}': {err}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;
    Ok(())
}
