use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, WriteError};

/// Installs the global tracing subscriber. `level` takes any `EnvFilter`
/// directive, e.g. `"info"` or `"tenebra=debug"`.
pub fn init(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| WriteError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| WriteError::InvalidArgument("logging already initialized".into()))
}
