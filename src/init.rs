use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::env::{env_or, CTXKIT_LOG_ANSI_ENV, CTXKIT_LOG_ENV, CTXKIT_LOG_TARGET_ENV};

/// Console output settings for the global `tracing` subscriber.
///
/// **Fields**
/// - `filter`: `EnvFilter` directives, e.g. `info` or `warn,ctxkit=debug`.
/// - `ansi`: color the output.
/// - `with_target`: print each event's target (module path).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
            with_target: false,
        }
    }
}

impl LogConfig {
    /// [`LogConfig::default`] overridden by the `CTXKIT_LOG*` variables in
    /// [`env`](crate::env). Unparsable booleans keep their default.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            filter: env_or(CTXKIT_LOG_ENV, &default.filter),
            ansi: parse_bool(&env_or(CTXKIT_LOG_ANSI_ENV, ""), default.ansi),
            with_target: parse_bool(&env_or(CTXKIT_LOG_TARGET_ENV, ""), default.with_target),
        }
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("global subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a global `tracing` subscriber printing events to stdout.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with an [`EnvFilter`] built from
/// `config.filter` and a `fmt` layer as the global default subscriber, so
/// entries made through [`TracingLogger`](crate::log::TracingLogger) show up
/// on the console.
///
/// **Errors**
///
/// If the filter doesn't parse or a global subscriber is already installed.
pub fn init_tracing_with_config(config: &LogConfig) -> Result<(), InitError> {
    let filter = EnvFilter::try_new(&config.filter)?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi)
        .with_target(config.with_target);
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize tracing with [`LogConfig::from_env`].
///
/// This is the recommended entrypoint for binaries.
pub fn init_tracing() -> Result<(), InitError> {
    init_tracing_with_config(&LogConfig::from_env())
}
