use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, util::TryInitError, EnvFilter,
};

use crate::LibraryConfig;

/// Debug-log switch handed to journeys and IDM helpers.
///
/// The switch is constructed once from [`LibraryConfig::debug_logs`] and copied into every
/// collaborator that wants to trace request and response payloads. When disabled nothing is
/// emitted, regardless of the installed subscriber's filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugLog {
    enabled: bool,
}

impl DebugLog {
    #[allow(missing_docs)]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A switch that never logs.
    pub const fn disabled() -> Self {
        Self::new(false)
    }

    #[allow(missing_docs)]
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(config.debug_logs)
    }

    #[allow(missing_docs)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emit a plain message.
    pub fn log(&self, message: &str) {
        if self.enabled {
            tracing::debug!("{message}");
        }
    }

    /// Emit a message followed by the pretty-printed JSON form of `value`.
    pub fn log_value<T: Serialize + ?Sized>(&self, message: &str, value: &T) {
        if !self.enabled {
            return;
        }

        match serde_json::to_string_pretty(value) {
            Ok(json) => tracing::debug!("{message}\n{json}"),
            Err(error) => tracing::debug!(%error, "{message}"),
        }
    }
}

/// Install a stderr `fmt` subscriber.
///
/// The default level is `debug` when `DEBUG_LOGS` is set and `warn` otherwise; `RUST_LOG`
/// overrides it per target. Calling this more than once returns an error from the second call
/// on and leaves the first subscriber in place.
pub fn init_tracing(config: &LibraryConfig) -> Result<(), TryInitError> {
    let default_level = if config.debug_logs {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_config_flag() {
        let config = LibraryConfig {
            debug_logs: true,
            ..Default::default()
        };
        assert!(DebugLog::from_config(&config).is_enabled());
        assert!(!DebugLog::from_config(&LibraryConfig::default()).is_enabled());
        assert_eq!(DebugLog::default(), DebugLog::disabled());
    }

    #[test]
    fn second_init_is_rejected() {
        let config = LibraryConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
