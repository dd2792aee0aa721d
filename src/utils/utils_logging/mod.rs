use serde::{Serialize, Deserialize};
use tracing_subscriber::EnvFilter;

/// Verbosity of the structured log events emitted by the environments and controllers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace
}
impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Off => { "off" }
            LogLevel::Error => { "error" }
            LogLevel::Warn => { "warn" }
            LogLevel::Info => { "info" }
            LogLevel::Debug => { "debug" }
            LogLevel::Trace => { "trace" }
        }
    }
}
impl Default for LogLevel {
    fn default() -> Self { LogLevel::Warn }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Prints the module path of each event when true.
    pub with_target: bool
}
impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            with_target: false
        }
    }
}

/// Installs a global `tracing` subscriber for the given configuration.
///
/// A `RUST_LOG` environment variable, if set, takes precedence over `config.level`.  Returns
/// false if a global subscriber was already installed (by an earlier call or by the host
/// application), in which case nothing changes.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let config = LogConfig { level: LogLevel::Debug, with_target: true };
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
