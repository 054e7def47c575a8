use serde::Deserialize;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    #[default]
    Compact,
}

/// Log filtering and output format.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. `"info"` or `"augur_engine=debug,info"`).
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_owned()
}
