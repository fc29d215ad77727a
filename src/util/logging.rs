//! Structured logging setup
//!
//! Logging goes through the `tracing` ecosystem. Output is human-readable by
//! default or JSON for log shippers. `RUST_LOG`, when set, takes precedence
//! over the configured level. Initialization happens at most once per
//! process.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Crates too chatty at the configured level
const QUIET_CRATES: [&str; 3] = ["h2", "hyper", "reqwest"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,

    /// JSON lines instead of the pretty console format
    pub use_json: bool,

    /// Include the module target (e.g. `stackgoals::machine`)
    pub include_target: bool,

    /// Include file and line number
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }

    /// Read `STACKGOALS_LOG_LEVEL` and `STACKGOALS_LOG_JSON`
    pub fn from_env() -> Self {
        let level = env::var("STACKGOALS_LOG_LEVEL")
            .map(|l| parse_level(&l))
            .unwrap_or(Level::INFO);
        let use_json = env::var("STACKGOALS_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);
        Self {
            level,
            use_json,
            ..Default::default()
        }
    }
}

/// Case-insensitive; unknown levels fall back to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level, honor_rust_log: bool) -> EnvFilter {
    if honor_rust_log {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    let mut filter = EnvFilter::new(format!("stackgoals={}", level));
    for name in QUIET_CRATES {
        if let Ok(directive) = format!("{}=warn", name).parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level, true);
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);

        if config.use_json {
            tracing_subscriber::registry().with(filter).with(layer.json()).init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_and_production() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);

        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);
    }

    #[test]
    fn test_filter_quiets_http_crates() {
        let filter = build_filter(Level::DEBUG, false).to_string();
        assert!(filter.contains("stackgoals=debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("STACKGOALS_LOG_LEVEL", "debug");
        env::set_var("STACKGOALS_LOG_JSON", "true");
        let config = LoggingConfig::from_env();
        env::remove_var("STACKGOALS_LOG_LEVEL");
        env::remove_var("STACKGOALS_LOG_JSON");

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
    }
}
