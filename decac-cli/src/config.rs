//! CLI configuration
//!
//! Per-phase log levels for the tracing subscriber.

use tracing::Level;

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub verify: Option<Level>,
    pub codegen: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            verify: None,
            codegen: None,
        }
    }
}

impl LogConfig {
    /// Levels for `-d` repeated `count` times
    pub fn from_debug_count(count: u8) -> Self {
        Self {
            global: to_tracing(decac_log::Level::from_debug_count(count)),
            ..Self::default()
        }
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "decac::verify" => self.verify.unwrap_or(self.global),
            "decac::codegen" => self.codegen.unwrap_or(self.global),
            _ => self.global,
        }
    }
}

pub fn to_tracing(level: decac_log::Level) -> Level {
    match level {
        decac_log::Level::Trace => Level::TRACE,
        decac_log::Level::Debug => Level::DEBUG,
        decac_log::Level::Info => Level::INFO,
        decac_log::Level::Warn => Level::WARN,
        decac_log::Level::Error => Level::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_count_levels() {
        assert_eq!(LogConfig::from_debug_count(0).global, Level::WARN);
        assert_eq!(LogConfig::from_debug_count(1).global, Level::INFO);
        assert_eq!(LogConfig::from_debug_count(2).global, Level::DEBUG);
        assert_eq!(LogConfig::from_debug_count(9).global, Level::TRACE);
    }

    #[test]
    fn test_phase_override() {
        let config = LogConfig {
            codegen: Some(Level::TRACE),
            ..LogConfig::default()
        };
        assert_eq!(config.level_for("decac::codegen"), Level::TRACE);
        assert_eq!(config.level_for("decac::verify"), Level::WARN);
        assert_eq!(config.level_for("decac::cli"), Level::WARN);
    }
}
