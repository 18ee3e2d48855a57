//! API configuration
//!
//! Holds the run configuration `RunConfig` and a global singleton for the CLI

use crate::error::DecacError;
use decac_config::CompilerOptions;
use decac_log::Logger;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Compilation configuration shared by every file of one invocation
#[derive(Clone)]
pub struct RunConfig {
    /// Compiler options
    pub options: CompilerOptions,
    /// Logger handed to each compiler instance
    pub logger: Arc<Logger>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("options", &self.options)
            .field("log_level", &self.logger.level())
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            options: CompilerOptions::default(),
            logger: Logger::noop(),
        }
    }
}

impl RunConfig {
    pub fn new(options: CompilerOptions, logger: Arc<Logger>) -> Self {
        Self { options, logger }
    }

    pub fn from_options(options: CompilerOptions) -> Self {
        Self {
            options,
            logger: Logger::noop(),
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize the global configuration; only the first call succeeds
pub fn init(config: RunConfig) -> Result<(), DecacError> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| DecacError::Internal("configuration already initialized".into()))
}

/// Global configuration, if initialized
pub fn config() -> Option<&'static RunConfig> {
    GLOBAL_CONFIG.get()
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.options, CompilerOptions::default());
        assert_eq!(cfg.options.register_count(), 16);
    }

    #[test]
    fn test_run_config_debug() {
        let cfg = RunConfig::default();
        let debug_str = format!("{:?}", cfg);
        assert!(debug_str.contains("options"));
        assert!(debug_str.contains("log_level"));
    }

    #[test]
    fn test_global_config_init_once() {
        // the singleton is process-wide; whichever test gets here first wins
        let first = init(RunConfig::default());
        assert!(is_initialized());
        assert!(config().is_some());
        if first.is_ok() {
            assert!(init(RunConfig::default()).is_err());
        }
    }
}
