//! One-call logger setup

use crate::{Level, LogRingBuffer, Logger};
use std::sync::Arc;

/// Root logger configuration
///
/// ```
/// use decac_log::{LogConfig, Level};
///
/// let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(100).init();
/// assert!(ring.is_some());
/// assert!(logger.is_enabled(Level::Debug));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogConfig {
    pub level: Level,
    #[cfg(feature = "stderr")]
    pub stderr: bool,
    /// Capacity of the capture buffer, if any
    pub ring_buffer: Option<usize>,
}

impl LogConfig {
    pub fn new(level: Level) -> Self {
        LogConfig {
            level,
            #[cfg(feature = "stderr")]
            stderr: false,
            ring_buffer: None,
        }
    }

    /// Level from the `-d` count, printing to stderr
    #[cfg(feature = "stderr")]
    pub fn from_debug_count(count: u8) -> Self {
        LogConfig::new(Level::from_debug_count(count)).with_stderr()
    }

    /// Trace everything into a ring buffer, print nothing
    pub fn test() -> Self {
        LogConfig::new(Level::Trace).with_ring_buffer(4096)
    }

    #[cfg(feature = "stderr")]
    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.ring_buffer = Some(capacity);
        self
    }

    /// Build the root logger and hand back its capture buffer
    pub fn init(self) -> (Arc<Logger>, Option<Arc<LogRingBuffer>>) {
        let logger = Logger::new(self.level);
        #[cfg(feature = "stderr")]
        {
            if self.stderr {
                logger.add_sink(crate::StderrSink);
            }
        }
        let ring = self.ring_buffer.map(|capacity| {
            let ring = LogRingBuffer::new(capacity);
            logger.add_sink(Arc::clone(&ring));
            ring
        });
        (logger, ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_captures_into_ring() {
        let (logger, ring) = LogConfig::test().init();
        let ring = ring.unwrap();
        logger.for_unit("a.deca").log(Level::Trace, "t", "captured");
        assert_eq!(ring.for_unit("a.deca").len(), 1);
    }

    #[test]
    fn test_config_without_outputs() {
        let (logger, ring) = LogConfig::new(Level::Info).init();
        assert!(ring.is_none());
        assert_eq!(logger.level(), Level::Info);
    }

    #[cfg(feature = "stderr")]
    #[test]
    fn test_debug_count_config() {
        let config = LogConfig::from_debug_count(1);
        assert!(config.stderr);
        assert_eq!(config.level, Level::Info);
    }
}
