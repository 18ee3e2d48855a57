//! Logging macros; the message is only formatted when the level is enabled

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)*) => {{
        if $logger.is_enabled($level) {
            $logger.log($level, module_path!(), ::std::format!($($arg)*));
        }
    }};
}

#[cfg(test)]
mod tests {
    use crate::{Level, LogRingBuffer, Logger};

    #[test]
    fn test_macros_record_module_path() {
        let ring = LogRingBuffer::new(16);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());
        trace!(logger, "t{}", 1);
        debug!(logger, "d");
        info!(logger, "i");
        warn!(logger, "w");
        error!(logger, "e");
        let records = ring.records();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].message, "t1");
        assert_eq!(records[0].target, "decac_log::macros::tests");
    }

    #[test]
    fn test_disabled_level_skips_formatting() {
        let logger = Logger::new(Level::Error);
        let mut evaluated = false;
        debug!(logger, "{}", {
            evaluated = true;
            "x"
        });
        assert!(!evaluated);
    }
}
