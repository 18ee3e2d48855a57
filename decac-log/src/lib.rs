//! decac-log - structured logging for the decac compiler
//!
//! - **Explicit**: there is no global logger, every compiler instance receives
//!   an `Arc<Logger>` from its caller.
//! - **Per unit**: `Logger::for_unit` gives each compiled file its own child
//!   logger, so files compiled in parallel keep separate phases.
//! - **Phase tagging**: `Logger::enter_phase` stamps records with the
//!   [`Phase`] that produced them.
//! - **Capture**: `LogRingBuffer` keeps the last N records, which is how tests
//!   observe what a compilation logged.
//!
//! ```
//! use decac_log::{LogConfig, Phase, debug};
//!
//! let (logger, ring) = LogConfig::test().init();
//! let unit = logger.for_unit("prog.deca");
//! let _phase = unit.enter_phase(Phase::Verify);
//! debug!(unit, "verifying {} classes", 3);
//! assert_eq!(ring.map(|r| r.in_phase(Phase::Verify).len()), Some(1));
//! ```

mod config;
mod logger;
mod macros;
mod record;
mod ring_buffer;

pub use config::LogConfig;
pub use decac_config::Phase;
pub use logger::{LogSink, Logger, PhaseGuard};
pub use record::{Level, Record};
pub use ring_buffer::LogRingBuffer;

#[cfg(feature = "stderr")]
pub use logger::StderrSink;
