//! CLI logging initialization
//!
//! Per-phase log control on top of `tracing-subscriber`. Records produced by
//! the compiler's own `decac_log::Logger` are forwarded into `tracing`
//! through [`TracingSink`].

use crate::config::LogConfig;
use decac_log::{Level, LogSink, Phase, Record};
use std::io;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    Layer,
};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored, multi-line (development)
    Pretty,
    /// One line per event
    Compact,
    /// JSON (tool integration)
    Json,
}

/// Install the global subscriber, writing to stderr
pub fn init(log_config: &LogConfig, format: LogFormat) -> Result<(), TryInitError> {
    let targets = Targets::new()
        .with_default(log_config.global)
        .with_target("decac::verify", log_config.level_for("decac::verify"))
        .with_target("decac::codegen", log_config.level_for("decac::codegen"))
        .with_target("decac::cli", log_config.global);

    let layer = create_format_layer(format, io::stderr).with_filter(targets);
    tracing_subscriber::registry().with(layer).try_init()
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

macro_rules! forward {
    ($target:literal, $record:expr) => {{
        let record = $record;
        let phase = record.phase.map_or("-", |p| p.as_str());
        let unit = record.unit.as_deref().unwrap_or("-");
        match record.level {
            Level::Trace => tracing::trace!(target: $target, unit, phase, module = record.target, "{}", record.message),
            Level::Debug => tracing::debug!(target: $target, unit, phase, module = record.target, "{}", record.message),
            Level::Info => tracing::info!(target: $target, unit, phase, module = record.target, "{}", record.message),
            Level::Warn => tracing::warn!(target: $target, unit, phase, module = record.target, "{}", record.message),
            Level::Error => tracing::error!(target: $target, unit, phase, module = record.target, "{}", record.message),
        }
    }};
}

/// Routes compiler records to the `decac::<phase>` tracing targets
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        match phase_target(record) {
            "decac::verify" => forward!("decac::verify", record),
            "decac::codegen" => forward!("decac::codegen", record),
            _ => forward!("decac::cli", record),
        }
    }
}

/// Phase target for a record, from its phase tag or else its module path
fn phase_target(record: &Record) -> &'static str {
    match record.phase {
        Some(Phase::Verify) => "decac::verify",
        Some(Phase::Codegen) => "decac::codegen",
        Some(Phase::Parse) => "decac::cli",
        None if record.target.contains("::verify") => "decac::verify",
        None if record.target.contains("::codegen") => "decac::codegen",
        None => "decac::cli",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_target_from_module_path() {
        let record = Record::new(Level::Debug, "decac_core::verify::classes", "pass 1");
        assert_eq!(phase_target(&record), "decac::verify");
        let record = Record::new(Level::Trace, "decac_core::codegen::registers", "spill");
        assert_eq!(phase_target(&record), "decac::codegen");
    }

    #[test]
    fn test_phase_target_from_phase_tag() {
        let record = Record::new(Level::Warn, "decac_core::compiler", "no return")
            .for_unit("a.deca")
            .in_phase(Phase::Verify);
        assert_eq!(phase_target(&record), "decac::verify");
        let record = Record::new(Level::Info, "decac_api", "compiling a.deca");
        assert_eq!(phase_target(&record), "decac::cli");
    }

    #[test]
    fn test_sink_without_subscriber_is_silent() {
        TracingSink.write(&Record::new(Level::Error, "decac_api", "ignored"));
    }
}
