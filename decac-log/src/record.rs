//! Log records
//!
//! A record knows which compilation unit produced it and in which compiler
//! phase, so output from files compiled side by side can be told apart.

use decac_config::Phase;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            _ => Level::Error,
        }
    }

    /// `-d` repeat count: 0 warns, 1 info, 2 debug, 3 and more trace
    pub const fn from_debug_count(count: u8) -> Self {
        match count {
            0 => Level::Warn,
            1 => Level::Info,
            2 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub level: Level,
    /// Module path of the call site
    pub target: &'static str,
    pub message: String,
    /// Source file being compiled, `None` for driver-level records
    pub unit: Option<Arc<str>>,
    pub phase: Option<Phase>,
    /// Time since the root logger was created
    pub elapsed: Duration,
}

impl Record {
    pub fn new(level: Level, target: &'static str, message: impl Into<String>) -> Self {
        Record {
            level,
            target,
            message: message.into(),
            unit: None,
            phase: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn for_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// `+12.345ms DEBUG [prog.deca verify] decac_core::verify: message`
    pub fn format(&self) -> String {
        let mut context = Vec::with_capacity(2);
        if let Some(unit) = &self.unit {
            context.push(unit.as_ref());
        }
        if let Some(phase) = self.phase {
            context.push(phase.as_str());
        }
        let context = if context.is_empty() {
            String::new()
        } else {
            format!(" [{}]", context.join(" "))
        };
        format!(
            "+{:.3}ms {}{} {}: {}",
            self.elapsed.as_secs_f64() * 1000.0,
            self.level,
            context,
            self.target,
            self.message
        )
    }
}
