//! Logger and sinks

use crate::record::{Level, Record};
use decac_config::Phase;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Log output target
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// A logger owned by whoever drives a compilation and passed down explicitly.
///
/// The driver holds the root logger, which owns the sinks. Each compilation
/// unit gets its own child from [`Logger::for_unit`]; the child stamps the
/// unit name and its current phase on every record and hands it to the
/// root's sinks. Phases live on the child, so units compiled on different
/// threads never see each other's phase.
pub struct Logger {
    level: AtomicU8,
    sinks: Mutex<Vec<Box<dyn LogSink>>>,
    parent: Option<Arc<Logger>>,
    unit: Option<Arc<str>>,
    phase: Mutex<Option<Phase>>,
    epoch: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            sinks: Mutex::new(Vec::new()),
            parent: None,
            unit: None,
            phase: Mutex::new(None),
            epoch: Instant::now(),
        })
    }

    /// A logger without sinks that only lets errors through
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }

    /// Add an output target
    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        lock(&self.sinks).push(Box::new(sink));
    }

    /// Child logger for one compilation unit, at this logger's current level
    pub fn for_unit(self: &Arc<Self>, unit: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(self.level.load(Ordering::Relaxed)),
            sinks: Mutex::new(Vec::new()),
            parent: Some(Arc::clone(self)),
            unit: Some(unit.into()),
            phase: Mutex::new(None),
            epoch: self.epoch,
        })
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    pub fn phase(&self) -> Option<Phase> {
        *lock(&self.phase)
    }

    /// Tag records with `phase` until the guard drops; the previous phase
    /// comes back afterwards.
    pub fn enter_phase(self: &Arc<Self>, phase: Phase) -> PhaseGuard {
        let previous = lock(&self.phase).replace(phase);
        PhaseGuard {
            logger: Arc::clone(self),
            previous,
        }
    }

    /// Record a message; the macros call this after checking the level
    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        let mut record = Record::new(level, target, message);
        record.elapsed = self.epoch.elapsed();
        record.unit = self.unit.clone();
        record.phase = self.phase();
        self.dispatch(&record);
    }

    fn dispatch(&self, record: &Record) {
        for sink in lock(&self.sinks).iter() {
            sink.write(record);
        }
        if let Some(parent) = &self.parent {
            parent.dispatch(record);
        }
    }
}

/// Restores the logger's previous phase on drop
pub struct PhaseGuard {
    logger: Arc<Logger>,
    previous: Option<Phase>,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        *lock(&self.logger.phase) = self.previous;
    }
}

#[cfg(feature = "stderr")]
pub struct StderrSink;

#[cfg(feature = "stderr")]
impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{}", record.format());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogRingBuffer;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_level_filtering() {
        let ring = LogRingBuffer::new(8);
        let logger = Logger::new(Level::Info).with_sink(ring.clone());
        logger.log(Level::Debug, "t", "hidden");
        logger.log(Level::Warn, "t", "shown");
        let records = ring.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "shown");
    }

    #[test]
    fn test_phase_guard_restores_previous() {
        let ring = LogRingBuffer::new(8);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());
        {
            let _verify = logger.enter_phase(Phase::Verify);
            {
                let _codegen = logger.enter_phase(Phase::Codegen);
                logger.log(Level::Debug, "t", "nested");
            }
            logger.log(Level::Debug, "t", "back");
        }
        logger.log(Level::Debug, "t", "outside");
        let phases: Vec<_> = ring.records().into_iter().map(|r| r.phase).collect();
        assert_eq!(phases, vec![Some(Phase::Codegen), Some(Phase::Verify), None]);
    }

    #[test]
    fn test_unit_logger_reaches_root_sinks() {
        let ring = LogRingBuffer::new(8);
        let root = Logger::new(Level::Debug).with_sink(ring.clone());
        let unit = root.for_unit("a.deca");
        assert_eq!(unit.level(), Level::Debug);
        unit.log(Level::Trace, "t", "below level");
        unit.log(Level::Debug, "t", "kept");
        let records = ring.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit.as_deref(), Some("a.deca"));
        assert_eq!(root.phase(), None);
    }

    #[test]
    fn test_parallel_units_keep_their_own_phase() {
        let ring = LogRingBuffer::new(16);
        let root = Logger::new(Level::Trace).with_sink(ring.clone());
        let a = root.for_unit("a.deca");
        let b = root.for_unit("b.deca");
        let entered = Barrier::new(2);
        let a_done = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                let guard = a.enter_phase(Phase::Verify);
                entered.wait();
                drop(guard);
                a_done.wait();
            });
            s.spawn(|| {
                let _guard = b.enter_phase(Phase::Codegen);
                entered.wait();
                a_done.wait();
                b.log(Level::Debug, "t", "emitting");
            });
        });

        let records = ring.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit.as_deref(), Some("b.deca"));
        assert_eq!(records[0].phase, Some(Phase::Codegen));
    }

    #[test]
    fn test_noop_logger() {
        let logger = Logger::noop();
        assert!(!logger.is_enabled(Level::Warn));
        assert!(logger.is_enabled(Level::Error));
    }
}
