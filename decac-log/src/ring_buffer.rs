//! Fixed-capacity record buffer, used to capture what a compilation logged

use crate::logger::LogSink;
use crate::record::Record;
use decac_config::Phase;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Keeps the most recent records; when full the oldest one is overwritten
pub struct LogRingBuffer {
    inner: Mutex<VecDeque<Record>>,
    capacity: usize,
    overwritten: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            overwritten: AtomicUsize::new(0),
        })
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Record>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, record: Record) {
        let mut inner = self.lock();
        if inner.len() >= self.capacity {
            inner.pop_front();
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
    }

    fn filtered(&self, keep: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.lock().iter().filter(|&r| keep(r)).cloned().collect()
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<Record> {
        self.filtered(|_| true)
    }

    pub fn in_phase(&self, phase: Phase) -> Vec<Record> {
        self.filtered(|r| r.phase == Some(phase))
    }

    /// Records logged while compiling `unit`
    pub fn for_unit(&self, unit: &str) -> Vec<Record> {
        self.filtered(|r| r.unit.as_deref() == Some(unit))
    }

    pub fn overwritten(&self) -> usize {
        self.overwritten.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    #[test]
    fn test_overwrites_oldest() {
        let ring = LogRingBuffer::new(2);
        for i in 0..3 {
            ring.write(&Record::new(Level::Info, "t", format!("m{i}")));
        }
        let messages: Vec<_> = ring.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["m1", "m2"]);
        assert_eq!(ring.overwritten(), 1);
    }

    #[test]
    fn test_filters_by_unit_and_phase() {
        let ring = LogRingBuffer::new(8);
        ring.write(&Record::new(Level::Debug, "t", "a").for_unit("a.deca").in_phase(Phase::Verify));
        ring.write(&Record::new(Level::Debug, "t", "b").for_unit("b.deca").in_phase(Phase::Codegen));
        ring.write(&Record::new(Level::Info, "t", "driver"));
        assert_eq!(ring.for_unit("a.deca").len(), 1);
        assert_eq!(ring.in_phase(Phase::Codegen)[0].message, "b");
        assert!(ring.for_unit("c.deca").is_empty());
    }
}
