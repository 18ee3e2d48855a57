//! Runtime error labels
//!
//! Each error kind gets one label and one handler block, however many check
//! sites branch to it. Handlers are emitted after all code, in the order the
//! kinds were first requested. With checks disabled no label is handed out.

use super::program::Label;
use decac_log::{trace, Logger};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeError {
    StackOverflow,
    HeapOverflow,
    NullDereference,
    FloatArithmetic,
    DivisionByZero,
    InputOutput,
    MissingReturn,
    ImpossibleCast,
}

impl RuntimeError {
    pub fn label_name(self) -> &'static str {
        match self {
            RuntimeError::StackOverflow => "stack_overflow",
            RuntimeError::HeapOverflow => "heap_overflow",
            RuntimeError::NullDereference => "null_dereference",
            RuntimeError::FloatArithmetic => "float_arithmetic",
            RuntimeError::DivisionByZero => "division_by_zero",
            RuntimeError::InputOutput => "io_error",
            RuntimeError::MissingReturn => "missing_return",
            RuntimeError::ImpossibleCast => "impossible_cast",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RuntimeError::StackOverflow => "Error: Stack Overflow",
            RuntimeError::HeapOverflow => "Error: Heap Overflow",
            RuntimeError::NullDereference => "Error: Null dereferencing",
            RuntimeError::FloatArithmetic => "Error: Float arithmetic overflow",
            RuntimeError::DivisionByZero => "Error: Division by zero",
            RuntimeError::InputOutput => "Error: Input/Output error",
            RuntimeError::MissingReturn => "Error: Missing return statement",
            RuntimeError::ImpossibleCast => "Error: Impossible cast",
        }
    }
}

pub struct ErrorManager {
    no_check: bool,
    requested: Vec<RuntimeError>,
    logger: Arc<Logger>,
}

impl ErrorManager {
    pub fn new(no_check: bool, logger: Arc<Logger>) -> Self {
        ErrorManager {
            no_check,
            requested: Vec::new(),
            logger,
        }
    }

    pub fn checks_enabled(&self) -> bool {
        !self.no_check
    }

    /// Label a check site should branch to, or `None` in no-check mode
    pub fn check_label(&mut self, kind: RuntimeError) -> Option<Label> {
        if self.no_check {
            return None;
        }
        if !self.requested.contains(&kind) {
            trace!(self.logger, "error label {} allocated", kind.label_name());
            self.requested.push(kind);
        }
        Some(Label::new(kind.label_name()))
    }

    /// Kinds whose handler block must be emitted, first request first
    pub fn requested(&self) -> &[RuntimeError] {
        &self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decac_log::{Level, LogRingBuffer};

    #[test]
    fn test_labels_are_deduplicated() {
        let mut errors = ErrorManager::new(false, Logger::noop());
        let a = errors.check_label(RuntimeError::NullDereference);
        let b = errors.check_label(RuntimeError::InputOutput);
        let c = errors.check_label(RuntimeError::NullDereference);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(
            errors.requested(),
            &[RuntimeError::NullDereference, RuntimeError::InputOutput]
        );
    }

    #[test]
    fn test_no_check_hands_out_nothing() {
        let mut errors = ErrorManager::new(true, Logger::noop());
        assert_eq!(errors.check_label(RuntimeError::DivisionByZero), None);
        assert!(errors.requested().is_empty());
        assert!(!errors.checks_enabled());
    }

    #[test]
    fn test_first_request_is_traced() {
        let ring = LogRingBuffer::new(8);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());
        let mut errors = ErrorManager::new(false, logger);
        errors.check_label(RuntimeError::DivisionByZero);
        errors.check_label(RuntimeError::DivisionByZero);
        let records = ring.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Trace);
        assert_eq!(records[0].message, "error label division_by_zero allocated");
    }
}
