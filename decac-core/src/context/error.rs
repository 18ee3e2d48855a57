//! Contextual errors and warnings

use super::env_exp::DoubleDefinition;
use crate::tools::{Location, SymbolTable, UnknownSymbol};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextualErrorKind {
    UnknownType,
    UnknownSymbol,
    DuplicateClass,
    DuplicateMember,
    DoubleDefinition,
    IllegalOverride,
    SignatureMismatch,
    TypeMismatch,
    CyclicInheritance,
    InternalInconsistency,
}

impl ContextualErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextualErrorKind::UnknownType => "unknown type",
            ContextualErrorKind::UnknownSymbol => "unknown symbol",
            ContextualErrorKind::DuplicateClass => "duplicate class",
            ContextualErrorKind::DuplicateMember => "duplicate member",
            ContextualErrorKind::DoubleDefinition => "double definition",
            ContextualErrorKind::IllegalOverride => "illegal override",
            ContextualErrorKind::SignatureMismatch => "signature mismatch",
            ContextualErrorKind::TypeMismatch => "type mismatch",
            ContextualErrorKind::CyclicInheritance => "cyclic inheritance",
            ContextualErrorKind::InternalInconsistency => "internal inconsistency",
        }
    }
}

impl fmt::Display for ContextualErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First rule violation found in a file; verification stops there
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at {location}")]
pub struct ContextualError {
    pub kind: ContextualErrorKind,
    /// Rule tag such as `"1.3"`, when the violation maps to a numbered rule
    pub rule: Option<&'static str>,
    pub message: String,
    pub location: Location,
}

pub type ContextualResult<T> = Result<T, ContextualError>;

impl ContextualError {
    pub fn new(kind: ContextualErrorKind, message: impl Into<String>, location: Location) -> Self {
        ContextualError {
            kind,
            rule: None,
            message: message.into(),
            location,
        }
    }

    /// Error tagged with a rule number; the message is prefixed `(RULE x.y)`
    pub fn rule(
        kind: ContextualErrorKind,
        rule: &'static str,
        message: impl fmt::Display,
        location: Location,
    ) -> Self {
        ContextualError {
            kind,
            rule: Some(rule),
            message: format!("(RULE {rule}) {message}"),
            location,
        }
    }

    pub fn internal(message: impl Into<String>, location: Location) -> Self {
        Self::new(ContextualErrorKind::InternalInconsistency, message, location)
    }

    pub fn unknown_symbol(error: UnknownSymbol, location: Location) -> Self {
        Self::new(ContextualErrorKind::UnknownSymbol, error.to_string(), location)
    }

    pub fn double_definition(
        error: DoubleDefinition,
        rule: &'static str,
        symbols: &SymbolTable,
        location: Location,
    ) -> Self {
        Self::rule(
            ContextualErrorKind::DoubleDefinition,
            rule,
            format_args!("'{}' has already been declared.", symbols.name(error.0)),
            location,
        )
    }
}

/// Non-fatal diagnostic, reported only when warnings are enabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub location: Location,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_message_format() {
        let err = ContextualError::rule(
            ContextualErrorKind::DuplicateClass,
            "1.3",
            "Class 'Shape' has already been declared.",
            Location::new(4, 7),
        );
        assert_eq!(err.rule, Some("1.3"));
        assert_eq!(
            err.to_string(),
            "(RULE 1.3) Class 'Shape' has already been declared. at 4:7"
        );
    }

    #[test]
    fn test_unknown_symbol_conversion() {
        let err = ContextualError::unknown_symbol(UnknownSymbol("foo".into()), Location::new(1, 2));
        assert_eq!(err.kind, ContextualErrorKind::UnknownSymbol);
        assert_eq!(err.to_string(), "unknown symbol 'foo' at 1:2");
    }

    #[test]
    fn test_double_definition_names_the_symbol() {
        let mut symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let err = ContextualError::double_definition(
            DoubleDefinition(x),
            "3.17",
            &symbols,
            Location::new(7, 9),
        );
        assert_eq!(err.kind, ContextualErrorKind::DoubleDefinition);
        assert_eq!(err.rule, Some("3.17"));
        assert_eq!(err.to_string(), "(RULE 3.17) 'x' has already been declared. at 7:9");
    }
}
