//! Unified error type for decac-api
//!
//! Wraps every failure one file can hit, from reading the tree to writing
//! the assembly, and renders it as a structured report.

use decac_config::OptionsError;
use decac_core::{CodegenError, CompileError, ContextualError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for decac-api
#[derive(Debug, Error)]
pub enum DecacError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed syntax tree in {}: {source}", path.display())]
    Tree {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Options(#[from] OptionsError),

    #[error("{} is not a .deca or .deca.json tree file", .0.display())]
    InvalidSource(PathBuf),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ContextualError> for DecacError {
    fn from(err: ContextualError) -> Self {
        DecacError::Compile(CompileError::Contextual(err))
    }
}

impl From<CodegenError> for DecacError {
    fn from(err: CodegenError) -> Self {
        DecacError::Compile(CompileError::Codegen(err))
    }
}

impl DecacError {
    /// Get error line number (if available)
    pub fn line(&self) -> Option<usize> {
        match self {
            DecacError::Compile(CompileError::Contextual(e)) if !e.location.is_builtin() => {
                Some(e.location.line)
            }
            DecacError::Compile(CompileError::Codegen(e)) => e.location().map(|l| l.line),
            DecacError::Tree { source, .. } => Some(source.line()),
            _ => None,
        }
    }

    /// Get error column number (if available)
    pub fn column(&self) -> Option<usize> {
        match self {
            DecacError::Compile(CompileError::Contextual(e)) if !e.location.is_builtin() => {
                Some(e.location.column)
            }
            DecacError::Compile(CompileError::Codegen(e)) => e.location().map(|l| l.column),
            DecacError::Tree { source, .. } => Some(source.column()),
            _ => None,
        }
    }

    /// Get error phase
    pub fn phase(&self) -> ErrorPhase {
        match self {
            DecacError::Compile(CompileError::Contextual(_)) => ErrorPhase::Verify,
            DecacError::Compile(CompileError::Codegen(_)) => ErrorPhase::Codegen,
            DecacError::Tree { .. } => ErrorPhase::Parse,
            DecacError::Io { .. } | DecacError::InvalidSource(_) => ErrorPhase::Io,
            DecacError::Options(_) => ErrorPhase::Options,
            DecacError::Internal(_) => ErrorPhase::Internal,
        }
    }

    /// Convert to structured error report
    pub fn to_report(&self) -> ErrorReport {
        let (error_kind, rule) = match self {
            DecacError::Compile(CompileError::Contextual(e)) => (e.kind.as_str(), e.rule),
            DecacError::Compile(CompileError::Codegen(CodegenError::Unsupported { .. })) => {
                ("unsupported construct", None)
            }
            DecacError::Compile(CompileError::Codegen(CodegenError::Internal(_))) => {
                ("internal codegen", None)
            }
            DecacError::Io { .. } => ("io", None),
            DecacError::Tree { .. } => ("malformed tree", None),
            DecacError::Options(_) => ("invalid options", None),
            DecacError::InvalidSource(_) => ("invalid source", None),
            DecacError::Internal(_) => ("internal", None),
        };

        ErrorReport {
            phase: self.phase(),
            line: self.line(),
            column: self.column(),
            error_kind: error_kind.to_string(),
            rule,
            message: self.to_string(),
        }
    }
}

/// Error phase enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPhase {
    Io,
    Options,
    Parse,
    Verify,
    Codegen,
    Internal,
}

impl std::fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorPhase::Io => "io",
            ErrorPhase::Options => "options",
            ErrorPhase::Parse => "parse",
            ErrorPhase::Verify => "verify",
            ErrorPhase::Codegen => "codegen",
            ErrorPhase::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Structured error report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub phase: ErrorPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub error_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => {
                write!(f, "[{}:{}] {} error: {}", line, col, self.phase, self.message)
            }
            _ => write!(f, "{} error: {}", self.phase, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decac_core::{ContextualErrorKind, Location};

    fn contextual() -> DecacError {
        ContextualError::rule(
            ContextualErrorKind::UnknownType,
            "0.2",
            "unknown type 'Foo'",
            Location::new(4, 9),
        )
        .into()
    }

    #[test]
    fn test_contextual_error_position() {
        let err = contextual();
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.column(), Some(9));
        assert_eq!(err.phase(), ErrorPhase::Verify);
        assert_eq!(err.to_string(), "(RULE 0.2) unknown type 'Foo' at 4:9");
    }

    #[test]
    fn test_report_carries_kind_and_rule() {
        let report = contextual().to_report();
        assert_eq!(report.error_kind, "unknown type");
        assert_eq!(report.rule, Some("0.2"));
        assert_eq!(
            report.to_string(),
            "[4:9] verify error: (RULE 0.2) unknown type 'Foo' at 4:9"
        );
    }

    #[test]
    fn test_report_serializes_to_json() {
        let json = serde_json::to_value(contextual().to_report()).unwrap();
        assert_eq!(json["phase"], "verify");
        assert_eq!(json["line"], 4);
        assert_eq!(json["rule"], "0.2");
    }

    #[test]
    fn test_codegen_unsupported_position() {
        let err: DecacError = CodegenError::Unsupported {
            construct: "method call",
            backend: "ARM",
            location: Location::new(2, 5),
        }
        .into();
        assert_eq!(err.phase(), ErrorPhase::Codegen);
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.to_report().error_kind, "unsupported construct");
    }

    #[test]
    fn test_tree_error_has_position() {
        let source = serde_json::from_str::<serde_json::Value>("{\n  oops").unwrap_err();
        let err = DecacError::Tree {
            path: PathBuf::from("a.deca.json"),
            source,
        };
        assert_eq!(err.phase(), ErrorPhase::Parse);
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().starts_with("malformed syntax tree in a.deca.json"));
    }

    #[test]
    fn test_options_error_has_no_position() {
        let err: DecacError = OptionsError::ParseAndVerify.into();
        assert_eq!(err.line(), None);
        assert_eq!(err.to_report().to_string(), "options error: options -p and -v are incompatible");
    }
}
