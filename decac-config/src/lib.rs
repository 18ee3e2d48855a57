//! Decac Config - Pure configuration data structures
//!
//! This crate contains only data structures and their validation, no global
//! state. It is the shared configuration vocabulary across all decac crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Smallest register count accepted by `-r`.
pub const MIN_REGISTERS: u8 = 4;
/// Largest register count accepted by `-r`, also the default.
pub const MAX_REGISTERS: u8 = 16;

/// Assembly flavour produced by the code generator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetBackend {
    /// Register/stack virtual machine (reference backend)
    #[default]
    Ima,
    /// ARM (32-bit, VFP) subset
    Arm,
}

impl TargetBackend {
    /// Extension of the emitted assembly file
    pub fn extension(&self) -> &'static str {
        match self {
            TargetBackend::Ima => "ass",
            TargetBackend::Arm => "s",
        }
    }
}

/// Options for one compiler invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Print the banner and exit
    pub print_banner: bool,
    /// Stop after the tree has been read (dump it)
    pub parse_only: bool,
    /// Stop after contextual verification
    pub verification_only: bool,
    /// Suppress runtime checks in generated code
    pub no_check: bool,
    /// Explicit register count, `None` means the default
    pub registers: Option<u8>,
    /// Emit warnings
    pub warnings: bool,
    /// Target backend
    pub target: TargetBackend,
    /// Debug verbosity, capped at 3 (trace)
    pub debug: u8,
    /// Compile the source files concurrently
    pub parallel: bool,
    /// Files to compile, in command-line order
    pub source_files: Vec<PathBuf>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            print_banner: false,
            parse_only: false,
            verification_only: false,
            no_check: false,
            registers: None,
            warnings: false,
            target: TargetBackend::Ima,
            debug: 0,
            parallel: false,
            source_files: Vec::new(),
        }
    }
}

/// Invalid option combination
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("options -p and -v are incompatible")]
    ParseAndVerify,

    #[error("register count must be between {MIN_REGISTERS} and {MAX_REGISTERS}, got {0}")]
    RegisterCount(u8),

    #[error("option -r cannot be used with the ARM backend (-a)")]
    RegistersWithArm,

    #[error("no source file given")]
    NoSourceFile,
}

impl CompilerOptions {
    /// Number of registers the allocator may use
    pub fn register_count(&self) -> u8 {
        self.registers.unwrap_or(MAX_REGISTERS)
    }

    /// Debug level clamped to the trace ceiling
    pub fn debug_level(&self) -> u8 {
        self.debug.min(3)
    }

    /// Check option combinations
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.parse_only && self.verification_only {
            return Err(OptionsError::ParseAndVerify);
        }
        if let Some(count) = self.registers {
            if self.target == TargetBackend::Arm {
                return Err(OptionsError::RegistersWithArm);
            }
            if !(MIN_REGISTERS..=MAX_REGISTERS).contains(&count) {
                return Err(OptionsError::RegisterCount(count));
            }
        }
        if self.source_files.is_empty() && !self.print_banner {
            return Err(OptionsError::NoSourceFile);
        }
        Ok(())
    }
}

/// Compilation phase, used for phase-specific logging
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Verify,
    Codegen,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Parse => "parse",
            Phase::Verify => "verify",
            Phase::Codegen => "codegen",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("decac::{}", self.as_str())
    }
}
