//! API types
//!
//! Per-file results of a compilation run.

use crate::error::DecacError;
use decac_core::CompileOutcome;
use std::path::PathBuf;

/// A file that compiled
#[derive(Debug)]
pub struct FileOutput {
    /// The tree file that was read
    pub source: PathBuf,
    /// Where the assembly was written, when codegen ran
    pub output: Option<PathBuf>,
    pub outcome: CompileOutcome,
}

/// Result for one file of a multi-file run
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<FileOutput, DecacError>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
