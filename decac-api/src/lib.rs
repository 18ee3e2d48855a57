//! Decac API - File-level compiler orchestration
//!
//! Reads syntax-tree files, runs one `DecacCompiler` per file and writes the
//! resulting assembly next to the source.
//!
//! # Example
//!
//! ```ignore
//! use decac_api::{compile_files, RunConfig};
//!
//! let config = RunConfig::default();
//! for report in compile_files(&["prog.deca.json".into()], &config) {
//!     if let Err(e) = report.result {
//!         eprintln!("{}: {}", report.path.display(), e);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

use decac_core::{CompileOutcome, DecacCompiler, Program};
use decac_log::{debug, info, Logger, Phase};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};
pub use error::{DecacError, ErrorPhase, ErrorReport};
pub use types::{FileOutput, FileReport};

// Re-export core types for convenience
pub use decac_config::{CompilerOptions, TargetBackend};
pub use decac_core::{Assembly, Warning};

/// Name used for trees that did not come from a file
const INLINE_SOURCE: &str = "<input>";

// ==================== Single program ====================

/// Compile an in-memory tree
pub fn compile_program(program: Program, config: &RunConfig) -> Result<CompileOutcome, DecacError> {
    compile_unit(program, config, config.logger.for_unit(INLINE_SOURCE))
}

fn compile_unit(
    program: Program,
    config: &RunConfig,
    logger: Arc<Logger>,
) -> Result<CompileOutcome, DecacError> {
    let mut compiler = DecacCompiler::with_logger(config.options.clone(), logger);
    Ok(compiler.compile(program)?)
}

/// Compile a tree given as JSON text
pub fn compile_source_str(source: &str, config: &RunConfig) -> Result<CompileOutcome, DecacError> {
    let program = Program::from_json(source).map_err(|source| DecacError::Tree {
        path: PathBuf::from(INLINE_SOURCE),
        source,
    })?;
    compile_program(program, config)
}

// ==================== Files ====================

/// Whether `path` names a syntax-tree file the driver accepts
pub fn is_tree_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".deca.json") || name.ends_with(".deca"))
}

/// Assembly path for `source`: strip `.json`, then `.deca`, then add the
/// backend extension
pub fn output_path(source: &Path, target: TargetBackend) -> PathBuf {
    let mut path = source.to_path_buf();
    if path.extension().is_some_and(|ext| ext == "json") {
        path.set_extension("");
    }
    if path.extension().is_some_and(|ext| ext == "deca") {
        path.set_extension("");
    }
    path.set_extension(target.extension());
    path
}

/// Read, compile and, when codegen ran, write the assembly of one file.
/// Nothing is written if compilation fails.
pub fn compile_file(path: &Path, config: &RunConfig) -> Result<FileOutput, DecacError> {
    if !is_tree_file(path) {
        return Err(DecacError::InvalidSource(path.to_path_buf()));
    }
    let logger = config.logger.for_unit(path.display().to_string());
    info!(logger, "compiling {}", path.display());

    let program = {
        let _phase = logger.enter_phase(Phase::Parse);
        let text = std::fs::read_to_string(path).map_err(|source| DecacError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(logger, "read {} bytes", text.len());
        Program::from_json(&text).map_err(|source| DecacError::Tree {
            path: path.to_path_buf(),
            source,
        })?
    };

    let outcome = compile_unit(program, config, Arc::clone(&logger))?;
    let output = match &outcome {
        CompileOutcome::Assembled(assembly) => {
            let out = output_path(path, assembly.target);
            std::fs::write(&out, &assembly.text).map_err(|source| DecacError::Io {
                path: out.clone(),
                source,
            })?;
            debug!(logger, "wrote {}", out.display());
            Some(out)
        }
        _ => None,
    };

    Ok(FileOutput {
        source: path.to_path_buf(),
        output,
        outcome,
    })
}

/// Compile every file, first occurrence of a duplicate only. With
/// `options.parallel` each file gets its own thread; reports keep input order.
pub fn compile_files(paths: &[PathBuf], config: &RunConfig) -> Vec<FileReport> {
    let mut seen = HashSet::new();
    let unique: Vec<&PathBuf> = paths.iter().filter(|p| seen.insert(p.as_path())).collect();

    if !config.options.parallel || unique.len() < 2 {
        return unique
            .into_iter()
            .map(|path| FileReport {
                path: path.clone(),
                result: compile_file(path, config),
            })
            .collect();
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = unique
            .iter()
            .map(|path| (path, scope.spawn(move || compile_file(path, config))))
            .collect();
        handles
            .into_iter()
            .map(|(path, handle)| FileReport {
                path: (*path).clone(),
                result: handle.join().unwrap_or_else(|_| {
                    Err(DecacError::Internal(format!(
                        "compilation of {} panicked",
                        path.display()
                    )))
                }),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use decac_core::tree::{Expr, Inst, Main};

    fn hello() -> Program {
        Program::new(
            vec![],
            Main::new(vec![], vec![Inst::println(vec![Expr::string("hello")])]),
        )
    }

    #[test]
    fn test_output_path_strips_tree_extensions() {
        let ima = TargetBackend::Ima;
        assert_eq!(output_path(Path::new("dir/prog.deca.json"), ima), PathBuf::from("dir/prog.ass"));
        assert_eq!(output_path(Path::new("prog.deca"), ima), PathBuf::from("prog.ass"));
        assert_eq!(
            output_path(Path::new("prog.deca.json"), TargetBackend::Arm),
            PathBuf::from("prog.s")
        );
    }

    #[test]
    fn test_is_tree_file() {
        assert!(is_tree_file(Path::new("a.deca.json")));
        assert!(is_tree_file(Path::new("a.deca")));
        assert!(!is_tree_file(Path::new("a.json")));
        assert!(!is_tree_file(Path::new("a.java")));
    }

    #[test]
    fn test_compile_program_assembles() {
        let outcome = compile_program(hello(), &RunConfig::default()).unwrap();
        match outcome {
            CompileOutcome::Assembled(assembly) => {
                assert!(assembly.text.contains("WSTR \"hello\""));
                assert!(assembly.text.contains("HALT"));
            }
            other => panic!("expected assembly, got {:?}", other),
        }
    }

    #[test]
    fn test_compile_source_str_rejects_bad_json() {
        let err = compile_source_str("{ not json", &RunConfig::default()).unwrap_err();
        assert_eq!(err.phase(), ErrorPhase::Parse);
        assert!(err.to_string().contains(INLINE_SOURCE));
    }

    #[test]
    fn test_compile_source_str_parse_only() {
        let json = hello().to_json_pretty().unwrap();
        let config = RunConfig::from_options(CompilerOptions {
            parse_only: true,
            ..CompilerOptions::default()
        });
        let outcome = compile_source_str(&json, &config).unwrap();
        assert_eq!(outcome, CompileOutcome::Parsed(hello()));
    }

    #[test]
    fn test_compile_file_rejects_other_extensions() {
        let err = compile_file(Path::new("notes.txt"), &RunConfig::default()).unwrap_err();
        assert!(matches!(err, DecacError::InvalidSource(_)));
    }

    #[test]
    fn test_compile_file_missing_is_io_error() {
        let path = std::env::temp_dir().join("decac-api-missing-file.deca.json");
        let err = compile_file(&path, &RunConfig::default()).unwrap_err();
        assert_eq!(err.phase(), ErrorPhase::Io);
    }
}
