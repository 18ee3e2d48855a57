//! Decac - Deca compiler
//!
//! Compiles verified Deca syntax trees to IMA stack-machine or ARM assembly.
//!
//! # Architecture
//!
//! ```text
//! decac-config  - option data and validation
//! decac-log     - per-unit loggers and capture buffers
//! decac-core    - verification and code generation (no IO)
//! decac-api     - per-file orchestration, assembly output
//! decac-cli     - the `decac` binary
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use decac_workspace::{compile_source_str, CompileOutcome, RunConfig};
//!
//! let outcome = compile_source_str(tree_json, &RunConfig::default()).unwrap();
//! if let CompileOutcome::Assembled(assembly) = outcome {
//!     println!("{}", assembly.text);
//! }
//! ```

pub use decac_api::{
    compile_file, compile_files, compile_program, compile_source_str, get_config, init_config,
    is_initialized, is_tree_file, output_path, DecacError, ErrorPhase, ErrorReport, FileOutput,
    FileReport, RunConfig,
};
pub use decac_config::{CompilerOptions, OptionsError, TargetBackend};
pub use decac_core::{tree, Assembly, CompileOutcome, DecacCompiler, Program, Warning};
pub use decac_log::{LogConfig, Logger, Phase};
