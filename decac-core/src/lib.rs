//! Decac Core - Compiler core (pure logic, no IO)
//!
//! Contains the symbol interner, the syntax tree, the type and environment
//! model, contextual verification and both code generators. Only operates on
//! in-memory data structures, no file IO or terminal output.
//!
//! Configuration and the logger are passed explicitly, not via global state.

pub mod codegen;
pub mod compiler;
pub mod context;
pub mod tools;
pub mod tree;
pub mod verify;

// Re-export common types
pub use codegen::CodegenError;
pub use compiler::{Assembly, CompileError, CompileOutcome, DecacCompiler};
pub use context::{ContextualError, ContextualErrorKind, Type, Warning};
pub use tools::{Location, Symbol, SymbolTable};
pub use tree::Program;

// Re-export config types from decac-config
pub use decac_config::{CompilerOptions, Phase, TargetBackend};
