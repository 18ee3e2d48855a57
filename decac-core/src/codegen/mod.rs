//! Code generation
//!
//! Both backends walk the decorated tree once. They share the program buffer,
//! the register pool, the stack-location table, the runtime error manager and
//! the method-table layout; only the instruction vocabulary differs.

pub mod arm;
pub mod errors;
pub mod ima;
pub mod method_table;
pub mod program;
pub mod registers;
pub mod stack;

pub use errors::{ErrorManager, RuntimeError};
pub use method_table::{ClassTable, MethodTableLayout};
pub use program::{Instruction, Label, LabelFactory, Line, Program};
pub use registers::{RegisterPool, SpillEmitter};
pub use stack::{StackBase, StackLocations, StackSlot};

use crate::tools::Location;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodegenError {
    #[error("{construct} is not supported by the {backend} backend at {location}")]
    Unsupported {
        construct: &'static str,
        backend: &'static str,
        location: Location,
    },

    #[error("internal code generation error: {0}")]
    Internal(String),
}

pub type CodegenResult<T> = Result<T, CodegenError>;

impl CodegenError {
    pub fn location(&self) -> Option<Location> {
        match self {
            CodegenError::Unsupported { location, .. } => Some(*location),
            CodegenError::Internal(_) => None,
        }
    }
}
