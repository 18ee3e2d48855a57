//! Small shared building blocks: source locations and the symbol interner

pub mod location;
pub mod symbol;

pub use location::Location;
pub use symbol::{Symbol, SymbolTable, UnknownSymbol};
