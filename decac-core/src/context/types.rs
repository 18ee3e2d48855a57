use crate::tools::{Symbol, SymbolTable};

/// Closed set of types; class types are nominal, keyed by class name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Boolean,
    Int,
    Float,
    String,
    Null,
    Class(Symbol),
}

impl Type {
    pub fn is_void(self) -> bool {
        self == Type::Void
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_class(self) -> bool {
        matches!(self, Type::Class(_))
    }

    pub fn is_class_or_null(self) -> bool {
        matches!(self, Type::Class(_) | Type::Null)
    }

    pub fn class_name(self) -> Option<Symbol> {
        match self {
            Type::Class(name) => Some(name),
            _ => None,
        }
    }

    /// Structural for builtins, by name for classes
    pub fn same_type(self, other: Type) -> bool {
        self == other
    }

    pub fn name(self, symbols: &SymbolTable) -> String {
        match self {
            Type::Void => "void".into(),
            Type::Boolean => "boolean".into(),
            Type::Int => "int".into(),
            Type::Float => "float".into(),
            Type::String => "string".into(),
            Type::Null => "null".into(),
            Type::Class(name) => symbols.name(name).to_string(),
        }
    }
}
