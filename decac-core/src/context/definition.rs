//! Definitions stored in the environments

use super::env_exp::ScopeId;
use super::types::Type;
use crate::tools::{Location, Symbol, SymbolTable};
use crate::tree::Visibility;

/// Ordered parameter types of a method
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature(pub Vec<Type>);

impl Signature {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn params(&self) -> &[Type] {
        &self.0
    }

    pub fn render(&self, symbols: &SymbolTable) -> String {
        self.0
            .iter()
            .map(|ty| ty.name(symbols))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefinition {
    pub ty: Type,
    pub visibility: Visibility,
    /// Class that declares the field
    pub owner: Symbol,
    /// 1-based word offset inside an instance
    pub index: u32,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDefinition {
    pub return_type: Type,
    pub signature: Signature,
    /// Class whose body provides the implementation
    pub owner: Symbol,
    /// 1-based method-table slot
    pub index: u32,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamDefinition {
    pub ty: Type,
    /// 1-based position in the parameter list
    pub index: u32,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    pub ty: Type,
    /// 1-based declaration order in the enclosing block
    pub index: u32,
    pub location: Location,
}

/// Anything an expression identifier can resolve to
#[derive(Clone, Debug, PartialEq)]
pub enum ExpDefinition {
    Field(FieldDefinition),
    Method(MethodDefinition),
    Param(ParamDefinition),
    Variable(VariableDefinition),
}

impl ExpDefinition {
    /// Value type; for a method, its return type
    pub fn ty(&self) -> Type {
        match self {
            ExpDefinition::Field(def) => def.ty,
            ExpDefinition::Method(def) => def.return_type,
            ExpDefinition::Param(def) => def.ty,
            ExpDefinition::Variable(def) => def.ty,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            ExpDefinition::Field(def) => def.location,
            ExpDefinition::Method(def) => def.location,
            ExpDefinition::Param(def) => def.location,
            ExpDefinition::Variable(def) => def.location,
        }
    }

    pub fn as_field(&self) -> Option<&FieldDefinition> {
        match self {
            ExpDefinition::Field(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodDefinition> {
        match self {
            ExpDefinition::Method(def) => Some(def),
            _ => None,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, ExpDefinition::Method(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ExpDefinition::Field(_) => "field",
            ExpDefinition::Method(_) => "method",
            ExpDefinition::Param(_) => "parameter",
            ExpDefinition::Variable(_) => "variable",
        }
    }
}

/// Field and method counts being assembled for one class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberCounters {
    pub fields: u32,
    pub methods: u32,
}

impl MemberCounters {
    /// Start from the superclass totals so inherited slots keep their index
    pub fn inherit(superclass: Option<&ClassDefinition>) -> Self {
        superclass.map_or_else(MemberCounters::default, |def| MemberCounters {
            fields: def.number_of_fields,
            methods: def.number_of_methods,
        })
    }

    pub fn next_field(&mut self) -> u32 {
        self.fields += 1;
        self.fields
    }

    pub fn next_method(&mut self) -> u32 {
        self.methods += 1;
        self.methods
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDefinition {
    pub name: Symbol,
    /// `None` only for `Object`
    pub superclass: Option<Symbol>,
    pub members: ScopeId,
    pub number_of_fields: u32,
    pub number_of_methods: u32,
    pub location: Location,
}

impl ClassDefinition {
    pub fn ty(&self) -> Type {
        Type::Class(self.name)
    }

    /// Publish the counts computed by the member pass
    pub fn record_counts(&mut self, counters: MemberCounters) {
        self.number_of_fields = counters.fields;
        self.number_of_methods = counters.methods;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeDefinition {
    Builtin { ty: Type, location: Location },
    Class(ClassDefinition),
}

impl TypeDefinition {
    pub fn ty(&self) -> Type {
        match self {
            TypeDefinition::Builtin { ty, .. } => *ty,
            TypeDefinition::Class(def) => def.ty(),
        }
    }

    pub fn location(&self) -> Location {
        match self {
            TypeDefinition::Builtin { location, .. } => *location,
            TypeDefinition::Class(def) => def.location,
        }
    }
}
