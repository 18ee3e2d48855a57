//! Semantic context: the type model and the two environments
//!
//! - [`EnvironmentType`] maps class/type names to their definitions and is
//!   global to one compilation.
//! - [`EnvironmentExp`] is an arena of parent-linked member/local scopes. A
//!   class scope's parent is its superclass scope, which is how inherited
//!   members are found.

pub mod definition;
pub mod env_exp;
pub mod env_type;
pub mod error;
pub mod types;

pub use definition::{
    ClassDefinition, ExpDefinition, FieldDefinition, MemberCounters, MethodDefinition,
    ParamDefinition, Signature, TypeDefinition, VariableDefinition,
};
pub use env_exp::{DoubleDefinition, EnvironmentExp, ScopeId};
pub use env_type::EnvironmentType;
pub use error::{ContextualError, ContextualErrorKind, ContextualResult, Warning};
pub use types::Type;
