//! Type compatibility relations

use crate::context::{EnvironmentType, Type};

/// Can a value of type `value` be stored where `target` is expected?
/// An int flowing into a float needs a conversion node.
pub(crate) fn assign_compatible(env: &EnvironmentType, target: Type, value: Type) -> bool {
    (target == Type::Float && value == Type::Int) || env.is_subtype(value, target)
}

pub(crate) fn cast_compatible(env: &EnvironmentType, target: Type, value: Type) -> bool {
    if target.is_void() || value.is_void() {
        return false;
    }
    (target.is_numeric() && value.is_numeric())
        || assign_compatible(env, target, value)
        || assign_compatible(env, value, target)
}

/// Result type of an arithmetic operator on numeric operands
pub(crate) fn arithmetic_result(left: Type, right: Type) -> Option<Type> {
    match (left, right) {
        (Type::Int, Type::Int) => Some(Type::Int),
        (Type::Float, Type::Float) | (Type::Int, Type::Float) | (Type::Float, Type::Int) => {
            Some(Type::Float)
        }
        _ => None,
    }
}

pub(crate) fn printable(ty: Type) -> bool {
    matches!(ty, Type::Int | Type::Float | Type::String)
}
