//! Pass 2: fields and method signatures
//!
//! Counters start from the superclass totals and are only written into the
//! class definition once all of the class's members are processed.

use super::{class_of, resolve_type};
use crate::compiler::DecacCompiler;
use crate::context::{
    ContextualError, ContextualErrorKind, ContextualResult, ExpDefinition, FieldDefinition,
    MemberCounters, MethodDefinition, ScopeId, Signature, Type,
};
use crate::tools::Symbol;
use crate::tree::{DeclClass, DeclField, DeclMethod, IdentDefinition};
use decac_log::{debug, trace};

pub(crate) fn verify_members(compiler: &mut DecacCompiler, class: &mut DeclClass) -> ContextualResult<()> {
    let name = compiler.symbols.lookup(&class.name.name).map_err(|e| {
        ContextualError::unknown_symbol(e, class.name.location)
    })?;
    let (members, superclass) = {
        let def = class_of(compiler, name, class.location)?;
        (def.members, def.superclass)
    };
    let mut counters = match superclass {
        Some(sup) => MemberCounters::inherit(Some(class_of(compiler, sup, class.location)?)),
        None => MemberCounters::default(),
    };

    for field in &mut class.fields {
        verify_field(compiler, name, members, &mut counters, field)?;
    }
    for method in &mut class.methods {
        verify_method_signature(compiler, name, members, &mut counters, method)?;
    }

    if let Some(def) = compiler.env_types.class_mut(name) {
        def.record_counts(counters);
    }
    debug!(
        compiler.logger,
        "class {}: {} fields, {} methods",
        class.name.name,
        counters.fields,
        counters.methods
    );
    Ok(())
}

fn verify_field(
    compiler: &mut DecacCompiler,
    class: Symbol,
    members: ScopeId,
    counters: &mut MemberCounters,
    field: &mut DeclField,
) -> ContextualResult<()> {
    let ty = resolve_type(compiler, &mut field.ty)?;
    if ty.is_void() {
        return Err(ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "2.5",
            format_args!("Field cannot be of type void: void {}", field.name.name),
            field.ty.location,
        ));
    }

    let symbol = compiler.symbols.intern(&field.name.name);
    if compiler
        .scopes
        .get(members, symbol)
        .is_some_and(ExpDefinition::is_method)
    {
        return Err(ContextualError::rule(
            ContextualErrorKind::IllegalOverride,
            "2.5",
            format_args!("Illegal override of '{}': method --> field.", field.name.name),
            field.name.location,
        ));
    }

    let definition = ExpDefinition::Field(FieldDefinition {
        ty,
        visibility: field.visibility,
        owner: class,
        index: counters.fields + 1,
        location: field.name.location,
    });
    compiler
        .scopes
        .declare(members, symbol, definition.clone())
        .map_err(|_| {
            ContextualError::rule(
                ContextualErrorKind::DuplicateMember,
                "2.4",
                format_args!("Method or field '{}' has already been declared.", field.name.name),
                field.name.location,
            )
        })?;
    counters.next_field();
    trace!(compiler.logger, "field {} at index {}", field.name.name, counters.fields);
    field.name.definition = Some(IdentDefinition::Exp(definition));
    Ok(())
}

fn verify_method_signature(
    compiler: &mut DecacCompiler,
    class: Symbol,
    members: ScopeId,
    counters: &mut MemberCounters,
    method: &mut DeclMethod,
) -> ContextualResult<()> {
    let return_type = resolve_type(compiler, &mut method.return_type)?;
    let mut params = Vec::with_capacity(method.params.len());
    for param in &mut method.params {
        let ty = resolve_type(compiler, &mut param.ty)?;
        if ty.is_void() {
            return Err(ContextualError::rule(
                ContextualErrorKind::TypeMismatch,
                "2.9",
                format_args!("Parameter '{}' cannot be of type void.", param.name.name),
                param.ty.location,
            ));
        }
        params.push(ty);
    }
    let signature = Signature(params);

    let symbol = compiler.symbols.intern(&method.name.name);
    if compiler.scopes.get_local(members, symbol).is_some() {
        return Err(ContextualError::rule(
            ContextualErrorKind::DuplicateMember,
            "2.6",
            format_args!("Method or field '{}' has already been declared.", method.name.name),
            method.name.location,
        ));
    }

    let index = match compiler.scopes.get(members, symbol) {
        None => counters.methods + 1,
        Some(ExpDefinition::Method(inherited)) => {
            check_override(compiler, method, inherited, &signature, return_type)?;
            inherited.index
        }
        Some(_) => {
            return Err(ContextualError::rule(
                ContextualErrorKind::IllegalOverride,
                "2.7",
                format_args!("Illegal override of '{}': field --> method.", method.name.name),
                method.name.location,
            ))
        }
    };
    if index > counters.methods {
        counters.next_method();
    }

    let definition = ExpDefinition::Method(MethodDefinition {
        return_type,
        signature,
        owner: class,
        index,
        location: method.name.location,
    });
    compiler.scopes.put(members, symbol, definition.clone());
    trace!(compiler.logger, "method {} in slot {}", method.name.name, index);
    method.name.definition = Some(IdentDefinition::Exp(definition));
    Ok(())
}

/// Same parameter list, return type a subtype of the inherited one
fn check_override(
    compiler: &DecacCompiler,
    method: &DeclMethod,
    inherited: &MethodDefinition,
    signature: &Signature,
    return_type: Type,
) -> ContextualResult<()> {
    if &inherited.signature != signature {
        return Err(ContextualError::rule(
            ContextualErrorKind::SignatureMismatch,
            "2.7",
            format_args!(
                "Method '{}' overrides ({}) with a different signature ({}).",
                method.name.name,
                inherited.signature.render(&compiler.symbols),
                signature.render(&compiler.symbols)
            ),
            method.name.location,
        ));
    }
    if !compiler.env_types.is_subtype(return_type, inherited.return_type) {
        return Err(ContextualError::rule(
            ContextualErrorKind::SignatureMismatch,
            "2.7",
            format_args!(
                "Method '{}' must return a subtype of {}.",
                method.name.name,
                inherited.return_type.name(&compiler.symbols)
            ),
            method.return_type.location,
        ));
    }
    Ok(())
}
