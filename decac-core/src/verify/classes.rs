//! Pass 1: class declarations

use super::class_of;
use crate::compiler::DecacCompiler;
use crate::context::{
    ClassDefinition, ContextualError, ContextualErrorKind, ContextualResult, Type,
};
use crate::tree::{DeclClass, IdentDefinition};
use decac_log::trace;

pub(crate) fn declare_class(compiler: &mut DecacCompiler, class: &mut DeclClass) -> ContextualResult<()> {
    let name = compiler.symbols.intern(&class.name.name);
    let (super_name, super_location) = match &class.superclass {
        Some(ident) => (compiler.symbols.intern(&ident.name), ident.location),
        None => (compiler.env_types.object(), class.location),
    };

    if super_name == name {
        return Err(ContextualError::rule(
            ContextualErrorKind::CyclicInheritance,
            "1.3",
            format_args!("Class '{}' cannot extend itself.", class.name.name),
            super_location,
        ));
    }

    let super_members = match compiler.env_types.get(super_name) {
        None => {
            return Err(ContextualError::rule(
                ContextualErrorKind::UnknownType,
                "1.3",
                format_args!(
                    "Superclass '{}' is not declared.",
                    compiler.symbols.name(super_name)
                ),
                super_location,
            ))
        }
        Some(def) if !def.ty().is_class() => {
            return Err(ContextualError::rule(
                ContextualErrorKind::TypeMismatch,
                "1.3",
                format_args!(
                    "Superclass '{}' is not a class.",
                    compiler.symbols.name(super_name)
                ),
                super_location,
            ))
        }
        Some(_) => class_of(compiler, super_name, super_location)?.members,
    };

    // A redeclaration is reported as such even when its new superclass
    // descends from the first declaration.
    if compiler.env_types.get(name).is_some() {
        return Err(duplicate_class(class));
    }

    let members = compiler.scopes.new_scope(Some(super_members));
    let definition = ClassDefinition {
        name,
        superclass: Some(super_name),
        members,
        number_of_fields: 0,
        number_of_methods: 0,
        location: class.location,
    };
    if compiler.env_types.declare_class(definition).is_err() {
        return Err(duplicate_class(class));
    }

    class.name.definition = Some(IdentDefinition::Type(Type::Class(name)));
    if let Some(ident) = class.superclass.as_mut() {
        ident.definition = Some(IdentDefinition::Type(Type::Class(super_name)));
    }
    trace!(
        compiler.logger,
        "declared class {} extends {}",
        class.name.name,
        compiler.symbols.name(super_name)
    );
    Ok(())
}

fn duplicate_class(class: &DeclClass) -> ContextualError {
    ContextualError::rule(
        ContextualErrorKind::DuplicateClass,
        "1.3",
        format_args!("Class '{}' has already been declared.", class.name.name),
        class.name.location,
    )
}
