//! Contextual verification
//!
//! Three whole-program passes run strictly in order:
//!
//! 1. class declarations: superclass resolution, class registration
//! 2. member signatures: field indices, method slots, override checks
//! 3. bodies: field initializers, method bodies and the main block
//!
//! The first violation aborts verification of the file.

mod body;
mod classes;
mod expr;
mod members;
mod rules;

use crate::compiler::DecacCompiler;
use crate::context::{ContextualError, ContextualResult, Type};
use crate::tools::{Location, Symbol};
use crate::tree::{Ident, IdentDefinition, Program};
use decac_log::{debug, trace};

pub(crate) use body::BodyContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyPass {
    ClassDeclarations,
    MemberSignatures,
    Bodies,
    Done,
}

impl VerifyPass {
    fn next(self) -> Self {
        match self {
            VerifyPass::ClassDeclarations => VerifyPass::MemberSignatures,
            VerifyPass::MemberSignatures => VerifyPass::Bodies,
            VerifyPass::Bodies | VerifyPass::Done => VerifyPass::Done,
        }
    }
}

pub struct Verifier<'c> {
    compiler: &'c mut DecacCompiler,
    pass: VerifyPass,
}

impl<'c> Verifier<'c> {
    pub fn new(compiler: &'c mut DecacCompiler) -> Self {
        Verifier {
            compiler,
            pass: VerifyPass::ClassDeclarations,
        }
    }

    pub fn pass(&self) -> VerifyPass {
        self.pass
    }

    /// Advance through every pass; the verifier cannot be resumed afterwards
    pub fn run(mut self, program: &mut Program) -> ContextualResult<()> {
        while self.pass != VerifyPass::Done {
            self.step(program)?;
        }
        Ok(())
    }

    fn step(&mut self, program: &mut Program) -> ContextualResult<()> {
        debug!(self.compiler.logger, "{:?} over {} classes", self.pass, program.classes.len());
        match self.pass {
            VerifyPass::ClassDeclarations => {
                for class in &mut program.classes {
                    classes::declare_class(self.compiler, class)?;
                }
            }
            VerifyPass::MemberSignatures => {
                for class in &mut program.classes {
                    members::verify_members(self.compiler, class)?;
                }
            }
            VerifyPass::Bodies => {
                for class in &mut program.classes {
                    body::verify_class_body(self.compiler, class)?;
                }
                body::verify_main(self.compiler, &mut program.main)?;
            }
            VerifyPass::Done => {}
        }
        self.pass = self.pass.next();
        Ok(())
    }
}

/// Resolve a type name and decorate the identifier with it
pub(crate) fn resolve_type(compiler: &mut DecacCompiler, ident: &mut Ident) -> ContextualResult<Type> {
    let symbol = compiler.symbols.intern(&ident.name);
    let ty = compiler
        .env_types
        .get(symbol)
        .map(|def| def.ty())
        .ok_or_else(|| {
            ContextualError::rule(
                crate::context::ContextualErrorKind::UnknownType,
                "0.2",
                format_args!("Type '{}' is not defined.", ident.name),
                ident.location,
            )
        })?;
    trace!(compiler.logger, "type {} resolved", ident.name);
    ident.definition = Some(IdentDefinition::Type(ty));
    Ok(ty)
}

pub(crate) fn class_of(
    compiler: &DecacCompiler,
    name: Symbol,
    location: Location,
) -> ContextualResult<&crate::context::ClassDefinition> {
    compiler.env_types.class(name).ok_or_else(|| {
        ContextualError::internal(
            format!("class '{}' vanished from the type environment", compiler.symbols.name(name)),
            location,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use decac_config::CompilerOptions;

    #[test]
    fn test_pass_order() {
        let mut pass = VerifyPass::ClassDeclarations;
        let mut seen = vec![pass];
        while pass != VerifyPass::Done {
            pass = pass.next();
            seen.push(pass);
        }
        assert_eq!(
            seen,
            vec![
                VerifyPass::ClassDeclarations,
                VerifyPass::MemberSignatures,
                VerifyPass::Bodies,
                VerifyPass::Done
            ]
        );
    }

    #[test]
    fn test_resolve_type_decorates() {
        let mut compiler = DecacCompiler::new(CompilerOptions::default());
        let mut ident = Ident::new("float");
        assert_eq!(resolve_type(&mut compiler, &mut ident), Ok(Type::Float));
        assert_eq!(ident.type_definition(), Some(Type::Float));

        let mut unknown = Ident::new("Nope").at(3, 4);
        let err = resolve_type(&mut compiler, &mut unknown).unwrap_err();
        assert_eq!(err.kind, crate::context::ContextualErrorKind::UnknownType);
        assert_eq!(err.location, Location::new(3, 4));
    }
}
