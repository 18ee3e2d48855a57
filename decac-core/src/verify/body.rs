//! Pass 3: field initializers, method bodies and the main block

use super::expr::{verify_condition, verify_expr, verify_rvalue};
use super::rules::printable;
use super::{class_of, resolve_type};
use crate::compiler::DecacCompiler;
use crate::context::{
    ContextualError, ContextualErrorKind, ContextualResult, ExpDefinition, ParamDefinition,
    ScopeId, Type, VariableDefinition, Warning,
};
use crate::tools::{Location, Symbol};
use crate::tree::{
    block_returns, DeclClass, DeclMethod, DeclVar, IdentDefinition, Inst, InstKind, Main,
    MethodBody,
};
use decac_log::trace;

/// Where a body is being checked
#[derive(Clone, Copy, Debug)]
pub(crate) struct BodyContext {
    pub scope: ScopeId,
    /// Enclosing class; `None` in `main`
    pub class: Option<Symbol>,
    /// `Void` in `main` and in void methods
    pub return_type: Type,
}

fn declared_type(ident: &crate::tree::Ident) -> ContextualResult<Type> {
    ident.type_definition().ok_or_else(|| {
        ContextualError::internal(
            format!("type '{}' was not resolved before the body pass", ident.name),
            ident.location,
        )
    })
}

pub(crate) fn verify_class_body(compiler: &mut DecacCompiler, class: &mut DeclClass) -> ContextualResult<()> {
    let name = compiler
        .symbols
        .lookup(&class.name.name)
        .map_err(|e| ContextualError::unknown_symbol(e, class.name.location))?;
    let members = class_of(compiler, name, class.location)?.members;
    let field_context = BodyContext {
        scope: members,
        class: Some(name),
        return_type: Type::Void,
    };

    for field in &mut class.fields {
        if let Some(init) = field.init.as_mut() {
            let ty = declared_type(&field.ty)?;
            verify_rvalue(compiler, &field_context, init, ty)?;
        }
    }
    for method in &mut class.methods {
        verify_method_body(compiler, name, members, method)?;
    }
    Ok(())
}

fn verify_method_body(
    compiler: &mut DecacCompiler,
    class: Symbol,
    members: ScopeId,
    method: &mut DeclMethod,
) -> ContextualResult<()> {
    let return_type = declared_type(&method.return_type)?;
    let DeclMethod {
        params,
        body,
        name,
        location,
        ..
    } = method;
    let (vars, insts) = match body {
        MethodBody::Asm { .. } => return Ok(()),
        MethodBody::Block { vars, insts } => (vars, insts),
    };

    let scope = compiler.scopes.new_scope(Some(members));
    for (position, param) in params.iter_mut().enumerate() {
        let definition = ExpDefinition::Param(ParamDefinition {
            ty: declared_type(&param.ty)?,
            index: position as u32 + 1,
            location: param.name.location,
        });
        let symbol = compiler.symbols.intern(&param.name.name);
        compiler
            .scopes
            .declare(scope, symbol, definition.clone())
            .map_err(|e| {
                ContextualError::double_definition(e, "2.9", &compiler.symbols, param.name.location)
            })?;
        param.name.definition = Some(IdentDefinition::Exp(definition));
    }

    let context = BodyContext {
        scope,
        class: Some(class),
        return_type,
    };
    declare_vars(compiler, &context, vars)?;
    verify_insts(compiler, &context, insts)?;

    if !return_type.is_void() && !block_returns(insts) {
        compiler.warn(Warning {
            message: "No return statement in non-void method.".into(),
            location: *location,
        });
    }
    trace!(compiler.logger, "body of {} verified", name.name);
    Ok(())
}

pub(crate) fn verify_main(compiler: &mut DecacCompiler, main: &mut Main) -> ContextualResult<()> {
    let scope = compiler.scopes.new_scope(None);
    let context = BodyContext {
        scope,
        class: None,
        return_type: Type::Void,
    };
    declare_vars(compiler, &context, &mut main.vars)?;
    verify_insts(compiler, &context, &mut main.insts)
}

fn declare_vars(compiler: &mut DecacCompiler, context: &BodyContext, vars: &mut [DeclVar]) -> ContextualResult<()> {
    for (position, var) in vars.iter_mut().enumerate() {
        let ty = resolve_type(compiler, &mut var.ty)?;
        if ty.is_void() {
            return Err(ContextualError::rule(
                ContextualErrorKind::TypeMismatch,
                "3.17",
                format_args!("Variable '{}' cannot be of type void.", var.name.name),
                var.ty.location,
            ));
        }
        if let Some(init) = var.init.as_mut() {
            verify_rvalue(compiler, context, init, ty)?;
        }
        let definition = ExpDefinition::Variable(VariableDefinition {
            ty,
            index: position as u32 + 1,
            location: var.name.location,
        });
        let symbol = compiler.symbols.intern(&var.name.name);
        compiler
            .scopes
            .declare(context.scope, symbol, definition.clone())
            .map_err(|e| {
                ContextualError::double_definition(e, "3.17", &compiler.symbols, var.name.location)
            })?;
        var.name.definition = Some(IdentDefinition::Exp(definition));
    }
    Ok(())
}

fn verify_insts(compiler: &mut DecacCompiler, context: &BodyContext, insts: &mut [Inst]) -> ContextualResult<()> {
    for inst in insts {
        verify_inst(compiler, context, inst)?;
    }
    Ok(())
}

fn verify_inst(compiler: &mut DecacCompiler, context: &BodyContext, inst: &mut Inst) -> ContextualResult<()> {
    let location = inst.location;
    match &mut inst.kind {
        InstKind::Expr(expr) => {
            verify_expr(compiler, context, expr)?;
        }
        InstKind::Print { args, .. } => {
            for arg in args {
                let ty = verify_expr(compiler, context, arg)?;
                if !printable(ty) {
                    return Err(ContextualError::rule(
                        ContextualErrorKind::TypeMismatch,
                        "3.31",
                        format_args!("Cannot print {} type.", ty.name(&compiler.symbols)),
                        arg.location,
                    ));
                }
            }
        }
        InstKind::IfThenElse {
            condition,
            then_branch,
            else_branch,
        } => {
            verify_condition(compiler, context, condition)?;
            verify_insts(compiler, context, then_branch)?;
            verify_insts(compiler, context, else_branch)?;
        }
        InstKind::While { condition, body } => {
            verify_condition(compiler, context, condition)?;
            verify_insts(compiler, context, body)?;
        }
        InstKind::Return(value) => verify_return(compiler, context, value, location)?,
        InstKind::NoOp => {}
    }
    Ok(())
}

fn verify_return(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    value: &mut crate::tree::Expr,
    location: Location,
) -> ContextualResult<()> {
    if context.return_type.is_void() {
        return Err(ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.24",
            "'return' is not allowed in main or in a void method.",
            location,
        ));
    }
    verify_rvalue(compiler, context, value, context.return_type)
}
