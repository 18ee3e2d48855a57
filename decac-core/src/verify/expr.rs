//! Expression typing
//!
//! Every verified expression caches its type in `Expr::ty`; int operands that
//! meet a float are wrapped in a conversion node here.

use super::body::BodyContext;
use super::rules::{arithmetic_result, assign_compatible, cast_compatible};
use super::{class_of, resolve_type};
use crate::compiler::DecacCompiler;
use crate::context::{
    ContextualError, ContextualErrorKind, ContextualResult, ExpDefinition, Type,
};
use crate::tools::{Location, Symbol, SymbolTable};
use crate::tree::{BinaryOp, Expr, ExprKind, Ident, IdentDefinition, UnaryOp, Visibility};

pub(crate) fn verify_expr(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    expr: &mut Expr,
) -> ContextualResult<Type> {
    let location = expr.location;
    let ty = match &mut expr.kind {
        ExprKind::IntLiteral(_) | ExprKind::ReadInt => Type::Int,
        ExprKind::FloatLiteral(_) | ExprKind::ReadFloat => Type::Float,
        ExprKind::BooleanLiteral(_) => Type::Boolean,
        ExprKind::StringLiteral(_) => Type::String,
        ExprKind::Null => Type::Null,
        ExprKind::This => match context.class {
            Some(class) => Type::Class(class),
            None => {
                return Err(ContextualError::rule(
                    ContextualErrorKind::TypeMismatch,
                    "3.43",
                    "'this' cannot be used in the main program.",
                    location,
                ))
            }
        },
        ExprKind::Identifier(ident) => verify_identifier(compiler, context, ident)?,
        ExprKind::Selection { receiver, field } => {
            verify_selection(compiler, context, receiver, field)?
        }
        ExprKind::MethodCall {
            receiver,
            method,
            args,
        } => verify_call(compiler, context, receiver.as_deref_mut(), method, args, location)?,
        ExprKind::New(ident) => {
            let ty = resolve_type(compiler, ident)?;
            if !ty.is_class() {
                return Err(ContextualError::rule(
                    ContextualErrorKind::TypeMismatch,
                    "3.42",
                    format_args!("Cannot instantiate non-class type {}.", ident.name),
                    location,
                ));
            }
            ty
        }
        ExprKind::Cast { ty, expr: inner } => {
            let target = resolve_type(compiler, ty)?;
            let source = verify_expr(compiler, context, inner)?;
            if !cast_compatible(&compiler.env_types, target, source) {
                return Err(ContextualError::rule(
                    ContextualErrorKind::TypeMismatch,
                    "3.39",
                    format_args!(
                        "Cannot cast {} to {}.",
                        source.name(&compiler.symbols),
                        target.name(&compiler.symbols)
                    ),
                    location,
                ));
            }
            target
        }
        ExprKind::InstanceOf { expr: inner, ty } => {
            let source = verify_expr(compiler, context, inner)?;
            let target = resolve_type(compiler, ty)?;
            if !source.is_class_or_null() || !target.is_class() {
                return Err(ContextualError::rule(
                    ContextualErrorKind::TypeMismatch,
                    "3.40",
                    format_args!(
                        "instanceof needs a class expression and a class, got {} and {}.",
                        source.name(&compiler.symbols),
                        target.name(&compiler.symbols)
                    ),
                    location,
                ));
            }
            Type::Boolean
        }
        ExprKind::Binary { op, left, right } => {
            verify_binary(compiler, context, *op, left, right, location)?
        }
        ExprKind::Unary { op, operand } => {
            let ty = verify_expr(compiler, context, operand)?;
            match (*op, ty) {
                (UnaryOp::Minus, Type::Int | Type::Float) => ty,
                (UnaryOp::Not, Type::Boolean) => Type::Boolean,
                _ => {
                    return Err(ContextualError::rule(
                        ContextualErrorKind::TypeMismatch,
                        "3.37",
                        format_args!(
                            "Unary operator cannot be applied to {}.",
                            ty.name(&compiler.symbols)
                        ),
                        location,
                    ))
                }
            }
        }
        ExprKind::Assign { target, value } => {
            if !matches!(
                target.kind,
                ExprKind::Identifier(_) | ExprKind::Selection { .. }
            ) {
                return Err(ContextualError::rule(
                    ContextualErrorKind::TypeMismatch,
                    "3.32",
                    "Left-hand side of assignment is not assignable.",
                    target.location,
                ));
            }
            let ty = verify_expr(compiler, context, target)?;
            verify_rvalue(compiler, context, value, ty)?;
            ty
        }
        ExprKind::ConvFloat(inner) => {
            verify_expr(compiler, context, inner)?;
            Type::Float
        }
    };
    expr.ty = Some(ty);
    Ok(ty)
}

/// Check `expr` against an expected type, inserting int → float conversion
pub(crate) fn verify_rvalue(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    expr: &mut Expr,
    expected: Type,
) -> ContextualResult<()> {
    let ty = verify_expr(compiler, context, expr)?;
    if !assign_compatible(&compiler.env_types, expected, ty) {
        return Err(ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.28",
            format_args!(
                "Cannot assign a value of type {} to {}.",
                ty.name(&compiler.symbols),
                expected.name(&compiler.symbols)
            ),
            expr.location,
        ));
    }
    if expected == Type::Float && ty == Type::Int {
        expr.convert_to_float();
    }
    Ok(())
}

pub(crate) fn verify_condition(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    expr: &mut Expr,
) -> ContextualResult<()> {
    let ty = verify_expr(compiler, context, expr)?;
    if ty != Type::Boolean {
        return Err(ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.29",
            format_args!("Condition must be boolean, got {}.", ty.name(&compiler.symbols)),
            expr.location,
        ));
    }
    Ok(())
}

fn lookup_symbol(compiler: &DecacCompiler, ident: &Ident) -> ContextualResult<Symbol> {
    compiler.symbols.lookup(&ident.name).map_err(|_| {
        ContextualError::rule(
            ContextualErrorKind::UnknownSymbol,
            "0.1",
            format_args!("Identifier '{}' is not declared.", ident.name),
            ident.location,
        )
    })
}

fn verify_identifier(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    ident: &mut Ident,
) -> ContextualResult<Type> {
    let symbol = lookup_symbol(compiler, ident)?;
    let definition = compiler
        .scopes
        .get(context.scope, symbol)
        .cloned()
        .ok_or_else(|| {
            ContextualError::rule(
                ContextualErrorKind::UnknownSymbol,
                "0.1",
                format_args!("Identifier '{}' is not declared.", ident.name),
                ident.location,
            )
        })?;
    if definition.is_method() {
        return Err(ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "0.1",
            format_args!("'{}' is a method, not a value.", ident.name),
            ident.location,
        ));
    }
    let ty = definition.ty();
    ident.definition = Some(IdentDefinition::Exp(definition));
    Ok(ty)
}

/// Member definition named by `ident` in `class`, resolved through inheritance
fn member_of(
    compiler: &DecacCompiler,
    class: Symbol,
    ident: &Ident,
    rule: &'static str,
) -> ContextualResult<ExpDefinition> {
    let members = class_of(compiler, class, ident.location)?.members;
    compiler
        .symbols
        .lookup(&ident.name)
        .ok()
        .and_then(|symbol| compiler.scopes.get(members, symbol))
        .cloned()
        .ok_or_else(|| {
            ContextualError::rule(
                ContextualErrorKind::UnknownSymbol,
                rule,
                format_args!(
                    "'{}' is not a member of class '{}'.",
                    ident.name,
                    compiler.symbols.name(class)
                ),
                ident.location,
            )
        })
}

fn verify_selection(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    receiver: &mut Expr,
    field: &mut Ident,
) -> ContextualResult<Type> {
    let receiver_type = verify_expr(compiler, context, receiver)?;
    let class = receiver_type.class_name().ok_or_else(|| {
        ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.65",
            "Field or method selection applied to variable of non-class type.",
            receiver.location,
        )
    })?;
    let definition = member_of(compiler, class, field, "3.65")?;
    let field_def = definition.as_field().ok_or_else(|| {
        ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.70",
            format_args!("'{}' is not a field.", field.name),
            field.location,
        )
    })?;

    if field_def.visibility == Visibility::Protected {
        let env = &compiler.env_types;
        let visible = context.class.is_some_and(|current| {
            env.is_subclass_of(current, field_def.owner) && env.is_subclass_of(class, current)
        });
        if !visible {
            return Err(ContextualError::rule(
                ContextualErrorKind::TypeMismatch,
                "3.66",
                format_args!("Protected field '{}' is not accessible here.", field.name),
                field.location,
            ));
        }
    }

    let ty = field_def.ty;
    field.definition = Some(IdentDefinition::Exp(definition));
    Ok(ty)
}

fn verify_call(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    receiver: Option<&mut Expr>,
    method: &mut Ident,
    args: &mut [Expr],
    location: Location,
) -> ContextualResult<Type> {
    let class = match receiver {
        Some(receiver) => {
            let ty = verify_expr(compiler, context, receiver)?;
            ty.class_name().ok_or_else(|| {
                ContextualError::rule(
                    ContextualErrorKind::TypeMismatch,
                    "3.71",
                    format_args!(
                        "Method selection applied to expression of non-class type: ({}).",
                        ty.name(&compiler.symbols)
                    ),
                    receiver.location,
                )
            })?
        }
        None => context.class.ok_or_else(|| {
            ContextualError::rule(
                ContextualErrorKind::UnknownSymbol,
                "3.71",
                format_args!("Method '{}' called without an object in main.", method.name),
                method.location,
            )
        })?,
    };

    let definition = member_of(compiler, class, method, "3.71")?;
    let method_def = definition.as_method().ok_or_else(|| {
        ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.41",
            format_args!("Invalid method call: {} is not a method.", method.name),
            location,
        )
    })?;
    let signature = method_def.signature.clone();
    let return_type = method_def.return_type;
    let bad_arguments = |symbols: &SymbolTable| {
        ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.72",
            format_args!(
                "Invalid argument list: signature of '{}' is ({}).",
                method.name,
                signature.render(symbols)
            ),
            location,
        )
    };

    if args.len() != signature.len() {
        return Err(bad_arguments(&compiler.symbols));
    }
    for (arg, expected) in args.iter_mut().zip(signature.params()) {
        let ty = verify_expr(compiler, context, arg)?;
        if !assign_compatible(&compiler.env_types, *expected, ty) {
            return Err(bad_arguments(&compiler.symbols));
        }
        if *expected == Type::Float && ty == Type::Int {
            arg.convert_to_float();
        }
    }

    method.definition = Some(IdentDefinition::Exp(definition));
    Ok(return_type)
}

fn verify_binary(
    compiler: &mut DecacCompiler,
    context: &BodyContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    location: Location,
) -> ContextualResult<Type> {
    let lt = verify_expr(compiler, context, left)?;
    let rt = verify_expr(compiler, context, right)?;

    let result = if op == BinaryOp::Modulo {
        (lt == Type::Int && rt == Type::Int).then_some(Type::Int)
    } else if op.is_arithmetic() {
        arithmetic_result(lt, rt)
    } else if op.is_ordering() {
        arithmetic_result(lt, rt).map(|_| Type::Boolean)
    } else if op.is_equality() {
        let comparable = arithmetic_result(lt, rt).is_some()
            || (lt == Type::Boolean && rt == Type::Boolean)
            || (lt.is_class_or_null() && rt.is_class_or_null());
        comparable.then_some(Type::Boolean)
    } else {
        (lt == Type::Boolean && rt == Type::Boolean).then_some(Type::Boolean)
    };

    let ty = result.ok_or_else(|| {
        ContextualError::rule(
            ContextualErrorKind::TypeMismatch,
            "3.33",
            format_args!(
                "Operator '{}' cannot be applied to {} and {}.",
                op.symbol(),
                lt.name(&compiler.symbols),
                rt.name(&compiler.symbols)
            ),
            location,
        )
    })?;
    if lt == Type::Int && rt == Type::Float {
        left.convert_to_float();
    } else if lt == Type::Float && rt == Type::Int {
        right.convert_to_float();
    }
    Ok(ty)
}
