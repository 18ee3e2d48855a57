//! Expression evaluation into a pool register

use super::gen::ImaGenerator;
use super::{ArithOp, Cond, Ima, Operand, Reg, R0, R1};
use crate::codegen::{CodegenError, CodegenResult, Label, RuntimeError};
use crate::context::{ExpDefinition, Type};
use crate::tools::Symbol;
use crate::tree::{BinaryOp, Expr, ExprKind, Ident, UnaryOp};
use decac_log::trace;

impl ImaGenerator<'_> {
    pub(super) fn acquire(&mut self) -> u8 {
        let before = self.pool.spill_count();
        let r = self.pool.acquire(&mut self.program);
        if self.pool.spill_count() > before {
            trace!(self.compiler.logger, "register pool exhausted, spilling R{}", r);
        }
        r
    }

    pub(super) fn release(&mut self, r: u8) {
        self.pool.release(r, &mut self.program);
    }

    /// `BOV` to the handler of `kind`, unless checks are off
    pub(super) fn check_overflow(&mut self, kind: RuntimeError) {
        if let Some(label) = self.errors.check_label(kind) {
            self.program.add(Ima::Bov(label));
        }
    }

    pub(super) fn null_check(&mut self, reg: Reg) {
        if let Some(label) = self.errors.check_label(RuntimeError::NullDereference) {
            self.program.add(Ima::Cmp(Operand::Null, reg));
            self.program.add(Ima::Branch(Cond::Eq, label));
        }
    }

    /// Evaluate a boolean and branch to `target` when it equals `when`
    pub(super) fn condition(&mut self, expr: &Expr, when: bool, target: Label) -> CodegenResult<()> {
        let r = self.acquire();
        self.expr(expr, r)?;
        self.program.add(Ima::Load(Reg::R(r).into(), R0));
        self.release(r);
        self.program.add(Ima::Cmp(Operand::Int(0), R0));
        let cond = if when { Cond::Ne } else { Cond::Eq };
        self.program.add(Ima::Branch(cond, target));
        Ok(())
    }

    pub(super) fn expr(&mut self, expr: &Expr, dst: u8) -> CodegenResult<()> {
        let rd = Reg::R(dst);
        match &expr.kind {
            ExprKind::IntLiteral(value) => self.program.add(Ima::Load(Operand::Int(*value), rd)),
            ExprKind::FloatLiteral(value) => {
                self.program.add(Ima::Load(Operand::Float(*value), rd))
            }
            ExprKind::BooleanLiteral(value) => {
                self.program.add(Ima::Load(Operand::Int(i32::from(*value)), rd))
            }
            ExprKind::Null => self.program.add(Ima::Load(Operand::Null, rd)),
            ExprKind::This => self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), rd)),
            ExprKind::StringLiteral(_) => {
                return Err(CodegenError::Internal(
                    "string value outside of a print argument".into(),
                ))
            }
            ExprKind::ReadInt | ExprKind::ReadFloat => {
                let read = if matches!(expr.kind, ExprKind::ReadInt) {
                    Ima::Rint
                } else {
                    Ima::Rfloat
                };
                self.program.add(read);
                self.check_overflow(RuntimeError::InputOutput);
                self.program.add(Ima::Load(R1.into(), rd));
            }
            ExprKind::Identifier(ident) => self.load_identifier(ident, rd)?,
            ExprKind::Selection { receiver, field } => {
                let index = self.field_index_of(field)?;
                self.expr(receiver, dst)?;
                self.null_check(rd);
                self.program.add(Ima::Load(Operand::Indirect(index, rd), rd));
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.call(receiver.as_deref(), method, args, dst)?,
            ExprKind::New(class) => self.new_object(class, dst)?,
            ExprKind::Cast { ty, expr: inner } => self.cast(ty, inner, dst)?,
            ExprKind::InstanceOf { expr: inner, ty } => {
                let class = class_type(ty)?;
                self.expr(inner, dst)?;
                let matched = self.labels.fresh("instanceof_true");
                let missed = self.labels.fresh("instanceof_false");
                let end = self.labels.fresh("instanceof_end");
                self.table_walk(dst, class, missed.clone(), matched.clone(), missed.clone())?;
                self.program.label(missed);
                self.program.add(Ima::Load(Operand::Int(0), rd));
                self.program.add(Ima::Bra(end.clone()));
                self.program.label(matched);
                self.program.add(Ima::Load(Operand::Int(1), rd));
                self.program.label(end);
            }
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right, dst)?,
            ExprKind::Unary { op, operand } => {
                self.expr(operand, dst)?;
                match op {
                    UnaryOp::Minus => self.program.add(Ima::Opp(rd.into(), rd)),
                    UnaryOp::Not => {
                        self.program.add(Ima::Cmp(Operand::Int(0), rd));
                        self.program.add(Ima::Set(Cond::Eq, rd));
                    }
                }
            }
            ExprKind::Assign { target, value } => {
                self.expr(value, dst)?;
                self.store(target, dst)?;
            }
            ExprKind::ConvFloat(inner) => {
                self.expr(inner, dst)?;
                self.program.add(Ima::Float(rd.into(), rd));
            }
        }
        Ok(())
    }

    fn field_index_of(&self, field: &Ident) -> CodegenResult<i32> {
        self.definition(field)?
            .as_field()
            .map(|def| def.index as i32)
            .ok_or_else(|| CodegenError::Internal(format!("'{}' is not a field", field.name)))
    }

    fn load_identifier(&mut self, ident: &Ident, rd: Reg) -> CodegenResult<()> {
        match self.definition(ident)? {
            ExpDefinition::Field(def) => {
                let index = def.index as i32;
                self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), rd));
                self.program.add(Ima::Load(Operand::Indirect(index, rd), rd));
            }
            ExpDefinition::Param(_) | ExpDefinition::Variable(_) => {
                let slot = self.slot_of(ident)?;
                self.program.add(Ima::Load(Operand::slot(slot), rd));
            }
            ExpDefinition::Method(_) => {
                return Err(CodegenError::Internal(format!(
                    "method '{}' used as a value",
                    ident.name
                )))
            }
        }
        Ok(())
    }

    /// Store register `value` into an lvalue, leaving it in place
    fn store(&mut self, target: &Expr, value: u8) -> CodegenResult<()> {
        let rv = Reg::R(value);
        match &target.kind {
            ExprKind::Identifier(ident) => match self.definition(ident)? {
                ExpDefinition::Field(def) => {
                    let index = def.index as i32;
                    self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), R1));
                    self.program.add(Ima::Store(rv, Operand::Indirect(index, R1)));
                }
                _ => {
                    let slot = self.slot_of(ident)?;
                    self.program.add(Ima::Store(rv, Operand::slot(slot)));
                }
            },
            ExprKind::Selection { receiver, field } => {
                let index = self.field_index_of(field)?;
                let r = self.acquire();
                self.expr(receiver, r)?;
                self.program.add(Ima::Load(Reg::R(r).into(), R1));
                self.release(r);
                self.null_check(R1);
                self.program.add(Ima::Store(rv, Operand::Indirect(index, R1)));
            }
            _ => {
                return Err(CodegenError::Internal(
                    "assignment to a non-lvalue".into(),
                ))
            }
        }
        Ok(())
    }

    fn call(
        &mut self,
        receiver: Option<&Expr>,
        method: &Ident,
        args: &[Expr],
        dst: u8,
    ) -> CodegenResult<()> {
        let rd = Reg::R(dst);
        let (slot, returns) = match self.definition(method)?.as_method() {
            Some(def) => (def.index as i32, !def.return_type.is_void()),
            None => {
                return Err(CodegenError::Internal(format!(
                    "'{}' is not a method",
                    method.name
                )))
            }
        };
        let words = args.len() as u32 + 1;

        self.program
            .add_commented(Ima::AddSp(words), format!("call {}", method.name));
        match receiver {
            Some(receiver) => self.expr(receiver, dst)?,
            None => self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), rd)),
        }
        self.program.add(Ima::Store(rd, Operand::Indirect(0, Reg::SP)));
        for (i, arg) in args.iter().enumerate() {
            self.expr(arg, dst)?;
            self.program
                .add(Ima::Store(rd, Operand::Indirect(-(i as i32) - 1, Reg::SP)));
        }
        self.program.add(Ima::Load(Operand::Indirect(0, Reg::SP), rd));
        self.null_check(rd);
        self.program.add(Ima::Load(Operand::Indirect(0, rd), rd));
        self.program.add(Ima::Bsr(Operand::Indirect(slot, rd)));
        self.program.add(Ima::SubSp(words));
        if returns {
            self.program.add(Ima::Load(R0.into(), rd));
        }
        Ok(())
    }

    fn new_object(&mut self, class_ident: &Ident, dst: u8) -> CodegenResult<()> {
        let rd = Reg::R(dst);
        let class = class_type(class_ident)?;
        let fields = self
            .compiler
            .env_types
            .class(class)
            .map(|def| def.number_of_fields)
            .ok_or_else(|| CodegenError::Internal(format!("unknown class '{}'", class_ident.name)))?;
        let table = self.table_address(class)?;

        self.program
            .add_commented(Ima::New(fields + 1, rd), format!("new {}", class_ident.name));
        self.check_overflow(RuntimeError::HeapOverflow);
        self.program.add(Ima::Lea(Operand::Indirect(table, Reg::GB), R0));
        self.program.add(Ima::Store(R0, Operand::Indirect(0, rd)));
        if class != self.compiler.env_types.object() {
            let init = Label::new(format!("init.{}", class_ident.name));
            self.program.add(Ima::Push(rd));
            self.program.add(Ima::Bsr(Operand::Label(init)));
            self.program.add(Ima::Pop(rd));
        }
        Ok(())
    }

    fn cast(&mut self, ty: &Ident, inner: &Expr, dst: u8) -> CodegenResult<()> {
        let rd = Reg::R(dst);
        let target = ty
            .type_definition()
            .ok_or_else(|| CodegenError::Internal(format!("type '{}' not resolved", ty.name)))?;
        let source = inner.ty();
        self.expr(inner, dst)?;
        match (source, target) {
            (Type::Int, Type::Float) => self.program.add(Ima::Float(rd.into(), rd)),
            (Type::Float, Type::Int) => {
                self.program.add(Ima::Int(rd.into(), rd));
                self.check_overflow(RuntimeError::FloatArithmetic);
            }
            (_, Type::Class(class)) if !self.compiler.env_types.is_subtype(source, target) => {
                if let Some(impossible) = self.errors.check_label(RuntimeError::ImpossibleCast) {
                    let end = self.labels.fresh("cast_ok");
                    self.table_walk(dst, class, end.clone(), end.clone(), impossible)?;
                    self.program.label(end);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Follow the table chain of the object in `value` looking for `class`
    fn table_walk(
        &mut self,
        value: u8,
        class: Symbol,
        on_null: Label,
        on_match: Label,
        on_miss: Label,
    ) -> CodegenResult<()> {
        let table = self.table_address(class)?;
        let lookup = self.labels.fresh("table_walk");
        self.program.add(Ima::Load(Reg::R(value).into(), R0));
        self.program.add(Ima::Cmp(Operand::Null, R0));
        self.program.add(Ima::Branch(Cond::Eq, on_null));
        self.program.add(Ima::Load(Operand::Indirect(0, R0), R0));
        self.program.label(lookup.clone());
        self.program.add(Ima::Lea(Operand::Indirect(table, Reg::GB), R1));
        self.program.add(Ima::Cmp(R1.into(), R0));
        self.program.add(Ima::Branch(Cond::Eq, on_match));
        self.program.add(Ima::Load(Operand::Indirect(0, R0), R0));
        self.program.add(Ima::Cmp(Operand::Null, R0));
        self.program.add(Ima::Branch(Cond::Ne, lookup));
        self.program.add(Ima::Bra(on_miss));
        Ok(())
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, dst: u8) -> CodegenResult<()> {
        let rd = Reg::R(dst);
        if op.is_logical() {
            let end = self.labels.fresh(if op == BinaryOp::And { "and_end" } else { "or_end" });
            let short = if op == BinaryOp::And { Cond::Eq } else { Cond::Ne };
            self.expr(left, dst)?;
            self.program.add(Ima::Cmp(Operand::Int(0), rd));
            self.program.add(Ima::Branch(short, end.clone()));
            self.expr(right, dst)?;
            self.program.label(end);
            return Ok(());
        }

        self.expr(left, dst)?;
        let tmp = self.acquire();
        let spilled = tmp == dst;
        let source = if spilled {
            // the left operand is on the stack until the release below
            self.expr(right, dst)?;
            self.program.add(Ima::Load(rd.into(), R0));
            self.release(tmp);
            R0
        } else {
            self.expr(right, tmp)?;
            Reg::R(tmp)
        };
        let float = left.ty() == Type::Float || right.ty() == Type::Float;
        self.apply_binary(op, float, source, rd);
        if !spilled {
            self.release(tmp);
        }
        Ok(())
    }

    fn apply_binary(&mut self, op: BinaryOp, float: bool, source: Reg, rd: Reg) {
        let arith = match op {
            BinaryOp::Plus => Some(ArithOp::Add),
            BinaryOp::Minus => Some(ArithOp::Sub),
            BinaryOp::Mult => Some(ArithOp::Mul),
            BinaryOp::Divide => Some(ArithOp::Quo),
            BinaryOp::Modulo => Some(ArithOp::Rem),
            _ => None,
        };
        if let Some(arith) = arith {
            self.program.add(Ima::Arith(arith, source.into(), rd));
            if float {
                self.check_overflow(RuntimeError::FloatArithmetic);
            } else if matches!(arith, ArithOp::Quo | ArithOp::Rem) {
                self.check_overflow(RuntimeError::DivisionByZero);
            }
            return;
        }
        let cond = match op {
            BinaryOp::Equals => Cond::Eq,
            BinaryOp::NotEquals => Cond::Ne,
            BinaryOp::Lower => Cond::Lt,
            BinaryOp::LowerOrEqual => Cond::Le,
            BinaryOp::Greater => Cond::Gt,
            _ => Cond::Ge,
        };
        self.program.add(Ima::Cmp(source.into(), rd));
        self.program.add(Ima::Set(cond, rd));
    }
}

fn class_type(ident: &Ident) -> CodegenResult<Symbol> {
    ident
        .type_definition()
        .and_then(Type::class_name)
        .ok_or_else(|| CodegenError::Internal(format!("'{}' is not a resolved class", ident.name)))
}
