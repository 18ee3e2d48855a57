//! Instructions

use super::gen::ImaGenerator;
use super::{Ima, Reg, R0, R1};
use crate::codegen::{CodegenError, CodegenResult};
use crate::context::Type;
use crate::tree::{Expr, ExprKind, Inst, InstKind};

impl ImaGenerator<'_> {
    pub(super) fn insts(&mut self, insts: &[Inst]) -> CodegenResult<()> {
        for inst in insts {
            self.inst(inst)?;
        }
        Ok(())
    }

    fn inst(&mut self, inst: &Inst) -> CodegenResult<()> {
        match &inst.kind {
            InstKind::Expr(expr) => {
                if !matches!(expr.kind, ExprKind::StringLiteral(_)) {
                    let r = self.acquire();
                    self.expr(expr, r)?;
                    self.release(r);
                }
            }
            InstKind::Print { newline, hex, args } => {
                for arg in args {
                    self.print_arg(arg, *hex)?;
                }
                if *newline {
                    self.program.add(Ima::Wnl);
                }
            }
            InstKind::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => {
                let otherwise = self.labels.fresh("else");
                let end = self.labels.fresh("end_if");
                self.condition(condition, false, otherwise.clone())?;
                self.insts(then_branch)?;
                self.program.add(Ima::Bra(end.clone()));
                self.program.label(otherwise);
                self.insts(else_branch)?;
                self.program.label(end);
            }
            InstKind::While { condition, body } => {
                let test = self.labels.fresh("while_cond");
                let start = self.labels.fresh("while_body");
                self.program.add(Ima::Bra(test.clone()));
                self.program.label(start.clone());
                self.insts(body)?;
                self.program.label(test);
                self.condition(condition, true, start)?;
            }
            InstKind::Return(value) => {
                let end = self.method_end.clone().ok_or_else(|| {
                    CodegenError::Internal("return outside of a method".into())
                })?;
                let r = self.acquire();
                self.expr(value, r)?;
                self.program.add(Ima::Load(Reg::R(r).into(), R0));
                self.release(r);
                self.program.add(Ima::Bra(end));
            }
            InstKind::NoOp => {}
        }
        Ok(())
    }

    fn print_arg(&mut self, arg: &Expr, hex: bool) -> CodegenResult<()> {
        if let ExprKind::StringLiteral(text) = &arg.kind {
            self.program.add(Ima::Wstr(text.clone()));
            return Ok(());
        }
        let write = match arg.ty() {
            Type::Int => Ima::Wint,
            Type::Float if hex => Ima::Wfloatx,
            Type::Float => Ima::Wfloat,
            other => {
                return Err(CodegenError::Internal(format!(
                    "cannot print a value of type {other:?}"
                )))
            }
        };
        let r = self.acquire();
        self.expr(arg, r)?;
        self.program.add(Ima::Load(Reg::R(r).into(), R1));
        self.release(r);
        self.program.add(write);
        Ok(())
    }
}
