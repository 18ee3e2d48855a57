//! Main-block code generation for ARM
//!
//! Frame: `push {r4-r10, fp, ip, lr}`, `mov fp, sp`, then one word per local
//! at `[fp, #-4i]`. Runtime error handlers print their message and call
//! `exit(1)`.

use super::{AluOp, Arm, ArmCond, ArmOperand, VfpOp, FIRST_POOL_REGISTER, POOL_LIMIT};
use crate::codegen::{
    CodegenError, CodegenResult, ErrorManager, Label, LabelFactory, Program, RegisterPool,
    RuntimeError, StackLocations, StackSlot,
};
use crate::compiler::DecacCompiler;
use crate::context::Type;
use crate::tools::Location;
use crate::tree::{BinaryOp, Expr, ExprKind, Ident, Inst, InstKind, Program as Tree, UnaryOp};
use decac_log::{debug, trace};
use std::sync::Arc;

const BACKEND: &str = "ARM";
const SAVED: [u8; 10] = [4, 5, 6, 7, 8, 9, 10, 11, 12, 14];
/// Scratch register holding a right operand after a spill
const SPILL_SOURCE: u8 = 2;

pub struct ArmGenerator<'c> {
    compiler: &'c mut DecacCompiler,
    program: Program<Arm>,
    pool: RegisterPool,
    labels: LabelFactory,
    errors: ErrorManager,
    locations: StackLocations,
    strings: Vec<String>,
}

fn unsupported(construct: &'static str, location: Location) -> CodegenError {
    CodegenError::Unsupported {
        construct,
        backend: BACKEND,
        location,
    }
}

/// Escape text for an `.asciz` directive
fn asciz(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

impl<'c> ArmGenerator<'c> {
    pub fn new(compiler: &'c mut DecacCompiler) -> Self {
        let no_check = compiler.options.no_check;
        let logger = Arc::clone(&compiler.logger);
        ArmGenerator {
            compiler,
            program: Program::new(),
            pool: RegisterPool::new(FIRST_POOL_REGISTER, POOL_LIMIT),
            labels: LabelFactory::new(),
            errors: ErrorManager::new(no_check, logger),
            locations: StackLocations::new(),
            strings: Vec::new(),
        }
    }

    pub fn generate(mut self, tree: &Tree) -> CodegenResult<String> {
        if let Some(class) = tree.classes.first() {
            return Err(unsupported("class declaration", class.location));
        }

        let vars = tree.main.vars.len() as u32;
        // keep sp 8-byte aligned for library calls
        let frame_bytes = (vars + vars % 2) * 4;
        self.program.label(Label::new("main"));
        self.program.add(Arm::Push(SAVED.to_vec()));
        self.program.add(Arm::Mov(11, ArmOperand::Reg(13)));
        if frame_bytes > 0 {
            self.program.add(Arm::SubSp(frame_bytes));
        }

        self.locations.enter_scope();
        for (i, var) in tree.main.vars.iter().enumerate() {
            let slot = StackSlot::frame(-4 * (i as i32 + 1));
            if let Some(init) = &var.init {
                let r = self.acquire();
                self.expr(init, r)?;
                self.program.add(Arm::Str(r, slot));
                self.release(r);
            }
            let symbol = self.symbol(&var.name)?;
            self.locations.bind(symbol, slot);
        }
        self.insts(&tree.main.insts)?;
        self.locations.exit_scope();

        self.program.add(Arm::Mov(0, ArmOperand::Imm(0)));
        self.program.add(Arm::Mov(13, ArmOperand::Reg(11)));
        let mut restore = SAVED.to_vec();
        if let Some(last) = restore.last_mut() {
            *last = 15;
        }
        self.program.add(Arm::Pop(restore));

        let mut out = Program::new();
        out.raw(self.data_section());
        out.raw("\t.text\n\t.global main");
        let text = std::mem::take(&mut self.program);
        out.append(text);
        self.emit_error_handlers(&mut out);

        debug!(self.compiler.logger, "{} ARM lines emitted", out.len());
        Ok(out.to_string())
    }

    fn data_section(&self) -> String {
        let mut data = String::from(
            "\t.arch armv7-a\n\t.fpu vfpv3\n\t.data\n\
             fmt_int: .asciz \"%d\"\n\
             fmt_float: .asciz \"%e\"\n\
             fmt_hex: .asciz \"%a\"\n\
             fmt_str: .asciz \"%s\"\n\
             newline: .asciz \"\\n\"\n\
             scan_int: .asciz \"%d\"\n\
             scan_float: .asciz \"%f\"\n\
             \t.align 2\n\
             scan_buffer: .word 0\n",
        );
        for (i, text) in self.strings.iter().enumerate() {
            data.push_str(&format!("str.{}: .asciz \"{}\"\n", i + 1, asciz(text)));
        }
        for kind in self.errors.requested() {
            data.push_str(&format!(
                "msg.{}: .asciz \"{}\\n\"\n",
                kind.label_name(),
                asciz(kind.message())
            ));
        }
        data
    }

    fn emit_error_handlers(&self, out: &mut Program<Arm>) {
        for kind in self.errors.requested() {
            out.label(Label::new(kind.label_name()));
            out.raw(format!(
                "\tldr r0, =msg.{}\n\tbl printf\n\tmov r0, #1\n\tbl exit",
                kind.label_name()
            ));
        }
    }

    fn symbol(&self, ident: &Ident) -> CodegenResult<crate::tools::Symbol> {
        self.compiler
            .symbols
            .lookup(&ident.name)
            .map_err(|e| CodegenError::Internal(e.to_string()))
    }

    fn slot_of(&self, ident: &Ident) -> CodegenResult<StackSlot> {
        let symbol = self.symbol(ident)?;
        self.locations.get(symbol).ok_or_else(|| {
            CodegenError::Internal(format!("no frame slot for '{}'", ident.name))
        })
    }

    fn acquire(&mut self) -> u8 {
        let before = self.pool.spill_count();
        let r = self.pool.acquire(&mut self.program);
        if self.pool.spill_count() > before {
            trace!(self.compiler.logger, "register pool exhausted, spilling r{}", r);
        }
        r
    }

    fn release(&mut self, r: u8) {
        self.pool.release(r, &mut self.program);
    }

    fn insts(&mut self, insts: &[Inst]) -> CodegenResult<()> {
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
                    self.program.raw("\tldr r0, =newline\n\tbl printf");
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
                self.program.add(Arm::B(None, end.clone()));
                self.program.label(otherwise);
                self.insts(else_branch)?;
                self.program.label(end);
            }
            InstKind::While { condition, body } => {
                let test = self.labels.fresh("while_cond");
                let start = self.labels.fresh("while_body");
                self.program.add(Arm::B(None, test.clone()));
                self.program.label(start.clone());
                self.insts(body)?;
                self.program.label(test);
                self.condition(condition, true, start)?;
            }
            InstKind::Return(_) => return Err(unsupported("return", inst.location)),
            InstKind::NoOp => {}
        }
        Ok(())
    }

    fn print_arg(&mut self, arg: &Expr, hex: bool) -> CodegenResult<()> {
        if let ExprKind::StringLiteral(text) = &arg.kind {
            self.strings.push(text.clone());
            self.program.raw(format!(
                "\tldr r1, =str.{}\n\tldr r0, =fmt_str\n\tbl printf",
                self.strings.len()
            ));
            return Ok(());
        }
        let r = self.acquire();
        self.expr(arg, r)?;
        let reg = super::register_name(r);
        match arg.ty() {
            Type::Int => self
                .program
                .raw(format!("\tmov r1, {reg}\n\tldr r0, =fmt_int\n\tbl printf")),
            Type::Float => {
                let format = if hex { "fmt_hex" } else { "fmt_float" };
                self.program.raw(format!(
                    "\tvmov s0, {reg}\n\tvcvt.f64.f32 d0, s0\n\tvmov r2, r3, d0\n\tldr r0, ={format}\n\tbl printf"
                ));
            }
            _ => return Err(unsupported("printing this type", arg.location)),
        }
        self.release(r);
        Ok(())
    }

    fn condition(&mut self, expr: &Expr, when: bool, target: Label) -> CodegenResult<()> {
        let r = self.acquire();
        self.expr(expr, r)?;
        self.program.add(Arm::Cmp(r, ArmOperand::Imm(0)));
        self.release(r);
        let cond = if when { ArmCond::Ne } else { ArmCond::Eq };
        self.program.add(Arm::B(Some(cond), target));
        Ok(())
    }

    fn branch_to_handler(&mut self, cond: ArmCond, kind: RuntimeError) {
        if let Some(label) = self.errors.check_label(kind) {
            self.program.add(Arm::B(Some(cond), label));
        }
    }

    /// Inf/NaN results have an all-ones exponent
    fn float_check(&mut self, rd: u8) {
        if self.errors.checks_enabled() {
            self.program.add(Arm::Alu(AluOp::Lsl, 0, rd, ArmOperand::Imm(1)));
            self.program.add(Arm::Cmp(0, ArmOperand::Imm(0xff00_0000)));
            self.branch_to_handler(ArmCond::Hs, RuntimeError::FloatArithmetic);
        }
    }

    fn read(&mut self, float: bool, rd: u8) {
        let format = if float { "scan_float" } else { "scan_int" };
        let mut block = format!("\tldr r0, ={format}\n\tldr r1, =scan_buffer\n\tbl scanf");
        if let Some(label) = self.errors.check_label(RuntimeError::InputOutput) {
            block.push_str(&format!("\n\tcmp r0, #1\n\tbne {label}"));
        }
        block.push_str(&format!(
            "\n\tldr r1, =scan_buffer\n\tldr {}, [r1]",
            super::register_name(rd)
        ));
        self.program.raw(block);
    }

    fn expr(&mut self, expr: &Expr, rd: u8) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::IntLiteral(value) => {
                self.program.add(Arm::LdrLiteral(rd, value.to_string()))
            }
            ExprKind::FloatLiteral(value) => self
                .program
                .add(Arm::LdrLiteral(rd, format!("{:#010x}", value.to_bits()))),
            ExprKind::BooleanLiteral(value) => {
                self.program.add(Arm::Mov(rd, ArmOperand::Imm(u32::from(*value))))
            }
            ExprKind::ReadInt => self.read(false, rd),
            ExprKind::ReadFloat => self.read(true, rd),
            ExprKind::Identifier(ident) => {
                let slot = self.slot_of(ident)?;
                self.program.add(Arm::Ldr(rd, slot));
            }
            ExprKind::Assign { target, value } => {
                let ExprKind::Identifier(ident) = &target.kind else {
                    return Err(unsupported("field assignment", target.location));
                };
                self.expr(value, rd)?;
                let slot = self.slot_of(ident)?;
                self.program.add(Arm::Str(rd, slot));
            }
            ExprKind::ConvFloat(inner) => {
                self.expr(inner, rd)?;
                self.convert(rd, Arm::IntToFloat(0));
            }
            ExprKind::Cast { ty, expr: inner } => {
                let target = ty.type_definition().unwrap_or(Type::Void);
                if target.is_class() {
                    return Err(unsupported("class cast", expr.location));
                }
                self.expr(inner, rd)?;
                match (inner.ty(), target) {
                    (Type::Int, Type::Float) => self.convert(rd, Arm::IntToFloat(0)),
                    (Type::Float, Type::Int) => self.convert(rd, Arm::FloatToInt(0)),
                    _ => {}
                }
            }
            ExprKind::Unary { op, operand } => {
                self.expr(operand, rd)?;
                let flip = match (op, operand.ty()) {
                    (UnaryOp::Not, _) => Arm::Alu(AluOp::Eor, rd, rd, ArmOperand::Imm(1)),
                    (UnaryOp::Minus, Type::Float) => {
                        Arm::Alu(AluOp::Eor, rd, rd, ArmOperand::Imm(0x8000_0000))
                    }
                    (UnaryOp::Minus, _) => Arm::Alu(AluOp::Rsb, rd, rd, ArmOperand::Imm(0)),
                };
                self.program.add(flip);
            }
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right, rd)?,
            ExprKind::StringLiteral(_) => {
                return Err(CodegenError::Internal(
                    "string value outside of a print argument".into(),
                ))
            }
            ExprKind::Null => return Err(unsupported("null", expr.location)),
            ExprKind::This => return Err(unsupported("this", expr.location)),
            ExprKind::Selection { .. } => {
                return Err(unsupported("field selection", expr.location))
            }
            ExprKind::MethodCall { .. } => return Err(unsupported("method call", expr.location)),
            ExprKind::New(_) => return Err(unsupported("object creation", expr.location)),
            ExprKind::InstanceOf { .. } => return Err(unsupported("instanceof", expr.location)),
        }
        Ok(())
    }

    /// Run a VFP conversion on the bits held in `rd`
    fn convert(&mut self, rd: u8, conversion: Arm) {
        self.program.add(Arm::ToSingle(0, rd));
        self.program.add(conversion);
        self.program.add(Arm::FromSingle(rd, 0));
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, rd: u8) -> CodegenResult<()> {
        if op.is_logical() {
            let end = self.labels.fresh(if op == BinaryOp::And { "and_end" } else { "or_end" });
            let short = if op == BinaryOp::And { ArmCond::Eq } else { ArmCond::Ne };
            self.expr(left, rd)?;
            self.program.add(Arm::Cmp(rd, ArmOperand::Imm(0)));
            self.program.add(Arm::B(Some(short), end.clone()));
            self.expr(right, rd)?;
            self.program.label(end);
            return Ok(());
        }

        self.expr(left, rd)?;
        let tmp = self.acquire();
        let spilled = tmp == rd;
        let source = if spilled {
            self.expr(right, rd)?;
            self.program.add(Arm::Mov(SPILL_SOURCE, ArmOperand::Reg(rd)));
            self.release(tmp);
            SPILL_SOURCE
        } else {
            self.expr(right, tmp)?;
            tmp
        };
        let float = left.ty() == Type::Float || right.ty() == Type::Float;
        if float {
            self.float_binary(op, source, rd);
        } else {
            self.int_binary(op, source, rd);
        }
        if !spilled {
            self.release(tmp);
        }
        Ok(())
    }

    fn int_binary(&mut self, op: BinaryOp, source: u8, rd: u8) {
        let src = ArmOperand::Reg(source);
        match op {
            BinaryOp::Plus => self.program.add(Arm::Alu(AluOp::Add, rd, rd, src)),
            BinaryOp::Minus => self.program.add(Arm::Alu(AluOp::Sub, rd, rd, src)),
            BinaryOp::Mult => self.program.add(Arm::Alu(AluOp::Mul, rd, rd, src)),
            BinaryOp::Divide | BinaryOp::Modulo => {
                if self.errors.checks_enabled() {
                    self.program.add(Arm::Cmp(source, ArmOperand::Imm(0)));
                    self.branch_to_handler(ArmCond::Eq, RuntimeError::DivisionByZero);
                }
                if op == BinaryOp::Divide {
                    self.program.add(Arm::Alu(AluOp::Sdiv, rd, rd, src));
                } else {
                    self.program.add(Arm::Alu(AluOp::Sdiv, 0, rd, src));
                    self.program.add(Arm::Mls(rd, 0, source, rd));
                }
            }
            _ => {
                self.program.add(Arm::Cmp(rd, src));
                self.set_flag(op, rd);
            }
        }
    }

    fn float_binary(&mut self, op: BinaryOp, source: u8, rd: u8) {
        self.program.add(Arm::ToSingle(0, rd));
        self.program.add(Arm::ToSingle(1, source));
        let vfp = match op {
            BinaryOp::Plus => Some(VfpOp::Add),
            BinaryOp::Minus => Some(VfpOp::Sub),
            BinaryOp::Mult => Some(VfpOp::Mul),
            BinaryOp::Divide => Some(VfpOp::Div),
            _ => None,
        };
        match vfp {
            Some(vfp) => {
                self.program.add(Arm::Vfp(vfp, 0, 0, 1));
                self.program.add(Arm::FromSingle(rd, 0));
                self.float_check(rd);
            }
            None => {
                self.program.add(Arm::Vcmp(0, 1));
                self.program.add(Arm::Vmrs);
                self.set_flag(op, rd);
            }
        }
    }

    /// Materialise the comparison flags as 0/1 in `rd`
    fn set_flag(&mut self, op: BinaryOp, rd: u8) {
        let cond = match op {
            BinaryOp::Equals => ArmCond::Eq,
            BinaryOp::NotEquals => ArmCond::Ne,
            BinaryOp::Lower => ArmCond::Lt,
            BinaryOp::LowerOrEqual => ArmCond::Le,
            BinaryOp::Greater => ArmCond::Gt,
            _ => ArmCond::Ge,
        };
        self.program.add(Arm::Mov(rd, ArmOperand::Imm(0)));
        self.program.add(Arm::MovIf(cond, rd, 1));
    }
}
