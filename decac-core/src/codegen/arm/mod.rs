//! ARM (A32 + VFP) backend
//!
//! Covers the main block only. Floats travel as IEEE single bits in core
//! registers and go through `s0`/`s1` for VFP arithmetic. `printf`/`scanf`
//! calls are emitted as raw blocks.

mod gen;

pub use gen::ArmGenerator;

use super::program::{Instruction, Label};
use super::stack::StackSlot;
use std::fmt;

/// Callee-saved registers handed out by the pool: `r4`..`r10`
pub const FIRST_POOL_REGISTER: u8 = 4;
pub const POOL_LIMIT: u8 = 11;
/// Pushed alongside a spilled register so `sp` stays 8-byte aligned
const SPILL_PAD: u8 = 12;

pub fn register_name(register: u8) -> String {
    match register {
        11 => "fp".into(),
        12 => "ip".into(),
        13 => "sp".into(),
        14 => "lr".into(),
        15 => "pc".into(),
        n => format!("r{n}"),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmOperand {
    Reg(u8),
    Imm(u32),
}

impl fmt::Display for ArmOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmOperand::Reg(r) => f.write_str(&register_name(*r)),
            ArmOperand::Imm(v) if *v > 0xffff => write!(f, "#{v:#x}"),
            ArmOperand::Imm(v) => write!(f, "#{v}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmCond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// unsigned higher or same
    Hs,
}

impl ArmCond {
    fn suffix(self) -> &'static str {
        match self {
            ArmCond::Eq => "eq",
            ArmCond::Ne => "ne",
            ArmCond::Lt => "lt",
            ArmCond::Le => "le",
            ArmCond::Gt => "gt",
            ArmCond::Ge => "ge",
            ArmCond::Hs => "hs",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Eor,
    Rsb,
    Lsl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VfpOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arm {
    Mov(u8, ArmOperand),
    MovIf(ArmCond, u8, u32),
    /// `ldr rd, =<value>` literal-pool load
    LdrLiteral(u8, String),
    Ldr(u8, StackSlot),
    Str(u8, StackSlot),
    Push(Vec<u8>),
    Pop(Vec<u8>),
    Alu(AluOp, u8, u8, ArmOperand),
    /// `mls rd, rn, rm, ra`: rd = ra - rn * rm
    Mls(u8, u8, u8, u8),
    Cmp(u8, ArmOperand),
    B(Option<ArmCond>, Label),
    /// core register → `s<n>`
    ToSingle(u8, u8),
    /// `s<n>` → core register
    FromSingle(u8, u8),
    Vfp(VfpOp, u8, u8, u8),
    Vcmp(u8, u8),
    Vmrs,
    IntToFloat(u8),
    FloatToInt(u8),
    SubSp(u32),
}

impl Instruction for Arm {
    const COMMENT_PREFIX: &'static str = "@";

    fn push(register: u8) -> Self {
        Arm::Push(vec![register, SPILL_PAD])
    }

    fn pop(register: u8) -> Self {
        Arm::Pop(vec![register, SPILL_PAD])
    }
}

fn register_list(registers: &[u8]) -> String {
    registers
        .iter()
        .map(|r| register_name(*r))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = |n: &u8| register_name(*n);
        match self {
            Arm::Mov(rd, op) => write!(f, "mov {}, {op}", r(rd)),
            Arm::MovIf(cond, rd, imm) => write!(f, "mov{} {}, #{imm}", cond.suffix(), r(rd)),
            Arm::LdrLiteral(rd, value) => write!(f, "ldr {}, ={value}", r(rd)),
            Arm::Ldr(rd, slot) => write!(f, "ldr {}, {slot}", r(rd)),
            Arm::Str(rd, slot) => write!(f, "str {}, {slot}", r(rd)),
            Arm::Push(list) => write!(f, "push {{{}}}", register_list(list)),
            Arm::Pop(list) => write!(f, "pop {{{}}}", register_list(list)),
            Arm::Alu(op, rd, rn, operand) => {
                let mnemonic = match op {
                    AluOp::Add => "add",
                    AluOp::Sub => "sub",
                    AluOp::Mul => "mul",
                    AluOp::Sdiv => "sdiv",
                    AluOp::Eor => "eor",
                    AluOp::Rsb => "rsb",
                    AluOp::Lsl => "lsl",
                };
                write!(f, "{mnemonic} {}, {}, {operand}", r(rd), r(rn))
            }
            Arm::Mls(rd, rn, rm, ra) => {
                write!(f, "mls {}, {}, {}, {}", r(rd), r(rn), r(rm), r(ra))
            }
            Arm::Cmp(rn, op) => write!(f, "cmp {}, {op}", r(rn)),
            Arm::B(None, label) => write!(f, "b {label}"),
            Arm::B(Some(cond), label) => write!(f, "b{} {label}", cond.suffix()),
            Arm::ToSingle(s, rn) => write!(f, "vmov s{s}, {}", r(rn)),
            Arm::FromSingle(rd, s) => write!(f, "vmov {}, s{s}", r(rd)),
            Arm::Vfp(op, sd, sn, sm) => {
                let mnemonic = match op {
                    VfpOp::Add => "vadd.f32",
                    VfpOp::Sub => "vsub.f32",
                    VfpOp::Mul => "vmul.f32",
                    VfpOp::Div => "vdiv.f32",
                };
                write!(f, "{mnemonic} s{sd}, s{sn}, s{sm}")
            }
            Arm::Vcmp(sn, sm) => write!(f, "vcmp.f32 s{sn}, s{sm}"),
            Arm::Vmrs => f.write_str("vmrs APSR_nzcv, fpscr"),
            Arm::IntToFloat(s) => write!(f, "vcvt.f32.s32 s{s}, s{s}"),
            Arm::FloatToInt(s) => write!(f, "vcvt.s32.f32 s{s}, s{s}"),
            Arm::SubSp(bytes) => write!(f, "sub sp, sp, #{bytes}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_rendering() {
        assert_eq!(Arm::Ldr(4, StackSlot::frame(-8)).to_string(), "ldr r4, [fp, #-8]");
        assert_eq!(
            Arm::Push(vec![4, 5, 11, 12, 14]).to_string(),
            "push {r4, r5, fp, ip, lr}"
        );
        assert_eq!(
            Arm::Cmp(0, ArmOperand::Imm(0xff00_0000)).to_string(),
            "cmp r0, #0xff000000"
        );
        assert_eq!(Arm::MovIf(ArmCond::Ge, 5, 1).to_string(), "movge r5, #1");
        assert_eq!(Arm::Vfp(VfpOp::Div, 0, 0, 1).to_string(), "vdiv.f32 s0, s0, s1");
        assert_eq!(Arm::Mls(4, 0, 5, 4).to_string(), "mls r4, r0, r5, r4");
    }

    #[test]
    fn test_spill_keeps_stack_aligned() {
        assert_eq!(<Arm as Instruction>::push(10).to_string(), "push {r10, ip}");
        assert_eq!(<Arm as Instruction>::pop(10).to_string(), "pop {r10, ip}");
    }
}
