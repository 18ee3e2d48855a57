//! Stack-machine (IMA) backend

mod expr;
mod gen;
mod inst;

pub use gen::ImaGenerator;

use super::program::{Instruction, Label};
use super::stack::StackSlot;
use std::fmt;

/// Scratch registers outside the pool: return value and I/O
pub const R0: Reg = Reg::R(0);
pub const R1: Reg = Reg::R(1);
/// First register handed out by the pool
pub const FIRST_POOL_REGISTER: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    R(u8),
    GB,
    LB,
    SP,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::R(n) => write!(f, "R{n}"),
            Reg::GB => f.write_str("GB"),
            Reg::LB => f.write_str("LB"),
            Reg::SP => f.write_str("SP"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Reg(Reg),
    Int(i32),
    Float(f32),
    Null,
    /// `d(R)`
    Indirect(i32, Reg),
    Label(Label),
}

impl Operand {
    pub fn slot(slot: StackSlot) -> Self {
        let base = match slot.base {
            super::stack::StackBase::Global => Reg::GB,
            _ => Reg::LB,
        };
        Operand::Indirect(slot.offset, base)
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Int(value) => write!(f, "#{value}"),
            Operand::Float(value) => write!(f, "#{}", hex_float(*value)),
            Operand::Null => f.write_str("#null"),
            Operand::Indirect(offset, reg) => write!(f, "{offset}({reg})"),
            Operand::Label(label) => write!(f, "{label}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cond {
    fn suffix(self) -> &'static str {
        match self {
            Cond::Eq => "EQ",
            Cond::Ne => "NE",
            Cond::Lt => "LT",
            Cond::Le => "LE",
            Cond::Gt => "GT",
            Cond::Ge => "GE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Ima {
    Load(Operand, Reg),
    Store(Reg, Operand),
    Lea(Operand, Reg),
    Push(Reg),
    Pop(Reg),
    AddSp(u32),
    SubSp(u32),
    Tsto(u32),
    New(u32, Reg),
    Arith(ArithOp, Operand, Reg),
    Opp(Operand, Reg),
    Cmp(Operand, Reg),
    /// `Scc R`: set R to 1 when the condition codes match
    Set(Cond, Reg),
    Branch(Cond, Label),
    Bov(Label),
    Bra(Label),
    Bsr(Operand),
    Rts,
    Float(Operand, Reg),
    Int(Operand, Reg),
    Rint,
    Rfloat,
    Wint,
    Wfloat,
    Wfloatx,
    Wstr(String),
    Wnl,
    Halt,
    Error,
}

impl Instruction for Ima {
    const COMMENT_PREFIX: &'static str = ";";

    fn push(register: u8) -> Self {
        Ima::Push(Reg::R(register))
    }

    fn pop(register: u8) -> Self {
        Ima::Pop(Reg::R(register))
    }
}

impl fmt::Display for Ima {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ima::Load(op, reg) => write!(f, "LOAD {op}, {reg}"),
            Ima::Store(reg, op) => write!(f, "STORE {reg}, {op}"),
            Ima::Lea(op, reg) => write!(f, "LEA {op}, {reg}"),
            Ima::Push(reg) => write!(f, "PUSH {reg}"),
            Ima::Pop(reg) => write!(f, "POP {reg}"),
            Ima::AddSp(n) => write!(f, "ADDSP #{n}"),
            Ima::SubSp(n) => write!(f, "SUBSP #{n}"),
            Ima::Tsto(n) => write!(f, "TSTO #{n}"),
            Ima::New(n, reg) => write!(f, "NEW #{n}, {reg}"),
            Ima::Arith(op, src, reg) => {
                let mnemonic = match op {
                    ArithOp::Add => "ADD",
                    ArithOp::Sub => "SUB",
                    ArithOp::Mul => "MUL",
                    ArithOp::Quo => "QUO",
                    ArithOp::Rem => "REM",
                };
                write!(f, "{mnemonic} {src}, {reg}")
            }
            Ima::Opp(op, reg) => write!(f, "OPP {op}, {reg}"),
            Ima::Cmp(op, reg) => write!(f, "CMP {op}, {reg}"),
            Ima::Set(cond, reg) => write!(f, "S{} {reg}", cond.suffix()),
            Ima::Branch(cond, label) => write!(f, "B{} {label}", cond.suffix()),
            Ima::Bov(label) => write!(f, "BOV {label}"),
            Ima::Bra(label) => write!(f, "BRA {label}"),
            Ima::Bsr(op) => write!(f, "BSR {op}"),
            Ima::Rts => f.write_str("RTS"),
            Ima::Float(op, reg) => write!(f, "FLOAT {op}, {reg}"),
            Ima::Int(op, reg) => write!(f, "INT {op}, {reg}"),
            Ima::Rint => f.write_str("RINT"),
            Ima::Rfloat => f.write_str("RFLOAT"),
            Ima::Wint => f.write_str("WINT"),
            Ima::Wfloat => f.write_str("WFLOAT"),
            Ima::Wfloatx => f.write_str("WFLOATX"),
            Ima::Wstr(text) => write!(f, "WSTR \"{}\"", text.replace('"', "\"\"")),
            Ima::Wnl => f.write_str("WNL"),
            Ima::Halt => f.write_str("HALT"),
            Ima::Error => f.write_str("ERROR"),
        }
    }
}

/// Hexadecimal float literal, e.g. `0x1.8p0` for 1.5
pub fn hex_float(value: f32) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    let bits = value.to_bits();
    let sign = if bits >> 31 == 1 { "-" } else { "" };
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x7f_ffff;
    if exponent == 0 && mantissa == 0 {
        return format!("{sign}0x0.0p0");
    }
    let digits = format!("{:06x}", mantissa << 1);
    let digits = match digits.trim_end_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    if exponent == 0 {
        format!("{sign}0x0.{digits}p-126")
    } else {
        format!("{sign}0x1.{digits}p{}", exponent - 127)
    }
}

/// Words of stack the code needs beyond its starting point
pub fn stack_need(instructions: &[&Ima]) -> u32 {
    let mut depth: i64 = 0;
    let mut peak: i64 = 0;
    for instruction in instructions {
        match instruction {
            Ima::Push(_) => depth += 1,
            Ima::Pop(_) => depth -= 1,
            Ima::AddSp(n) => depth += i64::from(*n),
            Ima::SubSp(n) => depth -= i64::from(*n),
            // return address and saved LB
            Ima::Bsr(_) => peak = peak.max(depth + 2),
            _ => {}
        }
        peak = peak.max(depth);
    }
    peak.max(0) as u32
}
