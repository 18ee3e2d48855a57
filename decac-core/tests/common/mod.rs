//! Test helpers
//!
//! Small tree fixtures and one-call wrappers around `DecacCompiler`.

#![allow(dead_code)]

use decac_core::tree::{DeclClass, DeclField, DeclMethod, DeclParam, DeclVar, Expr, Inst, Main};
use decac_core::{
    CompileError, CompileOutcome, CompilerOptions, ContextualError, DecacCompiler, Program,
    TargetBackend,
};
use decac_log::{LogConfig, LogRingBuffer, Record};
use std::sync::Arc;

pub fn options() -> CompilerOptions {
    CompilerOptions::default()
}

pub fn no_check() -> CompilerOptions {
    CompilerOptions {
        no_check: true,
        ..options()
    }
}

pub fn registers(count: u8) -> CompilerOptions {
    CompilerOptions {
        registers: Some(count),
        ..options()
    }
}

pub fn arm() -> CompilerOptions {
    CompilerOptions {
        target: TargetBackend::Arm,
        ..options()
    }
}

pub fn main_only(vars: Vec<DeclVar>, insts: Vec<Inst>) -> Program {
    Program::new(vec![], Main::new(vars, insts))
}

/// Run the whole pipeline and return the assembly text
pub fn assemble_with(program: Program, options: CompilerOptions) -> String {
    match DecacCompiler::new(options).compile(program) {
        Ok(CompileOutcome::Assembled(assembly)) => assembly.text,
        Ok(other) => panic!("expected assembly, got {:?}", other),
        Err(e) => panic!("compilation failed: {}", e),
    }
}

pub fn assemble(program: Program) -> String {
    assemble_with(program, options())
}

/// Verify a program that must be rejected
pub fn verify_error(program: Program) -> ContextualError {
    let mut program = program;
    match DecacCompiler::new(options()).verify(&mut program) {
        Ok(()) => panic!("verification unexpectedly succeeded"),
        Err(e) => e,
    }
}

/// Compile with a trace-level logger and hand back what it recorded
pub fn compile_logged(
    program: Program,
    options: CompilerOptions,
) -> (Result<CompileOutcome, CompileError>, Vec<Record>) {
    let (logger, ring) = LogConfig::test().init();
    let ring: Arc<LogRingBuffer> = ring.unwrap();
    let result = DecacCompiler::with_logger(options, logger.for_unit("test.deca")).compile(program);
    (result, ring.records())
}

/// Instruction lines of `text` with tabs and comments stripped
pub fn instructions(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.starts_with('\t'))
        .map(|line| line.split(';').next().unwrap_or("").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn has_instruction(text: &str, wanted: &str) -> bool {
    instructions(text).iter().any(|line| line == wanted)
}

/// `class A { int x; float y; }` and `class B extends A { int z; }`
pub fn points() -> Vec<DeclClass> {
    vec![
        DeclClass::new("A")
            .field(DeclField::new("int", "x"))
            .field(DeclField::new("float", "y")),
        DeclClass::new("B")
            .extends("A")
            .field(DeclField::new("int", "z")),
    ]
}

/// `class Counter { int count; int get() { return count; } }`
pub fn counter() -> DeclClass {
    DeclClass::new("Counter")
        .field(DeclField::new("int", "count"))
        .method(
            DeclMethod::new("int", "get")
                .body(vec![], vec![Inst::ret(Expr::ident("count"))]),
        )
}

pub fn method_with_param(return_type: &str, name: &str, param_type: &str) -> DeclMethod {
    DeclMethod::new(return_type, name)
        .param(DeclParam::new(param_type, "p"))
        .body(vec![], vec![])
}
