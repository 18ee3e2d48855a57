//! End-to-end code generation for both backends

mod common;

use common::*;
use decac_core::codegen::RuntimeError;
use decac_core::tree::{BinaryOp, DeclClass, DeclMethod, DeclVar, Expr, Inst, Main};
use decac_core::{CodegenError, CompileError, CompileOutcome, DecacCompiler, Program};
use decac_log::Phase;

fn with_object_access() -> Program {
    Program::new(
        vec![counter()],
        Main::new(
            vec![DeclVar::new("Counter", "c").init(Expr::new_object("Counter"))],
            vec![Inst::println(vec![Expr::call(Expr::ident("c"), "get", vec![])])],
        ),
    )
}

#[test]
fn test_hello_world_layout() {
    let text = assemble(main_only(
        vec![],
        vec![Inst::println(vec![Expr::string("hello")])],
    ));
    let lines = instructions(&text);
    let halt = lines.iter().position(|l| l == "HALT").unwrap();
    let wstr = lines.iter().position(|l| l == "WSTR \"hello\"").unwrap();
    assert!(wstr < halt);
    assert_eq!(lines[wstr + 1], "WNL");
    // Object's table only: #null and equals
    assert!(has_instruction(&text, "ADDSP #2"));
    assert!(has_instruction(&text, "LOAD code.Object.equals, R0"));
    assert!(text.contains("code.Object.equals:"));
}

#[test]
fn test_method_tables_chain_to_superclass() {
    let text = assemble(Program::new(points(), Default::default()));
    // Object at 1(GB), A at 3(GB), B at 5(GB)
    assert!(has_instruction(&text, "LOAD #null, R0"));
    assert!(has_instruction(&text, "STORE R0, 1(GB)"));
    assert!(has_instruction(&text, "LEA 1(GB), R0"));
    assert!(has_instruction(&text, "STORE R0, 3(GB)"));
    assert!(has_instruction(&text, "LEA 3(GB), R0"));
    assert!(has_instruction(&text, "STORE R0, 5(GB)"));
    assert!(has_instruction(&text, "ADDSP #6"));
}

#[test]
fn test_init_defaults_fields_then_calls_super_init() {
    let text = assemble(Program::new(points(), Default::default()));
    assert!(text.contains("init.A:"));
    assert!(text.contains("init.B:"));
    let b_init = text.split("init.B:").nth(1).unwrap();
    assert!(b_init.contains("BSR init.A"));
    // float field y defaults to 0.0
    let a_init = text.split("init.A:").nth(1).unwrap();
    assert!(a_init.contains("LOAD #0x0.0p0, R0"));
}

#[test]
fn test_method_call_and_frame() {
    let text = assemble(with_object_access());
    assert!(text.contains("code.Counter.get:"));
    assert!(has_instruction(&text, "NEW #2, R2"));
    assert!(has_instruction(&text, "BOV heap_overflow"));
    assert!(has_instruction(&text, "BSR init.Counter"));
    assert!(has_instruction(&text, "BSR 2(R2)"));
    assert!(has_instruction(&text, "SUBSP #1"));
    assert!(text.contains("fin.code.Counter.get:"));
    assert!(has_instruction(&text, "RTS"));
}

#[test]
fn test_null_check_present_by_default() {
    let text = assemble(with_object_access());
    assert!(has_instruction(&text, "CMP #null, R2"));
    assert!(has_instruction(&text, "BEQ null_dereference"));
    assert!(text.contains("null_dereference:"));
    assert!(has_instruction(
        &text,
        &format!("WSTR \"{}\"", RuntimeError::NullDereference.message())
    ));
}

#[test]
fn test_no_check_removes_runtime_checks() {
    let text = assemble_with(with_object_access(), no_check());
    assert!(!text.contains("null_dereference"));
    assert!(!text.contains("heap_overflow"));
    assert!(!text.contains("stack_overflow"));
    assert!(!text.contains("TSTO"));
    assert!(!has_instruction(&text, "ERROR"));
}

#[test]
fn test_missing_return_branch() {
    let class = DeclClass::new("A").method(DeclMethod::new("int", "m").body(vec![], vec![]));
    let text = assemble(Program::new(vec![class], Default::default()));
    assert!(has_instruction(&text, "BRA missing_return"));
    assert!(text.contains("missing_return:"));
}

#[test]
fn test_error_handlers_emitted_once() {
    let div = |a, b| Expr::binary(BinaryOp::Divide, Expr::ident(a), Expr::ident(b));
    let program = main_only(
        vec![
            DeclVar::new("int", "a").init(Expr::int(6)),
            DeclVar::new("int", "b").init(Expr::int(3)),
        ],
        vec![
            Inst::println(vec![div("a", "b")]),
            Inst::println(vec![div("b", "a")]),
        ],
    );
    let text = assemble(program);
    assert_eq!(text.matches("division_by_zero:").count(), 1);
    assert_eq!(
        instructions(&text)
            .iter()
            .filter(|l| *l == "BOV division_by_zero")
            .count(),
        2
    );
    assert!(has_instruction(&text, "QUO R3, R2"));
}

#[test]
fn test_float_arithmetic_overflow_check() {
    let program = main_only(
        vec![DeclVar::new("float", "f").init(Expr::float(1.5))],
        vec![Inst::println(vec![Expr::binary(
            BinaryOp::Mult,
            Expr::ident("f"),
            Expr::ident("f"),
        )])],
    );
    let text = assemble(program);
    assert!(has_instruction(&text, "BOV float_arithmetic"));
    assert!(has_instruction(&text, "WFLOAT"));
}

#[test]
fn test_read_int_checks_io() {
    let program = main_only(
        vec![DeclVar::new("int", "x").init(Expr::read_int())],
        vec![],
    );
    let text = assemble(program);
    assert!(has_instruction(&text, "RINT"));
    assert!(has_instruction(&text, "BOV io_error"));
}

#[test]
fn test_spill_when_registers_run_out() {
    // R2 and R3 only; the inner sum needs a third register
    let nested = Expr::binary(
        BinaryOp::Plus,
        Expr::ident("x"),
        Expr::binary(BinaryOp::Plus, Expr::ident("x"), Expr::ident("x")),
    );
    let program = main_only(
        vec![DeclVar::new("int", "x").init(Expr::int(1))],
        vec![Inst::println(vec![nested])],
    );

    let text = assemble_with(program.clone(), registers(4));
    assert!(text.contains("PUSH R3"));
    assert!(text.contains("POP R3"));
    assert!(has_instruction(&text, "ADD R0, R3"));

    let roomy = assemble(program);
    assert!(!roomy.contains("PUSH R3"));
    assert!(has_instruction(&roomy, "ADD R4, R3"));
}

#[test]
fn test_asm_body_copied_verbatim() {
    let class = DeclClass::new("A").method(DeclMethod::new("int", "raw").asm("\tLOAD #42, R0\n\tRTS"));
    let text = assemble(Program::new(vec![class], Default::default()));
    assert!(text.contains("code.A.raw:\n\tLOAD #42, R0\n\tRTS"));
}

#[test]
fn test_instanceof_walks_table_chain() {
    let program = Program::new(
        points(),
        Main::new(
            vec![DeclVar::new("A", "a").init(Expr::new_object("B"))],
            vec![Inst::if_then_else(
                Expr::instance_of(Expr::ident("a"), "B"),
                vec![Inst::println(vec![Expr::string("B")])],
                vec![],
            )],
        ),
    );
    let text = assemble(program);
    assert!(text.contains("table_walk.1:"));
    assert!(has_instruction(&text, "LEA 5(GB), R1"));
}

#[test]
fn test_downcast_checks_dynamic_type() {
    let program = Program::new(
        points(),
        Main::new(
            vec![
                DeclVar::new("A", "a").init(Expr::new_object("B")),
                DeclVar::new("B", "b").init(Expr::cast("B", Expr::ident("a"))),
            ],
            vec![],
        ),
    );
    let text = assemble(program);
    assert!(has_instruction(&text, "BRA impossible_cast"));
    assert!(text.contains("impossible_cast:"));
}

#[test]
fn test_arm_main_program() {
    let program = main_only(
        vec![DeclVar::new("int", "x").init(Expr::int(2))],
        vec![Inst::println(vec![
            Expr::string("x = "),
            Expr::binary(BinaryOp::Mult, Expr::ident("x"), Expr::int(21)),
        ])],
    );
    let text = assemble_with(program, arm());
    assert!(text.contains("main:"));
    assert!(text.contains("str.1: .asciz \"x = \""));
    assert!(text.contains("bl printf"));
    assert!(text.contains(".global main"));
}

#[test]
fn test_arm_division_checks_zero() {
    let program = main_only(
        vec![DeclVar::new("int", "x").init(Expr::int(2))],
        vec![Inst::println(vec![Expr::binary(
            BinaryOp::Modulo,
            Expr::int(7),
            Expr::ident("x"),
        )])],
    );
    let text = assemble_with(program, arm());
    assert!(text.contains("division_by_zero:"));
    assert!(text.contains("msg.division_by_zero"));
    assert!(text.contains("bl exit"));
}

#[test]
fn test_arm_spill_keeps_stack_aligned_around_scanf() {
    // r4 holds x, six sums take r5..r10, the seventh spills r10 around scanf
    let nested = (1..=7).rev().fold(Expr::read_int(), |inner, n| {
        Expr::binary(BinaryOp::Plus, Expr::int(n), inner)
    });
    let program = main_only(
        vec![DeclVar::new("int", "x").init(nested)],
        vec![Inst::println(vec![Expr::ident("x")])],
    );
    let text = assemble_with(program, arm());
    assert!(text.contains("bl scanf"));
    assert!(has_instruction(&text, "push {r10, ip}"));
    assert!(has_instruction(&text, "pop {r10, ip}"));
    assert!(!has_instruction(&text, "push {r10}"));
}

#[test]
fn test_arm_rejects_classes() {
    let err = DecacCompiler::new(arm())
        .compile(Program::new(vec![counter()], Default::default()))
        .unwrap_err();
    match err {
        CompileError::Codegen(CodegenError::Unsupported { construct, backend, .. }) => {
            assert_eq!(construct, "class declaration");
            assert_eq!(backend, "ARM");
        }
        other => panic!("expected unsupported construct, got {:?}", other),
    }
}

#[test]
fn test_stop_after_verification() {
    let mut options = options();
    options.verification_only = true;
    let outcome = DecacCompiler::new(options).compile(with_object_access()).unwrap();
    match outcome {
        CompileOutcome::Verified { program, warnings } => {
            assert!(warnings.is_empty());
            assert!(program.classes[0].name.type_definition().is_some());
        }
        other => panic!("expected verified tree, got {:?}", other),
    }
}

#[test]
fn test_compilation_is_logged() {
    let (result, records) = compile_logged(with_object_access(), options());
    assert!(result.is_ok());
    assert!(records.iter().any(|r| r.message.contains("IMA lines emitted")));
    assert!(records.iter().any(|r| r.phase == Some(Phase::Verify)));
    assert!(records.iter().any(|r| r.phase == Some(Phase::Codegen)));
    assert!(records.iter().all(|r| r.unit.as_deref() == Some("test.deca")));
}

#[test]
fn test_spill_is_traced() {
    let nested = Expr::binary(
        BinaryOp::Plus,
        Expr::int(1),
        Expr::binary(BinaryOp::Plus, Expr::int(2), Expr::int(3)),
    );
    let (result, records) = compile_logged(main_only(vec![], vec![Inst::println(vec![nested])]), registers(4));
    assert!(result.is_ok());
    assert!(records
        .iter()
        .any(|r| r.message.contains("register pool exhausted, spilling R3")));
}
