//! End-to-end tests: tree files in, assembly files out

mod common;

use common::*;
use decac_workspace::{
    compile_file, compile_files, compile_source_str, output_path, CompileOutcome, CompilerOptions,
    DecacError, ErrorPhase, LogConfig, Phase, RunConfig, TargetBackend,
};

fn config(options: CompilerOptions) -> RunConfig {
    RunConfig::from_options(options)
}

#[test]
fn test_compile_file_writes_assembly() {
    let dir = ScratchDir::new("write");
    let source = dir.write_tree("hello.deca.json", &hello("hi"));

    let output = compile_file(&source, &RunConfig::default()).unwrap();
    let written = output.output.unwrap();
    assert_eq!(written, dir.path().join("hello.ass"));

    let text = std::fs::read_to_string(&written).unwrap();
    assert!(text.contains("WSTR \"hi\""));
    assert!(text.contains("HALT"));
}

#[test]
fn test_failed_file_writes_nothing() {
    let dir = ScratchDir::new("fail");
    let source = dir.write_tree("bad.deca.json", &ill_typed());

    let err = compile_file(&source, &RunConfig::default()).unwrap_err();
    assert_eq!(err.phase(), ErrorPhase::Verify);
    assert_eq!(err.line(), Some(3));
    assert_eq!(err.column(), Some(13));
    assert!(!dir.path().join("bad.ass").exists());
}

#[test]
fn test_arm_output_extension() {
    let dir = ScratchDir::new("arm");
    let source = dir.write_tree("prog.deca", &hello("arm"));
    let options = CompilerOptions {
        target: TargetBackend::Arm,
        ..CompilerOptions::default()
    };

    let output = compile_file(&source, &config(options)).unwrap();
    assert_eq!(output.output.unwrap(), dir.path().join("prog.s"));
    assert_eq!(output_path(&source, TargetBackend::Arm), dir.path().join("prog.s"));
}

#[test]
fn test_verification_only_writes_nothing() {
    let dir = ScratchDir::new("verify");
    let source = dir.write_tree("cell.deca.json", &cell_program());
    let options = CompilerOptions {
        verification_only: true,
        ..CompilerOptions::default()
    };

    let output = compile_file(&source, &config(options)).unwrap();
    assert!(output.output.is_none());
    assert!(matches!(output.outcome, CompileOutcome::Verified { .. }));
    assert!(!dir.path().join("cell.ass").exists());
}

#[test]
fn test_malformed_tree_is_reported() {
    let dir = ScratchDir::new("tree");
    let source = dir.write_text("broken.deca.json", "{ \"classes\": [ }");

    let err = compile_file(&source, &RunConfig::default()).unwrap_err();
    assert!(matches!(err, DecacError::Tree { .. }));
    assert_eq!(err.to_report().error_kind, "malformed tree");
}

#[test]
fn test_files_are_deduplicated_and_independent() {
    let dir = ScratchDir::new("many");
    let good = dir.write_tree("good.deca.json", &cell_program());
    let bad = dir.write_tree("bad.deca.json", &ill_typed());
    let other = dir.write_text("notes.txt", "not a tree");

    let reports = compile_files(
        &[good.clone(), bad.clone(), good.clone(), other.clone()],
        &RunConfig::default(),
    );
    let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec![good, bad, other]);
    assert!(reports[0].is_ok());
    assert!(!reports[1].is_ok());
    assert!(matches!(reports[2].result, Err(DecacError::InvalidSource(_))));
    assert!(dir.path().join("good.ass").exists());
    assert!(!dir.path().join("bad.ass").exists());
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = ScratchDir::new("parallel");
    let paths: Vec<_> = (0..4)
        .map(|i| dir.write_tree(&format!("p{i}.deca.json"), &hello(&format!("file {i}"))))
        .collect();

    let sequential: Vec<String> = compile_files(&paths, &RunConfig::default())
        .into_iter()
        .map(|r| std::fs::read_to_string(r.result.unwrap().output.unwrap()).unwrap())
        .collect();

    let options = CompilerOptions {
        parallel: true,
        ..CompilerOptions::default()
    };
    let reports = compile_files(&paths, &config(options));
    assert_eq!(reports.len(), 4);
    for (i, report) in reports.into_iter().enumerate() {
        let written = report.result.unwrap().output.unwrap();
        let text = std::fs::read_to_string(written).unwrap();
        assert!(text.contains(&format!("WSTR \"file {i}\"")));
        assert_eq!(text, sequential[i]);
    }
}

#[test]
fn test_parallel_records_carry_their_own_unit_and_phase() {
    let dir = ScratchDir::new("parallel-log");
    let paths: Vec<_> = (0..4)
        .map(|i| dir.write_tree(&format!("q{i}.deca.json"), &cell_program()))
        .collect();
    let (logger, ring) = LogConfig::test().with_ring_buffer(65_536).init();
    let ring = ring.unwrap();
    let options = CompilerOptions {
        parallel: true,
        ..CompilerOptions::default()
    };

    let reports = compile_files(&paths, &RunConfig::new(options, logger));
    assert!(reports.iter().all(|r| r.is_ok()));
    assert_eq!(ring.overwritten(), 0);

    for path in &paths {
        let unit = path.display().to_string();
        let records = ring.for_unit(&unit);
        assert!(records.iter().any(|r| r.phase == Some(Phase::Parse)));
        assert!(records.iter().any(|r| r.phase == Some(Phase::Verify)));
        let emitted: Vec<_> = records
            .iter()
            .filter(|r| r.message.contains("IMA lines emitted"))
            .collect();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].phase, Some(Phase::Codegen));
    }
    let units: std::collections::HashSet<_> =
        ring.records().into_iter().filter_map(|r| r.unit).collect();
    assert_eq!(units.len(), 4);
}

#[test]
fn test_source_string_with_classes() {
    let json = cell_program().to_json_pretty().unwrap();
    match compile_source_str(&json, &RunConfig::default()).unwrap() {
        CompileOutcome::Assembled(assembly) => {
            assert!(assembly.text.contains("init.Cell:"));
            assert!(assembly.text.contains("code.Cell.get:"));
            assert!(assembly.text.contains("LOAD #7, R2"));
        }
        other => panic!("expected assembly, got {:?}", other),
    }
}

#[test]
fn test_warnings_returned_with_assembly() {
    use decac_workspace::tree::{DeclClass, DeclMethod};
    let program = decac_workspace::Program::new(
        vec![DeclClass::new("A").method(DeclMethod::new("int", "m").body(vec![], vec![]))],
        Default::default(),
    );
    let options = CompilerOptions {
        warnings: true,
        ..CompilerOptions::default()
    };
    match decac_workspace::compile_program(program, &config(options)).unwrap() {
        CompileOutcome::Assembled(assembly) => assert_eq!(assembly.warnings.len(), 1),
        other => panic!("expected assembly, got {:?}", other),
    }
}
