//! Test helpers
//!
//! Scratch directories and small programs for end-to-end runs.

#![allow(dead_code)]

use decac_workspace::tree::{DeclClass, DeclField, DeclMethod, DeclVar, Expr, Inst, Main};
use decac_workspace::Program;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory under the system temp dir, removed on drop
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "decac-{}-{}-{}",
            name,
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        ScratchDir { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `program` as a JSON tree file and return its path
    pub fn write_tree(&self, name: &str, program: &Program) -> PathBuf {
        let path = self.path.join(name);
        std::fs::write(&path, program.to_json_pretty().unwrap()).unwrap();
        path
    }

    pub fn write_text(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

pub fn hello(text: &str) -> Program {
    Program::new(vec![], Main::new(vec![], vec![Inst::println(vec![Expr::string(text)])]))
}

/// `class Cell { int value = 7; int get() { return value; } }`, printed from main
pub fn cell_program() -> Program {
    let cell = DeclClass::new("Cell")
        .field(DeclField::new("int", "value").init(Expr::int(7)))
        .method(DeclMethod::new("int", "get").body(vec![], vec![Inst::ret(Expr::ident("value"))]));
    Program::new(
        vec![cell],
        Main::new(
            vec![DeclVar::new("Cell", "c").init(Expr::new_object("Cell"))],
            vec![Inst::println(vec![Expr::call(Expr::ident("c"), "get", vec![])])],
        ),
    )
}

/// Main assigning a float to an int variable
pub fn ill_typed() -> Program {
    Program::new(
        vec![],
        Main::new(
            vec![DeclVar::new("int", "i").init(Expr::float(2.5).at(3, 13))],
            vec![],
        ),
    )
}
