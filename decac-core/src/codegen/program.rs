//! In-memory assembly buffer
//!
//! Emitters only append. The buffer is rendered once, in emission order.

use super::registers::SpillEmitter;
use std::collections::HashMap;
use std::fmt;

/// One backend's instruction type
pub trait Instruction: fmt::Display {
    /// Line-comment marker of the target assembler
    const COMMENT_PREFIX: &'static str;

    fn push(register: u8) -> Self;
    fn pop(register: u8) -> Self;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out `<prefix>.<n>` labels, numbered per prefix
#[derive(Debug, Default)]
pub struct LabelFactory {
    counters: HashMap<&'static str, u32>,
}

impl LabelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, prefix: &'static str) -> Label {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        Label(format!("{prefix}.{counter}"))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Line<I> {
    Instruction {
        instruction: I,
        comment: Option<String>,
    },
    Label(Label),
    Comment(String),
    /// Copied verbatim
    Raw(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program<I> {
    lines: Vec<Line<I>>,
}

impl<I> Default for Program<I> {
    fn default() -> Self {
        Program { lines: Vec::new() }
    }
}

impl<I: Instruction> Program<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instruction: I) {
        self.lines.push(Line::Instruction {
            instruction,
            comment: None,
        });
    }

    pub fn add_commented(&mut self, instruction: I, comment: impl Into<String>) {
        self.lines.push(Line::Instruction {
            instruction,
            comment: Some(comment.into()),
        });
    }

    pub fn label(&mut self, label: Label) {
        self.lines.push(Line::Label(label));
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Comment(text.into()));
    }

    pub fn raw(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Raw(text.into()));
    }

    pub fn append(&mut self, mut other: Program<I>) {
        self.lines.append(&mut other.lines);
    }

    pub fn lines(&self) -> &[Line<I>] {
        &self.lines
    }

    pub fn instructions(&self) -> impl Iterator<Item = &I> {
        self.lines.iter().filter_map(|line| match line {
            Line::Instruction { instruction, .. } => Some(instruction),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<I: Instruction> SpillEmitter for Program<I> {
    fn emit_push(&mut self, register: u8) {
        self.add_commented(I::push(register), "spill");
    }

    fn emit_pop(&mut self, register: u8) {
        self.add_commented(I::pop(register), "restore");
    }
}

impl<I: Instruction> fmt::Display for Program<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Instruction {
                    instruction,
                    comment,
                } => {
                    write!(f, "\t{instruction}")?;
                    if let Some(comment) = comment {
                        write!(f, " {} {comment}", I::COMMENT_PREFIX)?;
                    }
                    writeln!(f)?;
                }
                Line::Label(label) => writeln!(f, "{label}:")?,
                Line::Comment(text) => writeln!(f, "{} {text}", I::COMMENT_PREFIX)?,
                Line::Raw(text) => writeln!(f, "{}", text.trim_end_matches('\n'))?,
            }
        }
        Ok(())
    }
}
