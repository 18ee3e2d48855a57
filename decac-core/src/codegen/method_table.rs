//! Method-table layout
//!
//! Tables are laid out contiguously from `1(GB)`, `Object` first and then the
//! classes in declaration order (a superclass is always declared before its
//! subclasses). Word 0 of a table points at the superclass table, words
//! `1..=n` hold the method labels by slot index.

use super::{CodegenError, CodegenResult};
use crate::compiler::DecacCompiler;
use crate::tools::Symbol;
use decac_log::{debug, trace};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassTable {
    pub class: Symbol,
    /// Offset of word 0 from `GB`
    pub address: i32,
    /// `None` for `Object`
    pub superclass: Option<i32>,
    /// Mangled method labels, slot 1 first
    pub slots: Vec<Symbol>,
}

impl ClassTable {
    pub fn words(&self) -> i32 {
        self.slots.len() as i32 + 1
    }
}

#[derive(Debug, Default)]
pub struct MethodTableLayout {
    tables: Vec<ClassTable>,
    by_class: HashMap<Symbol, usize>,
    size: i32,
}

impl MethodTableLayout {
    /// Lay out `Object` and then `classes`, which must all be declared
    pub fn build(compiler: &mut DecacCompiler, classes: &[Symbol]) -> CodegenResult<Self> {
        let mut layout = MethodTableLayout::default();
        let object = compiler.env_types.object();
        layout.add(compiler, object)?;
        for class in classes {
            layout.add(compiler, *class)?;
        }
        debug!(
            compiler.logger,
            "{} method tables, {} words",
            layout.tables.len(),
            layout.size
        );
        Ok(layout)
    }

    fn add(&mut self, compiler: &mut DecacCompiler, class: Symbol) -> CodegenResult<()> {
        let (members, superclass, methods) = match compiler.env_types.class(class) {
            Some(def) => (def.members, def.superclass, def.number_of_methods as usize),
            None => {
                return Err(CodegenError::Internal(format!(
                    "no class definition for '{}'",
                    compiler.symbols.name(class)
                )))
            }
        };
        let super_address = match superclass {
            Some(sup) => Some(self.address(sup).ok_or_else(|| {
                CodegenError::Internal(format!(
                    "table of '{}' requested before its superclass",
                    compiler.symbols.name(class)
                ))
            })?),
            None => None,
        };

        let mut slots = vec![None; methods];
        compiler
            .scopes
            .collect_method_symbols(members, &mut compiler.symbols, &mut slots);
        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    CodegenError::Internal(format!(
                        "slot {} of '{}' has no method",
                        i + 1,
                        compiler.symbols.name(class)
                    ))
                })
            })
            .collect::<CodegenResult<Vec<_>>>()?;

        let table = ClassTable {
            class,
            address: self.size + 1,
            superclass: super_address,
            slots,
        };
        trace!(
            compiler.logger,
            "table of {} at {}(GB), {} slots",
            compiler.symbols.name(class),
            table.address,
            table.slots.len()
        );
        self.size += table.words();
        self.by_class.insert(class, self.tables.len());
        self.tables.push(table);
        Ok(())
    }

    pub fn address(&self, class: Symbol) -> Option<i32> {
        self.table(class).map(|t| t.address)
    }

    pub fn table(&self, class: Symbol) -> Option<&ClassTable> {
        self.by_class.get(&class).and_then(|i| self.tables.get(*i))
    }

    pub fn tables(&self) -> &[ClassTable] {
        &self.tables
    }

    /// Words occupied by all tables
    pub fn size(&self) -> i32 {
        self.size
    }
}
