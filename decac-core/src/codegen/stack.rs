//! Symbol → memory location bindings
//!
//! Bindings are scoped: `exit_scope` restores whatever the scope's names were
//! bound to before, so offsets from one method body never leak into the next.

use crate::tools::Symbol;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackBase {
    /// `GB`: method tables and main-program variables
    Global,
    /// `LB`: parameters (negative) and locals (positive)
    Local,
    /// ARM frame pointer
    Frame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackSlot {
    pub base: StackBase,
    pub offset: i32,
}

impl StackSlot {
    pub fn global(offset: i32) -> Self {
        StackSlot {
            base: StackBase::Global,
            offset,
        }
    }

    pub fn local(offset: i32) -> Self {
        StackSlot {
            base: StackBase::Local,
            offset,
        }
    }

    pub fn frame(offset: i32) -> Self {
        StackSlot {
            base: StackBase::Frame,
            offset,
        }
    }
}

impl fmt::Display for StackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            StackBase::Global => write!(f, "{}(GB)", self.offset),
            StackBase::Local => write!(f, "{}(LB)", self.offset),
            StackBase::Frame => write!(f, "[fp, #{}]", self.offset),
        }
    }
}

#[derive(Debug, Default)]
pub struct StackLocations {
    slots: HashMap<Symbol, StackSlot>,
    /// Per open scope: each bound name with its previous binding
    scopes: Vec<Vec<(Symbol, Option<StackSlot>)>>,
}

impl StackLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn exit_scope(&mut self) {
        if let Some(bound) = self.scopes.pop() {
            for (symbol, previous) in bound.into_iter().rev() {
                match previous {
                    Some(slot) => self.slots.insert(symbol, slot),
                    None => self.slots.remove(&symbol),
                };
            }
        }
    }

    pub fn bind(&mut self, symbol: Symbol, slot: StackSlot) {
        let previous = self.slots.insert(symbol, slot);
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((symbol, previous));
        }
    }

    pub fn get(&self, symbol: Symbol) -> Option<StackSlot> {
        self.slots.get(&symbol).copied()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
