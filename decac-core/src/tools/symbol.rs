//! Identifier interning
//!
//! Every spelling maps to exactly one [`Symbol`]; symbols compare by handle,
//! never by text. One table lives inside each compiler instance.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Interned identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown symbol '{0}'")]
pub struct UnknownSymbol(pub String);

#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, Symbol>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing symbol for `text`, or a fresh one
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(symbol) = self.by_name.get(text) {
            return *symbol;
        }
        let symbol = Symbol(self.names.len() as u32);
        self.names.push(text.to_string());
        self.by_name.insert(text.to_string(), symbol);
        symbol
    }

    /// Symbol for text that must already have been interned
    pub fn lookup(&self, text: &str) -> Result<Symbol, UnknownSymbol> {
        self.by_name
            .get(text)
            .copied()
            .ok_or_else(|| UnknownSymbol(text.to_string()))
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        self.names
            .get(symbol.index())
            .map(String::as_str)
            .unwrap_or("<invalid>")
    }

    /// Interned mangled label `code.<class>.<method>`
    pub fn method_label(&mut self, class: Symbol, method: Symbol) -> Symbol {
        let text = format!("code.{}.{}", self.name(class), self.name(method));
        self.intern(&text)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Borrow a symbol together with the table for `{}` formatting
    pub fn display(&self, symbol: Symbol) -> SymbolName<'_> {
        SymbolName(self.name(symbol))
    }
}

pub struct SymbolName<'a>(&'a str);

impl fmt::Display for SymbolName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
