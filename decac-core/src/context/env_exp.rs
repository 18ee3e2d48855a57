//! Expression environments
//!
//! Scopes live in an arena and refer to their parent by [`ScopeId`]. A new
//! scope can only name an already existing scope as parent, so the parent
//! graph is a forest and every lookup terminates.

use super::definition::ExpDefinition;
use crate::tools::{Symbol, SymbolTable};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        ScopeId(raw)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// `declare` found the name in the same scope
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("symbol already defined in this scope")]
pub struct DoubleDefinition(pub Symbol);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    entries: HashMap<Symbol, ExpDefinition>,
}

#[derive(Debug, Default)]
pub struct EnvironmentExp {
    scopes: Vec<Scope>,
}

impl EnvironmentExp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scope below `parent`
    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        debug_assert!(parent.map_or(true, |p| p.index() < self.scopes.len()));
        self.scopes.push(Scope {
            parent,
            entries: HashMap::new(),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.index()).and_then(|s| s.parent)
    }

    /// Local scope first, then the parent chain
    pub fn get(&self, scope: ScopeId, symbol: Symbol) -> Option<&ExpDefinition> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id.index())?;
            if let Some(def) = s.entries.get(&symbol) {
                return Some(def);
            }
            current = s.parent;
        }
        None
    }

    /// Lookup restricted to `scope` itself
    pub fn get_local(&self, scope: ScopeId, symbol: Symbol) -> Option<&ExpDefinition> {
        self.scopes
            .get(scope.index())
            .and_then(|s| s.entries.get(&symbol))
    }

    /// Insert a real declaration; shadowing an ancestor entry is fine
    pub fn declare(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
        definition: ExpDefinition,
    ) -> Result<(), DoubleDefinition> {
        if self.get_local(scope, symbol).is_some() {
            return Err(DoubleDefinition(symbol));
        }
        self.put(scope, symbol, definition);
        Ok(())
    }

    /// Unconditional insert for compiler-provided bindings
    pub fn put(&mut self, scope: ScopeId, symbol: Symbol, definition: ExpDefinition) {
        if let Some(s) = self.scopes.get_mut(scope.index()) {
            s.entries.insert(symbol, definition);
        }
    }

    pub fn local_entries(&self, scope: ScopeId) -> impl Iterator<Item = (Symbol, &ExpDefinition)> {
        self.scopes
            .get(scope.index())
            .into_iter()
            .flat_map(|s| s.entries.iter().map(|(sym, def)| (*sym, def)))
    }

    /// Fill `slots[index - 1]` with the mangled label of every method visible
    /// from `scope`, ancestors first so overrides replace inherited entries.
    pub fn collect_method_symbols(
        &self,
        scope: ScopeId,
        symbols: &mut SymbolTable,
        slots: &mut [Option<Symbol>],
    ) {
        if let Some(parent) = self.parent(scope) {
            self.collect_method_symbols(parent, symbols, slots);
        }
        let methods: Vec<(Symbol, Symbol, u32)> = self
            .local_entries(scope)
            .filter_map(|(name, def)| def.as_method().map(|m| (name, m.owner, m.index)))
            .collect();
        for (name, owner, index) in methods {
            if let Some(slot) = (index as usize)
                .checked_sub(1)
                .and_then(|i| slots.get_mut(i))
            {
                *slot = Some(symbols.method_label(owner, name));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::definition::{MethodDefinition, Signature, VariableDefinition};
    use crate::context::types::Type;
    use crate::tools::Location;

    fn var(ty: Type) -> ExpDefinition {
        ExpDefinition::Variable(VariableDefinition {
            ty,
            index: 1,
            location: Location::new(1, 1),
        })
    }

    fn method(owner: Symbol, index: u32) -> ExpDefinition {
        ExpDefinition::Method(MethodDefinition {
            return_type: Type::Void,
            signature: Signature::default(),
            owner,
            index,
            location: Location::new(1, 1),
        })
    }

    #[test]
    fn test_shadowing_parent_is_allowed() {
        let mut symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let mut env = EnvironmentExp::new();
        let outer = env.new_scope(None);
        let inner = env.new_scope(Some(outer));
        env.declare(outer, x, var(Type::Int)).unwrap();
        assert!(env.declare(inner, x, var(Type::Float)).is_ok());
        assert_eq!(env.get(inner, x).map(ExpDefinition::ty), Some(Type::Float));
        assert_eq!(env.get(outer, x).map(ExpDefinition::ty), Some(Type::Int));
    }

    #[test]
    fn test_same_scope_redeclaration_fails() {
        let mut symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let mut env = EnvironmentExp::new();
        let scope = env.new_scope(None);
        env.declare(scope, x, var(Type::Int)).unwrap();
        assert_eq!(
            env.declare(scope, x, var(Type::Int)),
            Err(DoubleDefinition(x))
        );
        env.put(scope, x, var(Type::Boolean));
        assert_eq!(env.get_local(scope, x).map(ExpDefinition::ty), Some(Type::Boolean));
    }

    #[test]
    fn test_get_walks_parent_chain() {
        let mut symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let mut env = EnvironmentExp::new();
        let a = env.new_scope(None);
        let b = env.new_scope(Some(a));
        let c = env.new_scope(Some(b));
        env.declare(a, x, var(Type::Int)).unwrap();
        assert!(env.get(c, x).is_some());
        assert!(env.get_local(c, x).is_none());
    }

    #[test]
    fn test_collect_method_symbols_overrides_in_place() {
        let mut symbols = SymbolTable::new();
        let object = symbols.intern("Object");
        let a = symbols.intern("A");
        let equals = symbols.intern("equals");
        let get = symbols.intern("get");
        let mut env = EnvironmentExp::new();
        let root = env.new_scope(None);
        let sub = env.new_scope(Some(root));
        env.put(root, equals, method(object, 1));
        env.declare(sub, get, method(a, 2)).unwrap();
        env.declare(sub, equals, method(a, 1)).unwrap();

        let mut slots = vec![None; 2];
        env.collect_method_symbols(sub, &mut symbols, &mut slots);
        let names: Vec<_> = slots
            .iter()
            .map(|s| s.map(|sym| symbols.name(sym).to_string()))
            .collect();
        assert_eq!(
            names,
            vec![Some("code.A.equals".to_string()), Some("code.A.get".to_string())]
        );
    }
}
