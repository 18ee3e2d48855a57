use super::definition::{
    ClassDefinition, ExpDefinition, MethodDefinition, Signature, TypeDefinition,
};
use super::env_exp::{EnvironmentExp, ScopeId};
use super::types::Type;
use crate::tools::{Location, Symbol, SymbolTable};
use std::collections::HashMap;

/// Global name → type mapping for one compilation
#[derive(Debug)]
pub struct EnvironmentType {
    types: HashMap<Symbol, TypeDefinition>,
    object: Symbol,
    equals: Symbol,
}

impl EnvironmentType {
    /// Builtins plus `Object`, whose only method is `equals(Object)` at slot 1
    pub fn new(symbols: &mut SymbolTable, scopes: &mut EnvironmentExp) -> Self {
        let mut types = HashMap::new();
        for (name, ty) in [
            ("void", Type::Void),
            ("boolean", Type::Boolean),
            ("float", Type::Float),
            ("int", Type::Int),
        ] {
            types.insert(
                symbols.intern(name),
                TypeDefinition::Builtin {
                    ty,
                    location: Location::BUILTIN,
                },
            );
        }

        let object = symbols.intern("Object");
        let equals = symbols.intern("equals");
        let members = scopes.new_scope(None);
        scopes.put(
            members,
            equals,
            ExpDefinition::Method(MethodDefinition {
                return_type: Type::Boolean,
                signature: Signature(vec![Type::Class(object)]),
                owner: object,
                index: 1,
                location: Location::BUILTIN,
            }),
        );
        types.insert(
            object,
            TypeDefinition::Class(ClassDefinition {
                name: object,
                superclass: None,
                members,
                number_of_fields: 0,
                number_of_methods: 1,
                location: Location::BUILTIN,
            }),
        );

        EnvironmentType {
            types,
            object,
            equals,
        }
    }

    pub fn object(&self) -> Symbol {
        self.object
    }

    pub fn equals_method(&self) -> Symbol {
        self.equals
    }

    pub fn object_scope(&self) -> Option<ScopeId> {
        self.class(self.object).map(|def| def.members)
    }

    pub fn get(&self, name: Symbol) -> Option<&TypeDefinition> {
        self.types.get(&name)
    }

    pub fn class(&self, name: Symbol) -> Option<&ClassDefinition> {
        match self.types.get(&name) {
            Some(TypeDefinition::Class(def)) => Some(def),
            _ => None,
        }
    }

    pub fn class_mut(&mut self, name: Symbol) -> Option<&mut ClassDefinition> {
        match self.types.get_mut(&name) {
            Some(TypeDefinition::Class(def)) => Some(def),
            _ => None,
        }
    }

    /// Register a class; on a name clash the existing definition is returned
    pub fn declare_class(&mut self, definition: ClassDefinition) -> Result<(), &TypeDefinition> {
        use std::collections::hash_map::Entry;
        match self.types.entry(definition.name) {
            Entry::Occupied(existing) => Err(existing.into_mut()),
            Entry::Vacant(slot) => {
                slot.insert(TypeDefinition::Class(definition));
                Ok(())
            }
        }
    }

    /// `class` followed by its ancestors up to `Object`
    pub fn ancestors(&self, class: Symbol) -> Ancestors<'_> {
        Ancestors {
            env: self,
            next: Some(class),
            remaining: self.types.len(),
        }
    }

    /// Reflexive subclass relation on class names
    pub fn is_subclass_of(&self, class: Symbol, ancestor: Symbol) -> bool {
        self.ancestors(class).any(|c| c == ancestor)
    }

    /// Subtyping: identity, null below every class, subclassing
    pub fn is_subtype(&self, sub: Type, sup: Type) -> bool {
        match (sub, sup) {
            (a, b) if a.same_type(b) => true,
            (Type::Null, Type::Class(_)) => true,
            (Type::Class(a), Type::Class(b)) => self.is_subclass_of(a, b),
            _ => false,
        }
    }
}

/// Walks the superclass chain; bounded by the number of types so a corrupted
/// chain cannot loop forever
pub struct Ancestors<'a> {
    env: &'a EnvironmentType,
    next: Option<Symbol>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.env.class(current).and_then(|def| def.superclass);
        Some(current)
    }
}
