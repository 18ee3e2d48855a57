//! Syntax tree handed over by the front end
//!
//! The tree is plain serde data (the front end ships it as JSON). Verification
//! fills the `#[serde(skip)]` decoration slots: every expression gets its
//! type, every identifier its resolved definition.

mod expr;
mod inst;

pub use expr::{BinaryOp, Expr, ExprKind, UnaryOp};
pub use inst::{Inst, InstKind};
pub(crate) use inst::block_returns;

use crate::context::{ExpDefinition, Type};
use crate::tools::Location;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
}

/// What an identifier resolved to
#[derive(Clone, Debug, PartialEq)]
pub enum IdentDefinition {
    Type(Type),
    Exp(ExpDefinition),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(skip)]
    pub definition: Option<IdentDefinition>,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Ident {
            name: name.into(),
            location: Location::default(),
            definition: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Location::new(line, column);
        self
    }

    pub fn exp_definition(&self) -> Option<&ExpDefinition> {
        match &self.definition {
            Some(IdentDefinition::Exp(def)) => Some(def),
            _ => None,
        }
    }

    pub fn type_definition(&self) -> Option<Type> {
        match &self.definition {
            Some(IdentDefinition::Type(ty)) => Some(*ty),
            _ => None,
        }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::new(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub classes: Vec<DeclClass>,
    #[serde(default)]
    pub main: Main,
}

impl Program {
    pub fn new(classes: Vec<DeclClass>, main: Main) -> Self {
        Program { classes, main }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Main block: locals then instructions
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Main {
    #[serde(default)]
    pub vars: Vec<DeclVar>,
    #[serde(default)]
    pub insts: Vec<Inst>,
}

impl Main {
    pub fn new(vars: Vec<DeclVar>, insts: Vec<Inst>) -> Self {
        Main { vars, insts }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclClass {
    pub name: Ident,
    /// Absent means `extends Object`
    #[serde(default)]
    pub superclass: Option<Ident>,
    #[serde(default)]
    pub fields: Vec<DeclField>,
    #[serde(default)]
    pub methods: Vec<DeclMethod>,
    #[serde(default)]
    pub location: Location,
}

impl DeclClass {
    pub fn new(name: &str) -> Self {
        DeclClass {
            name: Ident::new(name),
            superclass: None,
            fields: Vec::new(),
            methods: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(Ident::new(superclass));
        self
    }

    pub fn field(mut self, field: DeclField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: DeclMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Location::new(line, column);
        self.name.location = self.location;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclField {
    #[serde(default)]
    pub visibility: Visibility,
    pub ty: Ident,
    pub name: Ident,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub location: Location,
}

impl DeclField {
    pub fn new(ty: &str, name: &str) -> Self {
        DeclField {
            visibility: Visibility::Public,
            ty: Ident::new(ty),
            name: Ident::new(name),
            init: None,
            location: Location::default(),
        }
    }

    pub fn protected(mut self) -> Self {
        self.visibility = Visibility::Protected;
        self
    }

    pub fn init(mut self, value: Expr) -> Self {
        self.init = Some(value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclParam {
    pub ty: Ident,
    pub name: Ident,
    #[serde(default)]
    pub location: Location,
}

impl DeclParam {
    pub fn new(ty: &str, name: &str) -> Self {
        DeclParam {
            ty: Ident::new(ty),
            name: Ident::new(name),
            location: Location::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclVar {
    pub ty: Ident,
    pub name: Ident,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub location: Location,
}

impl DeclVar {
    pub fn new(ty: &str, name: &str) -> Self {
        DeclVar {
            ty: Ident::new(ty),
            name: Ident::new(name),
            init: None,
            location: Location::default(),
        }
    }

    pub fn init(mut self, value: Expr) -> Self {
        self.init = Some(value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodBody {
    Block {
        #[serde(default)]
        vars: Vec<DeclVar>,
        #[serde(default)]
        insts: Vec<Inst>,
    },
    /// Hand-written stack-machine code, copied verbatim
    Asm { code: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclMethod {
    pub return_type: Ident,
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<DeclParam>,
    pub body: MethodBody,
    #[serde(default)]
    pub location: Location,
}

impl DeclMethod {
    pub fn new(return_type: &str, name: &str) -> Self {
        DeclMethod {
            return_type: Ident::new(return_type),
            name: Ident::new(name),
            params: Vec::new(),
            body: MethodBody::Block {
                vars: Vec::new(),
                insts: Vec::new(),
            },
            location: Location::default(),
        }
    }

    pub fn param(mut self, param: DeclParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn body(mut self, vars: Vec<DeclVar>, insts: Vec<Inst>) -> Self {
        self.body = MethodBody::Block { vars, insts };
        self
    }

    pub fn asm(mut self, code: &str) -> Self {
        self.body = MethodBody::Asm { code: code.into() };
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Location::new(line, column);
        self.name.location = self.location;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_from_front_end_json() {
        let json = r#"{
            "classes": [{
                "name": { "name": "A", "location": { "line": 1, "column": 7 } },
                "fields": [{ "ty": { "name": "int" }, "name": { "name": "x" } }]
            }],
            "main": {
                "insts": [{ "kind": { "print": { "newline": true, "hex": false,
                    "args": [{ "kind": { "string_literal": "hi" } }] } } }]
            }
        }"#;
        let program = Program::from_json(json).unwrap();
        assert_eq!(program.classes[0].name.name, "A");
        assert_eq!(program.classes[0].name.location, Location::new(1, 7));
        assert!(program.classes[0].superclass.is_none());
        assert_eq!(program.classes[0].fields[0].visibility, Visibility::Public);
        assert_eq!(program.main.insts.len(), 1);
    }

    #[test]
    fn test_builders_match_json_shape() {
        let program = Program::new(
            vec![DeclClass::new("A").field(DeclField::new("int", "x"))],
            Main::new(vec![], vec![Inst::println(vec![Expr::string("hi")])]),
        );
        let text = program.to_json_pretty().unwrap();
        assert_eq!(Program::from_json(&text).unwrap(), program);
    }
}
