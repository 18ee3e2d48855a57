use super::Ident;
use crate::context::Type;
use crate::tools::Location;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Plus,
    Minus,
    Mult,
    Divide,
    Modulo,
    Equals,
    NotEquals,
    Lower,
    LowerOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mult => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Lower => "<",
            BinaryOp::LowerOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Mult | BinaryOp::Divide | BinaryOp::Modulo
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOp::Lower | BinaryOp::LowerOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equals | BinaryOp::NotEquals)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Minus,
    Not,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    IntLiteral(i32),
    FloatLiteral(f32),
    BooleanLiteral(bool),
    StringLiteral(String),
    Null,
    This,
    ReadInt,
    ReadFloat,
    Identifier(Ident),
    Selection {
        receiver: Box<Expr>,
        field: Ident,
    },
    /// `receiver` is absent for an implicit `this.m(...)`
    MethodCall {
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        method: Ident,
        #[serde(default)]
        args: Vec<Expr>,
    },
    New(Ident),
    Cast {
        ty: Ident,
        expr: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: Ident,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// int → float promotion inserted by the verifier
    ConvFloat(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub location: Location,
    /// Filled in by verification
    #[serde(skip)]
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            location: Location::default(),
            ty: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Location::new(line, column);
        self
    }

    /// Type cached by verification; `Void` for undecorated nodes
    pub fn ty(&self) -> Type {
        self.ty.unwrap_or(Type::Void)
    }

    pub fn int(value: i32) -> Self {
        Self::new(ExprKind::IntLiteral(value))
    }

    pub fn float(value: f32) -> Self {
        Self::new(ExprKind::FloatLiteral(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(ExprKind::BooleanLiteral(value))
    }

    pub fn string(value: &str) -> Self {
        Self::new(ExprKind::StringLiteral(value.into()))
    }

    pub fn null() -> Self {
        Self::new(ExprKind::Null)
    }

    pub fn this() -> Self {
        Self::new(ExprKind::This)
    }

    pub fn read_int() -> Self {
        Self::new(ExprKind::ReadInt)
    }

    pub fn read_float() -> Self {
        Self::new(ExprKind::ReadFloat)
    }

    pub fn ident(name: &str) -> Self {
        Self::new(ExprKind::Identifier(Ident::new(name)))
    }

    pub fn select(receiver: Expr, field: &str) -> Self {
        Self::new(ExprKind::Selection {
            receiver: Box::new(receiver),
            field: Ident::new(field),
        })
    }

    pub fn call(receiver: Expr, method: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::MethodCall {
            receiver: Some(Box::new(receiver)),
            method: Ident::new(method),
            args,
        })
    }

    /// Call on the implicit `this`
    pub fn call_self(method: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::MethodCall {
            receiver: None,
            method: Ident::new(method),
            args,
        })
    }

    pub fn new_object(class: &str) -> Self {
        Self::new(ExprKind::New(Ident::new(class)))
    }

    pub fn cast(ty: &str, expr: Expr) -> Self {
        Self::new(ExprKind::Cast {
            ty: Ident::new(ty),
            expr: Box::new(expr),
        })
    }

    pub fn instance_of(expr: Expr, ty: &str) -> Self {
        Self::new(ExprKind::InstanceOf {
            expr: Box::new(expr),
            ty: Ident::new(ty),
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::new(ExprKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// Wrap `self` in an int → float conversion, in place
    pub fn convert_to_float(&mut self) {
        let location = self.location;
        let inner = std::mem::replace(self, Expr::null());
        *self = Expr {
            kind: ExprKind::ConvFloat(Box::new(inner)),
            location,
            ty: Some(Type::Float),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_float_keeps_location() {
        let mut expr = Expr::int(3).at(2, 5);
        expr.ty = Some(Type::Int);
        expr.convert_to_float();
        assert_eq!(expr.ty, Some(Type::Float));
        assert_eq!(expr.location, Location::new(2, 5));
        match &expr.kind {
            ExprKind::ConvFloat(inner) => assert_eq!(inner.kind, ExprKind::IntLiteral(3)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOp::Modulo.is_arithmetic());
        assert!(BinaryOp::GreaterOrEqual.is_ordering());
        assert!(BinaryOp::NotEquals.is_equality());
        assert!(BinaryOp::Or.is_logical());
        assert_eq!(BinaryOp::LowerOrEqual.symbol(), "<=");
    }
}
