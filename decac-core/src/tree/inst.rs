use super::Expr;
use crate::tools::Location;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstKind {
    Expr(Expr),
    /// `print`, `println`, `printx`, `printlnx`
    Print {
        #[serde(default)]
        newline: bool,
        #[serde(default)]
        hex: bool,
        #[serde(default)]
        args: Vec<Expr>,
    },
    IfThenElse {
        condition: Expr,
        #[serde(default)]
        then_branch: Vec<Inst>,
        #[serde(default)]
        else_branch: Vec<Inst>,
    },
    While {
        condition: Expr,
        #[serde(default)]
        body: Vec<Inst>,
    },
    Return(Expr),
    NoOp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inst {
    pub kind: InstKind,
    #[serde(default)]
    pub location: Location,
}

impl Inst {
    pub fn new(kind: InstKind) -> Self {
        Inst {
            kind,
            location: Location::default(),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Location::new(line, column);
        self
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(InstKind::Expr(expr))
    }

    pub fn print(args: Vec<Expr>) -> Self {
        Self::new(InstKind::Print {
            newline: false,
            hex: false,
            args,
        })
    }

    pub fn println(args: Vec<Expr>) -> Self {
        Self::new(InstKind::Print {
            newline: true,
            hex: false,
            args,
        })
    }

    pub fn printx(args: Vec<Expr>) -> Self {
        Self::new(InstKind::Print {
            newline: false,
            hex: true,
            args,
        })
    }

    pub fn if_then_else(condition: Expr, then_branch: Vec<Inst>, else_branch: Vec<Inst>) -> Self {
        Self::new(InstKind::IfThenElse {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn while_loop(condition: Expr, body: Vec<Inst>) -> Self {
        Self::new(InstKind::While { condition, body })
    }

    pub fn ret(value: Expr) -> Self {
        Self::new(InstKind::Return(value))
    }

    /// Does every path through this instruction end in a `return`?
    pub fn always_returns(&self) -> bool {
        match &self.kind {
            InstKind::Return(_) => true,
            InstKind::IfThenElse {
                then_branch,
                else_branch,
                ..
            } => block_returns(then_branch) && block_returns(else_branch),
            _ => false,
        }
    }
}

pub(crate) fn block_returns(insts: &[Inst]) -> bool {
    insts.iter().any(Inst::always_returns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_returns() {
        let ret = Inst::ret(Expr::int(1));
        assert!(ret.always_returns());
        let half = Inst::if_then_else(Expr::boolean(true), vec![ret.clone()], vec![]);
        assert!(!half.always_returns());
        let both = Inst::if_then_else(Expr::boolean(true), vec![ret.clone()], vec![ret.clone()]);
        assert!(both.always_returns());
        let looped = Inst::while_loop(Expr::boolean(true), vec![ret]);
        assert!(!looped.always_returns());
    }
}
