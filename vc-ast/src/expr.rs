//! Expression AST (spec.md §3.2).
//!
//! Every node carries `(line, column)`. A parent node exclusively owns its
//! children through `Box`/`Vec`; `#[derive(Clone)]` gives a disjoint deep
//! clone and the compiler-generated `Drop` gives the recursive free that
//! spec.md's design notes (§9) call out as the natural replacement for a
//! hand-written tagged-union destructor.

use crate::types::Type;
use vc_diag::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    BitNot,
    LogNot,
    Deref,
    AddrOf,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogAnd,
    LogOr,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::LogAnd | BinaryOp::LogOr)
    }
}

/// `sizeof`/`_Alignof`/a compound literal's type operand: either a bare
/// type name or an expression whose type is evaluated without evaluating
/// the expression itself.
#[derive(Debug, Clone)]
pub enum TypeOrExpr {
    Type(Type),
    Expr(Box<Expr>),
}

/// One step of an `offsetof` member-designator path: `offsetof(S, a.b[2])`
/// walks `Field("a")`, `Field("b")`, `Index(2)`.
#[derive(Debug, Clone)]
pub enum OffsetofStep {
    Field(String),
    Index(u64),
}

/// A designated or positional initializer-list entry (spec.md §3.3).
#[derive(Debug, Clone)]
pub enum Designator {
    Field(String),
    Index(Expr),
}

#[derive(Debug, Clone)]
pub struct InitEntry {
    pub designator: Option<Designator>,
    pub value: InitValue,
}

#[derive(Debug, Clone)]
pub enum InitValue {
    Scalar(Expr),
    List(Vec<InitEntry>),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Location,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Location) -> Self {
        Expr { kind, loc }
    }

    /// `true` for the expression kinds the grammar accepts as an
    /// assignment/compound-assignment/`&`/`++`/`--` target.
    pub fn is_lvalue_kind(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident(_) | ExprKind::Index { .. } | ExprKind::Member { .. } | ExprKind::Unary {
                op: UnaryOp::Deref,
                ..
            }
        )
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit {
        value: i64,
        is_unsigned: bool,
        long_count: u8,
    },
    FloatLit {
        value: f64,
        is_float: bool,
    },
    StrLit {
        bytes: Vec<u8>,
        wide: bool,
    },
    CharLit {
        value: i64,
        wide: bool,
    },
    ComplexLit {
        real: f64,
        imag: f64,
    },
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// Plain `=`.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `+=`, `-=`, ... desugars here rather than to a cloned
    /// `target = target op rhs` tree (spec.md §9's design note on
    /// clone-then-free): the target sub-expression appears exactly once,
    /// and `vc-sema` evaluates its address a single time for both the
    /// load and the store.
    CompoundAssign {
        op: BinaryOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        field: String,
        arrow: bool,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Cast {
        ty: Type,
        expr: Box<Expr>,
    },
    Sizeof(TypeOrExpr),
    Alignof(TypeOrExpr),
    Offsetof {
        ty: Type,
        path: Vec<OffsetofStep>,
    },
    CompoundLiteral {
        ty: Type,
        init: Vec<InitEntry>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn ident(name: &str) -> Expr {
        Expr::new(ExprKind::Ident(name.into()), Location::new(1, 1))
    }

    #[test]
    fn clone_is_disjoint() {
        let mut original = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(ident("a")),
                rhs: Box::new(ident("b")),
            },
            Location::new(1, 1),
        );
        let clone = original.clone();
        if let ExprKind::Binary { lhs, .. } = &mut original.kind {
            if let ExprKind::Ident(name) = &mut lhs.kind {
                name.push('!');
            }
        }
        if let ExprKind::Binary { lhs, .. } = &clone.kind {
            if let ExprKind::Ident(name) = &lhs.kind {
                assert_eq!(name, "a");
            } else {
                panic!("expected ident");
            }
        } else {
            panic!("expected binary");
        }
    }

    #[test]
    fn lvalue_kinds() {
        assert!(ident("x").is_lvalue_kind());
        let call = Expr::new(
            ExprKind::Call {
                callee: "f".into(),
                args: vec![],
            },
            Location::new(1, 1),
        );
        assert!(!call.is_lvalue_kind());
        let _ = Type::void();
    }
}
