//! Statement AST (spec.md §3.3).

use crate::expr::{Expr, InitEntry};
use crate::types::Type;
use vc_diag::Location;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageClass {
    pub is_static: bool,
    pub is_register: bool,
    pub is_extern: bool,
    pub is_typedef: bool,
    pub is_inline: bool,
    pub is_noreturn: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

/// Either a plain scalar initializer or a designated-initializer list
/// (spec.md §3.3's initializer-entry grammar).
#[derive(Debug, Clone)]
pub enum Initializer {
    Scalar(Expr),
    List(Vec<InitEntry>),
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub storage: StorageClass,
    pub qualifiers: Qualifiers,
    pub init: Option<Initializer>,
    /// Explicit `_Alignas(expr)`, if present.
    pub alignas: Option<Expr>,
    /// Array-size expression for a declarator like `int a[n]`; may be a
    /// non-constant expression for a VLA-style declaration, in which case
    /// `vc-sema` lowers it to an `alloca` of the evaluated size rather
    /// than a fixed stack slot.
    pub array_size_expr: Option<Expr>,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Must be an integer constant expression (spec.md §4.4); enforced by
    /// `vc-sema`, not the parser, since it requires the constant evaluator.
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Option<String>,
    pub ty: Type,
    pub bit_width: Option<Expr>,
    pub is_flexible_array: bool,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Return(Option<Expr>),
    VarDecl(VarDecl),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    Break,
    Continue,
    Label {
        name: String,
        stmt: Box<Stmt>,
    },
    Goto(String),
    StaticAssert {
        cond: Expr,
        message: Option<String>,
    },
    Typedef {
        name: String,
        ty: Type,
    },
    EnumDecl {
        tag: Option<String>,
        variants: Vec<EnumVariant>,
    },
    StructDecl {
        tag: Option<String>,
        fields: Vec<FieldDecl>,
    },
    UnionDecl {
        tag: Option<String>,
        fields: Vec<FieldDecl>,
    },
    Block(Vec<Stmt>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_disjoint_on_block() {
        let original = Stmt::Block(vec![Stmt::Break, Stmt::Continue]);
        let mut clone = original.clone();
        if let Stmt::Block(stmts) = &mut clone {
            stmts.push(Stmt::Break);
        }
        if let Stmt::Block(stmts) = &original {
            assert_eq!(stmts.len(), 2);
        } else {
            panic!();
        }
    }
}
