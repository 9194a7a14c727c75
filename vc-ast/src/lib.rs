//! Tagged expression/statement/function AST nodes (spec.md §3, component C).
//!
//! Ownership follows plain Rust structure instead of the manual
//! tagged-union-with-raw-owning-pointers pattern spec.md §9 flags for
//! re-architecture: a parent node exclusively owns its children through
//! `Box`/`Vec`, `#[derive(Clone)]` gives a disjoint deep clone, and the
//! compiler-generated `Drop` is the recursive destructor. There is no
//! separate `free_expr`/`clone_expr` entry point to call — ordinary scope
//! exit and `.clone()` already have the right semantics.

pub mod expr;
pub mod func;
pub mod stmt;
pub mod types;

pub use expr::{BinaryOp, Designator, Expr, ExprKind, InitEntry, InitValue, OffsetofStep, TypeOrExpr, UnaryOp};
pub use func::{Function, Param};
pub use stmt::{EnumVariant, FieldDecl, Initializer, Qualifiers, Stmt, StorageClass, SwitchCase, VarDecl};
pub use types::{Type, TypeKind, WordSize};

/// A single translation unit: top-level declarations and definitions in
/// source order, the way the parser's top-level dispatcher (spec.md §4.2)
/// produces them.
#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    pub items: Vec<TopLevel>,
}

#[derive(Debug, Clone)]
pub enum TopLevel {
    Function(Function),
    GlobalVar(VarDecl),
    Stmt(Stmt),
}
