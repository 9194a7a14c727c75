//! Function AST (spec.md §3.4).

use crate::stmt::Stmt;
use crate::types::Type;
use vc_diag::Location;

#[derive(Debug, Clone)]
pub struct Param {
    /// `None` for an unnamed parameter in a prototype, e.g. `int f(int);`.
    pub name: Option<String>,
    pub ty: Type,
    pub is_restrict: bool,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub ret_type: Type,
    /// Tag name of the return type, when it is a `struct`/`union`, for
    /// aggregate-return lowering.
    pub ret_tag: Option<String>,
    pub params: Vec<Param>,
    pub is_variadic: bool,
    /// `None` for a prototype-only declaration (`int f(int);`).
    pub body: Option<Vec<Stmt>>,
    pub is_inline: bool,
    pub is_noreturn: bool,
    pub is_static: bool,
    pub loc: Location,
}

impl Function {
    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }
}
