//! Constant evaluator (spec.md §4.3, component E): pure recursive fold of
//! an AST subtree to a signed 64-bit value, plus `sizeof`/`_Alignof`/
//! `offsetof` resolution. Mirrors the shape of `cranelift-reader`'s
//! expression-folding helpers, generalized from hex-immediate parsing to
//! the C constant-expression grammar.

use failure_derive::Fail;
use vc_ast::{BinaryOp, Expr, ExprKind, OffsetofStep, Type, TypeKind, TypeOrExpr, UnaryOp, WordSize};
use vc_diag::Location;
use vc_symtab::{Symtabs, TagEntry, VarEntry};

/// What the constant evaluator needs from a symbol table: enum constant
/// and `const`-initialized variable lookup, plus tag layouts for
/// `offsetof`. Implemented directly by `vc_symtab::Symtabs`; `vc-sema`
/// implements it a second time over its own split table borrows so a
/// function body's constant folding never needs to reassemble a real
/// `Symtabs` out of its individually-borrowed fields.
pub trait SymbolSource {
    fn lookup_var(&self, name: &str) -> Option<&VarEntry>;
    fn lookup_enum_value(&self, name: &str) -> Option<i64>;
    fn tag(&self, name: &str) -> Option<&TagEntry>;
}

impl SymbolSource for Symtabs {
    fn lookup_var(&self, name: &str) -> Option<&VarEntry> {
        self.vars.lookup(name)
    }

    fn lookup_enum_value(&self, name: &str) -> Option<i64> {
        self.tags.values().find_map(|t| t.enum_values.get(name).copied())
    }

    fn tag(&self, name: &str) -> Option<&TagEntry> {
        self.tags.get(name)
    }
}

/// Failure kinds specific to constant folding (spec.md §4.3's "Overflow"
/// paragraph and §7's constant-expression-error kind).
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum ConstErrorKind {
    #[fail(display = "not a constant expression")]
    NotConstant,
    #[fail(display = "integer overflow in constant expression")]
    Overflow,
    #[fail(display = "division by zero in constant expression")]
    DivByZero,
    #[fail(display = "shift amount out of range")]
    BadShift,
    #[fail(display = "undeclared identifier in constant expression")]
    UndeclaredIdent,
    #[fail(display = "no such member")]
    NoSuchMember,
    #[fail(display = "{} is not a struct or union type", _0)]
    NotAnAggregate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Fail)]
#[fail(display = "{}", kind)]
pub struct ConstError {
    pub kind: ConstErrorKind,
    pub loc: Location,
}

impl ConstError {
    fn new(kind: ConstErrorKind, loc: Location) -> Self {
        ConstError { kind, loc }
    }
}

pub type CResult<T> = Result<T, ConstError>;

/// Everything the evaluator needs besides the expression itself: the
/// target word size (fixes `sizeof(ptr)`/`sizeof(long)`, spec.md §8
/// property 9) and the symbol tables (enum/const identifiers, tag
/// layouts for `offsetof`).
pub struct ConstCtx<'a> {
    pub word_size: WordSize,
    pub symtabs: &'a dyn SymbolSource,
}

impl<'a> ConstCtx<'a> {
    pub fn new(word_size: WordSize, symtabs: &'a dyn SymbolSource) -> Self {
        ConstCtx { word_size, symtabs }
    }
}

/// `sizeof` a type, honoring the target word size for `ptr`, `long`,
/// `ulong` (the three word-size-dependent types, spec.md §3.1/§8).
pub fn sizeof_type(ty: &Type, word_size: WordSize) -> u64 {
    match ty.kind {
        TypeKind::Ptr => word_size.ptr_size(),
        TypeKind::Long | TypeKind::ULong => word_size.long_size(),
        TypeKind::Array => ty.size,
        _ => ty.size,
    }
}

pub fn alignof_type(ty: &Type, word_size: WordSize) -> u64 {
    match ty.kind {
        TypeKind::Ptr => word_size.ptr_size(),
        _ => ty.align,
    }
}

/// Evaluate `expr` to a constant `i64`, per spec.md §4.3.
pub fn eval_const(expr: &Expr, ctx: &ConstCtx) -> CResult<i64> {
    match &expr.kind {
        ExprKind::IntLit { value, .. } => Ok(*value),
        ExprKind::CharLit { value, .. } => Ok(*value),
        ExprKind::FloatLit { .. } | ExprKind::StrLit { .. } | ExprKind::ComplexLit { .. } => {
            Err(ConstError::new(ConstErrorKind::NotConstant, expr.loc))
        }
        ExprKind::Ident(name) => eval_ident(name, expr.loc, ctx),
        ExprKind::Unary { op, operand } => eval_unary(*op, operand, expr.loc, ctx),
        ExprKind::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, expr.loc, ctx),
        ExprKind::Ternary { cond, then_expr, else_expr } => {
            if eval_const(cond, ctx)? != 0 {
                eval_const(then_expr, ctx)
            } else {
                eval_const(else_expr, ctx)
            }
        }
        ExprKind::Cast { expr: inner, .. } => eval_const(inner, ctx),
        ExprKind::Sizeof(toe) => eval_sizeof(toe, expr.loc, ctx),
        ExprKind::Alignof(toe) => eval_alignof(toe, expr.loc, ctx),
        ExprKind::Offsetof { ty, path } => eval_offsetof(ty, path, expr.loc, ctx),
        _ => Err(ConstError::new(ConstErrorKind::NotConstant, expr.loc)),
    }
}

fn eval_ident(name: &str, loc: Location, ctx: &ConstCtx) -> CResult<i64> {
    if let Some(v) = ctx.symtabs.lookup_enum_value(name) {
        return Ok(v);
    }
    if let Some(entry) = ctx.symtabs.lookup_var(name) {
        if let Some(k) = entry.const_value {
            return Ok(k);
        }
    }
    Err(ConstError::new(ConstErrorKind::UndeclaredIdent, loc))
}

fn eval_unary(op: UnaryOp, operand: &Expr, loc: Location, ctx: &ConstCtx) -> CResult<i64> {
    let v = eval_const(operand, ctx)?;
    match op {
        UnaryOp::Neg => v.checked_neg().ok_or_else(|| ConstError::new(ConstErrorKind::Overflow, loc)),
        UnaryOp::BitNot => Ok(!v),
        UnaryOp::LogNot => Ok((v == 0) as i64),
        _ => Err(ConstError::new(ConstErrorKind::NotConstant, loc)),
    }
}

fn eval_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, loc: Location, ctx: &ConstCtx) -> CResult<i64> {
    // Short-circuit evaluation still needs both sides to be constant
    // expressions in the ISO sense, but only one side need be *evaluated*.
    if op == BinaryOp::LogAnd {
        let l = eval_const(lhs, ctx)?;
        if l == 0 {
            return Ok(0);
        }
        return Ok((eval_const(rhs, ctx)? != 0) as i64);
    }
    if op == BinaryOp::LogOr {
        let l = eval_const(lhs, ctx)?;
        if l != 0 {
            return Ok(1);
        }
        return Ok((eval_const(rhs, ctx)? != 0) as i64);
    }

    let a = eval_const(lhs, ctx)?;
    let b = eval_const(rhs, ctx)?;
    let of = || ConstError::new(ConstErrorKind::Overflow, loc);
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(of),
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(of),
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(of),
        BinaryOp::Div => {
            if b == 0 {
                Err(ConstError::new(ConstErrorKind::DivByZero, loc))
            } else {
                a.checked_div(b).ok_or_else(of)
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err(ConstError::new(ConstErrorKind::DivByZero, loc))
            } else {
                a.checked_rem(b).ok_or_else(of)
            }
        }
        BinaryOp::Shl => {
            if !(0..64).contains(&b) {
                Err(ConstError::new(ConstErrorKind::BadShift, loc))
            } else {
                Ok(((a as i128) << b) as i64)
            }
        }
        BinaryOp::Shr => {
            if !(0..64).contains(&b) {
                Err(ConstError::new(ConstErrorKind::BadShift, loc))
            } else {
                Ok(a >> b)
            }
        }
        BinaryOp::BitAnd => Ok(a & b),
        BinaryOp::BitOr => Ok(a | b),
        BinaryOp::BitXor => Ok(a ^ b),
        BinaryOp::Eq => Ok((a == b) as i64),
        BinaryOp::Ne => Ok((a != b) as i64),
        BinaryOp::Lt => Ok((a < b) as i64),
        BinaryOp::Le => Ok((a <= b) as i64),
        BinaryOp::Gt => Ok((a > b) as i64),
        BinaryOp::Ge => Ok((a >= b) as i64),
        BinaryOp::LogAnd | BinaryOp::LogOr => unreachable!("handled above"),
    }
}

fn eval_sizeof(toe: &TypeOrExpr, loc: Location, ctx: &ConstCtx) -> CResult<i64> {
    match toe {
        TypeOrExpr::Type(ty) => Ok(sizeof_type(ty, ctx.word_size) as i64),
        TypeOrExpr::Expr(e) => {
            let ty = infer_type(e, ctx)?;
            Ok(sizeof_type(&ty, ctx.word_size) as i64)
        }
    }
}

fn eval_alignof(toe: &TypeOrExpr, loc: Location, ctx: &ConstCtx) -> CResult<i64> {
    match toe {
        TypeOrExpr::Type(ty) => Ok(alignof_type(ty, ctx.word_size) as i64),
        TypeOrExpr::Expr(e) => {
            let ty = infer_type(e, ctx)?;
            Ok(alignof_type(&ty, ctx.word_size) as i64)
        }
    }
    .map_err(|e: ConstError| ConstError::new(e.kind, loc))
}

fn eval_offsetof(ty: &Type, path: &[OffsetofStep], loc: Location, ctx: &ConstCtx) -> CResult<i64> {
    let tag_name = ty.tag.clone().ok_or_else(|| {
        ConstError::new(ConstErrorKind::NotAnAggregate(format!("{}", ty)), loc)
    })?;
    let mut tag = ctx
        .symtabs
        .tag(&tag_name)
        .ok_or_else(|| ConstError::new(ConstErrorKind::NotAnAggregate(tag_name.clone()), loc))?;
    let mut offset: u64 = 0;
    for (i, step) in path.iter().enumerate() {
        match step {
            OffsetofStep::Field(name) => {
                let member = tag
                    .member(name)
                    .ok_or_else(|| ConstError::new(ConstErrorKind::NoSuchMember, loc))?;
                offset += member.byte_offset;
                if i + 1 < path.len() {
                    let next_tag = member
                        .ty
                        .tag
                        .as_ref()
                        .and_then(|t| ctx.symtabs.tag(t));
                    tag = next_tag
                        .ok_or_else(|| ConstError::new(ConstErrorKind::NotAnAggregate(name.clone()), loc))?;
                }
            }
            OffsetofStep::Index(idx) => {
                // Only meaningful as the final step of an array member;
                // walk the last member's element size.
                offset += idx * tag.members.last().map(|m| m.elem_size).unwrap_or(0);
            }
        }
    }
    Ok(offset as i64)
}

/// Minimal static type inference used only to resolve `sizeof expr` /
/// `_Alignof expr` (spec.md §4.3: "evaluates operand type only" — the
/// expression itself is never evaluated). This is deliberately not a full
/// type checker; `vc-sema` owns that for expressions used as values.
pub fn infer_type(expr: &Expr, ctx: &ConstCtx) -> CResult<Type> {
    match &expr.kind {
        ExprKind::IntLit { is_unsigned, long_count, .. } => {
            let kind = match (*is_unsigned, *long_count) {
                (false, 0) => TypeKind::Int,
                (true, 0) => TypeKind::UInt,
                (false, _) => TypeKind::Long,
                (true, _) => TypeKind::ULong,
            };
            let size = if matches!(kind, TypeKind::Int | TypeKind::UInt) { 4 } else { ctx.word_size.long_size() };
            Ok(Type::basic(kind, size, size))
        }
        ExprKind::FloatLit { is_float, .. } => Ok(if *is_float {
            Type::basic(TypeKind::Float, 4, 4)
        } else {
            Type::basic(TypeKind::Double, 8, 8)
        }),
        ExprKind::CharLit { .. } => Ok(Type::basic(TypeKind::Char, 1, 1)),
        ExprKind::StrLit { bytes, .. } => Ok(Type::array_of(
            Type::basic(TypeKind::Char, 1, 1),
            Some(bytes.len() as u64 + 1),
        )),
        ExprKind::Ident(name) => ctx
            .symtabs
            .lookup_var(name)
            .map(|v| v.ty.clone())
            .ok_or_else(|| ConstError::new(ConstErrorKind::UndeclaredIdent, expr.loc)),
        ExprKind::Cast { ty, .. } => Ok(ty.clone()),
        ExprKind::Unary { op: UnaryOp::Deref, operand } => {
            let t = infer_type(operand, ctx)?;
            t.elem_type()
                .cloned()
                .ok_or_else(|| ConstError::new(ConstErrorKind::NotConstant, expr.loc))
        }
        ExprKind::Unary { op: UnaryOp::AddrOf, operand } => {
            let t = infer_type(operand, ctx)?;
            Ok(Type::ptr_to(t, ctx.word_size.ptr_size()))
        }
        ExprKind::Index { base, .. } => {
            let t = infer_type(base, ctx)?;
            t.elem_type()
                .cloned()
                .ok_or_else(|| ConstError::new(ConstErrorKind::NotConstant, expr.loc))
        }
        ExprKind::Member { base, field, .. } => {
            let t = infer_type(base, ctx)?;
            let tag_name = t.tag.clone().ok_or_else(|| {
                ConstError::new(ConstErrorKind::NotAnAggregate(format!("{}", t)), expr.loc)
            })?;
            let tag = ctx
                .symtabs
                .tag(&tag_name)
                .ok_or_else(|| ConstError::new(ConstErrorKind::NotAnAggregate(tag_name.clone()), expr.loc))?;
            tag.member(field)
                .map(|m| m.ty.clone())
                .ok_or_else(|| ConstError::new(ConstErrorKind::NoSuchMember, expr.loc))
        }
        ExprKind::Binary { lhs, .. } => infer_type(lhs, ctx),
        _ => Err(ConstError::new(ConstErrorKind::NotConstant, expr.loc)),
    }
}

/// Evaluate `expr` requiring a strictly positive result shorthand used by
/// array-size and bit-field-width constant folding in `vc-sema`.
pub fn eval_const_u64(expr: &Expr, ctx: &ConstCtx) -> CResult<u64> {
    let v = eval_const(expr, ctx)?;
    if v < 0 {
        Err(ConstError::new(ConstErrorKind::Overflow, expr.loc))
    } else {
        Ok(v as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::{ExprKind, TypeKind};
    use vc_diag::Location;

    fn ctx(symtabs: &Symtabs) -> ConstCtx {
        ConstCtx::new(WordSize::W64, symtabs)
    }

    fn int(v: i64) -> Expr {
        Expr::new(ExprKind::IntLit { value: v, is_unsigned: false, long_count: 0 }, Location::new(1, 1))
    }

    #[test]
    fn folds_simple_arithmetic() {
        let symtabs = Symtabs::new();
        let e = Expr::new(
            ExprKind::Binary { op: BinaryOp::Add, lhs: Box::new(int(2)), rhs: Box::new(Expr::new(
                ExprKind::Binary { op: BinaryOp::Mul, lhs: Box::new(int(3)), rhs: Box::new(int(4)) },
                Location::new(1, 1),
            )) },
            Location::new(1, 1),
        );
        assert_eq!(eval_const(&e, &ctx(&symtabs)).unwrap(), 14);
    }

    #[test]
    fn detects_add_overflow() {
        let symtabs = Symtabs::new();
        let e = Expr::new(
            ExprKind::Binary { op: BinaryOp::Add, lhs: Box::new(int(i64::MAX)), rhs: Box::new(int(1)) },
            Location::new(1, 1),
        );
        assert_eq!(eval_const(&e, &ctx(&symtabs)).unwrap_err().kind, ConstErrorKind::Overflow);
    }

    #[test]
    fn detects_negation_overflow() {
        let symtabs = Symtabs::new();
        let e = Expr::new(
            ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(int(i64::MIN)) },
            Location::new(1, 1),
        );
        assert_eq!(eval_const(&e, &ctx(&symtabs)).unwrap_err().kind, ConstErrorKind::Overflow);
    }

    #[test]
    fn sizeof_ptr_tracks_word_size() {
        let symtabs = Symtabs::new();
        let e = Expr::new(ExprKind::Sizeof(TypeOrExpr::Type(Type::ptr_to(Type::void(), 8))), Location::new(1, 1));
        let c32 = ConstCtx::new(WordSize::W32, &symtabs);
        let c64 = ConstCtx::new(WordSize::W64, &symtabs);
        assert_eq!(eval_const(&e, &c64).unwrap(), 8);
        assert_eq!(eval_const(&e, &c32).unwrap(), 4);
        let _ = TypeKind::Ptr;
    }

    #[test]
    fn offsetof_struct_s_b() {
        let mut symtabs = Symtabs::new();
        let int_ty = Type::basic(TypeKind::Int, 4, 4);
        let char_ty = Type::basic(TypeKind::Char, 1, 1);
        symtabs.tags.insert(
            "S".to_string(),
            vc_symtab::TagEntry {
                kind: vc_symtab::TagKind::Struct,
                size: 8,
                align: 4,
                members: vec![
                    vc_symtab::FieldLayout { name: "a".into(), ty: int_ty, elem_size: 4, byte_offset: 0, bit_width: None, bit_offset: None },
                    vc_symtab::FieldLayout { name: "b".into(), ty: char_ty, elem_size: 1, byte_offset: 4, bit_width: None, bit_offset: None },
                ],
                is_flexible: false,
                enum_values: Default::default(),
            },
        );
        let mut s_ty = Type::basic(TypeKind::Struct, 8, 4);
        s_ty.tag = Some("S".into());
        let e = Expr::new(
            ExprKind::Offsetof { ty: s_ty, path: vec![OffsetofStep::Field("b".into())] },
            Location::new(1, 1),
        );
        assert_eq!(eval_const(&e, &ctx(&symtabs)).unwrap(), 4);
    }
}
