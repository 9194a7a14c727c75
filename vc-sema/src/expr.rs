//! Expression lowering to IR value ids (spec.md §4.4's "Expression
//! lowering" contract): address-of an identifier yields `addr`; an
//! lvalue read yields `load`/`load_idx`/`load_ptr`; assignment evaluates
//! the rhs then emits the matching `store`.
//!
//! `LValue` is the one seam every assignable expression kind (`Ident`,
//! `*p`, `a[i]`, `s.field`, `p->field`) lowers through on its way to a
//! load or a store, so compound assignment and `++`/`--` can compute the
//! address once and reuse it for both halves (spec.md §4.4's compound-
//! assignment contract) instead of re-lowering the target expression.

use crate::{LowerCtx, SResult};
use vc_ast::{BinaryOp, Expr, ExprKind, InitValue, OffsetofStep, Type, TypeKind, TypeOrExpr, UnaryOp};
use vc_diag::{DiagnosticKind, Location};
use vc_ir::{Opcode, ValueId};

enum LValue {
    /// A plain named memory location: a variable, or `base+offset` for a
    /// struct member chain rooted at one (the same name-based addressing
    /// `vc-sema`'s global-aggregate lowering already uses).
    Named { name: String, ty: Type, alias: u32 },
    /// Addressed through a computed pointer value (`*p`, `p->field`).
    Ptr { ptr: ValueId, ty: Type, alias: u32 },
    /// `base[index]`, addressed by a base pointer value plus an unscaled
    /// element index (the emitter scales by `sizeof(elem)`).
    Indexed { base: ValueId, index: ValueId, ty: Type, alias: u32 },
    /// A bit-field member, keyed by the same name convention as `Named`.
    Bitfield { name: String, bit_offset: u32, bit_width: u32, ty: Type, alias: u32 },
}

pub fn lower_expr(ctx: &mut LowerCtx, e: &Expr) -> SResult<ValueId> {
    match &e.kind {
        ExprKind::IntLit { value, is_unsigned, long_count } => {
            let ty = int_lit_type(*is_unsigned, *long_count, ctx);
            Ok(ctx.builder.emit_const_int(*value, ty))
        }
        ExprKind::CharLit { value, .. } => Ok(ctx.builder.emit_const_int(*value, Type::basic(TypeKind::Char, 1, 1))),
        ExprKind::FloatLit { value, is_float } => {
            let ty = if *is_float { Type::basic(TypeKind::Float, 4, 4) } else { Type::basic(TypeKind::Double, 8, 8) };
            let bits = if *is_float { (*value as f32).to_bits() as u64 } else { value.to_bits() };
            Ok(ctx.builder.emit_const_float(bits, ty))
        }
        ExprKind::StrLit { bytes, .. } => {
            let label = ctx.builder.new_label("str");
            let ptr_ty = Type::ptr_to(Type::basic(TypeKind::Char, 1, 1), ctx.word_size.ptr_size());
            Ok(ctx.builder.emit_string_literal(&label, bytes, ptr_ty))
        }
        // No IR value can carry a real and an imaginary lane together
        // (every `vc-ir` constant is one scalar), so there is no value
        // this arm could return that arithmetic on it would compute
        // correctly. Reporting failure here, rather than folding the two
        // halves into one bit pattern, keeps an unsupported feature from
        // masquerading as a wrong answer.
        ExprKind::ComplexLit { .. } => Err(ctx.err(
            DiagnosticKind::Semantic,
            e.loc,
            "_Complex arithmetic is not supported",
        )),
        ExprKind::Ident(name) => lower_ident_load(ctx, name, e.loc),
        ExprKind::Unary { op, operand } => lower_unary(ctx, *op, operand, e.loc),
        ExprKind::Binary { op, lhs, rhs } => lower_binary(ctx, *op, lhs, rhs, e.loc),
        ExprKind::Ternary { cond, then_expr, else_expr } => lower_ternary(ctx, cond, then_expr, else_expr),
        ExprKind::Assign { target, value } => lower_assign(ctx, target, value),
        ExprKind::CompoundAssign { op, target, value } => lower_compound_assign(ctx, *op, target, value),
        ExprKind::Index { base, index } => lower_index_load(ctx, base, index),
        ExprKind::Member { base, field, arrow } => lower_member_load(ctx, base, field, *arrow, e.loc),
        ExprKind::Call { callee, args } => lower_call(ctx, callee, args),
        ExprKind::Cast { ty, expr } => lower_cast(ctx, ty, expr),
        ExprKind::Sizeof(toe) => lower_sizeof_like(ctx, toe, true),
        ExprKind::Alignof(toe) => lower_sizeof_like(ctx, toe, false),
        ExprKind::Offsetof { ty, path } => lower_offsetof(ctx, ty, path, e.loc),
        ExprKind::CompoundLiteral { ty, init } => lower_compound_literal(ctx, ty, init),
    }
}

/// Static type of an expression, used to pick promotion/coercion and
/// pointer-arithmetic rules without re-lowering it. Delegates to
/// `vc-const`'s operand-type inference for the leaf cases it already
/// covers and fills in the rest (assignment, call, ternary) locally.
fn expr_type(ctx: &LowerCtx, e: &Expr) -> SResult<Type> {
    match &e.kind {
        ExprKind::Assign { target, .. } | ExprKind::CompoundAssign { target, .. } => expr_type(ctx, target),
        ExprKind::Ternary { then_expr, .. } => expr_type(ctx, then_expr),
        ExprKind::Call { callee, .. } => Ok(ctx
            .funcs
            .lookup(callee)
            .map(|f| f.ret_type.clone())
            .unwrap_or_else(|| Type::basic(TypeKind::Int, 4, 4))),
        ExprKind::Binary { op, .. } if op.is_comparison() || op.is_short_circuit() => {
            Ok(Type::basic(TypeKind::Int, 4, 4))
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lt = expr_type(ctx, lhs)?;
            let rt = expr_type(ctx, rhs)?;
            Ok(binary_result_type(*op, lt, rt))
        }
        _ => {
            let view = ctx.const_view();
            vc_const::infer_type(e, &vc_const::ConstCtx::new(ctx.word_size, &view)).map_err(|err| ctx.const_err(err))
        }
    }
}

fn binary_result_type(op: BinaryOp, lt: Type, rt: Type) -> Type {
    if matches!(op, BinaryOp::Add | BinaryOp::Sub) && lt.is_pointer_like() {
        return lt;
    }
    if op == BinaryOp::Add && rt.is_pointer_like() {
        return rt;
    }
    if op == BinaryOp::Sub && lt.is_pointer_like() && rt.is_pointer_like() {
        return Type::basic(TypeKind::Long, lt.size.max(rt.size), lt.align.max(rt.align));
    }
    if lt.kind.is_float() || rt.kind.is_float() {
        return if lt.kind.is_float() && (!rt.kind.is_float() || lt.size >= rt.size) { lt } else { rt };
    }
    if lt.size >= rt.size {
        lt
    } else {
        rt
    }
}

fn int_lit_type(is_unsigned: bool, long_count: u8, ctx: &LowerCtx) -> Type {
    match (is_unsigned, long_count) {
        (false, 0) => Type::basic(TypeKind::Int, 4, 4),
        (true, 0) => Type::basic(TypeKind::UInt, 4, 4),
        (false, _) => Type::basic(TypeKind::Long, ctx.word_size.long_size(), ctx.word_size.long_size()),
        (true, _) => Type::basic(TypeKind::ULong, ctx.word_size.long_size(), ctx.word_size.long_size()),
    }
}

fn binop_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Shl => Opcode::Shl,
        BinaryOp::Shr => Opcode::Shr,
        BinaryOp::BitAnd => Opcode::BitAnd,
        BinaryOp::BitOr => Opcode::BitOr,
        BinaryOp::BitXor => Opcode::BitXor,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            unreachable!("comparisons lower through cmp_opcode")
        }
        BinaryOp::LogAnd | BinaryOp::LogOr => unreachable!("short-circuit ops lower through lower_short_circuit"),
    }
}

fn cmp_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Eq => Opcode::CmpEq,
        BinaryOp::Ne => Opcode::CmpNe,
        BinaryOp::Lt => Opcode::CmpLt,
        BinaryOp::Le => Opcode::CmpLe,
        BinaryOp::Gt => Opcode::CmpGt,
        BinaryOp::Ge => Opcode::CmpGe,
        _ => unreachable!("non-comparison op"),
    }
}

/// Coerce `value` to `target`'s type with a `cast` if its current type
/// doesn't already match.
pub(crate) fn coerce(ctx: &mut LowerCtx, value: ValueId, target: &Type) -> ValueId {
    let src_ty = ctx.builder.value_type(value);
    if src_ty.kind == target.kind && src_ty.size == target.size {
        return value;
    }
    ctx.builder.emit_cast(value, src_ty.kind, target.clone())
}

fn lower_ident_load(ctx: &mut LowerCtx, name: &str, loc: Location) -> SResult<ValueId> {
    let entry = ctx
        .vars
        .lookup(name)
        .cloned()
        .ok_or_else(|| ctx.err(DiagnosticKind::NameResolution, loc, format!("undeclared identifier '{}'", name)))?;
    let alias = ctx.builder.alias_set_for(&entry.ir_name, entry.ty.is_restrict);
    if entry.ty.kind == TypeKind::Array {
        // An array used as an rvalue decays to a pointer to its first element.
        let elem = entry.ty.elem_type().cloned().unwrap_or_else(Type::void);
        let ptr_ty = Type::ptr_to(elem, ctx.word_size.ptr_size());
        return Ok(ctx.builder.emit_addr(&entry.ir_name, ptr_ty, alias));
    }
    let is_volatile = entry.ty.is_volatile;
    Ok(ctx.builder.emit_load(&entry.ir_name, entry.ty, alias, is_volatile))
}

/// Resolve `base` to a pointer value addressing its first element, for
/// `Index` lowering: a named array decays via `addr`, a pointer-typed
/// value (variable or arbitrary expression) is used directly.
fn lower_array_base(ctx: &mut LowerCtx, base: &Expr) -> SResult<(ValueId, Type, u32)> {
    if let ExprKind::Ident(name) = &base.kind {
        if let Some(entry) = ctx.vars.lookup(name).cloned() {
            let alias = ctx.builder.alias_set_for(&entry.ir_name, entry.ty.is_restrict);
            if entry.ty.kind == TypeKind::Array {
                let elem = entry.ty.elem_type().cloned().unwrap_or_else(Type::void);
                let ptr_ty = Type::ptr_to(elem.clone(), ctx.word_size.ptr_size());
                let ptr = ctx.builder.emit_addr(&entry.ir_name, ptr_ty, alias);
                return Ok((ptr, elem, alias));
            }
        }
    }
    let v = lower_expr(ctx, base)?;
    let ty = ctx.builder.value_type(v);
    let elem = ty.elem_type().cloned().unwrap_or_else(Type::void);
    Ok((v, elem, 0))
}

fn lower_index_load(ctx: &mut LowerCtx, base: &Expr, index: &Expr) -> SResult<ValueId> {
    let (base_ptr, elem_ty, alias) = lower_array_base(ctx, base)?;
    let idx = lower_expr(ctx, index)?;
    Ok(ctx.builder.emit_load_idx(base_ptr, idx, elem_ty, alias))
}

fn lower_member_load(ctx: &mut LowerCtx, base: &Expr, field: &str, arrow: bool, loc: Location) -> SResult<ValueId> {
    let lv = lower_member_lvalue(ctx, base, field, arrow, loc)?;
    Ok(load_lvalue(ctx, &lv))
}

fn lower_member_lvalue(ctx: &mut LowerCtx, base: &Expr, field: &str, arrow: bool, loc: Location) -> SResult<LValue> {
    let not_aggregate = |ctx: &LowerCtx, loc: Location| ctx.err(DiagnosticKind::Semantic, loc, "member access on a non-aggregate value");
    let no_member = |ctx: &LowerCtx, loc: Location, field: &str| {
        ctx.err(DiagnosticKind::NameResolution, loc, format!("no member named '{}'", field))
    };

    if arrow {
        let ptr = lower_expr(ctx, base)?;
        let pty = ctx.builder.value_type(ptr);
        let struct_ty = pty.elem_type().cloned().ok_or_else(|| not_aggregate(ctx, loc))?;
        let tag_name = struct_ty.tag.clone().ok_or_else(|| not_aggregate(ctx, loc))?;
        let member = ctx
            .tags
            .get(&tag_name)
            .and_then(|t| t.member(field))
            .cloned()
            .ok_or_else(|| no_member(ctx, loc, field))?;
        let off_ty = Type::basic(TypeKind::Long, ctx.word_size.long_size(), ctx.word_size.long_size());
        let member_ptr = if member.byte_offset == 0 {
            ptr
        } else {
            let off = ctx.builder.emit_const_int(member.byte_offset as i64, off_ty);
            ctx.builder.emit_binary(Opcode::Add, ptr, off, pty)
        };
        if let (Some(bw), Some(bo)) = (member.bit_width, member.bit_offset) {
            return Ok(LValue::Bitfield { name: format!(".bf{}", member_ptr.0), bit_offset: bo, bit_width: bw, ty: member.ty, alias: 0 });
        }
        return Ok(LValue::Ptr { ptr: member_ptr, ty: member.ty, alias: 0 });
    }

    if let ExprKind::Ident(name) = &base.kind {
        if let Some(entry) = ctx.vars.lookup(name).cloned() {
            let tag_name = entry.ty.tag.clone().ok_or_else(|| not_aggregate(ctx, loc))?;
            let member = ctx
                .tags
                .get(&tag_name)
                .and_then(|t| t.member(field))
                .cloned()
                .ok_or_else(|| no_member(ctx, loc, field))?;
            let alias = ctx.builder.alias_set_for(&entry.ir_name, entry.ty.is_restrict);
            let leaf = format!("{}+{}", entry.ir_name, member.byte_offset);
            if let (Some(bw), Some(bo)) = (member.bit_width, member.bit_offset) {
                return Ok(LValue::Bitfield { name: leaf, bit_offset: bo, bit_width: bw, ty: member.ty, alias });
            }
            return Ok(LValue::Named { name: leaf, ty: member.ty, alias });
        }
    }

    // Fall back to a general lvalue (nested member, `(*p).field`, ...) and
    // chase it through a computed pointer instead of name concatenation.
    let base_lv = lower_lvalue(ctx, base)?;
    match base_lv {
        LValue::Named { name, ty, alias } => {
            let tag_name = ty.tag.clone().ok_or_else(|| not_aggregate(ctx, loc))?;
            let member = ctx
                .tags
                .get(&tag_name)
                .and_then(|t| t.member(field))
                .cloned()
                .ok_or_else(|| no_member(ctx, loc, field))?;
            let leaf = format!("{}+{}", name, member.byte_offset);
            if let (Some(bw), Some(bo)) = (member.bit_width, member.bit_offset) {
                return Ok(LValue::Bitfield { name: leaf, bit_offset: bo, bit_width: bw, ty: member.ty, alias });
            }
            Ok(LValue::Named { name: leaf, ty: member.ty, alias })
        }
        LValue::Ptr { ptr, ty, alias } => {
            let tag_name = ty.tag.clone().ok_or_else(|| not_aggregate(ctx, loc))?;
            let member = ctx
                .tags
                .get(&tag_name)
                .and_then(|t| t.member(field))
                .cloned()
                .ok_or_else(|| no_member(ctx, loc, field))?;
            let off_ty = Type::basic(TypeKind::Long, ctx.word_size.long_size(), ctx.word_size.long_size());
            let off = ctx.builder.emit_const_int(member.byte_offset as i64, off_ty);
            let ptr_ty = Type::ptr_to(member.ty.clone(), ctx.word_size.ptr_size());
            let member_ptr = ctx.builder.emit_binary(Opcode::Add, ptr, off, ptr_ty);
            Ok(LValue::Ptr { ptr: member_ptr, ty: member.ty, alias })
        }
        LValue::Indexed { .. } | LValue::Bitfield { .. } => Err(not_aggregate(ctx, loc)),
    }
}

fn lower_lvalue(ctx: &mut LowerCtx, e: &Expr) -> SResult<LValue> {
    match &e.kind {
        ExprKind::Ident(name) => {
            let entry = ctx
                .vars
                .lookup(name)
                .cloned()
                .ok_or_else(|| ctx.err(DiagnosticKind::NameResolution, e.loc, format!("undeclared identifier '{}'", name)))?;
            let alias = ctx.builder.alias_set_for(&entry.ir_name, entry.ty.is_restrict);
            Ok(LValue::Named { name: entry.ir_name.clone(), ty: entry.ty, alias })
        }
        ExprKind::Unary { op: UnaryOp::Deref, operand } => {
            let ptr = lower_expr(ctx, operand)?;
            let pty = ctx.builder.value_type(ptr);
            let elem = pty.elem_type().cloned().unwrap_or_else(Type::void);
            Ok(LValue::Ptr { ptr, ty: elem, alias: 0 })
        }
        ExprKind::Index { base, index } => {
            let (base_ptr, elem_ty, alias) = lower_array_base(ctx, base)?;
            let idx = lower_expr(ctx, index)?;
            Ok(LValue::Indexed { base: base_ptr, index: idx, ty: elem_ty, alias })
        }
        ExprKind::Member { base, field, arrow } => lower_member_lvalue(ctx, base, field, *arrow, e.loc),
        _ => Err(ctx.err(DiagnosticKind::Semantic, e.loc, "expression is not assignable")),
    }
}

fn load_lvalue(ctx: &mut LowerCtx, lv: &LValue) -> ValueId {
    match lv {
        LValue::Named { name, ty, alias } => ctx.builder.emit_load(name, ty.clone(), *alias, ty.is_volatile),
        LValue::Ptr { ptr, ty, alias } => ctx.builder.emit_load_ptr(*ptr, ty.clone(), *alias, ty.is_volatile),
        LValue::Indexed { base, index, ty, alias } => ctx.builder.emit_load_idx(*base, *index, ty.clone(), *alias),
        LValue::Bitfield { name, bit_offset, bit_width, ty, alias } => {
            ctx.builder.emit_load_bitfield(name, *bit_offset, *bit_width, ty.clone(), *alias)
        }
    }
}

fn store_lvalue(ctx: &mut LowerCtx, lv: &LValue, value: ValueId) {
    match lv {
        LValue::Named { name, ty, alias } => ctx.builder.emit_store(name, value, ty.clone(), *alias, ty.is_volatile),
        LValue::Ptr { ptr, ty, alias } => ctx.builder.emit_store_ptr(*ptr, value, ty.clone(), *alias, ty.is_volatile),
        LValue::Indexed { base, index, ty, alias } => {
            ctx.builder.emit_store_idx(*base, *index, value, ty.clone(), *alias);
        }
        LValue::Bitfield { name, bit_offset, bit_width, ty, alias } => {
            ctx.builder.emit_store_bitfield(name, value, *bit_offset, *bit_width, ty.clone(), *alias)
        }
    }
}

fn addr_of_lvalue(ctx: &mut LowerCtx, lv: &LValue, loc: Location) -> SResult<ValueId> {
    match lv {
        LValue::Named { name, ty, alias } => {
            let ptr_ty = Type::ptr_to(ty.clone(), ctx.word_size.ptr_size());
            Ok(ctx.builder.emit_addr(name, ptr_ty, *alias))
        }
        LValue::Ptr { ptr, .. } => Ok(*ptr),
        LValue::Indexed { base, index, ty, .. } => {
            let ptr_ty = Type::ptr_to(ty.clone(), ctx.word_size.ptr_size());
            Ok(ctx.builder.emit_binary(Opcode::PtrAdd, *base, *index, ptr_ty))
        }
        LValue::Bitfield { .. } => Err(ctx.err(DiagnosticKind::Semantic, loc, "cannot take the address of a bit-field")),
    }
}

fn lvalue_type(lv: &LValue) -> Type {
    match lv {
        LValue::Named { ty, .. } | LValue::Ptr { ty, .. } | LValue::Indexed { ty, .. } | LValue::Bitfield { ty, .. } => ty.clone(),
    }
}

fn lower_unary(ctx: &mut LowerCtx, op: UnaryOp, operand: &Expr, loc: Location) -> SResult<ValueId> {
    match op {
        UnaryOp::Neg => {
            let v = lower_expr(ctx, operand)?;
            let ty = ctx.builder.value_type(v);
            Ok(ctx.builder.emit_unary(Opcode::Neg, v, ty))
        }
        UnaryOp::BitNot => {
            let v = lower_expr(ctx, operand)?;
            let ty = ctx.builder.value_type(v);
            Ok(ctx.builder.emit_unary(Opcode::BitNot, v, ty))
        }
        UnaryOp::LogNot => {
            let v = lower_expr(ctx, operand)?;
            let vty = ctx.builder.value_type(v);
            let zero = ctx.builder.emit_const_int(0, vty);
            Ok(ctx.builder.emit_binary(Opcode::CmpEq, v, zero, Type::basic(TypeKind::Int, 4, 4)))
        }
        UnaryOp::Deref => {
            let lv = lower_lvalue(ctx, &Expr::new(ExprKind::Unary { op: UnaryOp::Deref, operand: Box::new(operand.clone()) }, loc))?;
            Ok(load_lvalue(ctx, &lv))
        }
        UnaryOp::AddrOf => {
            let lv = lower_lvalue(ctx, operand)?;
            addr_of_lvalue(ctx, &lv, loc)
        }
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => lower_incdec(ctx, op, operand),
    }
}

fn lower_incdec(ctx: &mut LowerCtx, op: UnaryOp, operand: &Expr) -> SResult<ValueId> {
    let lv = lower_lvalue(ctx, operand)?;
    let cur = load_lvalue(ctx, &lv);
    let ty = lvalue_type(&lv);
    let is_inc = matches!(op, UnaryOp::PreInc | UnaryOp::PostInc);
    let new_val = if ty.is_pointer_like() {
        let step_ty = Type::basic(TypeKind::Long, ctx.word_size.long_size(), ctx.word_size.long_size());
        let one = ctx.builder.emit_const_int(1, step_ty.clone());
        let step = if is_inc {
            one
        } else {
            let zero = ctx.builder.emit_const_int(0, step_ty.clone());
            ctx.builder.emit_binary(Opcode::Sub, zero, one, step_ty)
        };
        ctx.builder.emit_binary(Opcode::PtrAdd, cur, step, ty.clone())
    } else {
        let one = ctx.builder.emit_const_int(1, ty.clone());
        let opc = if is_inc { Opcode::Add } else { Opcode::Sub };
        ctx.builder.emit_binary(opc, cur, one, ty.clone())
    };
    store_lvalue(ctx, &lv, new_val);
    Ok(if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec) { new_val } else { cur })
}

fn lower_short_circuit(ctx: &mut LowerCtx, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> SResult<ValueId> {
    let result_ty = Type::basic(TypeKind::Int, 4, 4);
    let lv = lower_expr(ctx, lhs)?;
    let lv_ty = ctx.builder.value_type(lv);
    let zero = ctx.builder.emit_const_int(0, lv_ty);
    let short_label = ctx.builder.new_label(if op == BinaryOp::LogAnd { "sc_false" } else { "sc_true" });
    let end_label = ctx.builder.new_label("sc_end");
    let test = if op == BinaryOp::LogAnd {
        ctx.builder.emit_binary(Opcode::CmpEq, lv, zero, result_ty.clone())
    } else {
        ctx.builder.emit_binary(Opcode::CmpNe, lv, zero, result_ty.clone())
    };
    ctx.builder.emit_bcond(test, &short_label);

    let tmp_name = ctx.builder.new_label("sc_tmp");
    let alias = ctx.builder.alias_set_for(&tmp_name, false);
    let rv = lower_expr(ctx, rhs)?;
    let rv_ty = ctx.builder.value_type(rv);
    let rzero = ctx.builder.emit_const_int(0, rv_ty);
    let rbool = ctx.builder.emit_binary(Opcode::CmpNe, rv, rzero, result_ty.clone());
    ctx.builder.emit_store(&tmp_name, rbool, result_ty.clone(), alias, false);
    ctx.builder.emit_br(&end_label);

    ctx.builder.emit_label(&short_label);
    let shortval = ctx.builder.emit_const_int(if op == BinaryOp::LogAnd { 0 } else { 1 }, result_ty.clone());
    ctx.builder.emit_store(&tmp_name, shortval, result_ty.clone(), alias, false);

    ctx.builder.emit_label(&end_label);
    Ok(ctx.builder.emit_load(&tmp_name, result_ty, alias, false))
}

fn lower_binary(ctx: &mut LowerCtx, op: BinaryOp, lhs: &Expr, rhs: &Expr, _loc: Location) -> SResult<ValueId> {
    if op.is_short_circuit() {
        return lower_short_circuit(ctx, op, lhs, rhs);
    }
    let lv = lower_expr(ctx, lhs)?;
    let lt = ctx.builder.value_type(lv);
    let rv = lower_expr(ctx, rhs)?;
    let rt = ctx.builder.value_type(rv);

    if op.is_comparison() {
        return Ok(ctx.builder.emit_binary(cmp_opcode(op), lv, rv, Type::basic(TypeKind::Int, 4, 4)));
    }

    if matches!(op, BinaryOp::Add | BinaryOp::Sub) && lt.is_pointer_like() && rt.is_pointer_like() {
        let ty = Type::basic(TypeKind::Long, ctx.word_size.long_size(), ctx.word_size.long_size());
        return Ok(ctx.builder.emit_binary(Opcode::PtrDiff, lv, rv, ty));
    }
    if matches!(op, BinaryOp::Add | BinaryOp::Sub) && lt.is_pointer_like() {
        let step = if op == BinaryOp::Sub {
            let zero = ctx.builder.emit_const_int(0, rt.clone());
            ctx.builder.emit_binary(Opcode::Sub, zero, rv, rt)
        } else {
            rv
        };
        return Ok(ctx.builder.emit_binary(Opcode::PtrAdd, lv, step, lt));
    }
    if op == BinaryOp::Add && rt.is_pointer_like() {
        return Ok(ctx.builder.emit_binary(Opcode::PtrAdd, rv, lv, rt));
    }

    let result_ty = binary_result_type(op, lt, rt);
    Ok(ctx.builder.emit_binary(binop_opcode(op), lv, rv, result_ty))
}

fn lower_ternary(ctx: &mut LowerCtx, cond: &Expr, then_expr: &Expr, else_expr: &Expr) -> SResult<ValueId> {
    let cv = lower_expr(ctx, cond)?;
    let cv_ty = ctx.builder.value_type(cv);
    let zero = ctx.builder.emit_const_int(0, cv_ty);
    let is_false = ctx.builder.emit_binary(Opcode::CmpEq, cv, zero, Type::basic(TypeKind::Int, 4, 4));
    let else_label = ctx.builder.new_label("ternary_else");
    let end_label = ctx.builder.new_label("ternary_end");
    ctx.builder.emit_bcond(is_false, &else_label);

    let ty = expr_type(ctx, then_expr)?;
    let tmp_name = ctx.builder.new_label("ternary_tmp");
    let alias = ctx.builder.alias_set_for(&tmp_name, false);

    let tv = lower_expr(ctx, then_expr)?;
    let tv = coerce(ctx, tv, &ty);
    ctx.builder.emit_store(&tmp_name, tv, ty.clone(), alias, false);
    ctx.builder.emit_br(&end_label);

    ctx.builder.emit_label(&else_label);
    let ev = lower_expr(ctx, else_expr)?;
    let ev = coerce(ctx, ev, &ty);
    ctx.builder.emit_store(&tmp_name, ev, ty.clone(), alias, false);

    ctx.builder.emit_label(&end_label);
    Ok(ctx.builder.emit_load(&tmp_name, ty, alias, false))
}

fn lower_assign(ctx: &mut LowerCtx, target: &Expr, value: &Expr) -> SResult<ValueId> {
    let lv = lower_lvalue(ctx, target)?;
    let rv = lower_expr(ctx, value)?;
    let ty = lvalue_type(&lv);
    let coerced = coerce(ctx, rv, &ty);
    store_lvalue(ctx, &lv, coerced);
    Ok(coerced)
}

/// Compound assignment (`+=`, ...): the target's address is computed
/// once by `lower_lvalue` and reused for both the load and the store, so
/// a target with side effects (`a[f()] += 1`) only evaluates `f()` once
/// (spec.md §4.4's compound-assignment contract).
fn lower_compound_assign(ctx: &mut LowerCtx, op: BinaryOp, target: &Expr, value: &Expr) -> SResult<ValueId> {
    let lv = lower_lvalue(ctx, target)?;
    let cur = load_lvalue(ctx, &lv);
    let ty = lvalue_type(&lv);
    let rv = lower_expr(ctx, value)?;

    let result = if matches!(op, BinaryOp::Add | BinaryOp::Sub) && ty.is_pointer_like() {
        let rv_ty = ctx.builder.value_type(rv);
        let step = if op == BinaryOp::Sub {
            let zero = ctx.builder.emit_const_int(0, rv_ty.clone());
            ctx.builder.emit_binary(Opcode::Sub, zero, rv, rv_ty)
        } else {
            rv
        };
        ctx.builder.emit_binary(Opcode::PtrAdd, cur, step, ty.clone())
    } else {
        ctx.builder.emit_binary(binop_opcode(op), cur, rv, ty.clone())
    };
    let coerced = coerce(ctx, result, &ty);
    store_lvalue(ctx, &lv, coerced);
    Ok(coerced)
}

/// Implicit-int fallback for an undeclared callee keeps this a semantic
/// analyzer rather than a linker: a forward-declared-by-use function is
/// assumed to return `int`, matching pre-C99 implicit declarations.
fn lower_call(ctx: &mut LowerCtx, callee: &str, args: &[Expr]) -> SResult<ValueId> {
    let func = ctx.funcs.lookup(callee).cloned();
    let ret_ty = func.as_ref().map(|f| f.ret_type.clone()).unwrap_or_else(|| Type::basic(TypeKind::Int, 4, 4));
    let param_types = func.as_ref().map(|f| f.param_types.clone()).unwrap_or_default();
    for (i, a) in args.iter().enumerate() {
        let v = lower_expr(ctx, a)?;
        let v = match param_types.get(i) {
            Some(pty) => coerce(ctx, v, pty),
            None => v,
        };
        let arg_ty = ctx.builder.value_type(v);
        ctx.builder.emit_arg(v, arg_ty);
    }
    Ok(ctx.builder.emit_call(callee, ret_ty))
}

/// Resolve a cast's target type through the function's own typedef
/// scope; casts to an inline `struct`/`union` body are not supported
/// (such a body should be declared first and cast to by tag).
fn resolve_cast_type(ctx: &LowerCtx, ty: &Type) -> SResult<Type> {
    match ty.kind {
        TypeKind::Unknown => {
            let name = ty.tag.as_deref().unwrap_or_default();
            ctx.typedefs
                .lookup(name)
                .map(|t| t.ty.clone())
                .ok_or_else(|| ctx.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("unknown type name '{}'", name)))
        }
        TypeKind::Ptr => {
            let pointee = resolve_cast_type(ctx, ty.pointee.as_ref().expect("ptr type carries a pointee"))?;
            Ok(Type::ptr_to(pointee, ctx.word_size.ptr_size()))
        }
        _ => Ok(ty.clone()),
    }
}

fn lower_cast(ctx: &mut LowerCtx, ty: &Type, expr: &Expr) -> SResult<ValueId> {
    let target = resolve_cast_type(ctx, ty)?;
    let v = lower_expr(ctx, expr)?;
    if target.kind == TypeKind::Void {
        return Ok(ValueId::NONE);
    }
    let src_ty = ctx.builder.value_type(v);
    Ok(ctx.builder.emit_cast(v, src_ty.kind, target))
}

fn lower_sizeof_like(ctx: &mut LowerCtx, toe: &TypeOrExpr, is_sizeof: bool) -> SResult<ValueId> {
    let v = {
        let view = ctx.const_view();
        let cctx = vc_const::ConstCtx::new(ctx.word_size, &view);
        let resolve = |e: &Expr| vc_const::infer_type(e, &cctx);
        if is_sizeof {
            match toe {
                TypeOrExpr::Type(t) => vc_const::sizeof_type(t, ctx.word_size) as i64,
                TypeOrExpr::Expr(e) => {
                    let t = resolve(e).map_err(|err| ctx.const_err(err))?;
                    vc_const::sizeof_type(&t, ctx.word_size) as i64
                }
            }
        } else {
            match toe {
                TypeOrExpr::Type(t) => vc_const::alignof_type(t, ctx.word_size) as i64,
                TypeOrExpr::Expr(e) => {
                    let t = resolve(e).map_err(|err| ctx.const_err(err))?;
                    vc_const::alignof_type(&t, ctx.word_size) as i64
                }
            }
        }
    };
    let ty = Type::basic(TypeKind::ULong, ctx.word_size.long_size(), ctx.word_size.long_size());
    Ok(ctx.builder.emit_const_int(v, ty))
}

fn lower_offsetof(ctx: &mut LowerCtx, ty: &Type, path: &[OffsetofStep], loc: Location) -> SResult<ValueId> {
    let v = {
        let view = ctx.const_view();
        let cctx = vc_const::ConstCtx::new(ctx.word_size, &view);
        let wrapped = Expr::new(ExprKind::Offsetof { ty: ty.clone(), path: path.to_vec() }, loc);
        vc_const::eval_const(&wrapped, &cctx).map_err(|err| ctx.const_err(err))?
    };
    let ty = Type::basic(TypeKind::ULong, ctx.word_size.long_size(), ctx.word_size.long_size());
    Ok(ctx.builder.emit_const_int(v, ty))
}

/// Flatten a compound literal's initializer list into stores against a
/// synthetic named local, the same way a global aggregate's initializer
/// flattens into `"<name>+<offset>"` leaves (see `emit_global_aggregate`);
/// the value of the literal itself is the address of that local.
fn lower_compound_literal(ctx: &mut LowerCtx, ty: &Type, init: &[vc_ast::InitEntry]) -> SResult<ValueId> {
    let resolved = resolve_cast_type(ctx, ty)?;
    let name = ctx.builder.new_label("cl");
    let alias = ctx.builder.alias_set_for(&name, false);
    match resolved.kind {
        TypeKind::Array => {
            let elem = resolved.elem_type().cloned().unwrap_or_else(Type::void);
            for (i, entry) in init.iter().enumerate() {
                if let InitValue::Scalar(e) = &entry.value {
                    let v = lower_expr(ctx, e)?;
                    let v = coerce(ctx, v, &elem);
                    let leaf = format!("{}+{}", name, i as u64 * elem.size);
                    ctx.builder.emit_store(&leaf, v, elem.clone(), alias, false);
                }
            }
        }
        TypeKind::Struct | TypeKind::Union => {
            let tag_name = resolved.tag.clone().unwrap_or_default();
            let members = ctx.tags.get(&tag_name).map(|t| t.members.clone()).unwrap_or_default();
            for (pos, entry) in init.iter().enumerate() {
                if let (Some(member), InitValue::Scalar(e)) = (members.get(pos), &entry.value) {
                    let v = lower_expr(ctx, e)?;
                    let v = coerce(ctx, v, &member.ty);
                    let leaf = format!("{}+{}", name, member.byte_offset);
                    ctx.builder.emit_store(&leaf, v, member.ty.clone(), alias, false);
                }
            }
        }
        _ => {
            if let Some(entry) = init.first() {
                if let InitValue::Scalar(e) = &entry.value {
                    let v = lower_expr(ctx, e)?;
                    let v = coerce(ctx, v, &resolved);
                    ctx.builder.emit_store(&name, v, resolved.clone(), alias, false);
                }
            }
        }
    }
    let ptr_ty = Type::ptr_to(resolved.clone(), ctx.word_size.ptr_size());
    Ok(ctx.builder.emit_addr(&name, ptr_ty, alias))
}
