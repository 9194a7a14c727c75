//! Statement lowering (spec.md §4.4): one handler per `Stmt` variant,
//! each threading the same `LowerCtx` the caller already holds so loops
//! can push/pop `break_label`/`continue_label` and blocks can push/pop a
//! `vars` scope without the surrounding recursion losing track of
//! `builder`, `tags`, or `labels`.

use crate::{BlockScope, LowerCtx, SResult};
use crate::expr::{self, coerce};
use std::collections::HashMap;
use vc_ast::{FieldDecl, Initializer, InitValue, Stmt, SwitchCase, Type, TypeKind, VarDecl};
use vc_diag::{DiagnosticKind, Location};
use vc_ir::Opcode;
use vc_symtab::{FieldLayout, TagEntry, TagKind, TypedefEntry, VarEntry};

pub fn lower_stmt(ctx: &mut LowerCtx, stmt: &Stmt) -> SResult<()> {
    match stmt {
        Stmt::Expr(e) => {
            expr::lower_expr(ctx, e)?;
            Ok(())
        }
        Stmt::VarDecl(v) => lower_var_decl(ctx, v),
        Stmt::Return(value) => lower_return(ctx, value),
        Stmt::If { cond, then_branch, else_branch } => lower_if(ctx, cond, then_branch, else_branch),
        Stmt::While { cond, body } => lower_while(ctx, cond, body),
        Stmt::DoWhile { body, cond } => lower_do_while(ctx, body, cond),
        Stmt::For { init, cond, step, body } => lower_for(ctx, init, cond, step, body),
        Stmt::Switch { scrutinee, cases, default } => lower_switch(ctx, scrutinee, cases, default),
        Stmt::Break => lower_break(ctx),
        Stmt::Continue => lower_continue(ctx),
        Stmt::Label { name, stmt: inner } => {
            let label = ctx.labels.resolve(name);
            ctx.builder.emit_label(&label);
            ctx.labels.mark_defined(name);
            lower_stmt(ctx, inner)
        }
        Stmt::Goto(name) => {
            let label = ctx.labels.resolve(name);
            ctx.builder.emit_br(&label);
            Ok(())
        }
        Stmt::StaticAssert { cond, message } => lower_static_assert(ctx, cond, message),
        Stmt::Typedef { name, ty } => {
            let resolved = resolve_local_type(ctx, ty)?;
            ctx.typedefs
                .declare(name, TypedefEntry { elem_size: resolved.size, ty: resolved })
                .map_err(|_| ctx.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("redefinition of typedef '{}'", name)))?;
            Ok(())
        }
        Stmt::StructDecl { tag, fields } => {
            register_aggregate(ctx, tag, fields, false)?;
            Ok(())
        }
        Stmt::UnionDecl { tag, fields } => {
            register_aggregate(ctx, tag, fields, true)?;
            Ok(())
        }
        Stmt::EnumDecl { tag, variants } => {
            register_enum(ctx, tag, variants)?;
            Ok(())
        }
        Stmt::Block(stmts) => {
            let mut scope = BlockScope::enter(ctx);
            for s in stmts {
                lower_stmt(&mut scope, s)?;
            }
            Ok(())
        }
    }
}

fn lower_return(ctx: &mut LowerCtx, value: &Option<vc_ast::Expr>) -> SResult<()> {
    match value {
        Some(e) => {
            let v = expr::lower_expr(ctx, e)?;
            let ret_ty = ctx.ret_type.clone();
            let v = coerce(ctx, v, &ret_ty);
            ctx.builder.emit_return(Some(v));
            Ok(())
        }
        None => {
            if ctx.ret_type.kind != TypeKind::Void {
                return Err(ctx.err(DiagnosticKind::Type, Location::synthetic(), "non-void function must return a value"));
            }
            ctx.builder.emit_return(None);
            Ok(())
        }
    }
}

fn lower_if(ctx: &mut LowerCtx, cond: &vc_ast::Expr, then_branch: &Stmt, else_branch: &Option<Box<Stmt>>) -> SResult<()> {
    let cv = expr::lower_expr(ctx, cond)?;
    let cv_ty = ctx.builder.value_type(cv);
    let zero = ctx.builder.emit_const_int(0, cv_ty);
    let is_false = ctx.builder.emit_binary(Opcode::CmpEq, cv, zero, Type::basic(TypeKind::Int, 4, 4));
    let else_label = ctx.builder.new_label("if_else");
    ctx.builder.emit_bcond(is_false, &else_label);
    lower_stmt(ctx, then_branch)?;
    match else_branch {
        Some(eb) => {
            let end_label = ctx.builder.new_label("if_end");
            ctx.builder.emit_br(&end_label);
            ctx.builder.emit_label(&else_label);
            lower_stmt(ctx, eb)?;
            ctx.builder.emit_label(&end_label);
        }
        None => ctx.builder.emit_label(&else_label),
    }
    Ok(())
}

fn lower_while(ctx: &mut LowerCtx, cond: &vc_ast::Expr, body: &Stmt) -> SResult<()> {
    let top_label = ctx.builder.new_label("while_top");
    let end_label = ctx.builder.new_label("while_end");
    ctx.builder.emit_label(&top_label);
    let cv = expr::lower_expr(ctx, cond)?;
    let cv_ty = ctx.builder.value_type(cv);
    let zero = ctx.builder.emit_const_int(0, cv_ty);
    let is_false = ctx.builder.emit_binary(Opcode::CmpEq, cv, zero, Type::basic(TypeKind::Int, 4, 4));
    ctx.builder.emit_bcond(is_false, &end_label);

    let saved_break = ctx.break_label.replace(end_label.clone());
    let saved_continue = ctx.continue_label.replace(top_label.clone());
    let result = lower_stmt(ctx, body);
    ctx.break_label = saved_break;
    ctx.continue_label = saved_continue;
    result?;

    ctx.builder.emit_br(&top_label);
    ctx.builder.emit_label(&end_label);
    Ok(())
}

fn lower_do_while(ctx: &mut LowerCtx, body: &Stmt, cond: &vc_ast::Expr) -> SResult<()> {
    let top_label = ctx.builder.new_label("do_top");
    let continue_label = ctx.builder.new_label("do_continue");
    let end_label = ctx.builder.new_label("do_end");
    ctx.builder.emit_label(&top_label);

    let saved_break = ctx.break_label.replace(end_label.clone());
    let saved_continue = ctx.continue_label.replace(continue_label.clone());
    let result = lower_stmt(ctx, body);
    ctx.break_label = saved_break;
    ctx.continue_label = saved_continue;
    result?;

    ctx.builder.emit_label(&continue_label);
    let cv = expr::lower_expr(ctx, cond)?;
    let cv_ty = ctx.builder.value_type(cv);
    let zero = ctx.builder.emit_const_int(0, cv_ty);
    let is_true = ctx.builder.emit_binary(Opcode::CmpNe, cv, zero, Type::basic(TypeKind::Int, 4, 4));
    ctx.builder.emit_bcond(is_true, &top_label);
    ctx.builder.emit_label(&end_label);
    Ok(())
}

fn lower_for(
    ctx: &mut LowerCtx,
    init: &Option<Box<Stmt>>,
    cond: &Option<vc_ast::Expr>,
    step: &Option<vc_ast::Expr>,
    body: &Stmt,
) -> SResult<()> {
    let mut scope = BlockScope::enter(ctx);
    if let Some(s) = init {
        lower_stmt(&mut scope, s)?;
    }

    let top_label = scope.builder.new_label("for_top");
    let continue_label = scope.builder.new_label("for_continue");
    let end_label = scope.builder.new_label("for_end");
    scope.builder.emit_label(&top_label);

    if let Some(c) = cond {
        let cv = expr::lower_expr(&mut scope, c)?;
        let cv_ty = scope.builder.value_type(cv);
        let zero = scope.builder.emit_const_int(0, cv_ty);
        let is_false = scope.builder.emit_binary(Opcode::CmpEq, cv, zero, Type::basic(TypeKind::Int, 4, 4));
        scope.builder.emit_bcond(is_false, &end_label);
    }

    let saved_break = scope.break_label.replace(end_label.clone());
    let saved_continue = scope.continue_label.replace(continue_label.clone());
    let result = lower_stmt(&mut scope, body);
    scope.break_label = saved_break;
    scope.continue_label = saved_continue;
    result?;

    scope.builder.emit_label(&continue_label);
    if let Some(s) = step {
        expr::lower_expr(&mut scope, s)?;
    }
    scope.builder.emit_br(&top_label);
    scope.builder.emit_label(&end_label);
    Ok(())
}

/// Test-and-branch chain in source order (spec.md §4.4's `switch`
/// contract): each case value is compared against the scrutinee in turn
/// and a true comparison branches straight to that case's label, so
/// fallthrough between cases is just "no branch back out" — the cases'
/// statements are emitted in the same pass, right after the dispatch
/// chain, in source order.
fn lower_switch(ctx: &mut LowerCtx, scrutinee: &vc_ast::Expr, cases: &[SwitchCase], default: &Option<Vec<Stmt>>) -> SResult<()> {
    let sv = expr::lower_expr(ctx, scrutinee)?;
    let sv_ty = ctx.builder.value_type(sv);

    let mut seen = std::collections::HashSet::new();
    let mut case_values = Vec::with_capacity(cases.len());
    let mut case_labels = Vec::with_capacity(cases.len());
    for case in cases {
        let value = ctx.eval_const(&case.value)?;
        if !seen.insert(value) {
            return Err(ctx.err(DiagnosticKind::Semantic, case.value.loc, format!("duplicate case value {}", value)));
        }
        case_values.push(value);
        case_labels.push(ctx.builder.new_label("case"));
    }
    let default_label = ctx.builder.new_label("default");
    let end_label = ctx.builder.new_label("switch_end");

    for ((_, label), &value) in cases.iter().zip(&case_labels).zip(&case_values) {
        let k = ctx.builder.emit_const_int(value, sv_ty.clone());
        let eq = ctx.builder.emit_binary(Opcode::CmpEq, sv, k, Type::basic(TypeKind::Int, 4, 4));
        ctx.builder.emit_bcond(eq, label);
    }
    ctx.builder.emit_br(&default_label);

    let saved_break = ctx.break_label.replace(end_label.clone());
    for (case, label) in cases.iter().zip(&case_labels) {
        ctx.builder.emit_label(label);
        for s in &case.body {
            lower_stmt(ctx, s)?;
        }
    }
    ctx.builder.emit_label(&default_label);
    if let Some(body) = default {
        for s in body {
            lower_stmt(ctx, s)?;
        }
    }
    ctx.break_label = saved_break;

    ctx.builder.emit_label(&end_label);
    Ok(())
}

fn lower_break(ctx: &mut LowerCtx) -> SResult<()> {
    match ctx.break_label.clone() {
        Some(label) => {
            ctx.builder.emit_br(&label);
            Ok(())
        }
        None => Err(ctx.err(DiagnosticKind::Semantic, Location::synthetic(), "'break' outside a loop or switch")),
    }
}

fn lower_continue(ctx: &mut LowerCtx) -> SResult<()> {
    match ctx.continue_label.clone() {
        Some(label) => {
            ctx.builder.emit_br(&label);
            Ok(())
        }
        None => Err(ctx.err(DiagnosticKind::Semantic, Location::synthetic(), "'continue' outside a loop")),
    }
}

fn lower_static_assert(ctx: &mut LowerCtx, cond: &vc_ast::Expr, message: &Option<String>) -> SResult<()> {
    let v = ctx.eval_const(cond)?;
    if v == 0 {
        let msg = message.clone().unwrap_or_else(|| "static assertion failed".to_string());
        return Err(ctx.err(DiagnosticKind::Semantic, cond.loc, msg));
    }
    Ok(())
}

/// Register the variable in the current scope and emit its storage:
/// stack storage addressed by name for ordinary locals (the same
/// convention global variables use), or a single `alloca` for a VLA,
/// whose element count is only known at run time (spec.md §4.4's
/// `var_decl` contract).
fn lower_var_decl(ctx: &mut LowerCtx, v: &VarDecl) -> SResult<()> {
    let mut ty = resolve_local_type(ctx, &v.ty)?;

    if let (TypeKind::Array, None, Some(size_expr)) = (ty.kind, ty.array_len, &v.array_size_expr) {
        if let Ok(n) = ctx.eval_const_u64(size_expr) {
            let elem = ty.pointee.as_ref().expect("array carries an element type").as_ref().clone();
            ty = Type::array_of(elem, Some(n));
        } else {
            return lower_vla_decl(ctx, v, ty, size_expr);
        }
    }

    let ir_name = v.name.clone();
    let aggregate_tag = ty.tag.clone();
    ctx.vars
        .declare(
            &v.name,
            VarEntry {
                ty: ty.clone(),
                is_static: v.storage.is_static,
                is_register: v.storage.is_register,
                is_extern: v.storage.is_extern,
                aggregate_tag,
                const_value: None,
                frame_offset: None,
                ir_name: ir_name.clone(),
            },
        )
        .map_err(|_| ctx.err(DiagnosticKind::NameResolution, v.loc, format!("redefinition of '{}'", v.name)))?;

    match &v.init {
        None => Ok(()),
        Some(Initializer::Scalar(e)) => {
            let val = expr::lower_expr(ctx, e)?;
            let val = coerce(ctx, val, &ty);
            let alias = ctx.builder.alias_set_for(&ir_name, v.qualifiers.is_restrict);
            ctx.builder.emit_store(&ir_name, val, ty, alias, v.qualifiers.is_volatile);
            Ok(())
        }
        Some(Initializer::List(entries)) => lower_local_aggregate_init(ctx, &ir_name, &ty, entries),
    }
}

fn lower_vla_decl(ctx: &mut LowerCtx, v: &VarDecl, ty: Type, size_expr: &vc_ast::Expr) -> SResult<()> {
    let elem = ty.pointee.as_ref().expect("array carries an element type").as_ref().clone();
    let elem_size = vc_const::sizeof_type(&elem, ctx.word_size);
    let size_ty = Type::basic(TypeKind::ULong, ctx.word_size.long_size(), ctx.word_size.long_size());

    let count = expr::lower_expr(ctx, size_expr)?;
    let count = coerce(ctx, count, &size_ty);
    let elem_sz_val = ctx.builder.emit_const_int(elem_size as i64, size_ty.clone());
    let total = ctx.builder.emit_binary(Opcode::Mul, count, elem_sz_val, size_ty);

    let ptr_ty = Type::ptr_to(elem, ctx.word_size.ptr_size());
    let ptr = ctx.builder.emit_alloca(&v.name, total, ptr_ty.clone());
    let alias = ctx.builder.alias_set_for(&v.name, v.qualifiers.is_restrict);
    ctx.builder.emit_store(&v.name, ptr, ptr_ty.clone(), alias, false);

    ctx.vars
        .declare(
            &v.name,
            VarEntry {
                ty: ptr_ty,
                is_static: false,
                is_register: v.storage.is_register,
                is_extern: false,
                aggregate_tag: None,
                const_value: None,
                frame_offset: None,
                ir_name: v.name.clone(),
            },
        )
        .map_err(|_| ctx.err(DiagnosticKind::NameResolution, v.loc, format!("redefinition of '{}'", v.name)))
}

/// Mirrors `SemaCtx::emit_global_aggregate`'s designated-initializer
/// flattening, but stores into `"<name>+<offset>"` leaves instead of
/// emitting `glob_var` leaves, since this storage is a function-local
/// stack slot rather than file-scope data.
fn lower_local_aggregate_init(ctx: &mut LowerCtx, name: &str, ty: &Type, entries: &[vc_ast::InitEntry]) -> SResult<()> {
    let alias = ctx.builder.alias_set_for(name, false);
    match ty.kind {
        TypeKind::Array => {
            let elem = ty.pointee.clone().map(|b| *b).expect("array carries an element type");
            let elem_size = vc_const::sizeof_type(&elem, ctx.word_size);
            let mut idx: u64 = 0;
            for entry in entries {
                if let Some(vc_ast::Designator::Index(ie)) = &entry.designator {
                    idx = ctx.eval_const_u64(ie)?;
                }
                if let InitValue::Scalar(e) = &entry.value {
                    let v = expr::lower_expr(ctx, e)?;
                    let v = coerce(ctx, v, &elem);
                    let leaf = format!("{}+{}", name, idx * elem_size);
                    ctx.builder.emit_store(&leaf, v, elem.clone(), alias, false);
                }
                idx += 1;
            }
            Ok(())
        }
        TypeKind::Struct | TypeKind::Union => {
            let tag_name = ty.tag.clone().unwrap_or_default();
            let members = ctx.tags.get(&tag_name).map(|t| t.members.clone()).unwrap_or_default();
            let mut pos = 0usize;
            for entry in entries {
                if let Some(vc_ast::Designator::Field(field_name)) = &entry.designator {
                    pos = members.iter().position(|m| &m.name == field_name).unwrap_or(pos);
                }
                if let (Some(member), InitValue::Scalar(e)) = (members.get(pos), &entry.value) {
                    let v = expr::lower_expr(ctx, e)?;
                    let v = coerce(ctx, v, &member.ty);
                    let leaf = format!("{}+{}", name, member.byte_offset);
                    ctx.builder.emit_store(&leaf, v, member.ty.clone(), alias, false);
                }
                pos += 1;
            }
            Ok(())
        }
        _ => {
            if let Some(entry) = entries.first() {
                if let InitValue::Scalar(e) = &entry.value {
                    let v = expr::lower_expr(ctx, e)?;
                    let v = coerce(ctx, v, ty);
                    ctx.builder.emit_store(name, v, ty.clone(), alias, false);
                }
            }
            Ok(())
        }
    }
}

/// Resolve a declaration's parsed `Type` through this function's local
/// typedef/tag scope, mirroring `SemaCtx::resolve_type` for the block-
/// scope declarations (`struct`/`union`/`enum`/`typedef` nested inside a
/// function body) that never reach `SemaCtx` directly.
fn resolve_local_type(ctx: &mut LowerCtx, ty: &Type) -> SResult<Type> {
    match ty.kind {
        TypeKind::Unknown => {
            let name = ty.tag.as_deref().unwrap_or_default();
            let mut resolved = ctx
                .typedefs
                .lookup(name)
                .map(|t| t.ty.clone())
                .ok_or_else(|| ctx.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("unknown type name '{}'", name)))?;
            resolved.is_const |= ty.is_const;
            resolved.is_volatile |= ty.is_volatile;
            resolved.is_restrict |= ty.is_restrict;
            Ok(resolved)
        }
        TypeKind::Ptr => {
            let pointee = resolve_local_type(ctx, ty.pointee.as_ref().expect("ptr type carries a pointee"))?;
            let mut t = Type::ptr_to(pointee, ctx.word_size.ptr_size());
            t.is_const = ty.is_const;
            t.is_volatile = ty.is_volatile;
            t.is_restrict = ty.is_restrict;
            Ok(t)
        }
        TypeKind::Array => {
            let elem = resolve_local_type(ctx, ty.pointee.as_ref().expect("array type carries an element type"))?;
            Ok(Type::array_of(elem, ty.array_len))
        }
        TypeKind::Func => {
            let ret = resolve_local_type(ctx, ty.pointee.as_ref().expect("func type carries a return type"))?;
            let params = ty.params.iter().map(|p| resolve_local_type(ctx, p)).collect::<SResult<Vec<_>>>()?;
            Ok(Type::func(ret, params, ty.is_variadic))
        }
        TypeKind::Struct | TypeKind::Union if !ty.fields.is_empty() => register_aggregate(ctx, &ty.tag, &ty.fields, ty.kind == TypeKind::Union),
        TypeKind::Struct | TypeKind::Union => {
            let tag_name = ty.tag.as_deref().ok_or_else(|| ctx.err(DiagnosticKind::Semantic, Location::synthetic(), "anonymous struct/union with no body"))?;
            let entry = ctx
                .tags
                .get(tag_name)
                .ok_or_else(|| ctx.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("incomplete type 'struct {}'", tag_name)))?;
            let mut t = Type::basic(ty.kind, entry.size, entry.align);
            t.tag = Some(tag_name.to_string());
            Ok(t)
        }
        TypeKind::Int if !ty.enum_variants.is_empty() => register_enum(ctx, &ty.tag, &ty.enum_variants),
        _ => Ok(ty.clone()),
    }
}

fn next_anon_tag(ctx: &mut LowerCtx) -> String {
    ctx.builder.new_label("anon_tag")
}

fn register_enum(ctx: &mut LowerCtx, tag: &Option<String>, variants: &[vc_ast::EnumVariant]) -> SResult<Type> {
    let mut enum_values = HashMap::new();
    let mut next_val: i64 = 0;
    for v in variants {
        let val = match &v.value {
            Some(e) => ctx.eval_const(e)?,
            None => next_val,
        };
        next_val = val.wrapping_add(1);
        enum_values.insert(v.name.clone(), val);
    }
    let key = tag.clone().unwrap_or_else(|| next_anon_tag(ctx));
    ctx.tags.insert(key.clone(), TagEntry { kind: TagKind::Enum, size: 4, align: 4, members: Vec::new(), is_flexible: false, enum_values });
    let mut t = Type::basic(TypeKind::Int, 4, 4);
    t.tag = Some(key);
    Ok(t)
}

fn register_aggregate(ctx: &mut LowerCtx, tag: &Option<String>, fields: &[FieldDecl], is_union: bool) -> SResult<Type> {
    let mut members = Vec::new();
    let mut offset: u64 = 0;
    let mut size: u64 = 0;
    let mut max_align: u64 = 1;
    let mut is_flexible = false;
    let mut bit_cursor: Option<(u64, u32)> = None;

    for (i, f) in fields.iter().enumerate() {
        let resolved_ty = resolve_local_type(ctx, &f.ty)?;
        let elem_size = vc_const::sizeof_type(&resolved_ty, ctx.word_size);
        let align = resolved_ty.align.max(1);
        max_align = max_align.max(align);

        if f.is_flexible_array {
            if i + 1 != fields.len() {
                return Err(ctx.err(DiagnosticKind::Semantic, Location::synthetic(), "flexible array member must be the last member"));
            }
            is_flexible = true;
            members.push(FieldLayout {
                name: f.name.clone().unwrap_or_default(),
                ty: resolved_ty,
                elem_size: 0,
                byte_offset: if is_union { 0 } else { offset },
                bit_width: None,
                bit_offset: None,
            });
            continue;
        }

        if let Some(bw_expr) = &f.bit_width {
            let width = ctx.eval_const(bw_expr)? as u32;
            let field_offset = if is_union { 0 } else { align_up(offset, align) };
            let (unit_offset, used) = match bit_cursor {
                Some((u, used)) if !is_union && u == field_offset && used + width <= (elem_size as u32) * 8 => (u, used),
                _ => (field_offset, 0),
            };
            members.push(FieldLayout {
                name: f.name.clone().unwrap_or_default(),
                ty: resolved_ty,
                elem_size,
                byte_offset: unit_offset,
                bit_width: Some(width),
                bit_offset: Some(used),
            });
            bit_cursor = Some((unit_offset, used + width));
            if !is_union {
                offset = unit_offset + elem_size;
                size = size.max(offset);
            } else {
                size = size.max(elem_size);
            }
            continue;
        }
        bit_cursor = None;

        let field_offset = if is_union { 0 } else { align_up(offset, align) };
        members.push(FieldLayout { name: f.name.clone().unwrap_or_default(), ty: resolved_ty, elem_size, byte_offset: field_offset, bit_width: None, bit_offset: None });
        if is_union {
            size = size.max(elem_size);
        } else {
            offset = field_offset + elem_size;
            size = size.max(offset);
        }
    }

    size = align_up(size, max_align);
    let key = tag.clone().unwrap_or_else(|| next_anon_tag(ctx));
    let kind = if is_union { TagKind::Union } else { TagKind::Struct };
    ctx.tags.insert(key.clone(), TagEntry { kind, size, align: max_align, members, is_flexible, enum_values: HashMap::new() });
    let mut t = Type::basic(if is_union { TypeKind::Union } else { TypeKind::Struct }, size, max_align);
    t.tag = Some(key);
    Ok(t)
}

fn align_up(v: u64, align: u64) -> u64 {
    if align <= 1 {
        v
    } else {
        (v + align - 1) / align * align
    }
}
