//! Semantic analyzer and IR builder (spec.md §4.4, component F): scope
//! resolution, type lookup, constant folding via `vc-const`, and lowering
//! of every statement and expression kind into `vc-ir`.
//!
//! The traversal is a handful of free functions over a `LowerCtx` that
//! borrows each symbol table independently (spec.md §4.4's statement
//! handler signature: `(stmt, vars, funcs, labels, ir, ret_type,
//! break_label, continue_label)`) rather than one opaque "compiler"
//! object — so entering a lexical scope only locks the `vars` table, and
//! the rest of the context stays reachable for the recursive call inside.

pub mod expr;
pub mod stmt;

use std::collections::{HashMap, HashSet};
use vc_ast::{EnumVariant, FieldDecl, Function, Stmt, TopLevel, TranslationUnit, Type, TypeKind, VarDecl, WordSize};
use vc_const::{eval_const, sizeof_type, ConstCtx, ConstError, SymbolSource};
use vc_diag::{DiagCtx, Diagnostic, DiagnosticKind, Location};
use vc_ir::IrBuilder;
use vc_symtab::scope::ScopeStack;
use vc_symtab::{FuncEntry, LabelTable, Symtabs, TagEntry, TagKind, TypedefEntry, VarEntry};

pub type SResult<T> = Result<T, Diagnostic>;

/// Everything a function body's lowering needs, borrowed field-by-field
/// so a `BlockScope` can lock `vars` alone while leaving `builder`,
/// `tags`, `labels`, and friends reachable.
pub struct LowerCtx<'a> {
    pub diag: &'a DiagCtx,
    pub word_size: WordSize,
    pub vars: &'a mut ScopeStack<VarEntry>,
    pub funcs: &'a mut ScopeStack<FuncEntry>,
    pub typedefs: &'a mut ScopeStack<TypedefEntry>,
    pub tags: &'a mut HashMap<String, TagEntry>,
    pub labels: &'a mut LabelTable,
    pub builder: &'a mut IrBuilder,
    pub inline_emitted: &'a mut HashSet<String>,
    pub ret_type: Type,
    pub break_label: Option<String>,
    pub continue_label: Option<String>,
}

impl<'a> LowerCtx<'a> {
    /// A `vc-const` evaluation context over this function's current view of
    /// the symbol tables — used for array sizes, bit-field widths, and
    /// `switch` case labels, all of which must be constant expressions.
    pub fn const_view(&self) -> SymtabsView<'_> {
        SymtabsView { vars: self.vars, funcs: self.funcs, typedefs: self.typedefs, tags: self.tags }
    }

    pub fn eval_const(&self, e: &vc_ast::Expr) -> SResult<i64> {
        let view = self.const_view();
        eval_const(e, &ConstCtx::new(self.word_size, &view)).map_err(|err| self.const_err(err))
    }

    pub fn eval_const_u64(&self, e: &vc_ast::Expr) -> SResult<u64> {
        let view = self.const_view();
        vc_const::eval_const_u64(e, &ConstCtx::new(self.word_size, &view)).map_err(|err| self.const_err(err))
    }

    pub fn err(&self, kind: DiagnosticKind, loc: Location, msg: impl Into<String>) -> Diagnostic {
        self.diag.make(kind, loc, msg.into())
    }

    fn const_err(&self, e: ConstError) -> Diagnostic {
        self.err(DiagnosticKind::ConstantExpression, e.loc, format!("{}", e.kind))
    }
}

/// A borrow-compatible stand-in for `Symtabs` built from `LowerCtx`'s
/// split fields, so `vc-const`'s `ConstCtx` (which wants one `&Symtabs`)
/// can still be driven from inside a function body. `vc-const` only ever
/// reads through `&Symtabs`, so a same-shaped struct of borrowed fields
/// serves identically without copying any table.
pub struct SymtabsView<'a> {
    pub vars: &'a ScopeStack<VarEntry>,
    pub funcs: &'a ScopeStack<FuncEntry>,
    pub typedefs: &'a ScopeStack<TypedefEntry>,
    pub tags: &'a HashMap<String, TagEntry>,
}

impl<'a> SymbolSource for SymtabsView<'a> {
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

/// Runs a closure with `vars` scoped one level deeper, restoring it
/// afterward even if the closure returns early via `?` (spec.md §3.5:
/// "enclosing scopes shadow correctly").
pub struct BlockScope<'ctx, 'a> {
    ctx: &'ctx mut LowerCtx<'a>,
}

impl<'ctx, 'a> BlockScope<'ctx, 'a> {
    pub fn enter(ctx: &'ctx mut LowerCtx<'a>) -> Self {
        ctx.vars.push_scope();
        BlockScope { ctx }
    }
}

impl<'ctx, 'a> Drop for BlockScope<'ctx, 'a> {
    fn drop(&mut self) {
        self.ctx.vars.pop_scope();
    }
}

impl<'ctx, 'a> std::ops::Deref for BlockScope<'ctx, 'a> {
    type Target = LowerCtx<'a>;
    fn deref(&self) -> &LowerCtx<'a> {
        self.ctx
    }
}

impl<'ctx, 'a> std::ops::DerefMut for BlockScope<'ctx, 'a> {
    fn deref_mut(&mut self) -> &mut LowerCtx<'a> {
        self.ctx
    }
}

/// Owns the whole-translation-unit state: the merged symbol tables, the
/// single IR builder every global and function appends to in source
/// order, and the inline-emission set (spec.md §3.5, §9 — threaded
/// explicitly here instead of living behind a process-wide global).
pub struct SemaCtx<'a> {
    pub diag: &'a DiagCtx,
    pub word_size: WordSize,
    pub symtabs: Symtabs,
    pub inline_emitted: HashSet<String>,
    pub builder: IrBuilder,
    anon_tags: u32,
}

impl<'a> SemaCtx<'a> {
    pub fn new(diag: &'a DiagCtx, word_size: WordSize, label_prefix: impl Into<String>) -> Self {
        SemaCtx {
            diag,
            word_size,
            symtabs: Symtabs::new(),
            inline_emitted: HashSet::new(),
            builder: IrBuilder::new(label_prefix),
            anon_tags: 0,
        }
    }

    pub fn into_parts(self) -> (IrBuilder, Symtabs) {
        (self.builder, self.symtabs)
    }

    fn err(&self, kind: DiagnosticKind, loc: Location, msg: impl Into<String>) -> Diagnostic {
        self.diag.make(kind, loc, msg.into())
    }

    fn const_err(&self, e: ConstError) -> Diagnostic {
        self.err(DiagnosticKind::ConstantExpression, e.loc, format!("{}", e.kind))
    }

    pub fn check_translation_unit(&mut self, tu: &TranslationUnit) -> SResult<()> {
        for item in &tu.items {
            match item {
                TopLevel::Function(f) => self.check_function(f)?,
                TopLevel::GlobalVar(v) => self.check_global_var(v)?,
                TopLevel::Stmt(s) => self.check_toplevel_stmt(s)?,
            }
        }
        Ok(())
    }

    fn check_toplevel_stmt(&mut self, s: &Stmt) -> SResult<()> {
        match s {
            Stmt::StructDecl { tag, fields } => {
                self.register_aggregate(tag, fields, false)?;
                Ok(())
            }
            Stmt::UnionDecl { tag, fields } => {
                self.register_aggregate(tag, fields, true)?;
                Ok(())
            }
            Stmt::EnumDecl { tag, variants } => {
                self.register_enum(tag, variants)?;
                Ok(())
            }
            Stmt::Typedef { name, ty } => {
                let resolved = self.resolve_type(ty)?;
                self.symtabs
                    .typedefs
                    .declare(name, TypedefEntry { elem_size: resolved.size, ty: resolved })
                    .map_err(|_| self.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("redefinition of typedef '{}'", name)))?;
                Ok(())
            }
            Stmt::StaticAssert { cond, message } => self.check_static_assert(cond, message),
            _ => Ok(()),
        }
    }

    fn check_static_assert(&mut self, cond: &vc_ast::Expr, message: &Option<String>) -> SResult<()> {
        let v = eval_const(cond, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?;
        if v == 0 {
            let msg = message.clone().unwrap_or_else(|| "static assertion failed".to_string());
            return Err(self.err(DiagnosticKind::Semantic, cond.loc, msg));
        }
        Ok(())
    }

    /// Resolve a parser-produced `Type` to its final shape: typedef names
    /// (`TypeKind::Unknown` carrying the name in `tag`) are substituted,
    /// inline `struct`/`union`/`enum` bodies are folded into the tag table,
    /// and pointer/array/function wrappers are resolved recursively.
    pub fn resolve_type(&mut self, ty: &Type) -> SResult<Type> {
        match ty.kind {
            TypeKind::Unknown => {
                let name = ty.tag.as_deref().unwrap_or_default();
                let mut resolved = self
                    .symtabs
                    .resolve_typedef(name)
                    .cloned()
                    .ok_or_else(|| self.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("unknown type name '{}'", name)))?;
                resolved.is_const |= ty.is_const;
                resolved.is_volatile |= ty.is_volatile;
                resolved.is_restrict |= ty.is_restrict;
                Ok(resolved)
            }
            TypeKind::Ptr => {
                let pointee = self.resolve_type(ty.pointee.as_ref().expect("ptr type carries a pointee"))?;
                let mut t = Type::ptr_to(pointee, self.word_size.ptr_size());
                t.is_const = ty.is_const;
                t.is_volatile = ty.is_volatile;
                t.is_restrict = ty.is_restrict;
                Ok(t)
            }
            TypeKind::Array => {
                let elem = self.resolve_type(ty.pointee.as_ref().expect("array type carries an element type"))?;
                Ok(Type::array_of(elem, ty.array_len))
            }
            TypeKind::Func => {
                let ret = self.resolve_type(ty.pointee.as_ref().expect("func type carries a return type"))?;
                let params = ty.params.iter().map(|p| self.resolve_type(p)).collect::<SResult<Vec<_>>>()?;
                Ok(Type::func(ret, params, ty.is_variadic))
            }
            TypeKind::Struct | TypeKind::Union if !ty.fields.is_empty() => {
                self.register_aggregate(&ty.tag, &ty.fields, ty.kind == TypeKind::Union)
            }
            TypeKind::Struct | TypeKind::Union => {
                let tag_name = ty.tag.as_deref().ok_or_else(|| {
                    self.err(DiagnosticKind::Semantic, Location::synthetic(), "anonymous struct/union with no body")
                })?;
                let entry = self
                    .symtabs
                    .tags
                    .get(tag_name)
                    .ok_or_else(|| self.err(DiagnosticKind::NameResolution, Location::synthetic(), format!("incomplete type 'struct {}'", tag_name)))?;
                let mut t = Type::basic(ty.kind, entry.size, entry.align);
                t.tag = Some(tag_name.to_string());
                Ok(t)
            }
            TypeKind::Int if !ty.enum_variants.is_empty() => self.register_enum(&ty.tag, &ty.enum_variants),
            _ => Ok(ty.clone()),
        }
    }

    fn next_anon_tag(&mut self) -> String {
        self.anon_tags += 1;
        format!("<anon#{}>", self.anon_tags)
    }

    fn register_enum(&mut self, tag: &Option<String>, variants: &[EnumVariant]) -> SResult<Type> {
        let mut enum_values = HashMap::new();
        let mut next_val: i64 = 0;
        for v in variants {
            let val = match &v.value {
                Some(e) => eval_const(e, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?,
                None => next_val,
            };
            next_val = val.wrapping_add(1);
            enum_values.insert(v.name.clone(), val);
        }
        let key = tag.clone().unwrap_or_else(|| self.next_anon_tag());
        self.symtabs.tags.insert(
            key.clone(),
            TagEntry { kind: TagKind::Enum, size: 4, align: 4, members: Vec::new(), is_flexible: false, enum_values },
        );
        let mut t = Type::basic(TypeKind::Int, 4, 4);
        t.tag = Some(key);
        Ok(t)
    }

    /// Compute member offsets for a `struct`/`union` body and fold the
    /// result into the global tag table (spec.md §4.4's `struct_decl`/
    /// `union_decl` contract: "register into tag/typedef tables; emit no
    /// IR"). Bit-fields are packed into successive storage units of their
    /// declared type's size rather than ISO C's full allocation-unit
    /// rules — `vc`'s non-goal is full conformance, not byte-for-byte
    /// compatibility with a reference compiler's bit-field layout.
    fn register_aggregate(&mut self, tag: &Option<String>, fields: &[FieldDecl], is_union: bool) -> SResult<Type> {
        let mut members = Vec::new();
        let mut offset: u64 = 0;
        let mut size: u64 = 0;
        let mut max_align: u64 = 1;
        let mut is_flexible = false;
        let mut bit_cursor: Option<(u64, u32)> = None; // (storage byte offset, bits used)

        for (i, f) in fields.iter().enumerate() {
            let resolved_ty = self.resolve_type(&f.ty)?;
            let elem_size = sizeof_type(&resolved_ty, self.word_size);
            let align = resolved_ty.align.max(1);
            max_align = max_align.max(align);

            if f.is_flexible_array {
                if i + 1 != fields.len() {
                    return Err(self.err(
                        DiagnosticKind::Semantic,
                        Location::synthetic(),
                        "flexible array member must be the last member",
                    ));
                }
                is_flexible = true;
                members.push(vc_symtab::FieldLayout {
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
                let width = eval_const(bw_expr, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))? as u32;
                let field_offset = if is_union { 0 } else { align_up(offset, align) };
                let (unit_offset, used) = match bit_cursor {
                    Some((u, used)) if !is_union && u == field_offset && used + width <= (elem_size as u32) * 8 => (u, used),
                    _ => (field_offset, 0),
                };
                members.push(vc_symtab::FieldLayout {
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
            members.push(vc_symtab::FieldLayout {
                name: f.name.clone().unwrap_or_default(),
                ty: resolved_ty,
                elem_size,
                byte_offset: field_offset,
                bit_width: None,
                bit_offset: None,
            });
            if is_union {
                size = size.max(elem_size);
            } else {
                offset = field_offset + elem_size;
                size = size.max(offset);
            }
        }

        size = align_up(size, max_align);
        let key = tag.clone().unwrap_or_else(|| self.next_anon_tag());
        let kind = if is_union { TagKind::Union } else { TagKind::Struct };
        self.symtabs.tags.insert(
            key.clone(),
            TagEntry { kind, size, align: max_align, members, is_flexible, enum_values: HashMap::new() },
        );
        let mut t = Type::basic(if is_union { TypeKind::Union } else { TypeKind::Struct }, size, max_align);
        t.tag = Some(key);
        Ok(t)
    }

    /// `check_global(stmt, globals) → ir_block` (spec.md §4.4): register
    /// a file-scope variable and emit its `glob_*` instruction(s).
    pub fn check_global_var(&mut self, v: &VarDecl) -> SResult<()> {
        let mut ty = self.resolve_type(&v.ty)?;
        if let (TypeKind::Array, None, Some(size_expr)) = (ty.kind, ty.array_len, &v.array_size_expr) {
            let n = vc_const::eval_const_u64(size_expr, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?;
            let elem = ty.pointee.as_ref().expect("array carries an element type").as_ref().clone();
            ty = Type::array_of(elem, Some(n));
        }

        let exported = !v.storage.is_static;
        let aggregate_tag = ty.tag.clone();

        let const_value = match &v.init {
            Some(vc_ast::Initializer::Scalar(e)) => {
                Some(eval_const(e, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?)
            }
            _ => None,
        };

        self.symtabs.vars.set(
            &v.name,
            VarEntry {
                ty: ty.clone(),
                is_static: v.storage.is_static,
                is_register: v.storage.is_register,
                is_extern: v.storage.is_extern,
                aggregate_tag,
                const_value,
                frame_offset: None,
                ir_name: v.name.clone(),
            },
        );

        if v.storage.is_extern && v.init.is_none() {
            return Ok(()); // a pure declaration; the defining TU emits the storage
        }

        match &v.init {
            None => self.builder.emit_glob_var(&v.name, ty, None, exported),
            Some(vc_ast::Initializer::Scalar(_)) => self.builder.emit_glob_var(&v.name, ty, const_value, exported),
            Some(vc_ast::Initializer::List(entries)) => self.emit_global_aggregate(&v.name, &ty, entries, exported)?,
        }
        Ok(())
    }

    /// Flatten a (possibly designated) initializer list for an array or
    /// struct global into a header `glob_array`/`glob_struct` instruction
    /// plus one `glob_var`-shaped leaf per constant element, addressed as
    /// `"<name>+<byte offset>"` — the same name-based addressing every
    /// other memory opcode in this IR already uses, so the emitter (not
    /// yet wired up) can resolve each leaf without a new instruction shape.
    fn emit_global_aggregate(&mut self, name: &str, ty: &Type, entries: &[vc_ast::InitEntry], exported: bool) -> SResult<()> {
        let elem_ty = ty.pointee.clone().map(|b| *b);
        match ty.kind {
            TypeKind::Array => {
                self.builder.emit_glob_var(name, ty.clone(), None, exported);
                let elem = elem_ty.expect("array carries an element type");
                let elem_size = sizeof_type(&elem, self.word_size);
                let mut idx: u64 = 0;
                for entry in entries {
                    if let Some(vc_ast::Designator::Index(ie)) = &entry.designator {
                        idx = vc_const::eval_const_u64(ie, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?;
                    }
                    if let vc_ast::InitValue::Scalar(e) = &entry.value {
                        let k = eval_const(e, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?;
                        let leaf_name = format!("{}+{}", name, idx * elem_size);
                        self.builder.emit_glob_var(&leaf_name, elem.clone(), Some(k), exported);
                    }
                    idx += 1;
                }
                Ok(())
            }
            TypeKind::Struct | TypeKind::Union => {
                self.builder.emit_glob_var(name, ty.clone(), None, exported);
                let tag_name = ty.tag.clone().unwrap_or_default();
                let members = self.symtabs.tags.get(&tag_name).map(|t| t.members.clone()).unwrap_or_default();
                let mut pos = 0usize;
                for entry in entries {
                    if let Some(vc_ast::Designator::Field(field_name)) = &entry.designator {
                        pos = members.iter().position(|m| &m.name == field_name).unwrap_or(pos);
                    }
                    if let (Some(member), vc_ast::InitValue::Scalar(e)) = (members.get(pos), &entry.value) {
                        let k = eval_const(e, &ConstCtx::new(self.word_size, &self.symtabs)).map_err(|e| self.const_err(e))?;
                        let leaf_name = format!("{}+{}", name, member.byte_offset);
                        self.builder.emit_glob_var(&leaf_name, member.ty.clone(), Some(k), exported);
                    }
                    pos += 1;
                }
                Ok(())
            }
            _ => {
                self.builder.emit_glob_var(name, ty.clone(), None, exported);
                Ok(())
            }
        }
    }

    /// `check_func(func, globals) → ir_block` (spec.md §4.4).
    pub fn check_function(&mut self, f: &Function) -> SResult<()> {
        let ret_type = self.resolve_type(&f.ret_type)?;
        let mut param_types = Vec::with_capacity(f.params.len());
        for p in &f.params {
            param_types.push(self.resolve_type(&p.ty)?);
        }
        let param_sizes: Vec<u64> = param_types.iter().map(|t| sizeof_type(t, self.word_size)).collect();

        self.symtabs.funcs.set(
            &f.name,
            FuncEntry {
                ret_type: ret_type.clone(),
                ret_size: sizeof_type(&ret_type, self.word_size),
                param_types: param_types.clone(),
                param_sizes,
                is_variadic: f.is_variadic,
                is_prototype_only: f.body.is_none(),
                is_inline: f.is_inline,
                emitted: false,
            },
        );

        let body = match &f.body {
            Some(b) => b,
            None => return Ok(()),
        };

        if f.is_inline && self.inline_emitted.contains(&f.name) {
            return Ok(());
        }

        self.diag.set_function(&f.name);
        self.builder.emit_func_begin(&f.name, !f.is_static);

        let mut labels = LabelTable::new(&f.name);
        {
            let mut lctx = LowerCtx {
                diag: self.diag,
                word_size: self.word_size,
                vars: &mut self.symtabs.vars,
                funcs: &mut self.symtabs.funcs,
                typedefs: &mut self.symtabs.typedefs,
                tags: &mut self.symtabs.tags,
                labels: &mut labels,
                builder: &mut self.builder,
                inline_emitted: &mut self.inline_emitted,
                ret_type: ret_type.clone(),
                break_label: None,
                continue_label: None,
            };
            let mut scope = BlockScope::enter(&mut lctx);
            for (i, p) in f.params.iter().enumerate() {
                if let Some(name) = &p.name {
                    let pty = param_types[i].clone();
                    let _ = scope.vars.declare(
                        name,
                        VarEntry {
                            ty: pty.clone(),
                            is_static: false,
                            is_register: false,
                            is_extern: false,
                            aggregate_tag: pty.tag.clone(),
                            const_value: None,
                            frame_offset: None,
                            ir_name: name.clone(),
                        },
                    );
                    let v = scope.builder.emit_load_param(i as u32, pty.clone());
                    let alias = scope.builder.alias_set_for(name, p.is_restrict);
                    scope.builder.emit_store(name, v, pty, alias, false);
                }
            }
            for s in body {
                stmt::lower_stmt(&mut scope, s)?;
            }
            let undefined = scope.labels.undefined_labels();
            if let Some(missing) = undefined.first() {
                return Err(scope.err(
                    DiagnosticKind::NameResolution,
                    Location::synthetic(),
                    format!("undefined label '{}'", missing),
                ));
            }
        }

        self.builder.emit_func_end(&f.name);
        self.diag.clear_function();
        if f.is_inline {
            self.inline_emitted.insert(f.name.clone());
        }
        Ok(())
    }
}

fn align_up(v: u64, align: u64) -> u64 {
    if align <= 1 {
        v
    } else {
        (v + align - 1) / align * align
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::TranslationUnit;
    use vc_diag::DiagCtx;

    #[test]
    fn registers_struct_layout_with_offsets() {
        let diag = DiagCtx::new("t.c");
        let mut sema = SemaCtx::new(&diag, WordSize::W64, "t");
        let fields = vec![
            FieldDecl { name: Some("a".into()), ty: Type::basic(TypeKind::Int, 4, 4), bit_width: None, is_flexible_array: false },
            FieldDecl { name: Some("b".into()), ty: Type::basic(TypeKind::Char, 1, 1), bit_width: None, is_flexible_array: false },
        ];
        let ty = sema.register_aggregate(&Some("S".into()), &fields, false).unwrap();
        assert_eq!(ty.size, 8);
        let tag = sema.symtabs.tags.get("S").unwrap();
        assert_eq!(tag.member("b").unwrap().byte_offset, 4);
    }

    #[test]
    fn enum_values_default_sequentially() {
        let diag = DiagCtx::new("t.c");
        let mut sema = SemaCtx::new(&diag, WordSize::W64, "t");
        let variants = vec![
            EnumVariant { name: "A".into(), value: Some(vc_ast::Expr::new(vc_ast::ExprKind::IntLit { value: 1, is_unsigned: false, long_count: 0 }, Location::new(1, 1))) },
            EnumVariant { name: "B".into(), value: None },
            EnumVariant { name: "C".into(), value: Some(vc_ast::Expr::new(vc_ast::ExprKind::IntLit { value: 5, is_unsigned: false, long_count: 0 }, Location::new(1, 1))) },
        ];
        sema.register_enum(&None, &variants).unwrap();
        let tag = sema.symtabs.tags.values().find(|t| t.enum_values.contains_key("B")).unwrap();
        assert_eq!(tag.enum_values["A"], 1);
        assert_eq!(tag.enum_values["B"], 2);
        assert_eq!(tag.enum_values["C"], 5);
    }

    #[test]
    fn e1_return_const_expr_lowers() {
        let diag = DiagCtx::new("t.c");
        let mut sema = SemaCtx::new(&diag, WordSize::W64, "t");
        let two = vc_ast::Expr::new(vc_ast::ExprKind::IntLit { value: 2, is_unsigned: false, long_count: 0 }, Location::new(1, 1));
        let three = vc_ast::Expr::new(vc_ast::ExprKind::IntLit { value: 3, is_unsigned: false, long_count: 0 }, Location::new(1, 1));
        let four = vc_ast::Expr::new(vc_ast::ExprKind::IntLit { value: 4, is_unsigned: false, long_count: 0 }, Location::new(1, 1));
        let mul = vc_ast::Expr::new(vc_ast::ExprKind::Binary { op: vc_ast::BinaryOp::Mul, lhs: Box::new(three), rhs: Box::new(four) }, Location::new(1, 1));
        let add = vc_ast::Expr::new(vc_ast::ExprKind::Binary { op: vc_ast::BinaryOp::Add, lhs: Box::new(two), rhs: Box::new(mul) }, Location::new(1, 1));
        let func = Function {
            name: "main".into(),
            ret_type: Type::basic(TypeKind::Int, 4, 4),
            ret_tag: None,
            params: vec![],
            is_variadic: false,
            body: Some(vec![Stmt::Return(Some(add))]),
            is_inline: false,
            is_noreturn: false,
            is_static: false,
            loc: Location::new(1, 1),
        };
        let tu = TranslationUnit { items: vec![TopLevel::Function(func)] };
        sema.check_translation_unit(&tu).unwrap();
        let ops: Vec<_> = sema.builder.list.iter().map(|(_, i)| i.op).collect();
        assert!(ops.contains(&vc_ir::Opcode::Return));
        assert!(ops.contains(&vc_ir::Opcode::FuncBegin));
        assert!(ops.contains(&vc_ir::Opcode::FuncEnd));
    }
}
