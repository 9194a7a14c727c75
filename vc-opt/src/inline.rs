//! Inliner (spec.md §4.5): substitutes small, self-contained callees
//! directly into their call sites.
//!
//! `vc`'s IR has no basic blocks and `InstrList` offers no splice-in-the-
//! middle primitive (only `push_back`/`remove`), so unlike
//! `cranelift-codegen`'s CFG-aware inliner this rebuilds the whole
//! instruction list in one forward pass: every instruction is copied
//! across unchanged except a call to an eligible function, which is
//! replaced by a freshly cloned copy of that function's body.
//!
//! Eligibility is deliberately narrow and non-recursive (this pass runs
//! once, like the rest of the pipeline): a callee qualifies only if its
//! body is short, calls no other function, allocates no VLA buffer, and
//! ends in exactly one `Return` that is its last instruction — so the
//! clone never needs to jump past a sibling path the way the function's
//! own internal branches do, and splicing it in linearly is always safe.
//! Only call sites whose argument count matches its parameter count are
//! substituted. Recursive self-calls are never inlined, since a function
//! that calls anything (including itself) is already disqualified.

use std::collections::{HashMap, HashSet};
use vc_ir::{Instr, InstrList, IrBuilder, Opcode, ValueId};

const MAX_INLINE_LEN: usize = 24;

struct Callee {
    /// Body instructions strictly between `FuncBegin` and `FuncEnd`.
    body: Vec<Instr>,
    param_count: usize,
}

pub fn run(builder: &mut IrBuilder) {
    let snapshot: Vec<Instr> = builder.list.iter().map(|(_, i)| i.clone()).collect();
    let globals = collect_global_names(&snapshot);
    let callees = collect_callees(&snapshot);

    let mut new_list = InstrList::new();
    let mut pending_args: Vec<Instr> = Vec::new();
    let mut site = 0u32;

    for instr in snapshot {
        if instr.op == Opcode::Arg {
            pending_args.push(instr);
            continue;
        }

        if instr.op == Opcode::Call {
            if let Some(callee) = callees.get(&instr.name) {
                if callee.param_count == pending_args.len() {
                    let args: Vec<ValueId> = pending_args.drain(..).map(|a| a.src1).collect();
                    site += 1;
                    inline_call(builder, &mut new_list, callee, &args, instr.dest, &instr.ty, &globals, site);
                    continue;
                }
            }
        }

        for a in pending_args.drain(..) {
            new_list.push_back(a);
        }
        new_list.push_back(instr);
    }
    for a in pending_args.drain(..) {
        new_list.push_back(a);
    }

    builder.list = new_list;
}

fn collect_global_names(snapshot: &[Instr]) -> HashSet<String> {
    snapshot
        .iter()
        .filter(|i| {
            matches!(
                i.op,
                Opcode::GlobVar | Opcode::GlobArray | Opcode::GlobStruct | Opcode::GlobUnion | Opcode::GlobString
            )
        })
        .map(|i| i.name.clone())
        .collect()
}

fn collect_callees(snapshot: &[Instr]) -> HashMap<String, Callee> {
    let mut out = HashMap::new();
    let mut cur: Option<(String, Vec<Instr>)> = None;

    for instr in snapshot {
        match instr.op {
            Opcode::FuncBegin => cur = Some((instr.name.clone(), Vec::new())),
            Opcode::FuncEnd => {
                if let Some((name, body)) = cur.take() {
                    // A single, final `Return` means the clone never needs
                    // to skip over a sibling control-flow path the way the
                    // original function's own branches do: the last
                    // instruction is the only exit, so splicing the body
                    // in and continuing linearly is safe.
                    let single_final_return = body
                        .last()
                        .map(|i| i.op == Opcode::Return)
                        .unwrap_or(false)
                        && body.iter().filter(|i| i.op == Opcode::Return).count() == 1;
                    let eligible = single_final_return
                        && body.len() <= MAX_INLINE_LEN
                        && !body.iter().any(|i| matches!(i.op, Opcode::Call | Opcode::CallPtr | Opcode::Alloca));
                    if eligible {
                        let param_count = body.iter().filter(|i| i.op == Opcode::LoadParam).count();
                        out.insert(name, Callee { body, param_count });
                    }
                }
            }
            _ => {
                if let Some((_, body)) = cur.as_mut() {
                    body.push(instr.clone());
                }
            }
        }
    }
    out
}

/// Clones `callee`'s body into `new_list` at a call site, substituting
/// `args` for its `LoadParam`s and renaming every local storage name and
/// label so repeated inlining of the same callee never collides with
/// itself or with the caller's own locals. Global names are left alone.
fn inline_call(
    builder: &mut IrBuilder,
    new_list: &mut InstrList,
    callee: &Callee,
    args: &[ValueId],
    call_dest: ValueId,
    ret_ty: &vc_ast::Type,
    globals: &HashSet<String>,
    site: u32,
) {
    let suffix = format!("$inl{}", site);
    let mut value_map: HashMap<ValueId, ValueId> = HashMap::new();
    let mut label_map: HashMap<String, String> = HashMap::new();

    for instr in &callee.body {
        if instr.op == Opcode::Label {
            label_map.insert(instr.name.clone(), builder.new_label("inl"));
        }
    }

    let is_void = ret_ty.kind == vc_ast::TypeKind::Void;
    let ret_name = builder.new_label("inl_ret");

    for instr in &callee.body {
        if instr.op == Opcode::LoadParam {
            let idx = instr.imm as usize;
            if let Some(&arg) = args.get(idx) {
                value_map.insert(instr.dest, arg);
            }
            continue;
        }

        let mut cloned = instr.clone();
        cloned.src1 = remap_value(cloned.src1, &value_map);
        cloned.src2 = remap_value(cloned.src2, &value_map);

        if cloned.op.produces_value() {
            let fresh = builder.new_value(cloned.ty.clone());
            value_map.insert(instr.dest, fresh);
            cloned.dest = fresh;
        }

        match cloned.op {
            Opcode::Label | Opcode::Br | Opcode::BCond => {
                if let Some(renamed) = label_map.get(&cloned.name) {
                    cloned.name = renamed.clone();
                }
                new_list.push_back(cloned);
            }
            Opcode::Return => {
                if !is_void {
                    let mut store = Instr::new(Opcode::Store, ret_ty.clone());
                    store.src1 = cloned.src1;
                    store.name = ret_name.clone();
                    new_list.push_back(store);
                }
                // The Return is always the clone's last instruction
                // (enforced at collection time), so dropping it here and
                // letting the final load below read `ret_name` is exact.
            }
            Opcode::StoreIdx => {
                // The stored value travels packed in `imm`; remap it too.
                let stored = remap_value(ValueId(instr.imm as u32), &value_map);
                cloned.imm = stored.0 as i64;
                cloned.name = rename_storage(&cloned.name, globals, &suffix);
                new_list.push_back(cloned);
            }
            _ if cloned.op.is_memory() || cloned.op == Opcode::GlobVar => {
                if !cloned.name.is_empty() {
                    cloned.name = rename_storage(&cloned.name, globals, &suffix);
                }
                new_list.push_back(cloned);
            }
            _ => {
                new_list.push_back(cloned);
            }
        }
    }

    if !is_void {
        let mut load = Instr::new(Opcode::Load, ret_ty.clone());
        load.dest = call_dest;
        load.name = ret_name;
        new_list.push_back(load);
    }
}

fn remap_value(id: ValueId, map: &HashMap<ValueId, ValueId>) -> ValueId {
    if id.is_none() {
        id
    } else {
        *map.get(&id).unwrap_or(&id)
    }
}

/// Renames a local storage reference (including the `"<base>+<offset>"`
/// aggregate-member convention) so it can't collide with the caller's own
/// locals; global names pass through untouched.
fn rename_storage(name: &str, globals: &HashSet<String>, suffix: &str) -> String {
    let base = name.split('+').next().unwrap_or(name);
    if globals.contains(base) {
        return name.to_string();
    }
    match name.split_once('+') {
        Some((b, rest)) => format!("{}{}+{}", b, suffix, rest),
        None => format!("{}{}", name, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::{Type, TypeKind};

    fn int_ty() -> Type {
        Type::basic(TypeKind::Int, 4, 4)
    }

    #[test]
    fn inlines_small_leaf_callee() {
        let mut b = IrBuilder::new("t");
        b.emit_func_begin("add1", true);
        let p = b.emit_load_param(0, int_ty());
        let one = b.emit_const_int(1, int_ty());
        let sum = b.emit_binary(Opcode::Add, p, one, int_ty());
        b.emit_return(Some(sum));
        b.emit_func_end("add1");

        b.emit_func_begin("main", true);
        let five = b.emit_const_int(5, int_ty());
        b.emit_arg(five, int_ty());
        let call_dest = b.emit_call("add1", int_ty());
        let alias = b.alias_set_for("r", false);
        b.emit_store("r", call_dest, int_ty(), alias, false);
        b.emit_func_end("main");

        let before_has_call = b.list.iter().any(|(_, i)| i.op == Opcode::Call);
        assert!(before_has_call);
        run(&mut b);
        let after_has_call = b.list.iter().any(|(_, i)| i.op == Opcode::Call);
        assert!(!after_has_call);
    }

    #[test]
    fn leaves_mismatched_arity_call_site_alone() {
        let mut b = IrBuilder::new("t");
        b.emit_func_begin("add1", true);
        let p = b.emit_load_param(0, int_ty());
        b.emit_return(Some(p));
        b.emit_func_end("add1");

        b.emit_func_begin("main", true);
        let call_dest = b.emit_call("add1", int_ty());
        let alias = b.alias_set_for("r", false);
        b.emit_store("r", call_dest, int_ty(), alias, false);
        b.emit_func_end("main");

        run(&mut b);
        assert!(b.list.iter().any(|(_, i)| i.op == Opcode::Call));
    }
}
