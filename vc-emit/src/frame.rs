//! Per-function local-storage frame layout.
//!
//! `vc-regalloc` only places register-allocated `ValueId`s (spec.md
//! §4.6); named storage (`Load`/`Store`/`Addr`/`Alloca`'s `name` field —
//! a C local variable, possibly accessed piecewise through the
//! `"<base>+<byte offset>"` aggregate-member convention `vc-sema` already
//! uses for both locals and globals) is a separate addressing domain the
//! emitter owns directly, the same way it owns complex/long-double
//! temporaries that never enter a register class either.

use std::collections::{HashMap, HashSet};
use vc_ir::{Instr, Opcode};
use vc_regalloc::Target;

pub struct LocalFrame {
    offsets: HashMap<String, u64>,
    /// Stack slots (in `target.word_size()` units) this frame occupies,
    /// for the caller to fold into the function's total frame size.
    pub extra_slots: u32,
}

impl LocalFrame {
    /// Byte offset below the frame pointer for `name`, honoring the
    /// `"<base>+<offset>"` aggregate-member convention.
    pub fn offset(&self, name: &str) -> u64 {
        let (base, extra) = match name.split_once('+') {
            Some((b, o)) => (b, o.parse::<u64>().unwrap_or(0)),
            None => (name, 0),
        };
        self.offsets.get(base).copied().unwrap_or(0) + extra
    }

    /// Whether `base` (already stripped of any `"+offset"` suffix) was
    /// assigned a frame slot, i.e. is a true local rather than a global.
    pub fn is_local(&self, base: &str) -> bool {
        self.offsets.contains_key(base)
    }
}

/// Scans one function's body for every named memory access not aliasing
/// a known global, and assigns each base name a word-aligned slot sized
/// to the largest offset+size any access to it reaches — this is exactly
/// the same "flatten aggregate member accesses into one byte layout"
/// problem `vc-emit::globals` solves for file-scope aggregates, just
/// against observed accesses instead of an explicit initializer list.
pub fn build(body: &[Instr], globals: &HashSet<String>, spill_slots: u32, target: Target) -> LocalFrame {
    let mut extents: HashMap<String, u64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for instr in body {
        if instr.name.is_empty() {
            continue;
        }
        let is_named_access = instr.op.is_memory() || matches!(instr.op, Opcode::LoadBitfield | Opcode::StoreBitfield);
        if !is_named_access {
            continue;
        }
        let (base, off) = match instr.name.split_once('+') {
            Some((b, o)) => (b.to_string(), o.parse::<u64>().unwrap_or(0)),
            None => (instr.name.clone(), 0),
        };
        if globals.contains(&base) {
            continue;
        }
        let size = instr.ty.size.max(1);
        let extent = off + size;
        if !extents.contains_key(&base) {
            order.push(base.clone());
            extents.insert(base.clone(), 0);
        }
        let e = extents.get_mut(&base).expect("just inserted");
        if extent > *e {
            *e = extent;
        }
    }

    let word = target.word_size();
    let mut offsets = HashMap::new();
    let mut cursor = spill_slots as u64 * word;
    for name in order {
        let size = extents[&name];
        let aligned = ((size + word - 1) / word) * word;
        cursor += aligned;
        offsets.insert(name, cursor);
    }
    let extra_slots = ((cursor - spill_slots as u64 * word) / word) as u32;
    LocalFrame { offsets, extra_slots }
}

/// Every `GlobVar`/`GlobArray`/`GlobStruct`/`GlobUnion`/`GlobString` base
/// name in the whole translation unit (the leaf `"+offset"` suffix
/// stripped), so `build` can tell a local from a global sharing the
/// emitter's flat name-addressing scheme.
pub fn collect_global_names(instrs: &[Instr]) -> HashSet<String> {
    instrs
        .iter()
        .filter(|i| {
            matches!(
                i.op,
                Opcode::GlobVar | Opcode::GlobArray | Opcode::GlobStruct | Opcode::GlobUnion | Opcode::GlobString
            )
        })
        .map(|i| i.name.split('+').next().unwrap_or(&i.name).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::{Type, TypeKind};
    use vc_ir::IrBuilder;

    fn int_ty() -> Type {
        Type::basic(TypeKind::Int, 4, 4)
    }

    #[test]
    fn distinct_locals_get_distinct_offsets() {
        let mut b = IrBuilder::new("t");
        let alias = b.alias_set_for("x", false);
        let v = b.emit_const_int(1, int_ty());
        b.emit_store("x", v, int_ty(), alias, false);
        let alias2 = b.alias_set_for("y", false);
        b.emit_store("y", v, int_ty(), alias2, false);
        let body: Vec<Instr> = b.list.iter().map(|(_, i)| i.clone()).collect();
        let frame = build(&body, &HashSet::new(), 0, Target::X86_64);
        assert_ne!(frame.offset("x"), frame.offset("y"));
    }

    #[test]
    fn aggregate_leaves_share_one_slot_sized_to_the_largest_extent() {
        let mut b = IrBuilder::new("t");
        let alias = b.alias_set_for("a", false);
        let v = b.emit_const_int(1, int_ty());
        b.emit_store("a+0", v, int_ty(), alias, false);
        b.emit_store("a+8", v, int_ty(), alias, false);
        let body: Vec<Instr> = b.list.iter().map(|(_, i)| i.clone()).collect();
        let frame = build(&body, &HashSet::new(), 0, Target::X86_64);
        assert_eq!(frame.offset("a+0") + 8, frame.offset("a+8"));
    }

    #[test]
    fn global_names_are_excluded_from_the_local_frame() {
        let mut b = IrBuilder::new("t");
        b.emit_glob_var("g", int_ty(), None, true);
        let alias = b.alias_set_for("g", false);
        b.emit_load("g", int_ty(), alias, false);
        let body: Vec<Instr> = b.list.iter().map(|(_, i)| i.clone()).collect();
        let globals = collect_global_names(&body);
        let frame = build(&body, &globals, 0, Target::X86_64);
        assert_eq!(frame.extra_slots, 0);
    }
}
