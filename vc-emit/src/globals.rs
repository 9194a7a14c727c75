//! `.data`/`.bss`/`.rodata` directive emission for file-scope objects and
//! string literals (spec.md §6's "Output" list).
//!
//! `vc-sema` never constructs `Opcode::GlobArray`/`GlobStruct`/`GlobUnion`
//! (`vc-sema/src/lib.rs`'s `emit_global_aggregate`): every global, scalar
//! or aggregate, is one header `GlobVar` plus zero or more leaf `GlobVar`s
//! named `"<base>+<byte offset>"`. This module groups leaves back under
//! their header and lays out one combined run of directives per symbol.

use std::collections::HashMap;
use vc_ast::{Type, TypeKind};
use vc_ir::{IrBuilder, Opcode};

struct GlobalSym {
    ty: Type,
    exported: bool,
    scalar_value: Option<i64>,
    leaves: Vec<(u64, i64, u64)>,
    order: usize,
}

/// Emits `.data`/`.bss` for every `GlobVar` (and, defensively, the unused
/// `GlobArray`/`GlobStruct`/`GlobUnion` opcodes, in case a future lowering
/// ever constructs one) anywhere in `builder`'s list, in declaration order.
pub fn emit_data(builder: &IrBuilder) -> String {
    let mut syms: HashMap<String, GlobalSym> = HashMap::new();
    let mut next_order = 0usize;

    for (_, instr) in builder.list.iter() {
        if !matches!(instr.op, Opcode::GlobVar | Opcode::GlobArray | Opcode::GlobStruct | Opcode::GlobUnion) {
            continue;
        }
        match instr.name.split_once('+') {
            Some((base, off)) => {
                let offset: u64 = off.parse().unwrap_or(0);
                let sym = syms.entry(base.to_string()).or_insert_with(|| new_sym(&mut next_order));
                sym.leaves.push((offset, instr.imm, instr.ty.size.max(1)));
            }
            None => {
                let sym = syms.entry(instr.name.clone()).or_insert_with(|| new_sym(&mut next_order));
                sym.ty = instr.ty.clone();
                sym.exported = instr.is_restrict;
                if instr.ty.kind.is_scalar() {
                    sym.scalar_value = Some(instr.imm);
                }
            }
        }
    }

    let mut ordered: Vec<(String, GlobalSym)> = syms.into_iter().collect();
    ordered.sort_by_key(|(_, s)| s.order);

    let mut buf = String::new();
    for (name, sym) in &ordered {
        emit_symbol(&mut buf, name, sym);
    }
    buf
}

fn new_sym(next_order: &mut usize) -> GlobalSym {
    let order = *next_order;
    *next_order += 1;
    GlobalSym { ty: Type::void(), exported: false, scalar_value: None, leaves: Vec::new(), order }
}

fn emit_symbol(buf: &mut String, name: &str, sym: &GlobalSym) {
    let size = sym.ty.size.max(1);
    let align = sym.ty.align.max(1);
    let all_zero = sym.scalar_value.unwrap_or(0) == 0 && sym.leaves.iter().all(|&(_, v, _)| v == 0);

    if sym.exported {
        buf.push_str(&format!(".globl {}\n", name));
    }

    if all_zero {
        buf.push_str(".bss\n");
        buf.push_str(&format!(".align {}\n", align));
        buf.push_str(&format!("{}:\n", name));
        buf.push_str(&format!("    .zero {}\n", size));
        return;
    }

    buf.push_str(".data\n");
    buf.push_str(&format!(".align {}\n", align));
    buf.push_str(&format!("{}:\n", name));

    if let Some(v) = sym.scalar_value {
        emit_value_bytes(buf, v, size);
        return;
    }

    let mut leaves = sym.leaves.clone();
    leaves.sort_by_key(|&(off, _, _)| off);
    let mut cursor = 0u64;
    for (off, val, lsize) in leaves {
        if off > cursor {
            buf.push_str(&format!("    .zero {}\n", off - cursor));
        }
        emit_value_bytes(buf, val, lsize);
        cursor = off + lsize;
    }
    if cursor < size {
        buf.push_str(&format!("    .zero {}\n", size - cursor));
    }
}

fn emit_value_bytes(buf: &mut String, value: i64, size: u64) {
    let (directive, width) = match size {
        1 => (".byte", 1),
        2 => (".word", 2),
        4 => (".long", 4),
        _ => (".quad", 8),
    };
    buf.push_str(&format!("    {} {}\n", directive, value));
    if size > width {
        buf.push_str(&format!("    .zero {}\n", size - width));
    }
}

/// `.rodata` string literals, each under its own private label
/// (`GlobString`'s `name`), in declaration order. `vc-ir`'s `StringTable`
/// holds the actual bytes; the instruction itself only carries the label
/// and a byte count.
pub fn emit_rodata(builder: &IrBuilder) -> String {
    let mut buf = String::new();
    for (_, instr) in builder.list.iter() {
        if instr.op != Opcode::GlobString {
            continue;
        }
        let bytes = builder.strings.get(&instr.name).unwrap_or(&[]);
        buf.push_str(".rodata\n");
        buf.push_str(&format!("{}:\n", instr.name));
        buf.push_str("    .ascii \"");
        for &b in bytes {
            escape_byte(&mut buf, b);
        }
        buf.push_str("\"\n");
        buf.push_str("    .byte 0\n");
    }
    buf
}

fn escape_byte(buf: &mut String, b: u8) {
    match b {
        b'"' => buf.push_str("\\\""),
        b'\\' => buf.push_str("\\\\"),
        b'\n' => buf.push_str("\\n"),
        b'\t' => buf.push_str("\\t"),
        0x20..=0x7e => buf.push(b as char),
        _ => buf.push_str(&format!("\\{:03o}", b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ir::IrBuilder;

    fn int_ty() -> Type {
        Type::basic(TypeKind::Int, 4, 4)
    }

    #[test]
    fn zero_initialized_scalar_goes_to_bss() {
        let mut b = IrBuilder::new("t");
        b.emit_glob_var("g", int_ty(), None, true);
        let out = emit_data(&b);
        assert!(out.contains(".bss"));
        assert!(out.contains("g:"));
        assert!(out.contains(".zero 4"));
    }

    #[test]
    fn nonzero_scalar_goes_to_data() {
        let mut b = IrBuilder::new("t");
        b.emit_glob_var("g", int_ty(), Some(7), true);
        let out = emit_data(&b);
        assert!(out.contains(".data"));
        assert!(out.contains(".long 7"));
    }

    #[test]
    fn aggregate_leaves_lay_out_with_gaps() {
        let mut b = IrBuilder::new("t");
        let arr_ty = Type::array_of(int_ty(), Some(3));
        b.emit_glob_var("a", arr_ty, None, false);
        b.emit_glob_var("a+0", int_ty(), Some(1), false);
        b.emit_glob_var("a+8", int_ty(), Some(3), false);
        let out = emit_data(&b);
        assert!(out.contains(".long 1"));
        assert!(out.contains(".zero 4"));
        assert!(out.contains(".long 3"));
    }

    #[test]
    fn string_literal_emits_rodata_with_nul_terminator() {
        let mut b = IrBuilder::new("t");
        let ptr_ty = Type::ptr_to(Type::basic(TypeKind::Char, 1, 1), 8);
        b.emit_string_literal(".Lstr0", b"hi", ptr_ty);
        let out = emit_rodata(&b);
        assert!(out.contains(".rodata"));
        assert!(out.contains(".Lstr0:"));
        assert!(out.contains("\"hi\""));
        assert!(out.contains(".byte 0"));
    }
}
