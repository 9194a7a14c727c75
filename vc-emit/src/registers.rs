//! Per-target, per-width register name tables and the `loc_str` operand
//! formatter (spec.md §4.7).
//!
//! Index 0 of each class is `vc-regalloc`'s reserved scratch register —
//! never assigned to a live range, but still a real machine register the
//! emitter materializes spilled operands through.

use crate::Syntax;
use vc_regalloc::Target;

const INT64: [&str; 14] = [
    "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
];
const INT32: [&str; 6] = ["eax", "ebx", "ecx", "edx", "esi", "edi"];

pub fn base_pointer(target: Target) -> &'static str {
    match target {
        Target::X86_64 => "rbp",
        Target::X86_32 => "ebp",
    }
}

fn stack_pointer(target: Target) -> &'static str {
    match target {
        Target::X86_64 => "rsp",
        Target::X86_32 => "esp",
    }
}

/// Integer register name at `size` bytes (1, 2, 4, or 8), without the
/// `%`/`[]` syntax decoration `loc_str` adds.
fn int_reg_name(index: usize, size: u64, target: Target) -> String {
    match target {
        Target::X86_64 => size_variant_64(INT64[index], size),
        Target::X86_32 => size_variant_32(INT32[index], size),
    }
}

fn size_variant_64(base: &str, size: u64) -> String {
    if size == 8 {
        return base.to_string();
    }
    // r8..r15 keep their name and take a d/w/b size suffix.
    if base.starts_with('r') && base[1..].chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        return match size {
            4 => format!("{}d", base),
            2 => format!("{}w", base),
            1 => format!("{}b", base),
            _ => base.to_string(),
        };
    }
    // rax/rbx/rcx/rdx/rsi/rdi have their own historical sub-names.
    let core = &base[1..];
    let name = match (core, size) {
        ("ax", 4) => "eax", ("ax", 2) => "ax", ("ax", 1) => "al",
        ("bx", 4) => "ebx", ("bx", 2) => "bx", ("bx", 1) => "bl",
        ("cx", 4) => "ecx", ("cx", 2) => "cx", ("cx", 1) => "cl",
        ("dx", 4) => "edx", ("dx", 2) => "dx", ("dx", 1) => "dl",
        ("si", 4) => "esi", ("si", 2) => "si", ("si", 1) => "sil",
        ("di", 4) => "edi", ("di", 2) => "di", ("di", 1) => "dil",
        _ => base,
    };
    name.to_string()
}

fn size_variant_32(base: &str, size: u64) -> String {
    if size == 4 {
        return base.to_string();
    }
    let core = &base[1..];
    let name = match (core, size) {
        ("ax", 2) => "ax", ("ax", 1) => "al",
        ("bx", 2) => "bx", ("bx", 1) => "bl",
        ("cx", 2) => "cx", ("cx", 1) => "cl",
        ("dx", 2) => "dx", ("dx", 1) => "dl",
        // si/di have no 8-bit encoding without a REX prefix on x86-32.
        ("si", _) => "si",
        ("di", _) => "di",
        _ => base,
    };
    name.to_string()
}

fn xmm_reg_name(index: usize) -> String {
    format!("xmm{}", index)
}

/// `loc_str(id, x64, syntax)` from spec.md §4.7: formats a register index
/// or a negative stack-slot index as the target's operand syntax.
pub fn loc_str(loc: i32, size: u64, is_xmm: bool, target: Target, syntax: Syntax) -> String {
    if loc >= 0 {
        let name = if is_xmm {
            xmm_reg_name(loc as usize)
        } else {
            int_reg_name(loc as usize, size, target)
        };
        match syntax {
            Syntax::Att => format!("%{}", name),
            Syntax::Intel => name,
        }
    } else {
        let slot = (-1 - loc) as u64;
        let offset = (slot + 1) * target.word_size();
        let bp = base_pointer(target);
        match syntax {
            Syntax::Att => format!("-{}(%{})", offset, bp),
            Syntax::Intel => format!("[{}-{}]", bp, offset),
        }
    }
}

/// The scratch register reserved by `vc-regalloc` (index 0 of its class),
/// decorated for the target's operand syntax.
pub fn scratch(size: u64, is_xmm: bool, target: Target, syntax: Syntax) -> String {
    loc_str(0, size, is_xmm, target, syntax)
}

pub fn reg(name: &str, syntax: Syntax) -> String {
    match syntax {
        Syntax::Att => format!("%{}", name),
        Syntax::Intel => name.to_string(),
    }
}

pub fn sp(target: Target, syntax: Syntax) -> String {
    reg(stack_pointer(target), syntax)
}

pub fn bp(target: Target, syntax: Syntax) -> String {
    reg(base_pointer(target), syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn att_register_gets_percent_prefix() {
        assert_eq!(loc_str(0, 8, false, Target::X86_64, Syntax::Att), "%rax");
    }

    #[test]
    fn intel_register_has_no_prefix() {
        assert_eq!(loc_str(0, 8, false, Target::X86_64, Syntax::Intel), "rax");
    }

    #[test]
    fn spill_slot_formats_as_rbp_offset() {
        assert_eq!(loc_str(-1, 8, false, Target::X86_64, Syntax::Att), "-8(%rbp)");
        assert_eq!(loc_str(-1, 8, false, Target::X86_64, Syntax::Intel), "[rbp-8]");
    }

    #[test]
    fn extended_register_takes_byte_suffix() {
        assert_eq!(loc_str(6, 1, false, Target::X86_64, Syntax::Att), "%r8b");
    }

    #[test]
    fn x86_32_has_no_extended_registers() {
        assert_eq!(loc_str(5, 4, false, Target::X86_32, Syntax::Att), "%edi");
    }
}
