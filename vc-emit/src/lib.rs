//! Assembly emitter (spec.md §4.7, component J): turns `vc-ir`'s
//! instruction list plus `vc-regalloc`'s per-function locations into AT&T
//! or Intel syntax x86-32/x86-64 assembly text.
//!
//! Grounded on `cranelift-codegen`'s text-emission path: one pass over
//! the instruction stream, one formatted fragment appended per
//! instruction, no intermediate machine-code representation (spec.md §6
//! only asks for assembly text, never an object file).

mod frame;
mod function;
mod globals;
mod registers;

use vc_ir::IrBuilder;
use vc_regalloc::{FunctionAlloc, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Att,
    Intel,
}

/// Assembles the whole translation unit's `.data`/`.bss`/`.rodata`
/// sections followed by `.text`, in that order, matching spec.md §6's
/// output list.
pub fn emit(builder: &IrBuilder, allocs: &[FunctionAlloc], target: Target, syntax: Syntax) -> String {
    let mut out = String::new();
    out.push_str(&globals::emit_data(builder));
    out.push_str(&globals::emit_rodata(builder));
    out.push_str(&function::emit_functions(builder, allocs, target, syntax));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::{Type, TypeKind};

    fn int_ty() -> Type {
        Type::basic(TypeKind::Int, 4, 4)
    }

    #[test]
    fn emits_a_minimal_function_with_prologue_and_epilogue() {
        let mut b = IrBuilder::new("t");
        b.emit_func_begin("main", true);
        let c = b.emit_const_int(42, int_ty());
        b.emit_return(Some(c));
        b.emit_func_end("main");

        let allocs = vc_regalloc::allocate(&b, Target::X86_64);
        let out = emit(&b, &allocs, Target::X86_64, Syntax::Att);
        assert!(out.contains(".globl main"));
        assert!(out.contains("main:"));
        assert!(out.contains("push %rbp"));
        assert!(out.contains("ret"));
    }

    #[test]
    fn emits_a_global_and_a_function_together() {
        let mut b = IrBuilder::new("t");
        b.emit_glob_var("g", int_ty(), Some(7), true);
        b.emit_func_begin("f", true);
        b.emit_return(None);
        b.emit_func_end("f");

        let allocs = vc_regalloc::allocate(&b, Target::X86_64);
        let out = emit(&b, &allocs, Target::X86_64, Syntax::Att);
        assert!(out.contains(".data"));
        assert!(out.contains("g:"));
        assert!(out.contains(".text"));
        assert!(out.contains("f:"));
    }
}
