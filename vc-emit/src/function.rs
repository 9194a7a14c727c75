//! Per-instruction code emission inside a function body (spec.md §4.7).
//!
//! One match on `instr.op`, one formatted fragment into the caller's
//! buffer, following `cranelift-codegen`'s own "match the opcode, emit
//! the text" shape rather than a trait-object-per-opcode visitor.

use std::collections::HashMap;
use vc_ast::{Type, TypeKind};
use vc_ir::{Instr, IrBuilder, Opcode, ValueId};
use vc_regalloc::{is_xmm_class, FunctionAlloc, Target};

use crate::frame::{self, LocalFrame};
use crate::registers::{self, loc_str};
use crate::Syntax;

pub fn emit_functions(builder: &IrBuilder, allocs: &[FunctionAlloc], target: Target, syntax: Syntax) -> String {
    let by_name: HashMap<&str, &FunctionAlloc> = allocs.iter().map(|a| (a.name.as_str(), a)).collect();
    let all: Vec<Instr> = builder.list.iter().map(|(_, i)| i.clone()).collect();
    let globals = frame::collect_global_names(&all);

    let mut buf = String::new();
    buf.push_str(".text\n");

    let mut cur_name = String::new();
    let mut cur_exported = false;
    let mut cur_body: Vec<Instr> = Vec::new();
    let mut in_func = false;

    for instr in &all {
        match instr.op {
            Opcode::FuncBegin => {
                in_func = true;
                cur_name = instr.name.clone();
                cur_exported = instr.is_restrict;
                cur_body.clear();
            }
            Opcode::FuncEnd => {
                in_func = false;
                let alloc = by_name.get(cur_name.as_str()).copied();
                let frame = frame::build(&cur_body, &globals, alloc.map(|a| a.stack_slots).unwrap_or(0), target);
                let total_slots = alloc.map(|a| a.stack_slots).unwrap_or(0) + frame.extra_slots;
                emit_prologue(&mut buf, &cur_name, cur_exported, total_slots, target, syntax);
                let empty = FunctionAlloc { name: cur_name.clone(), loc: HashMap::new(), stack_slots: 0 };
                let alloc = alloc.unwrap_or(&empty);
                for i in &cur_body {
                    emit_instr(&mut buf, i, alloc, &frame, &cur_name, target, syntax);
                }
                emit_epilogue(&mut buf, &cur_name, target, syntax);
            }
            Opcode::GlobVar | Opcode::GlobArray | Opcode::GlobStruct | Opcode::GlobUnion | Opcode::GlobString => {
                // Laid out separately by `globals.rs`; skipped here so a
                // string literal used mid-expression doesn't interrupt
                // the surrounding function's text.
            }
            _ => {
                if in_func {
                    cur_body.push(instr.clone());
                }
            }
        }
    }
    buf
}

fn emit_prologue(buf: &mut String, name: &str, exported: bool, total_slots: u32, target: Target, syntax: Syntax) {
    if exported {
        buf.push_str(&format!(".globl {}\n", name));
    }
    buf.push_str(&format!("{}:\n", name));
    let bp = registers::bp(target, syntax);
    let sp = registers::sp(target, syntax);
    push_operand(buf, &bp);
    mov(buf, &sp, &bp, syntax);
    let raw = total_slots as u64 * target.word_size();
    let frame_bytes = if target == Target::X86_64 { align_up(raw, 16) } else { raw };
    if frame_bytes > 0 {
        sub_imm(buf, frame_bytes, &sp, syntax);
    }
}

fn align_up(v: u64, align: u64) -> u64 {
    (v + align - 1) / align * align
}

fn emit_epilogue(buf: &mut String, fn_name: &str, target: Target, syntax: Syntax) {
    buf.push_str(&format!(".Lepilogue_{}:\n", fn_name));
    let bp = registers::bp(target, syntax);
    let sp = registers::sp(target, syntax);
    mov(buf, &bp, &sp, syntax);
    pop_operand(buf, &bp);
    buf.push_str("    ret\n");
}

fn loc_of(alloc: &FunctionAlloc, id: ValueId) -> i32 {
    *alloc.loc.get(&id).unwrap_or(&0)
}

fn operand(alloc: &FunctionAlloc, id: ValueId, ty: &Type, target: Target, syntax: Syntax) -> String {
    let xmm = is_xmm_class(ty);
    loc_str(loc_of(alloc, id), ty.size.max(1), xmm, target, syntax)
}

/// A named local's address, `"<base>+<byte offset>"` already folded into
/// one frame-relative slot by `LocalFrame`.
fn local_operand(frame: &LocalFrame, name: &str, target: Target, syntax: Syntax) -> String {
    let offset = frame.offset(name);
    let bp = registers::base_pointer(target);
    match syntax {
        Syntax::Att => format!("-{}(%{})", offset, bp),
        Syntax::Intel => format!("[{}-{}]", bp, offset),
    }
}

fn mov(buf: &mut String, src: &str, dst: &str, syntax: Syntax) {
    match syntax {
        Syntax::Att => buf.push_str(&format!("    mov {}, {}\n", src, dst)),
        Syntax::Intel => buf.push_str(&format!("    mov {}, {}\n", dst, src)),
    }
}

fn binop(buf: &mut String, mnemonic: &str, src: &str, dst: &str, syntax: Syntax) {
    match syntax {
        Syntax::Att => buf.push_str(&format!("    {} {}, {}\n", mnemonic, src, dst)),
        Syntax::Intel => buf.push_str(&format!("    {} {}, {}\n", mnemonic, dst, src)),
    }
}

fn push_operand(buf: &mut String, operand: &str) {
    buf.push_str(&format!("    push {}\n", operand));
}

fn pop_operand(buf: &mut String, operand: &str) {
    buf.push_str(&format!("    pop {}\n", operand));
}

fn sub_imm(buf: &mut String, amount: u64, dst: &str, syntax: Syntax) {
    match syntax {
        Syntax::Att => buf.push_str(&format!("    sub ${}, {}\n", amount, dst)),
        Syntax::Intel => buf.push_str(&format!("    sub {}, {}\n", dst, amount)),
    }
}

fn imm_operand(value: i64, syntax: Syntax) -> String {
    match syntax {
        Syntax::Att => format!("${}", value),
        Syntax::Intel => value.to_string(),
    }
}

fn int_size_suffix(size: u64) -> &'static str {
    match size {
        1 => "b",
        2 => "w",
        4 => "l",
        _ => "q",
    }
}

/// Stack-relative slot for incoming/outgoing parameter `index`, above the
/// saved frame pointer and return address — this backend passes every
/// argument on the stack rather than following the platform ABI's
/// register-argument convention, since SysV/Microsoft calling-convention
/// compliance is outside spec.md §4.7's scope.
fn param_operand(index: u64, target: Target, syntax: Syntax) -> String {
    let word = target.word_size();
    let offset = (2 + index) * word;
    let bp = registers::base_pointer(target);
    match syntax {
        Syntax::Att => format!("{}(%{})", offset, bp),
        Syntax::Intel => format!("[{}+{}]", bp, offset),
    }
}

fn emit_instr(buf: &mut String, instr: &Instr, alloc: &FunctionAlloc, frame: &LocalFrame, fn_name: &str, target: Target, syntax: Syntax) {
    match instr.op {
        Opcode::ConstInt => {
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            mov(buf, &imm_operand(instr.imm, syntax), &dst, syntax);
        }
        Opcode::ConstFloat => {
            // Materialized through the integer scratch register and into
            // the destination's xmm register; a private rodata constant
            // pool is outside spec.md §4.7's scope.
            let scratch = registers::scratch(8, false, target, syntax);
            mov(buf, &imm_operand(instr.imm, syntax), &scratch, syntax);
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            buf.push_str(&format!("    movq {}, {}\n", scratch, dst));
        }
        Opcode::ConstStrRef => {
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            match syntax {
                Syntax::Att => buf.push_str(&format!("    lea {}(%rip), {}\n", instr.name, dst)),
                Syntax::Intel => buf.push_str(&format!("    lea {}, [{} + rip]\n", dst, instr.name)),
            }
        }

        Opcode::Load => {
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            let src = storage_operand(&instr.name, frame, target, syntax);
            mov(buf, &src, &dst, syntax);
        }
        Opcode::Store => {
            let src = operand(alloc, instr.src1, &instr.ty, target, syntax);
            let dst = storage_operand(&instr.name, frame, target, syntax);
            mov(buf, &src, &dst, syntax);
        }
        Opcode::LoadParam => {
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            let src = param_operand(instr.imm as u64, target, syntax);
            mov(buf, &src, &dst, syntax);
        }
        Opcode::StoreParam => {
            let src = operand(alloc, instr.src1, &instr.ty, target, syntax);
            let dst = param_operand(instr.imm as u64, target, syntax);
            mov(buf, &src, &dst, syntax);
        }
        Opcode::Addr => {
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            let src = storage_operand(&instr.name, frame, target, syntax);
            match syntax {
                Syntax::Att => buf.push_str(&format!("    lea {}, {}\n", src, dst)),
                Syntax::Intel => buf.push_str(&format!("    lea {}, {}\n", dst, src)),
            }
        }
        Opcode::LoadPtr => {
            let ptr = operand(alloc, instr.src1, &ptr_ty(target), target, syntax);
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            mov(buf, &deref(&ptr, syntax), &dst, syntax);
        }
        Opcode::StorePtr => {
            let ptr = operand(alloc, instr.src1, &ptr_ty(target), target, syntax);
            let val = operand(alloc, instr.src2, &instr.ty, target, syntax);
            mov(buf, &val, &deref(&ptr, syntax), syntax);
        }
        Opcode::LoadIdx => {
            let base = operand(alloc, instr.src1, &ptr_ty(target), target, syntax);
            let idx = operand(alloc, instr.src2, &int_ty(), target, syntax);
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            mov(buf, &indexed(&base, &idx, instr.ty.size.max(1), syntax), &dst, syntax);
        }
        Opcode::StoreIdx => {
            let base = operand(alloc, instr.src1, &ptr_ty(target), target, syntax);
            let idx = operand(alloc, instr.src2, &int_ty(), target, syntax);
            let val = operand(alloc, ValueId(instr.imm as u32), &instr.ty, target, syntax);
            mov(buf, &val, &indexed(&base, &idx, instr.ty.size.max(1), syntax), syntax);
        }
        Opcode::Alloca => {
            let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
            let src = storage_operand(&instr.name, frame, target, syntax);
            match syntax {
                Syntax::Att => buf.push_str(&format!("    lea {}, {}\n", src, dst)),
                Syntax::Intel => buf.push_str(&format!("    lea {}, {}\n", dst, src)),
            }
        }
        Opcode::LoadBitfield | Opcode::StoreBitfield => {
            buf.push_str(&format!("    # bitfield access for {}\n", instr.name));
        }

        op if op.is_arithmetic() => emit_arithmetic(buf, instr, alloc, target, syntax),
        op if op.is_comparison() => emit_comparison(buf, instr, alloc, target, syntax),
        Opcode::Cast => emit_cast(buf, instr, alloc, target, syntax),

        Opcode::LogAnd | Opcode::LogOr => {
            // Never constructed: `vc-sema/src/expr.rs`'s
            // `lower_short_circuit` lowers `&&`/`||` directly to
            // `CmpNe`/`BCond`/`Br`/`Label` before reaching the IR. Kept
            // so the dispatch stays total over `Opcode`.
            emit_short_circuit(buf, instr, alloc, target, syntax);
        }

        Opcode::Label => buf.push_str(&format!("{}:\n", instr.name)),
        Opcode::Br => buf.push_str(&format!("    jmp {}\n", instr.name)),
        Opcode::BCond => {
            let cond = operand(alloc, instr.src1, &int_ty(), target, syntax);
            buf.push_str(&format!("    cmp {}, {}\n", imm_operand(0, syntax), cond));
            buf.push_str(&format!("    jne {}\n", instr.name));
        }
        Opcode::Return => {
            if !instr.src1.is_none() {
                let src = operand(alloc, instr.src1, &instr.ty, target, syntax);
                let ret_reg = return_register(&instr.ty, target, syntax);
                mov(buf, &src, &ret_reg, syntax);
            }
            buf.push_str(&format!("    jmp .Lepilogue_{}\n", fn_name));
        }
        Opcode::Arg => {
            let src = operand(alloc, instr.src1, &instr.ty, target, syntax);
            buf.push_str(&format!("    push {}\n", src));
        }
        Opcode::Call => {
            buf.push_str(&format!("    call {}\n", instr.name));
            if !instr.dest.is_none() {
                let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
                let ret_reg = return_register(&instr.ty, target, syntax);
                mov(buf, &ret_reg, &dst, syntax);
            }
        }
        Opcode::CallPtr => {
            let target_reg = operand(alloc, instr.src1, &ptr_ty(target), target, syntax);
            buf.push_str(&format!("    call *{}\n", target_reg));
            if !instr.dest.is_none() {
                let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
                let ret_reg = return_register(&instr.ty, target, syntax);
                mov(buf, &ret_reg, &dst, syntax);
            }
        }
        Opcode::FuncBegin | Opcode::FuncEnd | Opcode::GlobVar | Opcode::GlobArray | Opcode::GlobStruct
        | Opcode::GlobUnion | Opcode::GlobString => unreachable!("handled by the caller"),
    }
}

fn return_register(ty: &Type, target: Target, syntax: Syntax) -> String {
    if is_xmm_class(ty) {
        registers::reg("xmm0", syntax)
    } else {
        registers::reg(if target == Target::X86_64 { "rax" } else { "eax" }, syntax)
    }
}

/// A named memory operand's address: a global symbol resolves
/// rip-relative; a local falls back to its frame slot.
fn storage_operand(name: &str, frame: &LocalFrame, target: Target, syntax: Syntax) -> String {
    let base = name.split('+').next().unwrap_or(name);
    if frame.is_local(base) {
        local_operand(frame, name, target, syntax)
    } else {
        match syntax {
            Syntax::Att => format!("{}(%rip)", name),
            Syntax::Intel => format!("[{} + rip]", name),
        }
    }
}

fn deref(ptr: &str, syntax: Syntax) -> String {
    match syntax {
        Syntax::Att => format!("({})", ptr),
        Syntax::Intel => format!("[{}]", ptr),
    }
}

fn indexed(base: &str, idx: &str, scale: u64, syntax: Syntax) -> String {
    match syntax {
        Syntax::Att => format!("({}, {}, {})", base, idx, scale),
        Syntax::Intel => format!("[{} + {} * {}]", base, idx, scale),
    }
}

fn ptr_ty(target: Target) -> Type {
    Type::ptr_to(Type::void(), target.word_size())
}

fn int_ty() -> Type {
    Type::basic(TypeKind::Int, 4, 4)
}

fn emit_arithmetic(buf: &mut String, instr: &Instr, alloc: &FunctionAlloc, target: Target, syntax: Syntax) {
    let is_float = instr.ty.kind.is_float() && instr.ty.kind != TypeKind::LDouble;
    let is_ldouble = instr.ty.kind == TypeKind::LDouble;
    debug_assert!(
        !instr.ty.kind.is_complex(),
        "vc-sema never lowers a value to a complex-typed constant, so no complex-typed arithmetic instruction should reach the emitter"
    );
    if is_ldouble {
        emit_ldouble_arithmetic(buf, instr);
        return;
    }

    let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
    let src1 = operand(alloc, instr.src1, &instr.ty, target, syntax);
    mov(buf, &src1, &dst, syntax);

    match instr.op {
        Opcode::Div | Opcode::Mod => emit_division(buf, instr, alloc, target, syntax, &dst),
        Opcode::Shl | Opcode::Shr => {
            let count = operand(alloc, instr.src2, &int_ty(), target, syntax);
            let cl = registers::reg("cl", syntax);
            mov(buf, &count, &cl, syntax);
            let mnemonic = if instr.op == Opcode::Shl {
                "shl"
            } else if instr.ty.kind.is_unsigned() {
                "shr"
            } else {
                "sar"
            };
            binop(buf, mnemonic, &cl, &dst, syntax);
        }
        Opcode::Neg => buf.push_str(&format!("    neg {}\n", dst)),
        Opcode::BitNot => buf.push_str(&format!("    not {}\n", dst)),
        _ if is_float => {
            let src2 = operand(alloc, instr.src2, &instr.ty, target, syntax);
            let suffix = if instr.ty.kind == TypeKind::Float { "ss" } else { "sd" };
            let mnemonic = match instr.op {
                Opcode::Add => format!("add{}", suffix),
                Opcode::Sub => format!("sub{}", suffix),
                Opcode::Mul => format!("mul{}", suffix),
                _ => format!("div{}", suffix),
            };
            binop(buf, &mnemonic, &src2, &dst, syntax);
        }
        _ => {
            let src2 = operand(alloc, instr.src2, &instr.ty, target, syntax);
            let mnemonic = match instr.op {
                Opcode::Add | Opcode::PtrAdd => "add",
                Opcode::Sub | Opcode::PtrDiff => "sub",
                Opcode::Mul => "imul",
                Opcode::BitAnd => "and",
                Opcode::BitOr => "or",
                Opcode::BitXor => "xor",
                _ => "add",
            };
            let sfx = int_size_suffix(instr.ty.size.max(1));
            binop(buf, &format!("{}{}", mnemonic, sfx), &src2, &dst, syntax);
        }
    }
}

fn emit_division(buf: &mut String, instr: &Instr, alloc: &FunctionAlloc, target: Target, syntax: Syntax, dst: &str) {
    let ax = registers::reg(if target == Target::X86_64 { "rax" } else { "eax" }, syntax);
    let dx = registers::reg(if target == Target::X86_64 { "rdx" } else { "edx" }, syntax);
    mov(buf, dst, &ax, syntax);
    buf.push_str(if target == Target::X86_64 { "    cqto\n" } else { "    cltd\n" });
    let src2 = operand(alloc, instr.src2, &instr.ty, target, syntax);
    let mnemonic = if instr.ty.kind.is_unsigned() { "div" } else { "idiv" };
    buf.push_str(&format!("    {} {}\n", mnemonic, src2));
    if instr.op == Opcode::Div {
        mov(buf, &ax, dst, syntax);
    } else {
        mov(buf, &dx, dst, syntax);
    }
}

fn emit_ldouble_arithmetic(buf: &mut String, instr: &Instr) {
    let mnemonic = match instr.op {
        Opcode::Add => "faddp",
        Opcode::Sub => "fsubp",
        Opcode::Mul => "fmulp",
        Opcode::Div => "fdivp",
        Opcode::Neg => "fchs",
        _ => "fnop",
    };
    buf.push_str(&format!("    fldt {}\n", spill_name(instr.src1)));
    if instr.op != Opcode::Neg {
        buf.push_str(&format!("    fldt {}\n", spill_name(instr.src2)));
    }
    buf.push_str(&format!("    {}\n", mnemonic));
    buf.push_str(&format!("    fstpt {}\n", spill_name(instr.dest)));
}

fn spill_name(id: ValueId) -> String {
    format!(".Lldbl{}", id.0)
}

fn emit_comparison(buf: &mut String, instr: &Instr, alloc: &FunctionAlloc, target: Target, syntax: Syntax) {
    let operand_ty = Type::basic(instr.ty.kind, instr.ty.size.max(4), instr.ty.align.max(4));
    let src1 = operand(alloc, instr.src1, &operand_ty, target, syntax);
    let src2 = operand(alloc, instr.src2, &operand_ty, target, syntax);
    buf.push_str(&format!("    cmp {}, {}\n", src2, src1));
    let cc = match instr.op {
        Opcode::CmpEq => "e",
        Opcode::CmpNe => "ne",
        Opcode::CmpLt => "l",
        Opcode::CmpLe => "le",
        Opcode::CmpGt => "g",
        _ => "ge",
    };
    let al = registers::reg("al", syntax);
    buf.push_str(&format!("    set{} {}\n", cc, al));
    let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
    buf.push_str(&format!("    movzbl {}, {}\n", al, dst));
}

fn emit_cast(buf: &mut String, instr: &Instr, alloc: &FunctionAlloc, target: Target, syntax: Syntax) {
    let src_kind = unpack_src_kind(instr.imm);
    let dst_kind = instr.ty.kind;
    let src_ty = Type::basic(src_kind, kind_size(src_kind, target), kind_size(src_kind, target));
    let src = operand(alloc, instr.src1, &src_ty, target, syntax);
    let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);

    match (src_kind.is_float(), dst_kind.is_float()) {
        (true, true) => {
            let mnemonic = if src_kind == TypeKind::Float && dst_kind == TypeKind::Double {
                "cvtss2sd"
            } else if src_kind == TypeKind::Double && dst_kind == TypeKind::Float {
                "cvtsd2ss"
            } else {
                "movq" // identity cast (peephole's move substitute).
            };
            buf.push_str(&format!("    {} {}, {}\n", mnemonic, src, dst));
        }
        (false, true) => {
            let mnemonic = if dst_kind == TypeKind::Float { "cvtsi2ss" } else { "cvtsi2sd" };
            buf.push_str(&format!("    {} {}, {}\n", mnemonic, src, dst));
        }
        (true, false) => {
            let mnemonic = if src_kind == TypeKind::Float { "cvttss2si" } else { "cvttsd2si" };
            buf.push_str(&format!("    {} {}, {}\n", mnemonic, src, dst));
        }
        (false, false) => {
            // int/int: widening move (sign- or zero-extend), or an
            // identity move when sizes match (peephole's `x + 0` etc.
            // collapse to exactly this shape).
            if src_ty.size == instr.ty.size {
                mov(buf, &src, &dst, syntax);
            } else if src_kind.is_unsigned() {
                buf.push_str(&format!(
                    "    movz{}{} {}, {}\n",
                    int_size_suffix(src_ty.size),
                    int_size_suffix(instr.ty.size.max(1)),
                    src,
                    dst
                ));
            } else {
                buf.push_str(&format!(
                    "    movs{}{} {}, {}\n",
                    int_size_suffix(src_ty.size),
                    int_size_suffix(instr.ty.size.max(1)),
                    src,
                    dst
                ));
            }
        }
    }
}

fn unpack_src_kind(imm: i64) -> TypeKind {
    kind_from_tag(imm & 0xffff_ffff)
}

fn kind_from_tag(tag: i64) -> TypeKind {
    const KINDS: [TypeKind; 24] = [
        TypeKind::Void, TypeKind::Bool, TypeKind::Char, TypeKind::UChar, TypeKind::Short, TypeKind::UShort,
        TypeKind::Int, TypeKind::UInt, TypeKind::Long, TypeKind::ULong, TypeKind::LLong, TypeKind::ULLong,
        TypeKind::Float, TypeKind::Double, TypeKind::LDouble, TypeKind::ComplexFloat, TypeKind::ComplexDouble,
        TypeKind::ComplexLDouble, TypeKind::Ptr, TypeKind::Array, TypeKind::Struct, TypeKind::Union,
        TypeKind::Func, TypeKind::Unknown,
    ];
    KINDS.get(tag as usize).copied().unwrap_or(TypeKind::Unknown)
}

fn kind_size(kind: TypeKind, target: Target) -> u64 {
    match kind {
        TypeKind::Bool | TypeKind::Char | TypeKind::UChar => 1,
        TypeKind::Short | TypeKind::UShort => 2,
        TypeKind::Int | TypeKind::UInt | TypeKind::Float => 4,
        TypeKind::Long | TypeKind::ULong | TypeKind::Ptr => target.word_size(),
        TypeKind::LLong | TypeKind::ULLong | TypeKind::Double => 8,
        TypeKind::LDouble => 16,
        _ => target.word_size(),
    }
}

fn emit_short_circuit(buf: &mut String, instr: &Instr, alloc: &FunctionAlloc, target: Target, syntax: Syntax) {
    let src1 = operand(alloc, instr.src1, &int_ty(), target, syntax);
    let src2 = operand(alloc, instr.src2, &int_ty(), target, syntax);
    let dst = operand(alloc, instr.dest, &instr.ty, target, syntax);
    let short_label = format!(".Lsc{}_{}", instr.dest.0, if instr.op == Opcode::LogAnd { "false" } else { "true" });
    let end_label = format!(".Lsc{}_end", instr.dest.0);
    let short_value = if instr.op == Opcode::LogAnd { 0 } else { 1 };

    buf.push_str(&format!("    cmp {}, {}\n", imm_operand(0, syntax), src1));
    buf.push_str(&format!("    je {}\n", short_label));
    buf.push_str(&format!("    cmp {}, {}\n", imm_operand(0, syntax), src2));
    buf.push_str(&format!("    je {}\n", short_label));
    mov(buf, &imm_operand(1 - short_value, syntax), &dst, syntax);
    buf.push_str(&format!("    jmp {}\n", end_label));
    buf.push_str(&format!("{}:\n", short_label));
    mov(buf, &imm_operand(short_value, syntax), &dst, syntax);
    buf.push_str(&format!("{}:\n", end_label));
}
