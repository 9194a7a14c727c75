//! Peephole simplification and dead-code elimination (spec.md §4.5).
//!
//! Two passes, run in order: algebraic simplification collapses trivial
//! identities (`x + 0`, `x * 1`, double negation) into an identity cast of
//! the surviving operand — there's no dedicated copy opcode, so an
//! identity `Cast` (matching source and destination kind) stands in for a
//! move, the same trick the inliner uses for its final return-value move.
//! Dead-code elimination then walks once more and drops any side-effect-free
//! instruction whose result nothing reads, mirroring
//! `cranelift-codegen`'s `dce.rs`: a liveness set built from every operand
//! actually referenced, checked against `Opcode::produces_value`.

use std::collections::{HashMap, HashSet};
use vc_ir::{IrBuilder, Opcode, ValueId};

pub fn run(builder: &mut IrBuilder) {
    simplify(builder);
    eliminate_dead_code(builder);
}

fn simplify(builder: &mut IrBuilder) {
    let mut const_of: HashMap<ValueId, i64> = HashMap::new();
    let mut neg_operand: HashMap<ValueId, ValueId> = HashMap::new();

    for id in builder.list.ids() {
        let (op, dest, src1, src2, imm) = {
            let i = builder.list.get(id).expect("id came from ids()");
            (i.op, i.dest, i.src1, i.src2, i.imm)
        };

        match op {
            Opcode::ConstInt => {
                const_of.insert(dest, imm);
            }
            Opcode::Neg => {
                neg_operand.insert(dest, src1);
                if let Some(&inner) = neg_operand.get(&src1) {
                    to_identity(builder, id, inner);
                }
            }
            Opcode::Add => {
                if const_of.get(&src2) == Some(&0) {
                    to_identity(builder, id, src1);
                } else if const_of.get(&src1) == Some(&0) {
                    to_identity(builder, id, src2);
                }
            }
            Opcode::Sub => {
                if const_of.get(&src2) == Some(&0) {
                    to_identity(builder, id, src1);
                }
            }
            Opcode::Mul => {
                if const_of.get(&src2) == Some(&1) {
                    to_identity(builder, id, src1);
                } else if const_of.get(&src1) == Some(&1) {
                    to_identity(builder, id, src2);
                }
            }
            _ => {}
        }
    }
}

/// Rewrites instruction `id` in place into an identity move of `operand`,
/// preserving its original destination and type.
fn to_identity(builder: &mut IrBuilder, id: vc_ir::InstrId, operand: ValueId) {
    let ty = builder.list.get(id).expect("still live").ty.clone();
    let kind_tag = ty.kind as i64;
    let instr = builder.list.get_mut(id).expect("still live");
    instr.op = Opcode::Cast;
    instr.src1 = operand;
    instr.src2 = ValueId::NONE;
    instr.imm = kind_tag | (kind_tag << 32);
}

fn eliminate_dead_code(builder: &mut IrBuilder) {
    let mut used: HashSet<ValueId> = HashSet::new();
    for (_, instr) in builder.list.iter() {
        if !instr.src1.is_none() {
            used.insert(instr.src1);
        }
        if !instr.src2.is_none() {
            used.insert(instr.src2);
        }
        if instr.op == Opcode::StoreIdx {
            used.insert(ValueId(instr.imm as u32));
        }
    }

    let ids = builder.list.ids();
    for id in ids {
        let (op, dest, is_volatile) = {
            let i = builder.list.get(id).expect("id came from ids()");
            (i.op, i.dest, i.is_volatile)
        };
        if op.produces_value() && !has_side_effect(op) && !is_volatile && !used.contains(&dest) {
            builder.list.remove(id);
        }
    }
}

/// Instructions whose effect matters even when their result is unread: a
/// call may have side effects the optimizer can't see into, and an
/// `Alloca` reserves a stack slot other code may still reference by name.
fn has_side_effect(op: Opcode) -> bool {
    matches!(op, Opcode::Alloca | Opcode::Call | Opcode::CallPtr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::{Type, TypeKind};

    fn int_ty() -> Type {
        Type::basic(TypeKind::Int, 4, 4)
    }

    #[test]
    fn drops_unread_constant() {
        let mut b = IrBuilder::new("t");
        b.emit_const_int(9, int_ty());
        let before = b.list.len();
        run(&mut b);
        assert!(b.list.len() < before);
    }

    #[test]
    fn add_zero_becomes_identity_cast() {
        let mut b = IrBuilder::new("t");
        let a = b.emit_const_int(4, int_ty());
        let zero = b.emit_const_int(0, int_ty());
        let sum = b.emit_binary(Opcode::Add, a, zero, int_ty());
        let alias = b.alias_set_for("r", false);
        b.emit_store("r", sum, int_ty(), alias, false);
        run(&mut b);
        let id = b.list.ids().iter().copied().find(|id| b.list.get(*id).unwrap().dest == sum).unwrap();
        assert_eq!(b.list.get(id).unwrap().op, Opcode::Cast);
    }

    #[test]
    fn keeps_instructions_with_side_effects() {
        let mut b = IrBuilder::new("t");
        b.emit_call("f", Type::void());
        let before = b.list.len();
        run(&mut b);
        assert_eq!(b.list.len(), before);
    }
}
