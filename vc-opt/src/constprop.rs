//! Constant propagation (spec.md §4.5): a single forward walk that tracks
//! which values and which named storage locations currently hold a known
//! constant, folding loads and binary arithmetic against that knowledge.
//!
//! Run once per translation unit, not iterated to a fixed point, matching
//! the rest of this crate's passes.

use std::collections::HashMap;
use vc_ir::{IrBuilder, Opcode, ValueId};

pub fn run(builder: &mut IrBuilder) {
    let mut value_const: HashMap<ValueId, i64> = HashMap::new();
    let mut name_const: HashMap<String, i64> = HashMap::new();

    for id in builder.list.ids() {
        let (op, dest, src1, src2, imm, name, is_volatile) = {
            let i = builder.list.get(id).expect("id came from ids()");
            (i.op, i.dest, i.src1, i.src2, i.imm, i.name.clone(), i.is_volatile)
        };

        match op {
            Opcode::ConstInt => {
                value_const.insert(dest, imm);
            }

            Opcode::Store => {
                if is_volatile {
                    name_const.remove(&name);
                } else if let Some(&k) = value_const.get(&src1) {
                    name_const.insert(name, k);
                } else {
                    name_const.remove(&name);
                }
            }

            Opcode::Load => {
                if !is_volatile {
                    if let Some(&k) = name_const.get(&name) {
                        let instr = builder.list.get_mut(id).expect("still live");
                        instr.op = Opcode::ConstInt;
                        instr.imm = k;
                        instr.src1 = ValueId::NONE;
                        instr.src2 = ValueId::NONE;
                        instr.name.clear();
                        value_const.insert(dest, k);
                        continue;
                    }
                }
                value_const.remove(&dest);
            }

            Opcode::Call | Opcode::CallPtr | Opcode::StorePtr | Opcode::StoreIdx | Opcode::Arg => {
                // Escapes: the callee or the pointed-to memory may alias any
                // named storage, so every binding is suspect.
                name_const.clear();
                value_const.remove(&dest);
            }

            _ if op.is_arithmetic() => match (value_const.get(&src1), value_const.get(&src2)) {
                (Some(&a), Some(&b)) => match fold(op, a, b) {
                    Some(k) => {
                        let instr = builder.list.get_mut(id).expect("still live");
                        instr.op = Opcode::ConstInt;
                        instr.imm = k;
                        instr.src1 = ValueId::NONE;
                        instr.src2 = ValueId::NONE;
                        value_const.insert(dest, k);
                    }
                    None => {
                        value_const.remove(&dest);
                    }
                },
                _ => {
                    value_const.remove(&dest);
                }
            },

            _ => {
                if !dest.is_none() {
                    value_const.remove(&dest);
                }
            }
        }
    }
}

fn fold(op: Opcode, a: i64, b: i64) -> Option<i64> {
    match op {
        Opcode::Add => Some(a.wrapping_add(b)),
        Opcode::Sub => Some(a.wrapping_sub(b)),
        Opcode::Mul => Some(a.wrapping_mul(b)),
        Opcode::Div if b != 0 => Some(a.wrapping_div(b)),
        Opcode::Mod if b != 0 => Some(a.wrapping_rem(b)),
        Opcode::Shl => Some(a.wrapping_shl(b as u32)),
        Opcode::Shr => Some(a.wrapping_shr(b as u32)),
        Opcode::BitAnd => Some(a & b),
        Opcode::BitOr => Some(a | b),
        Opcode::BitXor => Some(a ^ b),
        // Neg/BitNot are unary (src2 is always NONE, so the lookup above
        // never succeeds) and PtrAdd/PtrDiff are left to the emitter.
        _ => None,
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
    fn folds_constant_binary_add() {
        let mut b = IrBuilder::new("t");
        let a = b.emit_const_int(2, int_ty());
        let c = b.emit_const_int(3, int_ty());
        let sum = b.emit_binary(Opcode::Add, a, c, int_ty());
        run(&mut b);
        let id = b.list.ids().iter().copied().find(|id| b.list.get(*id).unwrap().dest == sum).unwrap();
        let sum_instr = b.list.get(id).unwrap();
        assert_eq!(sum_instr.op, Opcode::ConstInt);
        assert_eq!(sum_instr.imm, 5);
    }

    #[test]
    fn propagates_store_then_load() {
        let mut b = IrBuilder::new("t");
        let k = b.emit_const_int(7, int_ty());
        let alias = b.alias_set_for("x", false);
        b.emit_store("x", k, int_ty(), alias, false);
        let loaded = b.emit_load("x", int_ty(), alias, false);
        run(&mut b);
        let id = b.list.ids().iter().copied().find(|id| b.list.get(*id).unwrap().dest == loaded).unwrap();
        let load_instr = b.list.get(id).unwrap();
        assert_eq!(load_instr.op, Opcode::ConstInt);
        assert_eq!(load_instr.imm, 7);
    }

    #[test]
    fn call_clears_known_bindings() {
        let mut b = IrBuilder::new("t");
        let k = b.emit_const_int(7, int_ty());
        let alias = b.alias_set_for("x", false);
        b.emit_store("x", k, int_ty(), alias, false);
        b.emit_call("clobber", Type::void());
        let loaded = b.emit_load("x", int_ty(), alias, false);
        run(&mut b);
        let id = b.list.ids().iter().copied().find(|id| b.list.get(*id).unwrap().dest == loaded).unwrap();
        let load_instr = b.list.get(id).unwrap();
        assert_eq!(load_instr.op, Opcode::Load);
    }
}
