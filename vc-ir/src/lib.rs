//! Three-address IR (spec.md §3.6, component G): opcodes, the single
//! `Instr` shape, the doubly-linked `InstrList`, and the `IrBuilder` that
//! `vc-sema` drives while lowering statements and expressions.

pub mod builder;
pub mod list;
pub mod opcode;
pub mod value;

pub use builder::IrBuilder;
pub use list::{InstrId, InstrList, Iter};
pub use opcode::{Instr, Opcode, ValueId};
pub use value::{AliasTable, StringTable};

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ast::{Type, TypeKind};

    /// `return 2 + 3 * 4;` lowered without any const-folding (that pass
    /// lives in vc-opt): five arithmetic-free instructions feeding a
    /// `Return`.
    #[test]
    fn builds_straight_line_arithmetic() {
        let mut b = IrBuilder::new("main");
        let int_ty = Type::basic(TypeKind::Int, 4, 4);
        let two = b.emit_const_int(2, int_ty.clone());
        let three = b.emit_const_int(3, int_ty.clone());
        let four = b.emit_const_int(4, int_ty.clone());
        let mul = b.emit_binary(Opcode::Mul, three, four, int_ty.clone());
        let add = b.emit_binary(Opcode::Add, two, mul, int_ty.clone());
        b.emit_return(Some(add));

        assert_eq!(b.list.len(), 6);
        let ops: Vec<Opcode> = b.list.iter().map(|(_, i)| i.op).collect();
        assert_eq!(
            ops,
            vec![Opcode::ConstInt, Opcode::ConstInt, Opcode::ConstInt, Opcode::Mul, Opcode::Add, Opcode::Return]
        );
    }
}
