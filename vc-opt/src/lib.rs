//! Optimizer (spec.md §4.5, component H): three independent passes run
//! once each, in a fixed order, directly over the translation unit's
//! `IrBuilder`. None of them iterate to a fixed point — a pass that could
//! expose more work for an earlier pass (inlining exposing fresh constant
//! folding, say) simply leaves that follow-up work undone, matching the
//! reference implementation's single-pass pipeline.

mod constprop;
mod inline;
mod peephole;

use vc_ir::IrBuilder;

/// Runs constant propagation, then inlining, then peephole/dead-code
/// cleanup, each exactly once.
pub fn optimize(builder: &mut IrBuilder) {
    log::debug!("running constant propagation");
    constprop::run(builder);
    log::debug!("running inliner");
    inline::run(builder);
    log::debug!("running peephole/dead-code pass");
    peephole::run(builder);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_ir::Opcode;
    use vc_ast::{Type, TypeKind};

    #[test]
    fn pipeline_folds_and_drops_dead_constant_through_a_call_boundary() {
        let mut b = IrBuilder::new("t");
        let int_ty = Type::basic(TypeKind::Int, 4, 4);

        b.emit_func_begin("two", true);
        let a = b.emit_const_int(1, int_ty.clone());
        let c = b.emit_const_int(1, int_ty.clone());
        let sum = b.emit_binary(Opcode::Add, a, c, int_ty.clone());
        b.emit_return(Some(sum));
        b.emit_func_end("two");

        b.emit_func_begin("main", true);
        let call_dest = b.emit_call("two", int_ty.clone());
        let alias = b.alias_set_for("r", false);
        b.emit_store("r", call_dest, int_ty.clone(), alias, false);
        b.emit_func_end("main");

        optimize(&mut b);

        // The call is gone (inlined) and the fold leaves a single stored
        // constant, not a live binary-add instruction.
        assert!(!b.list.iter().any(|(_, i)| i.op == Opcode::Call));
        assert!(!b.list.iter().any(|(_, i)| i.op == Opcode::Add));
    }
}
