//! IR builder: allocates value ids and alias-set ids, and provides one
//! `emit_*` helper per opcode family so `vc-sema`'s statement/expression
//! lowering never constructs an `Instr` by hand (spec.md §4.4).

use crate::list::{InstrId, InstrList};
use crate::opcode::{Instr, Opcode, ValueId};
use crate::value::{AliasTable, StringTable, ValueTypes};
use vc_ast::{Type, TypeKind};

pub struct IrBuilder {
    pub list: InstrList,
    next_value: u32,
    next_label: u32,
    alias_sets: AliasTable,
    pub value_types: ValueTypes,
    pub strings: StringTable,
    /// Label tag prefix used to keep labels unique across the whole
    /// translation unit even though each function's label table (component
    /// B) resets per function.
    label_prefix: String,
}

impl IrBuilder {
    pub fn new(label_prefix: impl Into<String>) -> Self {
        IrBuilder {
            list: InstrList::new(),
            next_value: 1, // 0 is reserved for "no value"
            next_label: 0,
            alias_sets: AliasTable::new(),
            value_types: ValueTypes::new(),
            strings: StringTable::new(),
            label_prefix: label_prefix.into(),
        }
    }

    pub fn new_value(&mut self, ty: Type) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        self.value_types.set(id, ty);
        id
    }

    pub fn value_type(&self, id: ValueId) -> Type {
        self.value_types.get(id).cloned().unwrap_or_else(Type::void)
    }

    /// Fresh globally-unique label, `L<i>_<tag>` (spec.md §4.7: "Labels
    /// are globally unique strings produced by a monotonic counter
    /// combined with a supplied tag").
    pub fn new_label(&mut self, tag: &str) -> String {
        let name = format!(".L{}_{}_{}", self.label_prefix, self.next_label, tag);
        self.next_label += 1;
        name
    }

    /// Alias-set id for a named memory access: same name always maps to
    /// the same id, except a `restrict`-qualified access gets a fresh id
    /// of its own (spec.md §3.6's "Alias sets").
    pub fn alias_set_for(&mut self, name: &str, is_restrict: bool) -> u32 {
        self.alias_sets.get(name, is_restrict)
    }

    fn push(&mut self, instr: Instr) -> InstrId {
        self.list.push_back(instr)
    }

    // --- constants ---

    pub fn emit_const_int(&mut self, value: i64, ty: Type) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::ConstInt, ty);
        i.dest = dest;
        i.imm = value;
        self.push(i);
        dest
    }

    pub fn emit_const_float(&mut self, bits: u64, ty: Type) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::ConstFloat, ty);
        i.dest = dest;
        i.imm = bits as i64;
        self.push(i);
        dest
    }

    /// Emits the `.rodata` definition (`GlobString`) and returns a value
    /// referencing it by label (`ConstStrRef`), matching how a string
    /// literal used as an rvalue decays to its address.
    pub fn emit_string_literal(&mut self, label: &str, bytes: &[u8], ptr_ty: Type) -> ValueId {
        let mut g = Instr::new(Opcode::GlobString, Type::void());
        g.name = label.to_string();
        g.imm = bytes.len() as i64;
        self.strings.set(label, bytes.to_vec());
        self.push(g);
        let dest = self.new_value(ptr_ty.clone());
        let mut i = Instr::new(Opcode::ConstStrRef, ptr_ty);
        i.dest = dest;
        i.name = label.to_string();
        self.push(i);
        dest
    }

    // --- memory ---

    pub fn emit_load(&mut self, name: &str, ty: Type, alias_set: u32, is_volatile: bool) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::Load, ty);
        i.dest = dest;
        i.name = name.to_string();
        i.alias_set = alias_set;
        i.is_volatile = is_volatile;
        self.push(i);
        dest
    }

    pub fn emit_store(&mut self, name: &str, value: ValueId, ty: Type, alias_set: u32, is_volatile: bool) {
        let mut i = Instr::new(Opcode::Store, ty);
        i.src1 = value;
        i.name = name.to_string();
        i.alias_set = alias_set;
        i.is_volatile = is_volatile;
        self.push(i);
    }

    pub fn emit_load_bitfield(&mut self, name: &str, bit_offset: u32, bit_width: u32, ty: Type, alias_set: u32) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::LoadBitfield, ty);
        i.dest = dest;
        i.name = name.to_string();
        i.imm = ((bit_offset as i64) << 32) | bit_width as i64;
        i.alias_set = alias_set;
        self.push(i);
        dest
    }

    pub fn emit_store_bitfield(&mut self, name: &str, value: ValueId, bit_offset: u32, bit_width: u32, ty: Type, alias_set: u32) {
        let mut i = Instr::new(Opcode::StoreBitfield, ty);
        i.src1 = value;
        i.name = name.to_string();
        i.imm = ((bit_offset as i64) << 32) | bit_width as i64;
        i.alias_set = alias_set;
        self.push(i);
    }

    pub fn emit_load_param(&mut self, index: u32, ty: Type) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::LoadParam, ty);
        i.dest = dest;
        i.imm = index as i64;
        self.push(i);
        dest
    }

    pub fn emit_store_param(&mut self, index: u32, value: ValueId, ty: Type) {
        let mut i = Instr::new(Opcode::StoreParam, ty);
        i.src1 = value;
        i.imm = index as i64;
        self.push(i);
    }

    pub fn emit_addr(&mut self, name: &str, ptr_ty: Type, alias_set: u32) -> ValueId {
        let dest = self.new_value(ptr_ty.clone());
        let mut i = Instr::new(Opcode::Addr, ptr_ty);
        i.dest = dest;
        i.name = name.to_string();
        i.alias_set = alias_set;
        self.push(i);
        dest
    }

    pub fn emit_load_ptr(&mut self, ptr: ValueId, ty: Type, alias_set: u32, is_volatile: bool) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::LoadPtr, ty);
        i.dest = dest;
        i.src1 = ptr;
        i.alias_set = alias_set;
        i.is_volatile = is_volatile;
        self.push(i);
        dest
    }

    pub fn emit_store_ptr(&mut self, ptr: ValueId, value: ValueId, ty: Type, alias_set: u32, is_volatile: bool) {
        let mut i = Instr::new(Opcode::StorePtr, ty);
        i.src1 = ptr;
        i.src2 = value;
        i.alias_set = alias_set;
        i.is_volatile = is_volatile;
        self.push(i);
    }

    pub fn emit_load_idx(&mut self, base: ValueId, index: ValueId, ty: Type, alias_set: u32) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(Opcode::LoadIdx, ty);
        i.dest = dest;
        i.src1 = base;
        i.src2 = index;
        i.alias_set = alias_set;
        self.push(i);
        dest
    }

    pub fn emit_store_idx(&mut self, base: ValueId, index: ValueId, value: ValueId, ty: Type, alias_set: u32) -> InstrId {
        let mut i = Instr::new(Opcode::StoreIdx, ty);
        i.src1 = base;
        i.src2 = index;
        i.imm = value.0 as i64;
        i.alias_set = alias_set;
        self.push(i)
    }

    pub fn emit_alloca(&mut self, name: &str, size: ValueId, ptr_ty: Type) -> ValueId {
        let dest = self.new_value(ptr_ty.clone());
        let mut i = Instr::new(Opcode::Alloca, ptr_ty);
        i.dest = dest;
        i.src1 = size;
        i.name = name.to_string();
        self.push(i);
        dest
    }

    // --- arithmetic / comparison ---

    pub fn emit_binary(&mut self, op: Opcode, a: ValueId, b: ValueId, ty: Type) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(op, ty);
        i.dest = dest;
        i.src1 = a;
        i.src2 = b;
        self.push(i);
        dest
    }

    pub fn emit_unary(&mut self, op: Opcode, a: ValueId, ty: Type) -> ValueId {
        let dest = self.new_value(ty.clone());
        let mut i = Instr::new(op, ty);
        i.dest = dest;
        i.src1 = a;
        self.push(i);
        dest
    }

    pub fn emit_cast(&mut self, src: ValueId, src_ty: TypeKind, dst_ty: Type) -> ValueId {
        let dest = self.new_value(dst_ty.clone());
        let mut i = Instr::new(Opcode::Cast, dst_ty.clone());
        i.dest = dest;
        i.src1 = src;
        i.imm = (src_ty as i64) | ((kind_tag(dst_ty.kind) as i64) << 32);
        self.push(i);
        dest
    }

    // --- control flow ---

    pub fn emit_label(&mut self, name: &str) {
        let mut i = Instr::new(Opcode::Label, Type::void());
        i.name = name.to_string();
        self.push(i);
    }

    pub fn emit_br(&mut self, target: &str) {
        let mut i = Instr::new(Opcode::Br, Type::void());
        i.name = target.to_string();
        self.push(i);
    }

    /// Conditional branch: falls through when `cond` is false, jumps to
    /// `target` when true (the shape every statement handler in spec.md
    /// §4.4 assumes).
    pub fn emit_bcond(&mut self, cond: ValueId, target: &str) {
        let mut i = Instr::new(Opcode::BCond, Type::void());
        i.src1 = cond;
        i.name = target.to_string();
        self.push(i);
    }

    pub fn emit_return(&mut self, value: Option<ValueId>) {
        let mut i = Instr::new(Opcode::Return, Type::void());
        i.src1 = value.unwrap_or(ValueId::NONE);
        self.push(i);
    }

    pub fn emit_arg(&mut self, value: ValueId, ty: Type) {
        let mut i = Instr::new(Opcode::Arg, ty);
        i.src1 = value;
        self.push(i);
    }

    pub fn emit_call(&mut self, callee: &str, ret_ty: Type) -> ValueId {
        let dest = self.new_value(ret_ty.clone());
        let mut i = Instr::new(Opcode::Call, ret_ty);
        i.dest = dest;
        i.name = callee.to_string();
        self.push(i);
        dest
    }

    pub fn emit_call_ptr(&mut self, fn_ptr: ValueId, ret_ty: Type) -> ValueId {
        let dest = self.new_value(ret_ty.clone());
        let mut i = Instr::new(Opcode::CallPtr, ret_ty);
        i.dest = dest;
        i.src1 = fn_ptr;
        self.push(i);
        dest
    }

    pub fn emit_func_begin(&mut self, name: &str, exported: bool) {
        let mut i = Instr::new(Opcode::FuncBegin, Type::void());
        i.name = name.to_string();
        i.is_restrict = exported; // reused flag slot, same convention as emit_glob_var.
        self.push(i);
    }

    pub fn emit_func_end(&mut self, name: &str) {
        let mut i = Instr::new(Opcode::FuncEnd, Type::void());
        i.name = name.to_string();
        self.push(i);
    }

    // --- globals ---

    pub fn emit_glob_var(&mut self, name: &str, ty: Type, init: Option<i64>, exported: bool) {
        let mut i = Instr::new(Opcode::GlobVar, ty);
        i.name = name.to_string();
        i.imm = init.unwrap_or(0);
        i.is_restrict = exported; // reused flag slot: "has an initializer" vs BSS is tracked by imm/init presence; exported visibility is carried here to avoid adding a field only this opcode needs.
        self.push(i);
    }
}

fn kind_tag(kind: TypeKind) -> i64 {
    kind as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_labels_are_unique() {
        let mut b = IrBuilder::new("f");
        let a = b.new_label("true");
        let c = b.new_label("true");
        assert_ne!(a, c);
    }

    #[test]
    fn alias_sets_match_by_name_except_restrict() {
        let mut b = IrBuilder::new("f");
        let a1 = b.alias_set_for("p", false);
        let a2 = b.alias_set_for("p", false);
        assert_eq!(a1, a2);
        let r1 = b.alias_set_for("p", true);
        let r2 = b.alias_set_for("p", true);
        assert_ne!(r1, r2);
    }

    #[test]
    fn const_int_records_value_type() {
        let mut b = IrBuilder::new("f");
        let ty = Type::basic(TypeKind::Int, 4, 4);
        let v = b.emit_const_int(14, ty.clone());
        assert_eq!(b.value_type(v), ty);
        assert_eq!(b.list.len(), 1);
    }
}
