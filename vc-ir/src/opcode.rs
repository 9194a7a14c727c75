//! IR opcodes and the single instruction shape every opcode uses
//! (spec.md §3.6): opcode, up to two source values, a destination, an
//! immediate, an owned name, an alias-set id, and the volatile/restrict
//! flags.

use vc_ast::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // --- constants ---
    ConstInt,
    /// `imm` carries the IEEE-754 bit pattern of the float/double value.
    ConstFloat,
    /// `name` is the `.rodata` label; paired with a preceding `GlobString`.
    ConstStrRef,

    // --- memory ---
    Load,
    Store,
    LoadBitfield,
    StoreBitfield,
    LoadParam,
    StoreParam,
    Addr,
    LoadPtr,
    StorePtr,
    LoadIdx,
    StoreIdx,
    Alloca,

    // --- arithmetic ---
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Neg,
    BitNot,
    PtrAdd,
    PtrDiff,
    /// `imm` packs `(src_kind as i64) | (dst_kind as i64) << 32`.
    Cast,

    // --- comparison ---
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,

    // --- short-circuit ---
    LogAnd,
    LogOr,

    // --- control ---
    Br,
    BCond,
    Label,
    Return,
    Call,
    CallPtr,
    Arg,
    FuncBegin,
    FuncEnd,

    // --- globals ---
    GlobVar,
    GlobArray,
    GlobStruct,
    GlobUnion,
    GlobString,
}

impl Opcode {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::Shl
                | Opcode::Shr
                | Opcode::BitAnd
                | Opcode::BitOr
                | Opcode::BitXor
                | Opcode::Neg
                | Opcode::BitNot
                | Opcode::PtrAdd
                | Opcode::PtrDiff
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Opcode::CmpEq | Opcode::CmpNe | Opcode::CmpLt | Opcode::CmpLe | Opcode::CmpGt | Opcode::CmpGe
        )
    }

    pub fn is_memory(self) -> bool {
        matches!(
            self,
            Opcode::Load
                | Opcode::Store
                | Opcode::LoadBitfield
                | Opcode::StoreBitfield
                | Opcode::LoadParam
                | Opcode::StoreParam
                | Opcode::Addr
                | Opcode::LoadPtr
                | Opcode::StorePtr
                | Opcode::LoadIdx
                | Opcode::StoreIdx
                | Opcode::Alloca
        )
    }

    pub fn is_store(self) -> bool {
        matches!(self, Opcode::Store | Opcode::StoreBitfield | Opcode::StoreParam | Opcode::StorePtr | Opcode::StoreIdx)
    }

    pub fn is_call(self) -> bool {
        matches!(self, Opcode::Call | Opcode::CallPtr)
    }

    /// `true` if this instruction always produces a value worth giving a
    /// destination (used by dead-code elimination to decide what's safe
    /// to drop when unread).
    pub fn produces_value(self) -> bool {
        !matches!(
            self,
            Opcode::Store
                | Opcode::StoreBitfield
                | Opcode::StoreParam
                | Opcode::StorePtr
                | Opcode::StoreIdx
                | Opcode::Br
                | Opcode::BCond
                | Opcode::Label
                | Opcode::Return
                | Opcode::Arg
                | Opcode::FuncBegin
                | Opcode::FuncEnd
                | Opcode::GlobVar
                | Opcode::GlobArray
                | Opcode::GlobStruct
                | Opcode::GlobUnion
                | Opcode::GlobString
        )
    }
}

/// A value id; `0` means "no value" (spec.md §3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl ValueId {
    pub const NONE: ValueId = ValueId(0);

    pub fn is_none(self) -> bool {
        self == ValueId::NONE
    }
}

impl Default for ValueId {
    fn default() -> Self {
        ValueId::NONE
    }
}

/// One three-address instruction (spec.md §3.6).
#[derive(Debug, Clone)]
pub struct Instr {
    pub op: Opcode,
    pub dest: ValueId,
    pub src1: ValueId,
    pub src2: ValueId,
    /// Signed wide immediate; also packs paired type kinds for `Cast`.
    pub imm: i64,
    /// Variable reference, called function, label target, or
    /// string-literal label, depending on `op`.
    pub name: String,
    pub alias_set: u32,
    pub is_volatile: bool,
    pub is_restrict: bool,
    /// The type this instruction computes in / moves (int vs float vs
    /// pointer vs aggregate dispatch for the optimizer, regalloc register
    /// class, and the emitter's instruction selection).
    pub ty: Type,
}

impl Instr {
    pub fn new(op: Opcode, ty: Type) -> Self {
        Instr {
            op,
            dest: ValueId::NONE,
            src1: ValueId::NONE,
            src2: ValueId::NONE,
            imm: 0,
            name: String::new(),
            alias_set: 0,
            is_volatile: false,
            is_restrict: false,
            ty,
        }
    }
}
