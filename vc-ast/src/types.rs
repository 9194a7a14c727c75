//! C type representation (spec.md §3.1).
//!
//! A `Type` is fully described by `(kind, size, array_len, tag, pointee)`;
//! full aggregate member layout is not duplicated here — it lives in the
//! tag tables of `vc-symtab`, which `Type` only references by tag name.

use crate::stmt::{EnumVariant, FieldDecl};
use std::fmt;

/// The closed set of type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LLong,
    ULLong,
    Float,
    Double,
    LDouble,
    ComplexFloat,
    ComplexDouble,
    ComplexLDouble,
    Ptr,
    Array,
    Struct,
    Union,
    Func,
    Unknown,
}

impl TypeKind {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeKind::Bool
                | TypeKind::Char
                | TypeKind::UChar
                | TypeKind::Short
                | TypeKind::UShort
                | TypeKind::Int
                | TypeKind::UInt
                | TypeKind::Long
                | TypeKind::ULong
                | TypeKind::LLong
                | TypeKind::ULLong
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            TypeKind::Bool
                | TypeKind::UChar
                | TypeKind::UShort
                | TypeKind::UInt
                | TypeKind::ULong
                | TypeKind::ULLong
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, TypeKind::Float | TypeKind::Double | TypeKind::LDouble)
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            TypeKind::ComplexFloat | TypeKind::ComplexDouble | TypeKind::ComplexLDouble
        )
    }

    pub fn is_scalar(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex() || self == TypeKind::Ptr
    }
}

/// A C type. Pointer/array element types and function return types are
/// boxed rather than interned: `vc` compiles one translation unit per
/// process and types are small, so sharing isn't worth the indirection
/// table Cranelift's `ir::Type` enum avoids needing in the first place.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    /// `sizeof` this type; 0 for `void` and incomplete aggregates.
    pub size: u64,
    pub align: u64,
    /// Tag name for `struct`/`union`/`enum`, looked up in the symbol
    /// table's tag map for full layout.
    pub tag: Option<String>,
    /// Pointee for `Ptr`/`Array`, element type; return type for `Func`.
    pub pointee: Option<Box<Type>>,
    /// `Array` length; `None` means incomplete (`int a[]`) or a runtime
    /// (VLA-style) length carried instead as a separate size expression
    /// by the declaration that owns this type.
    pub array_len: Option<u64>,
    /// `Func` parameter types, in order.
    pub params: Vec<Type>,
    pub is_variadic: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
    pub is_flexible_array: bool,
    /// Member list of a `struct`/`union { ... }` declared inline with this
    /// type specifier, carried here (rather than only in the declaration
    /// statement) so it survives `.clone()` into every declarator that
    /// shares this base type — parameters, locals, and globals alike.
    /// Empty once the semantic analyzer has folded it into the tag table.
    pub fields: Vec<FieldDecl>,
    /// Enumerator list of an `enum { ... }` declared inline with this type
    /// specifier, carried the same way as `fields`.
    pub enum_variants: Vec<EnumVariant>,
}

impl Type {
    pub fn basic(kind: TypeKind, size: u64, align: u64) -> Self {
        Type {
            kind,
            size,
            align,
            tag: None,
            pointee: None,
            array_len: None,
            params: Vec::new(),
            is_variadic: false,
            is_const: false,
            is_volatile: false,
            is_restrict: false,
            is_flexible_array: false,
            fields: Vec::new(),
            enum_variants: Vec::new(),
        }
    }

    pub fn void() -> Self {
        Type::basic(TypeKind::Void, 0, 1)
    }

    /// `sizeof(void*)`/`sizeof(long)`/`sizeof(ulong)` are the three types
    /// whose size depends on the target word size (spec.md §8 property 9).
    pub fn ptr_to(pointee: Type, word_size: u64) -> Self {
        let mut t = Type::basic(TypeKind::Ptr, word_size, word_size);
        t.pointee = Some(Box::new(pointee));
        t
    }

    pub fn array_of(elem: Type, len: Option<u64>) -> Self {
        let size = len.map(|n| n * elem.size).unwrap_or(0);
        let align = elem.align;
        let mut t = Type::basic(TypeKind::Array, size, align);
        t.array_len = len;
        t.pointee = Some(Box::new(elem));
        t
    }

    pub fn func(ret: Type, params: Vec<Type>, is_variadic: bool) -> Self {
        let mut t = Type::basic(TypeKind::Func, 0, 1);
        t.pointee = Some(Box::new(ret));
        t.params = params;
        t.is_variadic = is_variadic;
        t
    }

    pub fn is_pointer_like(&self) -> bool {
        matches!(self.kind, TypeKind::Ptr | TypeKind::Array)
    }

    pub fn elem_type(&self) -> Option<&Type> {
        self.pointee.as_deref()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TypeKind::Ptr => write!(f, "{}*", self.pointee.as_ref().unwrap()),
            TypeKind::Array => write!(
                f,
                "{}[{}]",
                self.pointee.as_ref().unwrap(),
                self.array_len.map(|n| n.to_string()).unwrap_or_default()
            ),
            TypeKind::Struct => write!(f, "struct {}", self.tag.as_deref().unwrap_or("<anon>")),
            TypeKind::Union => write!(f, "union {}", self.tag.as_deref().unwrap_or("<anon>")),
            _ => write!(f, "{:?}", self.kind),
        }
    }
}

/// Target-specific base type table, since `long`/`ulong`/pointers vary in
/// size between the x86-32 and x86-64 targets spec.md §8 tests against.
#[derive(Debug, Clone, Copy)]
pub struct WordSize {
    pub bits: u32,
}

impl WordSize {
    pub const W32: WordSize = WordSize { bits: 32 };
    pub const W64: WordSize = WordSize { bits: 64 };

    pub fn bytes(self) -> u64 {
        (self.bits / 8) as u64
    }

    pub fn long_size(self) -> u64 {
        self.bytes()
    }

    pub fn ptr_size(self) -> u64 {
        self.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptr_size_tracks_word_size() {
        let w32 = WordSize::W32;
        let w64 = WordSize::W64;
        let t32 = Type::ptr_to(Type::void(), w32.ptr_size());
        let t64 = Type::ptr_to(Type::void(), w64.ptr_size());
        assert_eq!(t32.size, 4);
        assert_eq!(t64.size, 8);
    }
}
