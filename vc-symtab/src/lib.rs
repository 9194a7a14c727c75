//! Lexically scoped symbol tables (spec.md §3.5, component B): variables,
//! functions, typedefs, tags, and per-function labels.

pub mod scope;

use scope::ScopeStack;
use std::collections::HashMap;
use vc_ast::types::Type;

/// A variable's table entry: type, storage, the tag of its aggregate
/// layout (if any — looked up in `TagTable`), an optional constant bound
/// value (for `const` initialized-to-a-constant-expression integers used
/// by the constant evaluator), and its stack offset once the register
/// allocator has assigned one.
#[derive(Debug, Clone)]
pub struct VarEntry {
    pub ty: Type,
    pub is_static: bool,
    pub is_register: bool,
    pub is_extern: bool,
    pub aggregate_tag: Option<String>,
    pub const_value: Option<i64>,
    pub frame_offset: Option<i32>,
    /// The IR global-variable/stack-slot name this entry was lowered to.
    pub ir_name: String,
}

#[derive(Debug, Clone)]
pub struct FuncEntry {
    pub ret_type: Type,
    pub ret_size: u64,
    pub param_types: Vec<Type>,
    pub param_sizes: Vec<u64>,
    pub is_variadic: bool,
    pub is_prototype_only: bool,
    pub is_inline: bool,
    /// Whether this (inline) function's body has already been emitted in
    /// the current translation unit (spec.md §3.5, §4.4's "inline
    /// emission set", threaded explicitly rather than as a process-wide
    /// global per spec.md §9's design note).
    pub emitted: bool,
}

#[derive(Debug, Clone)]
pub struct TypedefEntry {
    pub ty: Type,
    pub elem_size: u64,
}

#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub name: String,
    pub ty: Type,
    pub elem_size: u64,
    pub byte_offset: u64,
    pub bit_width: Option<u32>,
    pub bit_offset: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

#[derive(Debug, Clone)]
pub struct TagEntry {
    pub kind: TagKind,
    pub size: u64,
    pub align: u64,
    pub members: Vec<FieldLayout>,
    pub is_flexible: bool,
    /// For `enum` tags: constant value of each enumerator.
    pub enum_values: HashMap<String, i64>,
}

impl TagEntry {
    pub fn member(&self, name: &str) -> Option<&FieldLayout> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Per-function map from source labels (`goto foo;`) to the unique
/// assembly/IR label name generated on first reference (spec.md §3.5,
/// "label table").
#[derive(Debug, Default)]
pub struct LabelTable {
    names: HashMap<String, String>,
    defined: std::collections::HashSet<String>,
    next_id: u32,
    func_name: String,
}

impl LabelTable {
    pub fn new(func_name: &str) -> Self {
        LabelTable {
            names: HashMap::new(),
            defined: std::collections::HashSet::new(),
            next_id: 0,
            func_name: func_name.to_string(),
        }
    }

    /// Resolve a source label to its IR name, allocating a fresh one on
    /// first reference from either a `goto` or a label definition.
    pub fn resolve(&mut self, source_label: &str) -> String {
        if let Some(existing) = self.names.get(source_label) {
            return existing.clone();
        }
        let ir_name = format!(".L{}_{}", self.func_name, self.next_id);
        self.next_id += 1;
        self.names.insert(source_label.to_string(), ir_name.clone());
        ir_name
    }

    pub fn mark_defined(&mut self, source_label: &str) {
        self.defined.insert(source_label.to_string());
    }

    /// Labels referenced but never defined in the same function (checked
    /// before `func_end`, spec.md §4.4).
    pub fn undefined_labels(&self) -> Vec<&str> {
        self.names
            .keys()
            .filter(|l| !self.defined.contains(l.as_str()))
            .map(|s| s.as_str())
            .collect()
    }
}

/// The full set of scoped tables plus the global tag table, bundled the
/// way `vc-sema` threads them through every statement handler.
pub struct Symtabs {
    pub vars: ScopeStack<VarEntry>,
    pub funcs: ScopeStack<FuncEntry>,
    pub typedefs: ScopeStack<TypedefEntry>,
    pub tags: HashMap<String, TagEntry>,
}

impl Symtabs {
    pub fn new() -> Self {
        Symtabs {
            vars: ScopeStack::new(),
            funcs: ScopeStack::new(),
            typedefs: ScopeStack::new(),
            tags: HashMap::new(),
        }
    }

    /// Resolve an identifier that could be a typedef name to its
    /// underlying type, walking enclosing scopes.
    pub fn resolve_typedef(&self, name: &str) -> Option<&Type> {
        self.typedefs.lookup(name).map(|t| &t.ty)
    }
}

impl Default for Symtabs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_table_assigns_fresh_names_once() {
        let mut labels = LabelTable::new("f");
        let a = labels.resolve("done");
        let b = labels.resolve("done");
        assert_eq!(a, b);
        let c = labels.resolve("other");
        assert_ne!(a, c);
    }

    #[test]
    fn label_table_flags_undefined_labels() {
        let mut labels = LabelTable::new("f");
        labels.resolve("missing");
        assert_eq!(labels.undefined_labels(), vec!["missing"]);
        labels.mark_defined("missing");
        assert!(labels.undefined_labels().is_empty());
    }
}
