//! Value-type table and alias-set allocation (spec.md §3.6's "Alias
//! sets": same base name maps to the same id; a `restrict`-qualified
//! access always gets a fresh one).

use crate::opcode::ValueId;
use std::collections::HashMap;
use vc_ast::Type;

#[derive(Default)]
pub struct ValueTypes {
    types: HashMap<ValueId, Type>,
}

impl ValueTypes {
    pub fn new() -> Self {
        ValueTypes::default()
    }

    pub fn set(&mut self, id: ValueId, ty: Type) {
        self.types.insert(id, ty);
    }

    pub fn get(&self, id: ValueId) -> Option<&Type> {
        self.types.get(&id)
    }
}

/// Maps memory-access base names to alias-set ids. Plain names collapse
/// to one id per name; `restrict`-qualified accesses are handed a fresh
/// id every time, so the optimizer never assumes two `restrict` accesses
/// alias even when they share a spelling.
#[derive(Default)]
pub struct AliasTable {
    by_name: HashMap<String, u32>,
    next_restrict: u32,
}

impl AliasTable {
    pub fn new() -> Self {
        AliasTable { by_name: HashMap::new(), next_restrict: 1_000_000 }
    }

    pub fn get(&mut self, name: &str, is_restrict: bool) -> u32 {
        if is_restrict {
            let id = self.next_restrict;
            self.next_restrict += 1;
            return id;
        }
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.by_name.len() as u32 + 1;
        self.by_name.insert(name.to_string(), id);
        id
    }
}

/// Maps a `GlobString` label to its literal bytes. `Instr` carries only
/// the label and the byte count (`imm`) — the content lives here, the
/// same side-table shape `ValueTypes` and `AliasTable` already use rather
/// than growing every `Instr` with a field only string literals need.
#[derive(Default)]
pub struct StringTable {
    by_label: HashMap<String, Vec<u8>>,
}

impl StringTable {
    pub fn new() -> Self {
        StringTable::default()
    }

    pub fn set(&mut self, label: &str, bytes: Vec<u8>) {
        self.by_label.insert(label.to_string(), bytes);
    }

    pub fn get(&self, label: &str) -> Option<&[u8]> {
        self.by_label.get(label).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_alias_set() {
        let mut t = AliasTable::new();
        assert_eq!(t.get("p", false), t.get("p", false));
    }

    #[test]
    fn restrict_access_always_fresh() {
        let mut t = AliasTable::new();
        assert_ne!(t.get("p", true), t.get("p", true));
    }

    #[test]
    fn different_names_different_sets() {
        let mut t = AliasTable::new();
        assert_ne!(t.get("p", false), t.get("q", false));
    }
}
