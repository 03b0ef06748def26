//! Arena of per-node state records.
//!
//! Scope chains are stored as an explicit arena with index-based parent
//! pointers rather than a reference graph, so a chain can be walked, cloned,
//! or serialized without cycles.  Reads fall back to the nearest ancestor
//! binding; writes always bind locally, which lets a child shadow an
//! ancestor's binding without mutating it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use elfos_types::{ElfError, Value};

use crate::StateVariable;

/// Index of a state record inside a [`StateArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(pub usize);

/// One node's bindings plus the parent-scope link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    /// Name of the owning node, for diagnostics.
    pub node: String,
    pub parent: Option<StateId>,
    bindings: HashMap<String, Value>,
}

/// The arena holding every state record of one control tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateArena {
    records: Vec<StateRecord>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh record chained to `parent` (or a root record when
    /// `parent` is `None`).
    pub fn alloc(&mut self, node: impl Into<String>, parent: Option<StateId>) -> StateId {
        let id = StateId(self.records.len());
        self.records.push(StateRecord {
            node: node.into(),
            parent,
            bindings: HashMap::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.records[id.0].parent
    }

    /// Nearest-ancestor-inclusive read.  Returns `None` when no record in
    /// the chain binds the variable.
    pub fn get(&self, id: StateId, variable: &StateVariable) -> Option<Value> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let record = &self.records[current.0];
            if let Some(value) = record.bindings.get(&variable.name) {
                return Some(value.clone());
            }
            cursor = record.parent;
        }
        None
    }

    /// Local-only, type-checked write.
    ///
    /// Fails with [`ElfError::TypeMismatch`] when the value's kind differs
    /// from the variable's declared type; the prior binding (if any) is left
    /// unchanged on failure.  Writes never propagate to ancestor records.
    pub fn set(
        &mut self,
        id: StateId,
        variable: &StateVariable,
        value: Value,
    ) -> Result<(), ElfError> {
        if value.kind() != variable.ty {
            return Err(ElfError::TypeMismatch {
                variable: variable.name.clone(),
                declared: variable.ty,
                found: value.kind(),
            });
        }
        self.records[id.0]
            .bindings
            .insert(variable.name.clone(), value);
        Ok(())
    }

    /// Chain-walking presence check that never materializes a value.
    pub fn is_bound(&self, id: StateId, variable: &StateVariable) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let record = &self.records[current.0];
            if record.bindings.contains_key(&variable.name) {
                return true;
            }
            cursor = record.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elfos_types::VarType;

    fn prompt_var() -> StateVariable {
        StateVariable::new("consolePrompt", VarType::Text, "prompt shown to operator")
    }

    #[test]
    fn read_falls_back_to_ancestor() {
        let mut arena = StateArena::new();
        let root = arena.alloc("root", None);
        let child = arena.alloc("dialog", Some(root));
        let v = prompt_var();

        arena.set(root, &v, Value::text("ready>")).unwrap();
        assert_eq!(arena.get(child, &v), Some(Value::text("ready>")));
    }

    #[test]
    fn write_shadows_without_mutating_parent() {
        let mut arena = StateArena::new();
        let root = arena.alloc("root", None);
        let child = arena.alloc("dialog", Some(root));
        let v = prompt_var();

        arena.set(root, &v, Value::text("a")).unwrap();
        arena.set(child, &v, Value::text("b")).unwrap();

        assert_eq!(arena.get(child, &v), Some(Value::text("b")));
        assert_eq!(arena.get(root, &v), Some(Value::text("a")));
    }

    #[test]
    fn type_mismatch_leaves_prior_binding_unchanged() {
        let mut arena = StateArena::new();
        let root = arena.alloc("root", None);
        let v = prompt_var();

        arena.set(root, &v, Value::text("ready>")).unwrap();
        let err = arena.set(root, &v, Value::from(42i32)).unwrap_err();
        assert!(matches!(err, ElfError::TypeMismatch { .. }));
        assert_eq!(arena.get(root, &v), Some(Value::text("ready>")));
    }

    #[test]
    fn is_bound_walks_the_chain() {
        let mut arena = StateArena::new();
        let root = arena.alloc("root", None);
        let mid = arena.alloc("mid", Some(root));
        let leaf = arena.alloc("leaf", Some(mid));
        let v = prompt_var();

        assert!(!arena.is_bound(leaf, &v));
        arena.set(root, &v, Value::text("x")).unwrap();
        assert!(arena.is_bound(leaf, &v));
        assert!(arena.is_bound(mid, &v));
    }

    #[test]
    fn unbound_read_is_none() {
        let mut arena = StateArena::new();
        let root = arena.alloc("root", None);
        assert_eq!(arena.get(root, &prompt_var()), None);
    }

    #[test]
    fn arena_serializes_without_cycles() {
        let mut arena = StateArena::new();
        let root = arena.alloc("root", None);
        let _child = arena.alloc("dialog", Some(root));
        arena.set(root, &prompt_var(), Value::text("ready>")).unwrap();

        let json = serde_json::to_string(&arena).unwrap();
        let back: StateArena = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(StateId(1), &prompt_var()), Some(Value::text("ready>")));
    }
}
