//! Shared handles onto the state arena.
//!
//! A [`State`] is one node's view of the tree-wide [`StateArena`]: reads
//! walk the parent chain, writes stay local.  Handles are cheap to clone and
//! are shared between the components of the owning node, so arena access is
//! serialized behind an `RwLock` (components of one node may mutate state
//! concurrently from different workers).

use std::sync::{Arc, RwLock};

use elfos_types::{ElfError, Value};

use crate::{StateArena, StateId, StateVariable};

/// The arena shared by every [`State`] handle of one control tree.
#[derive(Debug, Clone, Default)]
pub struct SharedArena {
    inner: Arc<RwLock<StateArena>>,
}

impl SharedArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a root scope and return its handle.
    pub fn root(&self, node: impl Into<String>) -> State {
        let id = self
            .inner
            .write()
            .expect("state arena lock poisoned")
            .alloc(node, None);
        State {
            arena: self.inner.clone(),
            id,
        }
    }

    /// Allocate a scope chained to `parent` and return its handle.
    pub fn child_of(&self, parent: &State, node: impl Into<String>) -> State {
        let id = self
            .inner
            .write()
            .expect("state arena lock poisoned")
            .alloc(node, Some(parent.id));
        State {
            arena: self.inner.clone(),
            id,
        }
    }

    /// Snapshot the whole arena (diagnostics / serialization).
    pub fn snapshot(&self) -> StateArena {
        self.inner
            .read()
            .expect("state arena lock poisoned")
            .clone()
    }
}

/// One node's scope handle.
#[derive(Debug, Clone)]
pub struct State {
    arena: Arc<RwLock<StateArena>>,
    id: StateId,
}

impl State {
    pub fn id(&self) -> StateId {
        self.id
    }

    /// The parent scope's id, if any.
    pub fn parent_id(&self) -> Option<StateId> {
        self.arena
            .read()
            .expect("state arena lock poisoned")
            .parent(self.id)
    }

    /// Nearest-ancestor-inclusive read; `None` when unbound everywhere.
    pub fn get(&self, variable: &StateVariable) -> Option<Value> {
        self.arena
            .read()
            .expect("state arena lock poisoned")
            .get(self.id, variable)
    }

    /// Local, type-checked write (shadows ancestors, never mutates them).
    pub fn set(&self, variable: &StateVariable, value: Value) -> Result<(), ElfError> {
        self.arena
            .write()
            .expect("state arena lock poisoned")
            .set(self.id, variable, value)
    }

    /// Chain presence check.
    pub fn is_bound(&self, variable: &StateVariable) -> bool {
        self.arena
            .read()
            .expect("state arena lock poisoned")
            .is_bound(self.id, variable)
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
    fn handles_share_one_arena() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let child = arena.child_of(&root, "dialog");
        let v = prompt_var();

        root.set(&v, Value::text("ready>")).unwrap();
        assert_eq!(child.get(&v), Some(Value::text("ready>")));
        assert!(child.is_bound(&v));
    }

    #[test]
    fn child_shadowing_through_handles() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let child = arena.child_of(&root, "dialog");
        let v = prompt_var();

        root.set(&v, Value::text("a")).unwrap();
        child.set(&v, Value::text("b")).unwrap();
        assert_eq!(child.get(&v), Some(Value::text("b")));
        assert_eq!(root.get(&v), Some(Value::text("a")));
    }

    #[test]
    fn parent_id_mirrors_allocation() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let child = arena.child_of(&root, "dialog");
        assert_eq!(root.parent_id(), None);
        assert_eq!(child.parent_id(), Some(root.id()));
    }

    #[test]
    fn concurrent_writers_do_not_corrupt_bindings() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let v = StateVariable::new("counterSeed", VarType::Integer, "test");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = root.clone();
                let var = v.clone();
                std::thread::spawn(move || state.set(&var, Value::from(i as i32)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Some writer won; the binding must be a well-formed integer.
        let value = root.get(&v).unwrap();
        assert_eq!(value.kind(), VarType::Integer);
    }
}
