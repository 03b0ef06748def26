//! `elfos-state` – the scoped world model.
//!
//! Each control node owns one scope of typed variable bindings, chained to
//! its parent node's scope.  Reads see the whole chain (lexical-scope
//! fallback); writes are always local, so a child can shadow an ancestor's
//! binding without mutating it.  Assignments are type-checked against the
//! variable's declaration — a mismatch is a hard error, never a coercion.
//!
//! # Modules
//!
//! - [`variable`] – [`StateVariable`]: typed variable declarations, identity
//!   by name.
//! - [`arena`] – [`StateArena`] / [`StateId`]: the explicit, cycle-free
//!   arena of scope records with index-based parent pointers.
//! - [`state`] – [`SharedArena`] / [`State`]: cheap cloneable handles with
//!   lock-serialized access for same-node concurrent mutators.

pub mod arena;
pub mod state;
pub mod variable;

pub use arena::{StateArena, StateId, StateRecord};
pub use state::{SharedArena, State};
pub use variable::StateVariable;
