//! Typed state variable declarations.

use serde::{Deserialize, Serialize};

use elfos_types::VarType;

/// A declared state variable: a name, a declared type, and a human-readable
/// comment.
///
/// Identity is by name alone — two declarations with the same name refer to
/// the same variable regardless of type or comment, so configuration must
/// declare each name exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVariable {
    pub name: String,
    pub ty: VarType,
    pub comment: String,
}

impl StateVariable {
    pub fn new(name: impl Into<String>, ty: VarType, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            comment: comment.into(),
        }
    }
}

impl PartialEq for StateVariable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for StateVariable {}

impl std::hash::Hash for StateVariable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for StateVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_by_name_only() {
        let a = StateVariable::new("consolePrompt", VarType::Text, "prompt shown to operator");
        let b = StateVariable::new("consolePrompt", VarType::Integer, "redeclared");
        assert_eq!(a, b);
    }

    #[test]
    fn different_names_differ() {
        let a = StateVariable::new("x", VarType::Integer, "");
        let b = StateVariable::new("y", VarType::Integer, "");
        assert_ne!(a, b);
    }
}
