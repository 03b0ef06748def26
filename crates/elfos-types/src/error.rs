//! Global error taxonomy.
//!
//! Four families, mirroring how failures propagate through the system:
//! scope errors (state writes/reads), evaluation errors (interpreter),
//! resource errors (pool checkout), and channel/worker/device errors.
//! Scope and evaluation errors are caught inside message handlers and the
//! offending command is skipped; resource errors are returned to the
//! requester; device end-of-stream cleanly stops its producer loop.

use thiserror::Error;

use crate::VarType;

/// A failure raised while evaluating an expression, predicate, or command.
///
/// Wrapped as [`ElfError::Evaluation`] so evaluation failures form a single
/// distinguishable error kind with structured detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("operator {op} expects {expected} argument(s), got {found}")]
    WrongArity {
        op: String,
        expected: String,
        found: usize,
    },

    #[error("operator {op} requires numeric arguments")]
    NotNumeric { op: String },

    #[error("operator {op} requires a boolean argument")]
    NotBoolean { op: String },

    #[error("operator {op} requires a list argument")]
    NotAList { op: String },

    #[error("operator {op} requires a map argument")]
    NotAMap { op: String },

    #[error("operator {op} cannot index an empty list")]
    EmptyList { op: String },

    #[error("list index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("choice command name '{0}' is not unique within its command tree")]
    DuplicateChoiceName(String),

    #[error("no action named '{0}' is registered with the interpreter")]
    UnknownAction(String),

    #[error("arbiter selected candidate {index} but choice '{choice}' has only {count}")]
    UnknownChoice {
        choice: String,
        index: usize,
        count: usize,
    },
}

/// Global error type spanning scope, evaluation, resource, and
/// channel/worker failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElfError {
    // ── Scope errors ─────────────────────────────────────────────────────
    #[error("type mismatch writing '{variable}': declared {declared}, value is {found}")]
    TypeMismatch {
        variable: String,
        declared: VarType,
        found: VarType,
    },

    #[error("variable '{0}' is unbound where a value is required")]
    Unbound(String),

    // ── Evaluation errors ────────────────────────────────────────────────
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    // ── Resource errors ──────────────────────────────────────────────────
    #[error("resource '{name}' is already held by '{holder}'")]
    ResourceHeld { name: String, holder: String },

    #[error("resource '{name}' is not held by '{holder}'")]
    ResourceNotHeld { name: String, holder: String },

    #[error("no resource named '{0}' is registered")]
    UnknownResource(String),

    // ── Channel / worker / device errors ─────────────────────────────────
    #[error("component '{component}' received unexpected message kind '{kind}'")]
    UnexpectedMessage { component: String, kind: String },

    #[error("device '{device}' I/O failure: {details}")]
    Device { device: String, details: String },

    #[error("channel to '{0}' is closed")]
    ChannelClosed(String),

    // ── Configuration errors ─────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_wraps_into_elf_error() {
        let err: ElfError = EvalError::NotNumeric { op: "Plus".into() }.into();
        assert!(matches!(err, ElfError::Evaluation(_)));
        assert!(err.to_string().contains("evaluation error"));
    }

    #[test]
    fn type_mismatch_display_names_variable() {
        let err = ElfError::TypeMismatch {
            variable: "consolePrompt".into(),
            declared: VarType::Text,
            found: VarType::Integer,
        };
        assert!(err.to_string().contains("consolePrompt"));
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn resource_held_display_names_holder() {
        let err = ElfError::ResourceHeld {
            name: "console".into(),
            holder: "console-actuator".into(),
        };
        assert!(err.to_string().contains("console-actuator"));
    }
}
