//! Boolean-producing predicates of the embedded expression language.
//!
//! Predicates are the only part of the interpreter that understands the
//! absent sentinel: an unbound state variable evaluates to `None`, and
//! `Equals` / `Different` / `NotNull` give it defined semantics instead of
//! raising a scope error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use elfos_types::{ElfError, EvalError, Value};

/// The predicate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// Arity 0: always true.
    True,
    /// Arity 1: boolean negation.
    Not,
    /// Arity ≥1: all arguments true.
    And,
    /// Arity ≥1: at least one argument true.
    Or,
    /// Arity 2: equality.  Two absent values are equal; an absent value
    /// never equals a present one.
    Equals,
    /// Arity ≥2: all arguments pairwise distinct, by set deduplication.  A
    /// single absent value is tolerated; a second one counts as a duplicate.
    Different,
    /// Arity 1: the argument is present (bound).
    NotNull,
}

impl Predicate {
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::True => "True",
            Predicate::Not => "Not",
            Predicate::And => "And",
            Predicate::Or => "Or",
            Predicate::Equals => "Equals",
            Predicate::Different => "Different",
            Predicate::NotNull => "NotNull",
        }
    }

    pub fn check_arity(&self, found: usize) -> Result<(), ElfError> {
        let ok = match self {
            Predicate::True => found == 0,
            Predicate::Not | Predicate::NotNull => found == 1,
            Predicate::And | Predicate::Or => found >= 1,
            Predicate::Equals => found == 2,
            Predicate::Different => found >= 2,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Predicate::True => "0",
            Predicate::Not | Predicate::NotNull => "1",
            Predicate::And | Predicate::Or => "at least 1",
            Predicate::Equals => "2",
            Predicate::Different => "at least 2",
        };
        Err(EvalError::WrongArity {
            op: self.name().to_string(),
            expected: expected.to_string(),
            found,
        }
        .into())
    }

    /// Apply the predicate to already-evaluated arguments, where `None` is
    /// the absent sentinel for an unbound variable.
    ///
    /// Callers must have run [`check_arity`](Predicate::check_arity) first.
    pub fn apply(&self, args: &[Option<Value>]) -> Result<bool, ElfError> {
        match self {
            Predicate::True => Ok(true),
            Predicate::Not => Ok(!self.boolean(&args[0])?),
            Predicate::And => {
                for arg in args {
                    if !self.boolean(arg)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or => {
                for arg in args {
                    if self.boolean(arg)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Equals => Ok(match (&args[0], &args[1]) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }),
            Predicate::Different => {
                let mut absent = 0usize;
                let mut seen: HashSet<String> = HashSet::new();
                for arg in args {
                    match arg {
                        None => absent += 1,
                        Some(value) => {
                            // Values are deduplicated by their canonical
                            // rendering; Value has no Hash impl (floats).
                            if !seen.insert(format!("{value:?}")) {
                                return Ok(false);
                            }
                        }
                    }
                }
                Ok(absent <= 1)
            }
            Predicate::NotNull => Ok(args[0].is_some()),
        }
    }

    fn boolean(&self, arg: &Option<Value>) -> Result<bool, ElfError> {
        match arg {
            Some(Value::Bool(b)) => Ok(*b),
            _ => Err(EvalError::NotBoolean {
                op: self.name().to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(v: impl Into<Value>) -> Option<Value> {
        Some(v.into())
    }

    #[test]
    fn true_takes_no_arguments() {
        assert!(Predicate::True.check_arity(0).is_ok());
        assert!(Predicate::True.check_arity(1).is_err());
        assert!(Predicate::True.apply(&[]).unwrap());
    }

    #[test]
    fn equals_treats_two_absents_as_equal() {
        assert!(Predicate::Equals.apply(&[None, None]).unwrap());
        assert!(!Predicate::Equals.apply(&[None, some("abc")]).unwrap());
        assert!(Predicate::Equals.apply(&[some("a"), some("a")]).unwrap());
        assert!(!Predicate::Equals.apply(&[some("a"), some("b")]).unwrap());
    }

    #[test]
    fn different_tolerates_a_single_absent() {
        assert!(Predicate::Different.apply(&[None, some("abc")]).unwrap());
        assert!(!Predicate::Different.apply(&[None, None, some("x")]).unwrap());
    }

    #[test]
    fn different_detects_duplicates_by_set_deduplication() {
        assert!(!Predicate::Different
            .apply(&[some("x"), some("x"), some("y")])
            .unwrap());
        assert!(Predicate::Different
            .apply(&[some("x"), some("y"), some("z")])
            .unwrap());
    }

    #[test]
    fn and_or_not_over_booleans() {
        assert!(Predicate::And.apply(&[some(true), some(true)]).unwrap());
        assert!(!Predicate::And.apply(&[some(true), some(false)]).unwrap());
        assert!(Predicate::Or.apply(&[some(false), some(true)]).unwrap());
        assert!(!Predicate::Not.apply(&[some(true)]).unwrap());
    }

    #[test]
    fn non_boolean_argument_is_an_evaluation_error() {
        let err = Predicate::Not.apply(&[some("not a bool")]).unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::NotBoolean { .. })
        ));
    }

    #[test]
    fn not_null_checks_presence() {
        assert!(Predicate::NotNull.apply(&[some(1i32)]).unwrap());
        assert!(!Predicate::NotNull.apply(&[None]).unwrap());
    }
}
