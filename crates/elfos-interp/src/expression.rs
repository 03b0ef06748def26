//! Expression trees evaluated against a node's scoped state.
//!
//! Leaves are literal values or state-variable references; interior nodes
//! apply an [`Operator`] or test a [`Predicate`].  Evaluation yields
//! `Option<Value>`: `None` is the absent sentinel produced by an unbound
//! variable.  Operators require present operands and raise
//! [`ElfError::Unbound`]; predicates give absence defined semantics.

use serde::{Deserialize, Serialize};

use elfos_state::{State, StateVariable};
use elfos_types::{ElfError, Value};

use crate::{Operator, Predicate};

/// An expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// A literal value.
    Literal(Value),
    /// A state-variable reference, dereferenced through the scope chain at
    /// evaluation time.
    Variable(StateVariable),
    /// Operator application over sub-expressions.
    Apply {
        op: Operator,
        args: Vec<Expression>,
    },
    /// Predicate test over sub-expressions; evaluates to a boolean value.
    Test {
        pred: Predicate,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn literal(v: impl Into<Value>) -> Expression {
        Expression::Literal(v.into())
    }

    pub fn variable(v: StateVariable) -> Expression {
        Expression::Variable(v)
    }

    pub fn apply(op: Operator, args: Vec<Expression>) -> Expression {
        Expression::Apply { op, args }
    }

    pub fn test(pred: Predicate, args: Vec<Expression>) -> Expression {
        Expression::Test { pred, args }
    }

    /// Evaluate against `state`.  `Ok(None)` means the expression is an
    /// unbound variable reference (the absent sentinel).
    pub fn eval(&self, state: &State) -> Result<Option<Value>, ElfError> {
        match self {
            Expression::Literal(v) => Ok(Some(v.clone())),
            Expression::Variable(var) => Ok(state.get(var)),
            Expression::Apply { op, args } => {
                op.check_arity(args.len())?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.eval_required(state)?);
                }
                op.apply(evaluated).map(Some)
            }
            Expression::Test { pred, args } => {
                pred.check_arity(args.len())?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.eval(state)?);
                }
                pred.apply(&evaluated).map(|b| Some(Value::Bool(b)))
            }
        }
    }

    /// Evaluate and require a present value; an unbound variable is a scope
    /// error here.
    pub fn eval_required(&self, state: &State) -> Result<Value, ElfError> {
        match self.eval(state)? {
            Some(v) => Ok(v),
            None => Err(ElfError::Unbound(self.describe())),
        }
    }

    /// Evaluate as a predicate expression and require a boolean result.
    pub fn eval_bool(&self, state: &State) -> Result<bool, ElfError> {
        match self.eval(state)? {
            Some(Value::Bool(b)) => Ok(b),
            Some(_) => Err(elfos_types::EvalError::NotBoolean {
                op: self.describe(),
            }
            .into()),
            None => Err(ElfError::Unbound(self.describe())),
        }
    }

    /// Best-effort description for error messages.
    fn describe(&self) -> String {
        match self {
            Expression::Variable(var) => var.name.clone(),
            Expression::Literal(v) => v.to_string(),
            Expression::Apply { op, .. } => op.name().to_string(),
            Expression::Test { pred, .. } => pred.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elfos_state::SharedArena;
    use elfos_types::{Number, VarType};

    fn prompt_var() -> StateVariable {
        StateVariable::new("consolePrompt", VarType::Text, "prompt shown to operator")
    }

    #[test]
    fn literal_evaluates_to_itself() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let e = Expression::literal(42i32);
        assert_eq!(e.eval(&root).unwrap(), Some(Value::from(42i32)));
    }

    #[test]
    fn variable_dereferences_through_scope_chain() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let child = arena.child_of(&root, "dialog");
        let v = prompt_var();
        root.set(&v, Value::text("ready>")).unwrap();

        let e = Expression::variable(v);
        assert_eq!(e.eval(&child).unwrap(), Some(Value::text("ready>")));
    }

    #[test]
    fn equals_against_child_and_root_scope() {
        // Spec end-to-end scenario: child binds consolePrompt, root does not.
        let arena = SharedArena::new();
        let root = arena.root("root");
        let child = arena.child_of(&root, "dialog");
        let v = prompt_var();
        child.set(&v, Value::text("ready>")).unwrap();

        let e = Expression::test(
            Predicate::Equals,
            vec![
                Expression::variable(v),
                Expression::literal("ready>"),
            ],
        );
        assert_eq!(e.eval(&child).unwrap(), Some(Value::Bool(true)));
        // Against the root state the variable is absent: not equal to the
        // present literal.
        assert_eq!(e.eval(&root).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn operator_over_unbound_variable_is_a_scope_error() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let v = StateVariable::new("missingCount", VarType::Integer, "test");

        let e = Expression::apply(
            Operator::Plus,
            vec![Expression::variable(v), Expression::literal(1i32)],
        );
        let err = e.eval(&root).unwrap_err();
        assert!(matches!(err, ElfError::Unbound(name) if name == "missingCount"));
    }

    #[test]
    fn nested_arithmetic_promotes() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        // Plus(1, Minus(Long(5), 3)) -> Long(3)
        let e = Expression::apply(
            Operator::Plus,
            vec![
                Expression::literal(1i32),
                Expression::apply(
                    Operator::Minus,
                    vec![Expression::literal(5i64), Expression::literal(3i32)],
                ),
            ],
        );
        assert_eq!(
            e.eval(&root).unwrap(),
            Some(Value::Number(Number::Long(3)))
        );
    }

    #[test]
    fn expression_trees_serialize() {
        let e = Expression::apply(
            Operator::Plus,
            vec![Expression::literal(1i32), Expression::literal(2i32)],
        );
        let json = serde_json::to_string(&e).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }
}
