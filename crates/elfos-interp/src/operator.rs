//! Value-producing operators of the embedded expression language.
//!
//! A closed enum with one exhaustive [`apply`](Operator::apply) keeps arity
//! and type checks centralized: adding an operator is a compiler-checked
//! exercise, and every failure surfaces as a distinguishable
//! [`EvalError`][elfos_types::EvalError].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use elfos_types::{ElfError, EvalError, Number, Value};

/// The operator kinds.  Arity is fixed per operator except where noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Arity 1: arithmetic negation.  Arity 2: subtraction.
    Minus,
    /// Binary addition under the numeric promotion tower.
    Plus,
    /// Binary strict less-than over numbers; yields a boolean.
    LessThan,
    /// Head of a non-empty list.
    First,
    /// Tail of a non-empty list.
    Rest,
    /// Element of a list at a zero-based numeric index.
    Nth,
    /// Length of a list, as a 32-bit integer.
    Length,
    /// Concatenation of two lists.
    Join,
    /// Variadic list constructor.
    TheList,
    /// Sorted keys of a map, as a list of text values.
    Keys,
    /// Values of a map, in key order.
    Values,
    /// `Enter(map, key, value)` – a copy of the map with one entry added or
    /// replaced.
    Enter,
    /// `Remove(map, key)` – a copy of the map without the entry.
    Remove,
    /// Whether a list or map has no elements.
    Empty,
}

impl Operator {
    /// Stable display name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Minus => "Minus",
            Operator::Plus => "Plus",
            Operator::LessThan => "LessThan",
            Operator::First => "First",
            Operator::Rest => "Rest",
            Operator::Nth => "Nth",
            Operator::Length => "Length",
            Operator::Join => "Join",
            Operator::TheList => "TheList",
            Operator::Keys => "Keys",
            Operator::Values => "Values",
            Operator::Enter => "Enter",
            Operator::Remove => "Remove",
            Operator::Empty => "Empty",
        }
    }

    /// Verify the argument count before evaluation.
    pub fn check_arity(&self, found: usize) -> Result<(), ElfError> {
        let ok = match self {
            Operator::Minus => found == 1 || found == 2,
            Operator::Plus
            | Operator::LessThan
            | Operator::Nth
            | Operator::Join
            | Operator::Remove => found == 2,
            Operator::Enter => found == 3,
            Operator::TheList => true,
            Operator::First
            | Operator::Rest
            | Operator::Length
            | Operator::Keys
            | Operator::Values
            | Operator::Empty => found == 1,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Operator::Minus => "1 or 2",
            Operator::Plus
            | Operator::LessThan
            | Operator::Nth
            | Operator::Join
            | Operator::Remove => "2",
            Operator::Enter => "3",
            Operator::TheList => "any",
            _ => "1",
        };
        Err(EvalError::WrongArity {
            op: self.name().to_string(),
            expected: expected.to_string(),
            found,
        }
        .into())
    }

    /// Apply the operator to already-evaluated, present arguments.
    ///
    /// Callers must have run [`check_arity`](Operator::check_arity) first;
    /// the argument count is trusted here.
    pub fn apply(&self, args: Vec<Value>) -> Result<Value, ElfError> {
        match self {
            Operator::Minus => {
                if args.len() == 1 {
                    let n = self.numeric(&args[0])?;
                    Ok(Value::Number(n.neg()))
                } else {
                    let a = self.numeric(&args[0])?;
                    let b = self.numeric(&args[1])?;
                    Ok(Value::Number(a.sub(b)))
                }
            }
            Operator::Plus => {
                let a = self.numeric(&args[0])?;
                let b = self.numeric(&args[1])?;
                Ok(Value::Number(a.add(b)))
            }
            Operator::LessThan => {
                let a = self.numeric(&args[0])?;
                let b = self.numeric(&args[1])?;
                Ok(Value::Bool(a.lt(b)))
            }
            Operator::First => {
                let items = self.list(&args[0])?;
                match items.first() {
                    Some(head) => Ok(head.clone()),
                    None => Err(EvalError::EmptyList {
                        op: self.name().to_string(),
                    }
                    .into()),
                }
            }
            Operator::Rest => {
                let items = self.list(&args[0])?;
                if items.is_empty() {
                    return Err(EvalError::EmptyList {
                        op: self.name().to_string(),
                    }
                    .into());
                }
                Ok(Value::List(items[1..].to_vec()))
            }
            Operator::Nth => {
                let items = self.list(&args[0])?;
                let index = self.numeric(&args[1])?.as_i64();
                if items.is_empty() {
                    return Err(EvalError::EmptyList {
                        op: self.name().to_string(),
                    }
                    .into());
                }
                if index < 0 || index as usize >= items.len() {
                    return Err(EvalError::IndexOutOfBounds {
                        index,
                        length: items.len(),
                    }
                    .into());
                }
                Ok(items[index as usize].clone())
            }
            Operator::Length => {
                let items = self.list(&args[0])?;
                Ok(Value::Number(Number::Integer(items.len() as i32)))
            }
            Operator::Join => {
                let mut joined = self.list(&args[0])?.to_vec();
                joined.extend_from_slice(self.list(&args[1])?);
                Ok(Value::List(joined))
            }
            Operator::TheList => Ok(Value::List(args)),
            Operator::Keys => {
                let entries = self.map(&args[0])?;
                Ok(Value::List(
                    entries.keys().map(|k| Value::text(k.clone())).collect(),
                ))
            }
            Operator::Values => {
                let entries = self.map(&args[0])?;
                Ok(Value::List(entries.values().cloned().collect()))
            }
            Operator::Enter => {
                let mut entries: BTreeMap<String, Value> = self.map(&args[0])?.clone();
                let key = self.key(&args[1])?;
                entries.insert(key.to_string(), args[2].clone());
                Ok(Value::Map(entries))
            }
            Operator::Remove => {
                let mut entries: BTreeMap<String, Value> = self.map(&args[0])?.clone();
                let key = self.key(&args[1])?;
                entries.remove(key);
                Ok(Value::Map(entries))
            }
            Operator::Empty => match &args[0] {
                Value::List(items) => Ok(Value::Bool(items.is_empty())),
                Value::Map(entries) => Ok(Value::Bool(entries.is_empty())),
                _ => Err(EvalError::NotAList {
                    op: self.name().to_string(),
                }
                .into()),
            },
        }
    }

    fn numeric(&self, v: &Value) -> Result<Number, ElfError> {
        v.as_number().ok_or_else(|| {
            EvalError::NotNumeric {
                op: self.name().to_string(),
            }
            .into()
        })
    }

    fn list<'a>(&self, v: &'a Value) -> Result<&'a [Value], ElfError> {
        v.as_list().ok_or_else(|| {
            EvalError::NotAList {
                op: self.name().to_string(),
            }
            .into()
        })
    }

    fn map<'a>(&self, v: &'a Value) -> Result<&'a BTreeMap<String, Value>, ElfError> {
        v.as_map().ok_or_else(|| {
            EvalError::NotAMap {
                op: self.name().to_string(),
            }
            .into()
        })
    }

    fn key<'a>(&self, v: &'a Value) -> Result<&'a str, ElfError> {
        v.as_text().ok_or_else(|| {
            EvalError::NotAMap {
                op: self.name().to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: Vec<Value>) -> Value {
        Value::List(items)
    }

    #[test]
    fn plus_promotes_integer_and_long() {
        let out = Operator::Plus
            .apply(vec![Value::from(1i32), Value::from(2i64)])
            .unwrap();
        assert_eq!(out, Value::from(3i64));
    }

    #[test]
    fn unary_minus_on_float() {
        let out = Operator::Minus
            .apply(vec![Value::Number(Number::Float(1.0))])
            .unwrap();
        assert_eq!(out, Value::Number(Number::Float(-1.0)));
    }

    #[test]
    fn binary_minus_subtracts() {
        let out = Operator::Minus
            .apply(vec![Value::from(5i32), Value::from(3i32)])
            .unwrap();
        assert_eq!(out, Value::from(2i32));
    }

    #[test]
    fn wrong_arity_is_an_evaluation_error() {
        let err = Operator::Plus.check_arity(3).unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::WrongArity { .. })
        ));
    }

    #[test]
    fn non_numeric_operand_is_rejected() {
        let err = Operator::Plus
            .apply(vec![Value::text("x"), Value::from(1i32)])
            .unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::NotNumeric { .. })
        ));
    }

    #[test]
    fn first_of_empty_list_fails() {
        let err = Operator::First.apply(vec![list(vec![])]).unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::EmptyList { .. })
        ));
    }

    #[test]
    fn nth_bounds_are_checked() {
        let l = list(vec![Value::from(10i32), Value::from(20i32)]);
        let out = Operator::Nth.apply(vec![l.clone(), Value::from(1i32)]).unwrap();
        assert_eq!(out, Value::from(20i32));
        let err = Operator::Nth.apply(vec![l, Value::from(2i32)]).unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn rest_and_join_and_length() {
        let l = list(vec![Value::from(1i32), Value::from(2i32)]);
        assert_eq!(
            Operator::Rest.apply(vec![l.clone()]).unwrap(),
            list(vec![Value::from(2i32)])
        );
        assert_eq!(
            Operator::Length.apply(vec![l.clone()]).unwrap(),
            Value::from(2i32)
        );
        assert_eq!(
            Operator::Join.apply(vec![l.clone(), l]).unwrap(),
            list(vec![
                Value::from(1i32),
                Value::from(2i32),
                Value::from(1i32),
                Value::from(2i32)
            ])
        );
    }

    #[test]
    fn the_list_builds_from_any_arity() {
        assert_eq!(Operator::TheList.apply(vec![]).unwrap(), list(vec![]));
        assert_eq!(
            Operator::TheList
                .apply(vec![Value::from(1i32), Value::text("a")])
                .unwrap(),
            list(vec![Value::from(1i32), Value::text("a")])
        );
    }

    #[test]
    fn map_enter_remove_keys_values_empty() {
        let m = Value::Map(Default::default());
        let m = Operator::Enter
            .apply(vec![m, Value::text("k"), Value::from(1i32)])
            .unwrap();
        assert_eq!(
            Operator::Keys.apply(vec![m.clone()]).unwrap(),
            list(vec![Value::text("k")])
        );
        assert_eq!(
            Operator::Values.apply(vec![m.clone()]).unwrap(),
            list(vec![Value::from(1i32)])
        );
        assert_eq!(
            Operator::Empty.apply(vec![m.clone()]).unwrap(),
            Value::Bool(false)
        );
        let m = Operator::Remove.apply(vec![m, Value::text("k")]).unwrap();
        assert_eq!(Operator::Empty.apply(vec![m]).unwrap(), Value::Bool(true));
    }
}
