//! `elfos-interp` – the embedded expression / predicate / command language.
//!
//! Behavior-generation components represent conditions, arithmetic, and
//! composite actions as trees evaluated against their node's scoped state.
//! Each family is a closed enum with one exhaustive evaluator, so arity and
//! type checks live in one place and adding a kind is compiler-checked.
//!
//! # Modules
//!
//! - [`operator`] – [`Operator`]: value-producing operators (arithmetic
//!   under the numeric promotion tower, list and map primitives).
//! - [`predicate`] – [`Predicate`]: boolean predicates with defined
//!   absent-value semantics.
//! - [`expression`] – [`Expression`]: trees of literals, variable
//!   references, operator applications, and predicate tests.
//! - [`command`] – [`Command`] / [`ChoiceArbiter`]: executable units,
//!   including choice commands that delegate selection and learning
//!   episodes that scope reward rules (mechanism only — no learning policy
//!   is built in).
//! - [`interpreter`] – [`Interpreter`]: the executor with its action and
//!   sensor registries.

pub mod command;
pub mod expression;
pub mod interpreter;
pub mod operator;
pub mod predicate;

pub use command::{ChoiceArbiter, ChoicePoint, Command, FirstCandidateArbiter, RewardRule};
pub use expression::Expression;
pub use interpreter::{ActionFn, Interpreter, SenseFn};
pub use operator::Operator;
pub use predicate::Predicate;
