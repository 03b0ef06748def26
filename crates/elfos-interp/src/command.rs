//! Executable command trees.
//!
//! Commands form a parallel tree to expressions: atomic action calls, sense
//! triggers, parallel groups, choice commands, and learning episodes.
//! Choice commands never choose themselves — they expose their candidates
//! and the state variables relevant to choosing to an external
//! [`ChoiceArbiter`], which performs the selection.  A learning episode
//! scopes reward rules over the choices nested inside it; when a rule's
//! eligibility predicate is true at the moment a nested choice executes,
//! that choice is credited the rule's signed amount through the arbiter.
//! The credit-assignment policy itself lives outside this crate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use elfos_state::StateVariable;
use elfos_types::{ElfError, EvalError, Value};

use crate::Expression;

/// A reward rule scoped by a learning episode: when `eligibility` holds at
/// the time a nested choice runs, that choice is credited `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRule {
    pub eligibility: Expression,
    /// Signed reward amount.
    pub amount: f64,
}

/// An executable command tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Apply a registered action to evaluated arguments, for side effect.
    Call {
        action: String,
        args: Vec<Expression>,
    },
    /// Trigger a registered sensing action.
    Sense { sensor: String },
    /// Sub-commands safe to execute concurrently; no ordering guarantee
    /// between them.
    Parallel(Vec<Command>),
    /// Exactly one of `alternatives` is executed; the selection is made by
    /// the external arbiter, informed by `relevant` state variables.
    AlternativeChoice {
        name: String,
        alternatives: Vec<Command>,
        relevant: Vec<StateVariable>,
    },
    /// Any subset of `candidates` is executed; the selection is made by the
    /// external arbiter, informed by `relevant` state variables.
    SubsetChoice {
        name: String,
        candidates: Vec<Command>,
        relevant: Vec<StateVariable>,
    },
    /// An ordered list of commands with reward rules scoped over the
    /// choices nested inside them.
    LearningEpisode {
        name: String,
        commands: Vec<Command>,
        rewards: Vec<RewardRule>,
    },
}

impl Command {
    /// Check that every choice command name is unique within this tree.
    ///
    /// Reward rules refer to choices by name, so a duplicate would make
    /// credit attribution ambiguous.
    pub fn validate(&self) -> Result<(), ElfError> {
        let mut seen = HashSet::new();
        self.collect_choice_names(&mut seen)
    }

    fn collect_choice_names<'c>(
        &'c self,
        seen: &mut HashSet<&'c str>,
    ) -> Result<(), ElfError> {
        match self {
            Command::Call { .. } | Command::Sense { .. } => Ok(()),
            Command::Parallel(children) => {
                for child in children {
                    child.collect_choice_names(seen)?;
                }
                Ok(())
            }
            Command::AlternativeChoice {
                name, alternatives, ..
            } => {
                if !seen.insert(name.as_str()) {
                    return Err(EvalError::DuplicateChoiceName(name.clone()).into());
                }
                for child in alternatives {
                    child.collect_choice_names(seen)?;
                }
                Ok(())
            }
            Command::SubsetChoice {
                name, candidates, ..
            } => {
                if !seen.insert(name.as_str()) {
                    return Err(EvalError::DuplicateChoiceName(name.clone()).into());
                }
                for child in candidates {
                    child.collect_choice_names(seen)?;
                }
                Ok(())
            }
            Command::LearningEpisode { commands, .. } => {
                for child in commands {
                    child.collect_choice_names(seen)?;
                }
                Ok(())
            }
        }
    }
}

/// A choice handed to the external arbiter: the choice command's name, how
/// many candidates it exposes, and the current values of the state
/// variables declared relevant to the selection.
#[derive(Debug, Clone)]
pub struct ChoicePoint {
    pub name: String,
    pub candidates: usize,
    /// Relevant variables paired with their current (possibly absent)
    /// values at choice time.
    pub relevant: Vec<(StateVariable, Option<Value>)>,
}

/// The external selection / credit seam.
///
/// The interpreter exposes candidates and reward credits through this trait
/// and implements no selection or learning policy of its own.
pub trait ChoiceArbiter: Send {
    /// Pick the index of the alternative to execute.
    fn choose_alternative(&mut self, point: &ChoicePoint) -> usize;

    /// Pick the (possibly empty) set of candidate indices to execute.
    fn choose_subset(&mut self, point: &ChoicePoint) -> Vec<usize>;

    /// Credit `amount` to the named choice (reward-rule mechanism).
    fn credit(&mut self, choice: &str, amount: f64);
}

/// Deterministic placeholder arbiter: always picks the first alternative
/// and every subset candidate, and records credits for inspection.  Stands
/// in for an external value-judgement component.
#[derive(Debug, Default)]
pub struct FirstCandidateArbiter {
    pub credits: Vec<(String, f64)>,
}

impl FirstCandidateArbiter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChoiceArbiter for FirstCandidateArbiter {
    fn choose_alternative(&mut self, _point: &ChoicePoint) -> usize {
        0
    }

    fn choose_subset(&mut self, point: &ChoicePoint) -> Vec<usize> {
        (0..point.candidates).collect()
    }

    fn credit(&mut self, choice: &str, amount: f64) {
        self.credits.push((choice.to_string(), amount));
    }
}
