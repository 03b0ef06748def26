//! The command executor.
//!
//! An [`Interpreter`] owns registries of named actions and sensors built
//! once at configuration time, and executes [`Command`] trees against a
//! node's [`State`] and an external [`ChoiceArbiter`].  The interpreter is
//! stateless between executions; everything mutable lives in the state
//! scope or the arbiter.

use std::collections::HashMap;

use tracing::debug;

use elfos_state::State;
use elfos_types::{ElfError, EvalError, Value};

use crate::{ChoiceArbiter, ChoicePoint, Command, RewardRule};

/// A side-effecting action applied to evaluated argument values.
pub type ActionFn = Box<dyn Fn(&[Value]) -> Result<(), ElfError> + Send + Sync>;

/// A zero-argument sensing trigger.
pub type SenseFn = Box<dyn Fn() -> Result<(), ElfError> + Send + Sync>;

/// Executes command trees against scoped state.
#[derive(Default)]
pub struct Interpreter {
    actions: HashMap<String, ActionFn>,
    sensors: HashMap<String, SenseFn>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action callable from [`Command::Call`].  Replaces any
    /// previous registration under the same name.
    pub fn register_action(
        &mut self,
        name: impl Into<String>,
        action: impl Fn(&[Value]) -> Result<(), ElfError> + Send + Sync + 'static,
    ) {
        self.actions.insert(name.into(), Box::new(action));
    }

    /// Register a sensing trigger callable from [`Command::Sense`].
    pub fn register_sensor(
        &mut self,
        name: impl Into<String>,
        sensor: impl Fn() -> Result<(), ElfError> + Send + Sync + 'static,
    ) {
        self.sensors.insert(name.into(), Box::new(sensor));
    }

    /// Execute `command` against `state`, delegating every choice to
    /// `arbiter`.
    ///
    /// Validates choice-name uniqueness up front.  Evaluation and scope
    /// errors abort the current command and propagate to the caller, which
    /// is expected to log and skip (never to crash its worker loop).
    pub fn execute(
        &self,
        command: &Command,
        state: &State,
        arbiter: &mut dyn ChoiceArbiter,
    ) -> Result<(), ElfError> {
        command.validate()?;
        let mut episodes: Vec<&[RewardRule]> = Vec::new();
        self.run(command, state, arbiter, &mut episodes)
    }

    fn run<'c>(
        &self,
        command: &'c Command,
        state: &State,
        arbiter: &mut dyn ChoiceArbiter,
        episodes: &mut Vec<&'c [RewardRule]>,
    ) -> Result<(), ElfError> {
        match command {
            Command::Call { action, args } => {
                let callee = self
                    .actions
                    .get(action)
                    .ok_or_else(|| EvalError::UnknownAction(action.clone()))?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.eval_required(state)?);
                }
                callee(&evaluated)
            }

            Command::Sense { sensor } => {
                let callee = self
                    .sensors
                    .get(sensor)
                    .ok_or_else(|| EvalError::UnknownAction(sensor.clone()))?;
                callee()
            }

            // Sub-commands are declared safe to run concurrently; running
            // them in order is one valid schedule.
            Command::Parallel(children) => {
                for child in children {
                    self.run(child, state, arbiter, episodes)?;
                }
                Ok(())
            }

            Command::AlternativeChoice {
                name,
                alternatives,
                relevant,
            } => {
                let point = self.choice_point(name, alternatives.len(), relevant, state);
                self.apply_rewards(name, state, arbiter, episodes)?;
                let index = arbiter.choose_alternative(&point);
                if index >= alternatives.len() {
                    return Err(EvalError::UnknownChoice {
                        choice: name.clone(),
                        index,
                        count: alternatives.len(),
                    }
                    .into());
                }
                debug!(choice = %name, index, "alternative selected");
                self.run(&alternatives[index], state, arbiter, episodes)
            }

            Command::SubsetChoice {
                name,
                candidates,
                relevant,
            } => {
                let point = self.choice_point(name, candidates.len(), relevant, state);
                self.apply_rewards(name, state, arbiter, episodes)?;
                let mut indices = arbiter.choose_subset(&point);
                indices.sort_unstable();
                indices.dedup();
                for &index in &indices {
                    if index >= candidates.len() {
                        return Err(EvalError::UnknownChoice {
                            choice: name.clone(),
                            index,
                            count: candidates.len(),
                        }
                        .into());
                    }
                }
                debug!(choice = %name, selected = indices.len(), "subset selected");
                for index in indices {
                    self.run(&candidates[index], state, arbiter, episodes)?;
                }
                Ok(())
            }

            Command::LearningEpisode {
                name,
                commands,
                rewards,
            } => {
                debug!(episode = %name, rules = rewards.len(), "entering learning episode");
                episodes.push(rewards.as_slice());
                let result = (|| {
                    for child in commands {
                        self.run(child, state, arbiter, episodes)?;
                    }
                    Ok(())
                })();
                episodes.pop();
                result
            }
        }
    }

    /// Credit the named choice for every active reward rule whose
    /// eligibility predicate holds right now.
    fn apply_rewards(
        &self,
        choice: &str,
        state: &State,
        arbiter: &mut dyn ChoiceArbiter,
        episodes: &[&[RewardRule]],
    ) -> Result<(), ElfError> {
        for scope in episodes {
            for rule in *scope {
                if rule.eligibility.eval_bool(state)? {
                    arbiter.credit(choice, rule.amount);
                }
            }
        }
        Ok(())
    }

    fn choice_point(
        &self,
        name: &str,
        candidates: usize,
        relevant: &[elfos_state::StateVariable],
        state: &State,
    ) -> ChoicePoint {
        ChoicePoint {
            name: name.to_string(),
            candidates,
            relevant: relevant
                .iter()
                .map(|var| (var.clone(), state.get(var)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expression, FirstCandidateArbiter, Predicate};
    use elfos_state::{SharedArena, StateVariable};
    use elfos_types::VarType;
    use std::sync::{Arc, Mutex};

    fn recording_interpreter() -> (Interpreter, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut interp = Interpreter::new();
        for name in ["greet", "farewell", "ping"] {
            let log = log.clone();
            interp.register_action(name, move |args: &[Value]| {
                let rendered = args.iter().map(Value::to_string).collect::<Vec<_>>();
                log.lock().unwrap().push(format!("{name}({})", rendered.join(", ")));
                Ok(())
            });
        }
        (interp, log)
    }

    #[test]
    fn call_evaluates_arguments_before_invoking() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let v = StateVariable::new("who", VarType::Text, "test");
        root.set(&v, Value::text("world")).unwrap();

        let (interp, log) = recording_interpreter();
        let cmd = Command::Call {
            action: "greet".into(),
            args: vec![Expression::variable(v)],
        };
        interp
            .execute(&cmd, &root, &mut FirstCandidateArbiter::new())
            .unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), ["greet(world)"]);
    }

    #[test]
    fn unknown_action_is_an_evaluation_error() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let interp = Interpreter::new();
        let cmd = Command::Call {
            action: "missing".into(),
            args: vec![],
        };
        let err = interp
            .execute(&cmd, &root, &mut FirstCandidateArbiter::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::UnknownAction(_))
        ));
    }

    #[test]
    fn alternative_choice_delegates_to_the_arbiter() {
        struct SecondArbiter;
        impl ChoiceArbiter for SecondArbiter {
            fn choose_alternative(&mut self, _point: &ChoicePoint) -> usize {
                1
            }
            fn choose_subset(&mut self, _point: &ChoicePoint) -> Vec<usize> {
                vec![]
            }
            fn credit(&mut self, _choice: &str, _amount: f64) {}
        }

        let arena = SharedArena::new();
        let root = arena.root("root");
        let (interp, log) = recording_interpreter();
        let cmd = Command::AlternativeChoice {
            name: "pick".into(),
            alternatives: vec![
                Command::Call { action: "greet".into(), args: vec![] },
                Command::Call { action: "farewell".into(), args: vec![] },
            ],
            relevant: vec![],
        };
        interp.execute(&cmd, &root, &mut SecondArbiter).unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), ["farewell()"]);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        struct WildArbiter;
        impl ChoiceArbiter for WildArbiter {
            fn choose_alternative(&mut self, _point: &ChoicePoint) -> usize {
                7
            }
            fn choose_subset(&mut self, _point: &ChoicePoint) -> Vec<usize> {
                vec![]
            }
            fn credit(&mut self, _choice: &str, _amount: f64) {}
        }

        let arena = SharedArena::new();
        let root = arena.root("root");
        let (interp, _log) = recording_interpreter();
        let cmd = Command::AlternativeChoice {
            name: "pick".into(),
            alternatives: vec![Command::Call { action: "greet".into(), args: vec![] }],
            relevant: vec![],
        };
        let err = interp.execute(&cmd, &root, &mut WildArbiter).unwrap_err();
        assert!(matches!(
            err,
            ElfError::Evaluation(EvalError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn choice_point_carries_relevant_variable_values() {
        struct Capture(Option<ChoicePoint>);
        impl ChoiceArbiter for Capture {
            fn choose_alternative(&mut self, point: &ChoicePoint) -> usize {
                self.0 = Some(point.clone());
                0
            }
            fn choose_subset(&mut self, _point: &ChoicePoint) -> Vec<usize> {
                vec![]
            }
            fn credit(&mut self, _choice: &str, _amount: f64) {}
        }

        let arena = SharedArena::new();
        let root = arena.root("root");
        let v = StateVariable::new("mood", VarType::Text, "test");
        root.set(&v, Value::text("cheerful")).unwrap();

        let (interp, _log) = recording_interpreter();
        let cmd = Command::AlternativeChoice {
            name: "pick".into(),
            alternatives: vec![Command::Call { action: "greet".into(), args: vec![] }],
            relevant: vec![v.clone()],
        };
        let mut capture = Capture(None);
        interp.execute(&cmd, &root, &mut capture).unwrap();
        let point = capture.0.unwrap();
        assert_eq!(point.candidates, 1);
        assert_eq!(point.relevant[0].0, v);
        assert_eq!(point.relevant[0].1, Some(Value::text("cheerful")));
    }

    #[test]
    fn learning_episode_credits_eligible_choices() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let flag = StateVariable::new("rewardEligible", VarType::Boolean, "test");
        root.set(&flag, Value::Bool(true)).unwrap();

        let (interp, _log) = recording_interpreter();
        let cmd = Command::LearningEpisode {
            name: "episode".into(),
            commands: vec![Command::AlternativeChoice {
                name: "greeting".into(),
                alternatives: vec![Command::Call { action: "greet".into(), args: vec![] }],
                relevant: vec![],
            }],
            rewards: vec![
                RewardRule {
                    eligibility: Expression::variable(flag.clone()),
                    amount: 2.0,
                },
                RewardRule {
                    eligibility: Expression::test(
                        Predicate::Not,
                        vec![Expression::variable(flag)],
                    ),
                    amount: -1.0,
                },
            ],
        };
        let mut arbiter = FirstCandidateArbiter::new();
        interp.execute(&cmd, &root, &mut arbiter).unwrap();
        // Only the eligible rule fires.
        assert_eq!(arbiter.credits, vec![("greeting".to_string(), 2.0)]);
    }

    #[test]
    fn episode_scope_is_popped_after_execution() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let (interp, _log) = recording_interpreter();

        let episode = Command::LearningEpisode {
            name: "episode".into(),
            commands: vec![],
            rewards: vec![RewardRule {
                eligibility: Expression::test(Predicate::True, vec![]),
                amount: 1.0,
            }],
        };
        let after = Command::AlternativeChoice {
            name: "later".into(),
            alternatives: vec![Command::Call { action: "ping".into(), args: vec![] }],
            relevant: vec![],
        };
        let cmd = Command::Parallel(vec![episode, after]);

        let mut arbiter = FirstCandidateArbiter::new();
        interp.execute(&cmd, &root, &mut arbiter).unwrap();
        // The choice outside the episode receives no credit.
        assert!(arbiter.credits.is_empty());
    }

    #[test]
    fn sense_triggers_registered_sensor() {
        let arena = SharedArena::new();
        let root = arena.root("root");
        let fired = Arc::new(Mutex::new(0u32));
        let mut interp = Interpreter::new();
        {
            let fired = fired.clone();
            interp.register_sensor("poll-console", move || {
                *fired.lock().unwrap() += 1;
                Ok(())
            });
        }
        let cmd = Command::Sense { sensor: "poll-console".into() };
        interp
            .execute(&cmd, &root, &mut FirstCandidateArbiter::new())
            .unwrap();
        assert_eq!(*fired.lock().unwrap(), 1);
    }
}
