//! Built-in components.
//!
//! Four roles, all communicating only through channels:
//!
//! | Role | Built-in | Loop |
//! |---|---|---|
//! | Sensor | [`ConsoleSensor`] | producer |
//! | Actuator | [`ConsoleActuator`], [`RequestActuatorSensor`] | worker |
//! | BehaviorGeneration | [`EchoBehavior`] | worker |
//! | ValueJudgement | [`ScheduleJudge`] | worker |
//!
//! [`RequestActuatorSensor`] is the tightly coupled actuator/sensor pair
//! modeled as one component: it consumes action messages and, after acting,
//! independently emits the resulting sensation on its outbound channel —
//! one value stream split into "do" and "observe" halves, not a
//! request/response call.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use elfos_hal::{LineDevice, RequestResponder};
use elfos_interp::{Command, Expression, FirstCandidateArbiter, Interpreter};
use elfos_kernel::ResourcePool;
use elfos_middleware::{ChannelSender, MessageHandler, MessageSource};
use elfos_state::{State, StateVariable};
use elfos_types::{
    ElfError, EvalError, Message, MessageBody, Schedule, ScheduleEvaluation, TaskCommand, Value,
};

/// Backoff before the single acquire retry on console contention.
const ACQUIRE_RETRY_BACKOFF: Duration = Duration::from_millis(50);

// ─────────────────────────────────────────────────────────────────────────────
// ConsoleSensor (producer)
// ─────────────────────────────────────────────────────────────────────────────

/// Reads lines from a [`LineDevice`] and emits each as an observed-input
/// message.  End-of-stream ends the producer loop cleanly.
pub struct ConsoleSensor {
    id: String,
    device: Box<dyn LineDevice>,
}

impl ConsoleSensor {
    pub fn new(id: impl Into<String>, device: Box<dyn LineDevice>) -> Self {
        Self {
            id: id.into(),
            device,
        }
    }
}

impl MessageSource for ConsoleSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn next(&mut self) -> Result<Option<Message>, ElfError> {
        Ok(self.device.read_line()?.map(|line| {
            Message::new(self.id.clone(), MessageBody::ObservedInput(Value::Text(line)))
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConsoleActuator (worker)
// ─────────────────────────────────────────────────────────────────────────────

/// Writes actuate payloads to a [`LineDevice`], holding the pooled console
/// resource for exactly the duration of each write.
///
/// On contention the acquire is retried once after a short backoff; a
/// second failure propagates, the worker logs it, and the message is
/// skipped (retry policy belongs to the caller, not the pool).
pub struct ConsoleActuator {
    id: String,
    device: Box<dyn LineDevice>,
    pool: ResourcePool,
    resource: String,
}

impl ConsoleActuator {
    pub fn new(
        id: impl Into<String>,
        device: Box<dyn LineDevice>,
        pool: ResourcePool,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            device,
            pool,
            resource: resource.into(),
        }
    }

    async fn acquire_with_retry(&self) -> Result<(), ElfError> {
        match self.pool.acquire(&self.resource, &self.id) {
            Ok(_) => Ok(()),
            Err(ElfError::ResourceHeld { .. }) => {
                tokio::time::sleep(ACQUIRE_RETRY_BACKOFF).await;
                self.pool.acquire(&self.resource, &self.id).map(|_| ())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MessageHandler for ConsoleActuator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&mut self, message: Message) -> Result<(), ElfError> {
        let MessageBody::Actuate(payload) = message.body else {
            return Err(ElfError::UnexpectedMessage {
                component: self.id.clone(),
                kind: message.kind().to_string(),
            });
        };
        let line = match payload {
            Value::Text(s) => s,
            other => other.to_string(),
        };
        self.acquire_with_retry().await?;
        let written = self.device.write_line(&line);
        self.pool.release(&self.resource, &self.id)?;
        written
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RequestActuatorSensor (worker with a sensor half)
// ─────────────────────────────────────────────────────────────────────────────

/// Dual-role component wrapping an external request/response collaborator.
///
/// The actuator half consumes `Actuate` payloads and performs the
/// synchronous [`RequestResponder::send_request`]; the sensor half then
/// emits the response as an observed-input message on its outbound channel.
pub struct RequestActuatorSensor {
    id: String,
    responder: Box<dyn RequestResponder>,
    out: ChannelSender,
}

impl RequestActuatorSensor {
    pub fn new(
        id: impl Into<String>,
        responder: Box<dyn RequestResponder>,
        out: ChannelSender,
    ) -> Self {
        Self {
            id: id.into(),
            responder,
            out,
        }
    }
}

#[async_trait]
impl MessageHandler for RequestActuatorSensor {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&mut self, message: Message) -> Result<(), ElfError> {
        let MessageBody::Actuate(payload) = message.body else {
            return Err(ElfError::UnexpectedMessage {
                component: self.id.clone(),
                kind: message.kind().to_string(),
            });
        };
        let response = self.responder.send_request(payload)?;
        self.out
            .send(Message::new(
                self.id.clone(),
                MessageBody::ObservedInput(response),
            ))
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EchoBehavior (worker)
// ─────────────────────────────────────────────────────────────────────────────

/// Behavior generation: turns observed inputs into actuations and runs
/// named command trees.
///
/// On `ObservedInput` it stores the value into its input variable, checks
/// the optional guard predicate, evaluates the response expression (default:
/// echo the stored input), and emits `Actuate`.  On `DoTask` it either runs
/// the named command tree directly or, when a value-judgement channel is
/// wired, submits a [`Schedule`] first and runs the task only after an
/// approving `ScheduleEvaluationResult`.
pub struct EchoBehavior {
    id: String,
    state: State,
    input_var: StateVariable,
    guard: Option<Expression>,
    response: Option<Expression>,
    out: ChannelSender,
    judge: Option<ChannelSender>,
    /// Importance attached to proposed schedules.
    importance: f64,
    interpreter: Interpreter,
    tasks: HashMap<String, Command>,
    arbiter: FirstCandidateArbiter,
    pending: HashMap<Uuid, TaskCommand>,
}

impl EchoBehavior {
    pub fn new(
        id: impl Into<String>,
        state: State,
        input_var: StateVariable,
        out: ChannelSender,
    ) -> Self {
        Self {
            id: id.into(),
            state,
            input_var,
            guard: None,
            response: None,
            out,
            judge: None,
            importance: 0.5,
            interpreter: Interpreter::new(),
            tasks: HashMap::new(),
            arbiter: FirstCandidateArbiter::new(),
            pending: HashMap::new(),
        }
    }

    /// Only act on inputs for which the guard predicate holds.
    pub fn with_guard(mut self, guard: Expression) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Response expression evaluated against the state after the input is
    /// stored; defaults to echoing the input itself.
    pub fn with_response(mut self, response: Expression) -> Self {
        self.response = Some(response);
        self
    }

    /// Route tasks through a value-judgement component before running them.
    pub fn with_judge(mut self, judge: ChannelSender, importance: f64) -> Self {
        self.judge = Some(judge);
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    /// Register a named command tree runnable via `DoTask`.
    pub fn with_task(mut self, name: impl Into<String>, command: Command) -> Self {
        self.tasks.insert(name.into(), command);
        self
    }

    /// Register an action callable from the command trees.
    pub fn with_action(
        mut self,
        name: impl Into<String>,
        action: impl Fn(&[Value]) -> Result<(), ElfError> + Send + Sync + 'static,
    ) -> Self {
        self.interpreter.register_action(name, action);
        self
    }

    /// Credits recorded by the placeholder arbiter (inspection seam).
    pub fn credits(&self) -> &[(String, f64)] {
        &self.arbiter.credits
    }

    fn run_task(&mut self, task: &TaskCommand) -> Result<(), ElfError> {
        let command = self
            .tasks
            .get(&task.name)
            .ok_or_else(|| EvalError::UnknownAction(task.name.clone()))?;
        self.interpreter
            .execute(command, &self.state, &mut self.arbiter)
    }
}

#[async_trait]
impl MessageHandler for EchoBehavior {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&mut self, message: Message) -> Result<(), ElfError> {
        match message.body {
            MessageBody::ObservedInput(value) => {
                self.state.set(&self.input_var, value.clone())?;
                if let Some(guard) = &self.guard {
                    if !guard.eval_bool(&self.state)? {
                        debug!(component = %self.id, "guard rejected input");
                        return Ok(());
                    }
                }
                let payload = match &self.response {
                    Some(expr) => expr.eval_required(&self.state)?,
                    None => value,
                };
                self.out
                    .send(Message::new(
                        self.id.clone(),
                        MessageBody::Actuate(payload),
                    ))
                    .await
            }

            MessageBody::DoTask(task) => match &self.judge {
                Some(judge) => {
                    let schedule = Schedule::new(self.id.clone(), task.clone(), self.importance);
                    self.pending.insert(schedule.id, task);
                    judge
                        .send(Message::new(
                            self.id.clone(),
                            MessageBody::EvaluateSchedule(schedule),
                        ))
                        .await
                }
                None => self.run_task(&task),
            },

            MessageBody::ScheduleEvaluationResult(verdict) => {
                let Some(task) = self.pending.remove(&verdict.schedule_id) else {
                    return Err(ElfError::UnexpectedMessage {
                        component: self.id.clone(),
                        kind: "schedule-evaluation-result".to_string(),
                    });
                };
                if verdict.approved {
                    self.run_task(&task)
                } else {
                    info!(component = %self.id, task = %task.name, score = verdict.score,
                        "schedule rejected by value judgement");
                    Ok(())
                }
            }

            other => Err(ElfError::UnexpectedMessage {
                component: self.id.clone(),
                kind: other.kind().to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScheduleJudge (worker)
// ─────────────────────────────────────────────────────────────────────────────

/// Value judgement: scores proposed schedules by clamped importance and
/// approves those at or above its threshold.
pub struct ScheduleJudge {
    id: String,
    threshold: f64,
    out: ChannelSender,
}

impl ScheduleJudge {
    pub fn new(id: impl Into<String>, threshold: f64, out: ChannelSender) -> Self {
        Self {
            id: id.into(),
            threshold: threshold.clamp(0.0, 1.0),
            out,
        }
    }
}

#[async_trait]
impl MessageHandler for ScheduleJudge {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&mut self, message: Message) -> Result<(), ElfError> {
        let MessageBody::EvaluateSchedule(schedule) = message.body else {
            return Err(ElfError::UnexpectedMessage {
                component: self.id.clone(),
                kind: message.kind().to_string(),
            });
        };
        let score = schedule.importance.clamp(0.0, 1.0);
        let verdict = ScheduleEvaluation {
            schedule_id: schedule.id,
            score,
            approved: score >= self.threshold,
        };
        debug!(component = %self.id, task = %schedule.task.name, score,
            approved = verdict.approved, "schedule evaluated");
        self.out
            .send(Message::new(
                self.id.clone(),
                MessageBody::ScheduleEvaluationResult(verdict),
            ))
            .await
    }
}
