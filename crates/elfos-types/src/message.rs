//! Typed message envelope exchanged over channels.
//!
//! A [`Message`] is an immutable record: once constructed it is only moved
//! between a producer and the single consumer of a channel, never mutated
//! and never broadcast.  Every message carries its sender's component id so
//! consumers can attribute traffic in logs and replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Value;

/// A named task requested from a behavior-generation component, carrying
/// already-evaluated parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCommand {
    /// Name of the command tree to execute, as registered at configuration
    /// time.
    pub name: String,
    /// Evaluated parameter values, positional.
    pub parameters: Vec<Value>,
}

impl TaskCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters(name: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// A proposed unit of work submitted to a value-judgement component for
/// scoring before it is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    /// Component id of the behavior generator proposing the schedule.
    pub proposer: String,
    pub task: TaskCommand,
    /// Importance in `[0.0, 1.0]`, inherited from the goal that spawned the
    /// task.
    pub importance: f64,
}

impl Schedule {
    pub fn new(proposer: impl Into<String>, task: TaskCommand, importance: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            proposer: proposer.into(),
            task,
            importance: importance.clamp(0.0, 1.0),
        }
    }
}

/// Verdict returned by a value-judgement component for one [`Schedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvaluation {
    pub schedule_id: Uuid,
    /// Score in `[0.0, 1.0]`.
    pub score: f64,
    pub approved: bool,
}

/// The kind-tagged payload of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum MessageBody {
    /// Sensed data flowing upward from a sensor toward behavior generation.
    ObservedInput(Value),
    /// A task handed to a behavior-generation component.
    DoTask(TaskCommand),
    /// An action payload flowing downward toward an actuator.
    Actuate(Value),
    /// Cooperative shutdown: the receiving worker exits its loop.
    Release,
    /// Ask a value-judgement component to score a schedule.
    EvaluateSchedule(Schedule),
    /// The value-judgement verdict for a previously submitted schedule.
    ScheduleEvaluationResult(ScheduleEvaluation),
    /// Untyped traffic for components with private conventions.
    Generic(Value),
}

impl MessageBody {
    /// Stable kind name for dispatch logging.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::ObservedInput(_) => "observed-input",
            MessageBody::DoTask(_) => "do-task",
            MessageBody::Actuate(_) => "actuate",
            MessageBody::Release => "release",
            MessageBody::EvaluateSchedule(_) => "evaluate-schedule",
            MessageBody::ScheduleEvaluationResult(_) => "schedule-evaluation-result",
            MessageBody::Generic(_) => "generic",
        }
    }
}

/// An immutable message: unique id, creation timestamp, sending component,
/// and a kind-tagged body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Component id of the producer.
    pub sender: String,
    pub body: MessageBody,
}

impl Message {
    pub fn new(sender: impl Into<String>, body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sender: sender.into(),
            body,
        }
    }

    /// Shorthand for the body's kind name.
    pub fn kind(&self) -> &'static str {
        self.body.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_roundtrip() {
        let msg = Message::new(
            "console-sensor",
            MessageBody::ObservedInput(Value::text("hello")),
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg.id, back.id);
        assert_eq!(msg.body, back.body);
    }

    #[test]
    fn body_kind_names_are_stable() {
        assert_eq!(MessageBody::Release.kind(), "release");
        assert_eq!(
            MessageBody::DoTask(TaskCommand::new("greet")).kind(),
            "do-task"
        );
    }

    #[test]
    fn schedule_importance_is_clamped() {
        let s = Schedule::new("bg", TaskCommand::new("greet"), 7.5);
        assert!((s.importance - 1.0).abs() < f64::EPSILON);
        let s = Schedule::new("bg", TaskCommand::new("greet"), -0.5);
        assert_eq!(s.importance, 0.0);
    }
}
