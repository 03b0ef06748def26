//! Goal trees.
//!
//! A goal is either a state to achieve or a procedure to perform — never
//! both — with an importance in `[0.0, 1.0]` and optional failure states.
//! Goals form their own tree, mirroring but independent of the node tree:
//! a deep node may pursue a shallow goal and vice versa.

use serde::{Deserialize, Serialize};

use elfos_types::TaskCommand;

/// The mutually exclusive body of a [`Goal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalBody {
    /// A named world state to bring about.
    AchieveState(String),
    /// A procedure to perform.
    PerformProcedure(TaskCommand),
}

/// One goal with its sub-goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub body: GoalBody,
    /// Importance in `[0.0, 1.0]`; clamped at construction.
    pub importance: f64,
    /// Named states whose occurrence means this goal has failed.
    pub failure_states: Vec<String>,
    pub children: Vec<Goal>,
}

impl Goal {
    pub fn new(name: impl Into<String>, body: GoalBody, importance: f64) -> Self {
        Self {
            name: name.into(),
            body,
            importance: importance.clamp(0.0, 1.0),
            failure_states: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_failure_states(mut self, states: Vec<String>) -> Self {
        self.failure_states = states;
        self
    }

    pub fn with_children(mut self, children: Vec<Goal>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first search by name through this goal and its descendants.
    pub fn find(&self, name: &str) -> Option<&Goal> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}
