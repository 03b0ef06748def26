//! `elfos-runtime` – the control hierarchy and its lifecycle.
//!
//! Assembles the node tree, its per-node state scopes, the built-in
//! components, and the channel wiring between them, then runs the whole
//! thing as a set of independent producer and worker loops.
//!
//! # Modules
//!
//! - [`node`] – [`Node`][node::Node] / [`NodeTree`][node::NodeTree]:
//!   the strict composition tree, each node owning one state scope chained
//!   to its parent's in lock step.
//! - [`goal`] – [`Goal`][goal::Goal]: goal trees with achieve-state or
//!   perform-procedure bodies, clamped importance, and failure states.
//! - [`component`] – the built-in sensor, actuator, behavior-generation,
//!   and value-judgement components.
//! - [`factory`] – [`TreeSpec`][factory::TreeSpec] →
//!   [`NodeFactory`][factory::NodeFactory] →
//!   [`ControlTree`][factory::ControlTree] →
//!   [`RunningTree`][factory::RunningTree]: declarative assembly, start,
//!   and cooperative stop.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace
//!   export to any OTLP-compatible collector.

pub mod component;
pub mod factory;
pub mod goal;
pub mod node;
pub mod telemetry;

pub use component::{
    ConsoleActuator, ConsoleSensor, EchoBehavior, RequestActuatorSensor, ScheduleJudge,
};
pub use factory::{
    ComponentSpec, ControlTree, NodeFactory, NodeSpec, ResourceSpec, RunningTree, TreeSpec,
    VariableSpec,
};
pub use goal::{Goal, GoalBody};
pub use node::{Node, NodeId, NodeTree};
pub use telemetry::{TracerProviderGuard, init_tracing};

// Re-export the pool and watchdog so orchestration code can hold them
// without an additional explicit dependency on elfos-kernel.
pub use elfos_kernel::{ResourcePool, Watchdog};
