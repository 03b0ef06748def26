//! `elfos-types` – shared vocabulary of the ELFOS control architecture.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`Number`] / [`Value`] / [`VarType`] – the dynamic value model with a
//!   symmetric numeric promotion tower.
//! - [`Message`] / [`MessageBody`] – the immutable envelope exchanged over
//!   channels, plus the [`TaskCommand`] / [`Schedule`] payloads.
//! - [`ElfError`] / [`EvalError`] – the global failure taxonomy (scope,
//!   evaluation, resource, channel/worker).

mod error;
mod message;
mod number;
mod value;

pub use error::{ElfError, EvalError};
pub use message::{Message, MessageBody, Schedule, ScheduleEvaluation, TaskCommand};
pub use number::Number;
pub use value::{Value, VarType};
