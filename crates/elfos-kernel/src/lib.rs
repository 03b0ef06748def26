//! `elfos-kernel` – arbitration and supervision.
//!
//! The kernel does not think; it arbitrates access to shared physical
//! devices and watches worker health.
//!
//! # Modules
//!
//! - [`pool`] – [`ResourcePool`][pool::ResourcePool]: exclusive-checkout
//!   registry for shared devices (the built-in case is a single shared
//!   console).  No wait queue — contention is an immediate error and retry
//!   policy belongs to the caller.
//! - [`watchdog`] – [`Watchdog`][watchdog::Watchdog]: tracks heartbeats
//!   from worker loops and reports stalled workers to a supervisor.

pub mod pool;
pub mod watchdog;

pub use pool::{Resource, ResourcePool};
pub use watchdog::{Watchdog, WorkerHealth};
