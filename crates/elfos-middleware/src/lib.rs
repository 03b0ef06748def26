//! `elfos-middleware` – the message-passing substrate.
//!
//! Components never call each other; they enqueue typed messages on
//! point-to-point channels.  Each channel has one consuming worker; each
//! producing component runs its own loop on a dedicated task.  All
//! concurrency in the system comes from these independent loops — there is
//! no global scheduler.
//!
//! # Modules
//!
//! - [`channel`] – [`ChannelSender`] / [`ChannelReceiver`]: multi-producer,
//!   single-consumer blocking channels with per-producer FIFO ordering.
//! - [`worker`] – [`MessageHandler`] + [`spawn_worker`]: the
//!   take/dispatch/repeat consumer loop with log-and-continue fault policy
//!   and cooperative `Release` shutdown.
//! - [`producer`] – [`MessageSource`] + [`spawn_producer`]: the blocking
//!   read/wrap/put loop with end-of-stream and stop-flag termination.

pub mod channel;
pub mod producer;
pub mod worker;

pub use channel::{ChannelReceiver, ChannelSender, DEFAULT_CAPACITY, channel};
pub use producer::{MessageSource, StopFlag, spawn_producer};
pub use worker::{Heartbeat, MessageHandler, spawn_worker};
