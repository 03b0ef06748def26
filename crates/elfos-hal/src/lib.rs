//! `elfos-hal` – device adapters.
//!
//! Components never touch devices directly; they hold a trait object and
//! the concrete driver is chosen at configuration time.  Tests substitute
//! the scripted simulations.
//!
//! # Modules
//!
//! - [`console`] – [`LineDevice`] trait and [`StdConsole`], the real
//!   stdin/stdout console driver.
//! - [`sim`] – [`SimConsole`]: scripted input + captured output for
//!   headless tests.
//! - [`responder`] – [`RequestResponder`] trait (the external
//!   knowledge-base seam) and the loopback [`EchoResponder`].

pub mod console;
pub mod responder;
pub mod sim;

pub use console::{LineDevice, StdConsole};
pub use responder::{EchoResponder, RequestResponder};
pub use sim::SimConsole;
