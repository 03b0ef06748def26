//! The producer side: components that only emit messages.
//!
//! A producer performs a blocking external read, wraps the result in a
//! message, blocking-puts it on its outbound channel, and repeats.  It
//! stops when the source reports end-of-stream, when its stop flag is
//! raised between reads, when the consumer disappears, or when the source
//! fails — a crashed producer simply stops emitting, which a healthy
//! consumer tolerates by blocking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use elfos_types::{ElfError, Message};

use crate::ChannelSender;

/// Cooperative cancellation flag shared between the runtime and its
/// producer loops, checked between reads.
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Implemented by every message-producing component.
pub trait MessageSource: Send {
    /// Component id, used for the producer's log scope.
    fn id(&self) -> &str;

    /// Blocking read of the next message.
    ///
    /// `Ok(None)` signals end-of-stream and cleanly terminates the loop.
    ///
    /// # Errors
    ///
    /// A device failure terminates the loop after being logged.
    fn next(&mut self) -> Result<Option<Message>, ElfError>;
}

/// Spawn the producer loop for `source` on a dedicated blocking task.
pub fn spawn_producer(
    mut source: Box<dyn MessageSource>,
    out: ChannelSender,
    stop: StopFlag,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let component = source.id().to_string();
        info!(component = %component, "producer started");
        loop {
            if stop.is_raised() {
                info!(component = %component, "stop flag raised");
                break;
            }
            match source.next() {
                Ok(Some(message)) => {
                    if out.blocking_send(message).is_err() {
                        info!(component = %component, "consumer gone, stopping");
                        break;
                    }
                }
                Ok(None) => {
                    info!(component = %component, "end of stream");
                    break;
                }
                Err(error) => {
                    warn!(component = %component, %error, "device failure, stopping");
                    break;
                }
            }
        }
        info!(component = %component, "producer stopped");
    })
}
