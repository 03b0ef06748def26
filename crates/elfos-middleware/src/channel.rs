//! Typed, blocking, point-to-point message channels.
//!
//! Built on [`tokio::sync::mpsc`]: any number of producers may hold a
//! [`ChannelSender`], but each channel has exactly one consuming worker
//! holding the [`ChannelReceiver`].  Messages from a single producer are
//! delivered in send order; no ordering holds across producers or across
//! channels.  `send` and `recv` are the only suspension points in the
//! system, blocking on a full buffer and an empty buffer respectively.

use std::sync::Arc;

use tokio::sync::mpsc;

use elfos_types::{ElfError, Message};

/// Default per-channel buffer capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Create a channel named after its consuming component.
pub fn channel(name: impl Into<String>, capacity: usize) -> (ChannelSender, ChannelReceiver) {
    let name: Arc<str> = Arc::from(name.into());
    let (tx, rx) = mpsc::channel(capacity);
    (
        ChannelSender {
            name: name.clone(),
            tx,
        },
        ChannelReceiver { name, rx },
    )
}

/// Producer half.  Clone freely; all clones feed the same consumer.
#[derive(Clone)]
pub struct ChannelSender {
    name: Arc<str>,
    tx: mpsc::Sender<Message>,
}

impl ChannelSender {
    /// Name of the consuming component this channel feeds.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocking put (async form): waits for buffer space.
    ///
    /// # Errors
    ///
    /// [`ElfError::ChannelClosed`] when the consumer has exited.
    pub async fn send(&self, message: Message) -> Result<(), ElfError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ElfError::ChannelClosed(self.name.to_string()))
    }

    /// Blocking put from a non-async producer thread.
    ///
    /// # Errors
    ///
    /// [`ElfError::ChannelClosed`] when the consumer has exited.
    pub fn blocking_send(&self, message: Message) -> Result<(), ElfError> {
        self.tx
            .blocking_send(message)
            .map_err(|_| ElfError::ChannelClosed(self.name.to_string()))
    }
}

/// Consumer half: owned by exactly one worker.
pub struct ChannelReceiver {
    name: Arc<str>,
    rx: mpsc::Receiver<Message>,
}

impl ChannelReceiver {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocking take: waits for the next message; `None` once every sender
    /// is dropped and the buffer is drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}
