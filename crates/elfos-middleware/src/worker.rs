//! The consumer side: one long-lived worker per channel.
//!
//! A worker loops blocking-take → dispatch → repeat.  Shutdown is
//! cooperative: a `Release` message (or channel closure) ends the loop
//! between takes; a message already taken is handled to completion.  A
//! handler error is logged and the loop continues — one bad message must
//! never kill the worker, and a crashed peer shows up here only as an empty
//! channel, which the worker tolerates by blocking.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use elfos_types::{ElfError, Message, MessageBody};

use crate::ChannelReceiver;

/// Per-message liveness callback, fired after each processed message.
pub type Heartbeat = Arc<dyn Fn() + Send + Sync>;

/// Implemented by every message-consuming component.
///
/// Handlers are expected to be short and non-blocking apart from the pool
/// and device calls they explicitly make.  An unexpected message kind
/// should surface as [`ElfError::UnexpectedMessage`]; the worker loop logs
/// it and moves on.
#[async_trait]
pub trait MessageHandler: Send {
    /// Component id, used for the worker's log scope.
    fn id(&self) -> &str;

    /// Dispatch one message by its concrete kind.
    async fn handle(&mut self, message: Message) -> Result<(), ElfError>;
}

/// Spawn the single consuming worker for `receiver`.
///
/// The worker exits when it takes a [`MessageBody::Release`] or when every
/// sender is gone.  `heartbeat`, when supplied, is invoked once per
/// processed message so a watchdog can detect stalls.
pub fn spawn_worker(
    mut receiver: ChannelReceiver,
    mut handler: Box<dyn MessageHandler>,
    heartbeat: Option<Heartbeat>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let component = handler.id().to_string();
        info!(component = %component, "worker started");
        while let Some(message) = receiver.recv().await {
            if matches!(message.body, MessageBody::Release) {
                info!(component = %component, "release received");
                break;
            }
            let kind = message.kind();
            let sender = message.sender.clone();
            if let Err(error) = handler.handle(message).await {
                // Skip the offending message; the loop must survive.
                warn!(
                    component = %component,
                    kind,
                    from = %sender,
                    %error,
                    "message handling failed, skipping"
                );
            }
            if let Some(beat) = &heartbeat {
                beat();
            }
        }
        info!(component = %component, "worker stopped");
    })
}
