//! External request/response collaborator seam.
//!
//! An actuator-role handler invokes [`RequestResponder::send_request`]
//! synchronously; the runtime wraps the response into an observed-input
//! message and re-injects it into the message substrate.  The payload
//! format is opaque to this core — the knowledge-base client behind the
//! seam owns its own wire protocol.

use elfos_types::{ElfError, Value};

/// The narrow interface to an external knowledge-base / API collaborator.
pub trait RequestResponder: Send {
    /// Stable identifier for logging, e.g. `"kb"`.
    fn id(&self) -> &str;

    /// Synchronous request/response exchange.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Device`] when the collaborator is unreachable or
    /// answers malformed.
    fn send_request(&mut self, payload: Value) -> Result<Value, ElfError>;
}

/// A loopback collaborator that answers every request with its own payload.
/// Used by tests and the demo configuration.
pub struct EchoResponder {
    id: String,
}

impl EchoResponder {
    pub fn new() -> Self {
        Self {
            id: "echo".to_string(),
        }
    }
}

impl Default for EchoResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestResponder for EchoResponder {
    fn id(&self) -> &str {
        &self.id
    }

    fn send_request(&mut self, payload: Value) -> Result<Value, ElfError> {
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_responder_reflects_payload() {
        let mut responder = EchoResponder::new();
        let out = responder.send_request(Value::text("ping")).unwrap();
        assert_eq!(out, Value::text("ping"));
    }
}
