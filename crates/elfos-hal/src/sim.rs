//! In-process simulated devices for headless tests.
//!
//! [`SimConsole`] plays back a script of input lines and captures every
//! written line, so the full control tree can run in CI without a terminal.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use elfos_types::ElfError;

use crate::console::LineDevice;

/// A scripted console: reads come from a pre-loaded script, writes are
/// captured for assertion.  After the script is exhausted, `read_line`
/// reports end-of-stream.
pub struct SimConsole {
    id: String,
    script: VecDeque<String>,
    output: Arc<Mutex<Vec<String>>>,
}

impl SimConsole {
    pub fn new(script: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: "console".to_string(),
            script: script.into_iter().map(Into::into).collect(),
            output: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the captured output lines.
    pub fn output(&self) -> Arc<Mutex<Vec<String>>> {
        self.output.clone()
    }
}

impl LineDevice for SimConsole {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_line(&mut self) -> Result<Option<String>, ElfError> {
        Ok(self.script.pop_front())
    }

    fn write_line(&mut self, line: &str) -> Result<(), ElfError> {
        self.output
            .lock()
            .expect("sim console output lock poisoned")
            .push(line.to_string());
        Ok(())
    }
}
