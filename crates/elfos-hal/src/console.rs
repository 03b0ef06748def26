//! Generic line-oriented device trait and the standard console driver.
//!
//! Drivers implement [`LineDevice`] and are handed to sensor/actuator
//! components; the rest of the system only ever talks to the trait, so a
//! scripted simulation can be swapped in for tests without touching control
//! logic.

use std::io::{BufRead, Write};

use elfos_types::ElfError;

/// A line-oriented blocking device (console, serial port, pipe).
///
/// `read_line` blocks until a full line is available and returns `None` at
/// end-of-stream, which cleanly terminates the owning producer loop.
///
/// `Sync` is required alongside `Send`: actuator handlers hold a shared
/// borrow of their device across await points, and their futures must be
/// `Send` to run on the worker tasks.
pub trait LineDevice: Send + Sync {
    /// Stable identifier, e.g. `"console"`.
    fn id(&self) -> &str;

    /// Blocking read of one line, without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Device`] on I/O failure; `Ok(None)` at
    /// end-of-stream.
    fn read_line(&mut self) -> Result<Option<String>, ElfError>;

    /// Blocking write of one line; a newline is appended.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Device`] on I/O failure.
    fn write_line(&mut self, line: &str) -> Result<(), ElfError>;
}

/// The process's real console: locked stdin for reads, stdout for writes.
pub struct StdConsole {
    id: String,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            id: "console".to_string(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDevice for StdConsole {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_line(&mut self) -> Result<Option<String>, ElfError> {
        let mut line = String::new();
        let n = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| ElfError::Device {
                device: self.id.clone(),
                details: e.to_string(),
            })?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn write_line(&mut self, line: &str) -> Result<(), ElfError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")
            .and_then(|_| stdout.flush())
            .map_err(|e| ElfError::Device {
                device: self.id.clone(),
                details: e.to_string(),
            })
    }
}
