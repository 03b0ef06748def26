//! [`ResourcePool`] – exclusive-checkout registry for shared devices.
//!
//! Sensors and actuators must acquire a named [`Resource`] before touching
//! the underlying device and release it when done.  Acquisition is
//! check-then-act, so the whole registry sits behind one lock.  The pool
//! never queues waiters: contention is reported immediately as
//! [`ElfError::ResourceHeld`], leaving retry and backoff policy to the
//! caller.
//!
//! # Example
//!
//! ```
//! use elfos_kernel::pool::ResourcePool;
//!
//! let pool = ResourcePool::new();
//! pool.register("console", "device");
//!
//! let res = pool.acquire("console", "console-actuator").unwrap();
//! assert_eq!(res.name, "console");
//! assert!(pool.acquire("console", "someone-else").is_err());
//!
//! pool.release("console", "console-actuator").unwrap();
//! assert!(pool.acquire("console", "someone-else").is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use elfos_types::ElfError;

/// A named, typed token representing a physical device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    /// Free-form device category, e.g. `"device"` or `"console"`.
    pub kind: String,
}

struct PoolEntry {
    resource: Arc<Resource>,
    holder: Option<String>,
}

/// Process-wide registry from resource name to one [`Resource`] instance.
///
/// Cloning the pool yields another handle onto the same registry.
#[derive(Clone, Default)]
pub struct ResourcePool {
    entries: Arc<Mutex<HashMap<String, PoolEntry>>>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource.  Re-registering an existing name replaces the
    /// entry and drops any holder.
    pub fn register(&self, name: impl Into<String>, kind: impl Into<String>) {
        let name = name.into();
        let resource = Arc::new(Resource {
            name: name.clone(),
            kind: kind.into(),
        });
        self.entries
            .lock()
            .expect("resource pool lock poisoned")
            .insert(name, PoolEntry { resource, holder: None });
    }

    /// Check out a resource for `holder`.
    ///
    /// # Errors
    ///
    /// [`ElfError::UnknownResource`] when no such name is registered;
    /// [`ElfError::ResourceHeld`] when it is currently checked out.
    pub fn acquire(&self, name: &str, holder: &str) -> Result<Arc<Resource>, ElfError> {
        let mut entries = self.entries.lock().expect("resource pool lock poisoned");
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| ElfError::UnknownResource(name.to_string()))?;
        if let Some(current) = &entry.holder {
            return Err(ElfError::ResourceHeld {
                name: name.to_string(),
                holder: current.clone(),
            });
        }
        entry.holder = Some(holder.to_string());
        debug!(resource = %name, holder = %holder, "resource acquired");
        Ok(entry.resource.clone())
    }

    /// Return a resource previously acquired by `holder`.
    ///
    /// # Errors
    ///
    /// [`ElfError::UnknownResource`] for an unregistered name;
    /// [`ElfError::ResourceNotHeld`] when `holder` does not currently hold
    /// it (including when nobody does).
    pub fn release(&self, name: &str, holder: &str) -> Result<(), ElfError> {
        let mut entries = self.entries.lock().expect("resource pool lock poisoned");
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| ElfError::UnknownResource(name.to_string()))?;
        match &entry.holder {
            Some(current) if current == holder => {
                entry.holder = None;
                debug!(resource = %name, holder = %holder, "resource released");
                Ok(())
            }
            _ => Err(ElfError::ResourceNotHeld {
                name: name.to_string(),
                holder: holder.to_string(),
            }),
        }
    }

    /// Current holder of the named resource, if any.
    pub fn holder(&self, name: &str) -> Result<Option<String>, ElfError> {
        let entries = self.entries.lock().expect("resource pool lock poisoned");
        entries
            .get(name)
            .map(|e| e.holder.clone())
            .ok_or_else(|| ElfError::UnknownResource(name.to_string()))
    }
}
