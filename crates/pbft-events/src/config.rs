use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EventError, Result};

/// Smallest stack size accepted for loop threads.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Thread settings for the event manager and the timers it serves.
///
/// Every field has a default, so a TOML document only needs the keys it
/// wants to change:
///
/// ```toml
/// manager_thread_name = "replica-0-events"
/// stack_size = 1048576
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Name of the manager loop thread.
    pub manager_thread_name: String,
    /// Name prefix of timer loop threads; each timer appends its index.
    pub timer_thread_name: String,
    /// Stack size for loop threads. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            manager_thread_name: "pbft-events".into(),
            timer_thread_name: "pbft-timer".into(),
            stack_size: None,
        }
    }
}

impl EventConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("manager_thread_name", &self.manager_thread_name),
            ("timer_thread_name", &self.timer_thread_name),
        ] {
            if name.is_empty() {
                return Err(EventError::Config(format!("{field} must not be empty")));
            }
            if name.contains('\0') {
                return Err(EventError::Config(format!(
                    "{field} must not contain NUL bytes"
                )));
            }
        }
        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(EventError::Config(format!(
                    "stack_size {size} is below the minimum of {MIN_STACK_SIZE}"
                )));
            }
        }
        Ok(())
    }

    /// Thread builder for a loop thread with the given name.
    pub(crate) fn thread_builder(&self, name: String) -> std::thread::Builder {
        let builder = std::thread::Builder::new().name(name);
        match self.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}
