use std::io;

use crate::event::EventType;

/// Errors produced by the event core.
///
/// Caller misuse that the protocol tolerates (repeat halts, stopping an idle
/// timer) is logged instead and never shows up here.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// `start` was called on a manager that already started.
    #[error("event manager already started")]
    AlreadyStarted,

    /// The manager loop has exited and no longer accepts events.
    #[error("event queue closed, dropped {event_type} event")]
    QueueClosed { event_type: EventType },

    /// A background loop thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid TOML for [`crate::EventConfig`].
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O error while reading configuration.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the events crate.
pub type Result<T> = std::result::Result<T, EventError>;
