//! Event plumbing for the PBFT replica state machine.
//!
//! A [`ThreadedEventManager`] owns one dedicated thread that hands events to
//! a single [`EventReceiver`], one at a time and in submission order. Follow-up
//! events returned by the receiver are processed before anything else is
//! accepted. [`ThreadedEventTimer`]s deliver an event into the same queue
//! once a countdown elapses; a `stop` or `reset` that has returned guarantees
//! the replaced event will never be delivered.

pub mod config;
pub mod error;
pub mod event;
pub mod manager;
mod threaded;
pub mod timer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use config::EventConfig;
pub use error::{EventError, Result};
pub use event::{Event, EventReceiver, EventType, WorkItem};
pub use manager::{EventManager, EventQueue, ThreadedEventManager};
pub use timer::{EventTimer, EventTimerFactory, ThreadedEventTimer, ThreadedTimerFactory};
