//! Hand-driven timers for deterministic protocol tests.
//!
//! [`ManualTimerFactory`] hands out timers that never fire on their own. A
//! test inspects what the protocol asked for and calls [`ManualTimer::fire`]
//! when it wants the countdown to elapse.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::{Event, EventType};
use crate::manager::{EventManager, EventQueue};
use crate::timer::{EventTimer, EventTimerFactory};

/// A command received by a [`ManualTimer`], in arrival order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerCommand {
    SoftReset(Duration, EventType),
    Reset(Duration, EventType),
    Stop,
    Halt,
}

#[derive(Default)]
struct ManualState {
    armed: Option<(Duration, Event)>,
    halted: bool,
    commands: Vec<TimerCommand>,
}

/// Timer that only fires when told to.
///
/// Clones share state, so a test can keep one handle while the protocol owns
/// another.
#[derive(Clone)]
pub struct ManualTimer {
    queue: EventQueue,
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimer {
    fn new(queue: EventQueue) -> Self {
        Self {
            queue,
            state: Arc::new(Mutex::new(ManualState::default())),
        }
    }

    /// Whether a countdown is running.
    pub fn is_counting(&self) -> bool {
        self.state.lock().armed.is_some()
    }

    /// Duration of the running countdown.
    pub fn duration(&self) -> Option<Duration> {
        self.state.lock().armed.as_ref().map(|(d, _)| *d)
    }

    /// Type of the event the running countdown would deliver.
    pub fn armed_event_type(&self) -> Option<EventType> {
        self.state.lock().armed.as_ref().map(|(_, e)| e.event_type())
    }

    pub fn commands(&self) -> Vec<TimerCommand> {
        self.state.lock().commands.clone()
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    /// Elapse the running countdown and submit its event.
    ///
    /// Returns `Ok(false)` when nothing was counting. Blocks until the
    /// manager accepts the event, so it must not be called from inside the
    /// manager's receiver.
    pub fn fire(&self) -> Result<bool> {
        let armed = {
            let mut state = self.state.lock();
            if state.halted {
                None
            } else {
                state.armed.take()
            }
        };
        match armed {
            Some((_, event)) => {
                self.queue.send(event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn start(&self, hard: bool, duration: Duration, event: Event) {
        let mut state = self.state.lock();
        let event_type = event.event_type();
        state.commands.push(if hard {
            TimerCommand::Reset(duration, event_type)
        } else {
            TimerCommand::SoftReset(duration, event_type)
        });
        if state.halted {
            debug!("Manual timer halted, dropping start request");
            return;
        }
        if state.armed.is_some() && !hard {
            return;
        }
        state.armed = Some((duration, event));
    }
}

impl EventTimer for ManualTimer {
    fn soft_reset(&self, duration: Duration, event: Event) {
        self.start(false, duration, event);
    }

    fn reset(&self, duration: Duration, event: Event) {
        self.start(true, duration, event);
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.commands.push(TimerCommand::Stop);
        if state.armed.take().is_none() && !state.halted {
            warn!("Attempting to stop an unfired idle timer");
        }
    }

    fn halt(&self) {
        let mut state = self.state.lock();
        state.commands.push(TimerCommand::Halt);
        if state.halted {
            warn!("Attempted to halt a threaded object twice");
        }
        state.halted = true;
        state.armed = None;
    }
}

/// [`EventTimerFactory`] producing [`ManualTimer`]s and remembering them.
#[derive(Clone)]
pub struct ManualTimerFactory {
    queue: EventQueue,
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

impl ManualTimerFactory {
    pub fn new(manager: &dyn EventManager) -> Self {
        Self {
            queue: manager.queue(),
            timers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The `index`-th timer created by this factory.
    pub fn timer(&self, index: usize) -> Option<ManualTimer> {
        self.timers.lock().get(index).cloned()
    }

    /// Number of timers created so far.
    pub fn created(&self) -> usize {
        self.timers.lock().len()
    }
}

impl EventTimerFactory for ManualTimerFactory {
    fn create_timer(&self) -> Result<Box<dyn EventTimer>> {
        let timer = ManualTimer::new(self.queue.clone());
        self.timers.lock().push(timer.clone());
        Ok(Box::new(timer))
    }
}
