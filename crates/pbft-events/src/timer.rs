//! Event timers with cancel-safe delivery.
//!
//! An [`EventTimer`] turns a duration and an event into a later submission to
//! an event manager's queue. Unlike a plain sleep-then-send task, once a
//! `stop` or `reset` call has returned, the event it replaced is never
//! delivered, even if the countdown had already elapsed. Every command, the
//! countdown, the delivery attempt, and the exit signal are arms of a single
//! select in the timer's own thread, so exactly one of them happens per
//! iteration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Select, Sender};
use tracing::{debug, trace, warn};

use crate::config::EventConfig;
use crate::error::{EventError, Result};
use crate::event::Event;
use crate::manager::{EventManager, EventQueue};
use crate::threaded::{ExitSignal, Threaded};

static NEXT_TIMER_INDEX: AtomicU64 = AtomicU64::new(0);

/// A timer delivering one event to an event manager after a countdown.
///
/// If the timer is stopped or reset, an event that was replaced is never
/// delivered, even if its countdown had already elapsed.
pub trait EventTimer: Send + Sync {
    /// Start a countdown only if none is running. An active countdown and
    /// its event are left untouched and `event` is dropped.
    fn soft_reset(&self, duration: Duration, event: Event);
    /// Start a new countdown, replacing any running countdown and clearing
    /// any pending event.
    fn reset(&self, duration: Duration, event: Event);
    /// Stop the countdown and clear any pending event.
    fn stop(&self);
    /// Stop the timer thread.
    fn halt(&self);
}

/// Creates [`EventTimer`]s bound to an event manager.
///
/// Protocol code takes a factory rather than building timers itself so tests
/// can substitute timers they drive by hand.
pub trait EventTimerFactory: Send + Sync {
    /// Create a stopped timer.
    fn create_timer(&self) -> Result<Box<dyn EventTimer>>;
}

/// Start request handed to the timer thread.
struct TimerStart {
    /// Whether to restart a countdown that is already running.
    hard: bool,
    event: Event,
    duration: Duration,
}

/// Loop-private timer state. Exactly one holds at any time.
enum TimerState {
    Idle,
    /// Counting down. `deadline` is `None` when the duration is too long to
    /// represent, in which case the countdown never elapses.
    Counting {
        deadline: Option<Instant>,
        event: Event,
    },
    /// Countdown elapsed; `event` is offered to the manager's queue.
    PendingDelivery(Event),
}

impl TimerState {
    fn start(self, timer: u64, start: TimerStart) -> TimerState {
        match self {
            TimerState::Counting { .. } if !start.hard => {
                debug!(timer, event_type = %start.event.event_type(), "Timer already counting, ignoring soft reset");
                self
            }
            previous => {
                match previous {
                    TimerState::Counting { .. } => debug!(timer, "Resetting a running timer"),
                    TimerState::PendingDelivery(_) => debug!(timer, "Timer cleared pending event"),
                    TimerState::Idle => {}
                }
                debug!(timer, duration = ?start.duration, "Starting timer");
                TimerState::Counting {
                    deadline: Instant::now().checked_add(start.duration),
                    event: start.event,
                }
            }
        }
    }

    fn stop(self, timer: u64) -> TimerState {
        match self {
            TimerState::Idle => warn!(timer, "Attempting to stop an unfired idle timer"),
            TimerState::Counting { .. } => debug!(timer, "Stopping timer"),
            TimerState::PendingDelivery(_) => {
                debug!(timer, "Stopping timer, cleared pending event")
            }
        }
        TimerState::Idle
    }

    fn fire(self, timer: u64) -> TimerState {
        match self {
            TimerState::Counting { event, .. } => {
                debug!(timer, "Event timer fired");
                TimerState::PendingDelivery(event)
            }
            other => other,
        }
    }
}

/// The timer thread: owns the receiving ends of the command channels.
struct TimerLoop {
    index: u64,
    start_rx: Receiver<TimerStart>,
    stop_rx: Receiver<()>,
    exit: ExitSignal,
    queue: EventQueue,
}

impl TimerLoop {
    fn run(self) {
        let timer = self.index;
        let mut state = TimerState::Idle;
        trace!(timer, "timer loop started");

        loop {
            if self.exit.is_halted() {
                debug!(timer, "Halting timer");
                return;
            }

            let countdown: Receiver<Instant> = match &state {
                TimerState::Counting {
                    deadline: Some(deadline),
                    ..
                } => channel::at(*deadline),
                _ => channel::never(),
            };

            let mut sel = Select::new();
            let start_op = sel.recv(&self.start_rx);
            let stop_op = sel.recv(&self.stop_rx);
            let fire_op = sel.recv(&countdown);
            let exit_op = sel.recv(self.exit.receiver());
            let deliver_op = match state {
                TimerState::PendingDelivery(_) => Some(sel.send(self.queue.sender())),
                _ => None,
            };

            let oper = sel.select();
            let index = oper.index();

            if index == start_op {
                match oper.recv(&self.start_rx) {
                    Ok(start) => state = state.start(timer, start),
                    Err(_) => {
                        debug!(timer, "Timer handle dropped");
                        return;
                    }
                }
            } else if index == stop_op {
                match oper.recv(&self.stop_rx) {
                    Ok(()) => state = state.stop(timer),
                    Err(_) => {
                        debug!(timer, "Timer handle dropped");
                        return;
                    }
                }
            } else if index == fire_op {
                let _ = oper.recv(&countdown);
                state = state.fire(timer);
            } else if index == exit_op {
                let _ = oper.recv(self.exit.receiver());
                debug!(timer, "Halting timer");
                return;
            } else {
                debug_assert_eq!(Some(index), deliver_op);
                let TimerState::PendingDelivery(event) =
                    std::mem::replace(&mut state, TimerState::Idle)
                else {
                    unreachable!("delivery is only selectable while an event is pending");
                };
                let event_type = event.event_type();
                match oper.send(self.queue.sender(), event) {
                    Ok(()) => debug!(timer, %event_type, "Timer event delivered"),
                    Err(_) => {
                        warn!(timer, %event_type, "Event manager gone, dropped timer event")
                    }
                }
            }
        }
    }
}

/// [`EventTimer`] backed by a dedicated OS thread.
///
/// `soft_reset`, `reset` and `stop` block until the timer thread has taken
/// the command, which is what makes "stop wins" hold for the caller: once
/// `stop` returns, the replaced event can no longer reach the queue. Commands
/// sent after the thread has exited are dropped. Dropping the timer ends the
/// thread.
pub struct ThreadedEventTimer {
    index: u64,
    threaded: Threaded,
    start_tx: Sender<TimerStart>,
    stop_tx: Sender<()>,
}

impl ThreadedEventTimer {
    /// Spawn an idle timer delivering into `queue`.
    pub fn new(queue: EventQueue, config: &EventConfig) -> Result<Self> {
        let index = NEXT_TIMER_INDEX.fetch_add(1, Ordering::Relaxed);
        let threaded = Threaded::new();
        let (start_tx, start_rx) = channel::bounded(0);
        let (stop_tx, stop_rx) = channel::bounded(0);

        let timer_loop = TimerLoop {
            index,
            start_rx,
            stop_rx,
            exit: threaded.exit_signal(),
            queue,
        };
        let name = format!("{}-{index}", config.timer_thread_name);
        config
            .thread_builder(name.clone())
            .spawn(move || timer_loop.run())
            .map_err(|source| EventError::Spawn { name, source })?;

        Ok(Self {
            index,
            threaded,
            start_tx,
            stop_tx,
        })
    }

    fn send_start(&self, hard: bool, duration: Duration, event: Event) {
        let start = TimerStart {
            hard,
            event,
            duration,
        };
        if self.start_tx.send(start).is_err() {
            debug!(timer = self.index, "Timer halted, dropping start request");
        }
    }
}

impl EventTimer for ThreadedEventTimer {
    fn soft_reset(&self, duration: Duration, event: Event) {
        self.send_start(false, duration, event);
    }

    fn reset(&self, duration: Duration, event: Event) {
        self.send_start(true, duration, event);
    }

    fn stop(&self) {
        if self.stop_tx.send(()).is_err() {
            debug!(timer = self.index, "Timer halted, dropping stop request");
        }
    }

    fn halt(&self) {
        self.threaded.halt();
    }
}

/// [`EventTimerFactory`] producing [`ThreadedEventTimer`]s.
#[derive(Clone, Debug)]
pub struct ThreadedTimerFactory {
    queue: EventQueue,
    config: EventConfig,
}

impl ThreadedTimerFactory {
    /// Factory for timers delivering into `manager` with default settings.
    pub fn new(manager: &dyn EventManager) -> Self {
        Self::from_parts(manager.queue(), EventConfig::default())
    }

    pub fn with_config(manager: &dyn EventManager, config: EventConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(manager.queue(), config))
    }

    pub(crate) fn from_parts(queue: EventQueue, config: EventConfig) -> Self {
        Self { queue, config }
    }
}

impl EventTimerFactory for ThreadedTimerFactory {
    fn create_timer(&self) -> Result<Box<dyn EventTimer>> {
        let timer = ThreadedEventTimer::new(self.queue.clone(), &self.config)?;
        Ok(Box::new(timer))
    }
}
