use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::config::EventConfig;
use crate::error::{EventError, Result};
use crate::event::{Event, EventReceiver};
use crate::threaded::{ExitSignal, Threaded};
use crate::timer::ThreadedTimerFactory;

/// Submit-only handle to an event manager's queue.
///
/// The queue is a rendezvous channel: `send` returns once the manager loop
/// has taken the event, which happens only between two fully processed
/// events (including their chained follow-ups).
#[derive(Clone, Debug)]
pub struct EventQueue {
    tx: Sender<Event>,
}

impl EventQueue {
    /// Submit an event, blocking until the manager loop accepts it.
    ///
    /// Blocks while the manager has not been started. Fails once the manager
    /// loop has exited, dropping the event.
    pub fn send(&self, event: Event) -> Result<()> {
        let event_type = event.event_type();
        self.tx
            .send(event)
            .map_err(|_| EventError::QueueClosed { event_type })
    }

    /// Inject a closure into the serialized stream as a work event.
    pub fn send_work(&self, f: impl FnOnce() + Send + 'static) -> Result<()> {
        self.send(Event::work(f))
    }

    pub(crate) fn sender(&self) -> &Sender<Event> {
        &self.tx
    }
}

/// Serialized dispatcher delivering events to a single [`EventReceiver`].
pub trait EventManager: Send + Sync {
    /// Handle for submitting events.
    fn queue(&self) -> EventQueue;
    /// Spawn the dispatch loop. Only the first call succeeds.
    fn start(&self) -> Result<()>;
    /// Tell the dispatch loop to exit at its next wait point.
    fn halt(&self);
}

/// State moved onto the manager thread by [`EventManager::start`].
struct EventLoop {
    receiver: Box<dyn EventReceiver>,
    events: Receiver<Event>,
    exit: ExitSignal,
}

impl EventLoop {
    fn run(self) {
        let EventLoop {
            mut receiver,
            events,
            exit,
        } = self;
        info!("event loop started");
        loop {
            if exit.is_halted() {
                break;
            }
            let running = channel::select! {
                recv(events) -> next => match next {
                    Ok(event) => {
                        dispatch(&mut *receiver, event);
                        true
                    }
                    Err(_) => {
                        debug!("event queue disconnected");
                        false
                    }
                },
                recv(exit.receiver()) -> _ => false,
            };
            if !running {
                break;
            }
        }
        debug!("event loop told to exit");
    }
}

/// Process `event` and every follow-up it produces before returning to the
/// queue.
fn dispatch(receiver: &mut dyn EventReceiver, event: Event) {
    let mut next = Some(event);
    let mut depth = 0usize;
    while let Some(event) = next {
        trace!(event_type = %event.event_type(), depth, "processing event");
        next = receiver.process_event(event);
        depth += 1;
    }
    if depth > 1 {
        trace!(chained = depth - 1, "drained follow-up events");
    }
}

/// [`EventManager`] running its dispatch loop on a dedicated OS thread.
///
/// The receiver is owned by the loop thread once started, so
/// `process_event` can never run concurrently with itself. Dropping the
/// manager halts the loop.
pub struct ThreadedEventManager {
    threaded: Threaded,
    queue: EventQueue,
    pending: Mutex<Option<EventLoop>>,
    config: EventConfig,
}

impl ThreadedEventManager {
    /// Create a manager for `receiver` with the default configuration.
    pub fn new(receiver: impl EventReceiver) -> Self {
        Self::build(Box::new(receiver), EventConfig::default())
    }

    /// Create a manager for `receiver` with a validated configuration.
    pub fn with_config(receiver: impl EventReceiver, config: EventConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(Box::new(receiver), config))
    }

    fn build(receiver: Box<dyn EventReceiver>, config: EventConfig) -> Self {
        let threaded = Threaded::new();
        let (tx, events) = channel::bounded(0);
        let event_loop = EventLoop {
            receiver,
            events,
            exit: threaded.exit_signal(),
        };
        Self {
            threaded,
            queue: EventQueue { tx },
            pending: Mutex::new(Some(event_loop)),
            config,
        }
    }

    /// Factory for timers delivering into this manager, sharing its config.
    pub fn timer_factory(&self) -> ThreadedTimerFactory {
        ThreadedTimerFactory::from_parts(self.queue(), self.config.clone())
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }
}

impl EventManager for ThreadedEventManager {
    fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    fn start(&self) -> Result<()> {
        let event_loop = self.pending.lock().take().ok_or(EventError::AlreadyStarted)?;
        let name = self.config.manager_thread_name.clone();
        self.config
            .thread_builder(name.clone())
            .spawn(move || event_loop.run())
            .map_err(|source| EventError::Spawn { name, source })?;
        Ok(())
    }

    fn halt(&self) {
        self.threaded.halt();
    }
}
