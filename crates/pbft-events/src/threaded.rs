use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::warn;

/// Exit signal shared between a component handle and its background loop.
///
/// The signal is a channel nobody ever sends on: `halt` drops the only
/// sender, which disconnects the channel and makes every `recv` on an
/// [`ExitSignal`] ready at once. Closing happens exactly once; later calls
/// only log.
pub(crate) struct Threaded {
    exit_tx: Mutex<Option<Sender<()>>>,
    exit_rx: Receiver<()>,
}

/// Loop-side view of a [`Threaded`] exit signal.
#[derive(Clone)]
pub(crate) struct ExitSignal(Receiver<()>);

impl ExitSignal {
    /// Receiver to register as one arm of a select.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.0
    }

    pub(crate) fn is_halted(&self) -> bool {
        matches!(
            self.0.try_recv(),
            Err(channel::TryRecvError::Disconnected)
        )
    }
}

impl Threaded {
    pub(crate) fn new() -> Self {
        let (exit_tx, exit_rx) = channel::bounded(0);
        Self {
            exit_tx: Mutex::new(Some(exit_tx)),
            exit_rx,
        }
    }

    /// A handle the background loop selects on.
    pub(crate) fn exit_signal(&self) -> ExitSignal {
        ExitSignal(self.exit_rx.clone())
    }

    /// Tell the loop to exit at its next wait point.
    pub(crate) fn halt(&self) {
        match self.exit_tx.lock().take() {
            Some(exit_tx) => drop(exit_tx),
            None => warn!("Attempted to halt a threaded object twice"),
        }
    }
}
