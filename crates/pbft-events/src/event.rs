use std::fmt;

use pbft_types::{CheckpointDescriptor, ConsensusMessage};

/// Discriminant identifying the kind of an [`Event`].
///
/// The numeric values are stable and can be used as compact tags in logs
/// and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventType {
    /// Deferred work injected into the serialized stream.
    Work = 0,
    /// The view change timer expired.
    ViewChangeTimer = 1,
    /// An execution completed.
    ExecDone = 2,
    /// State transfer completed.
    StateUpdated = 3,
    /// State transfer was initiated.
    StateUpdating = 4,
    /// A consensus message was received.
    Message = 5,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        Self::Work,
        Self::ViewChangeTimer,
        Self::ExecDone,
        Self::StateUpdated,
        Self::StateUpdating,
        Self::Message,
    ];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EventType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_u8() == value)
            .ok_or(value)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Work => "Work",
            Self::ViewChangeTimer => "ViewChangeTimer",
            Self::ExecDone => "ExecDone",
            Self::StateUpdated => "StateUpdated",
            Self::StateUpdating => "StateUpdating",
            Self::Message => "Message",
        };
        write!(f, "{s}")
    }
}

/// A deferred callable carried by [`Event::Work`].
///
/// The core never runs it; a receiver that wants to execute injected work
/// calls [`WorkItem::run`] from inside `process_event`, which puts the work
/// on the serialized event thread.
pub struct WorkItem(Box<dyn FnOnce() + Send + 'static>);

impl WorkItem {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Consume the item and run the wrapped closure.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WorkItem(..)")
    }
}

/// A single unit of work flowing to the [`EventReceiver`].
///
/// The variant set is closed: producers pick one of these, and the receiver
/// dispatches on it exhaustively.
#[derive(Debug)]
pub enum Event {
    Work(WorkItem),
    ViewChangeTimer,
    ExecDone,
    StateUpdated(CheckpointDescriptor),
    StateUpdating(CheckpointDescriptor),
    Message(ConsensusMessage),
}

impl Event {
    /// Build a work event from a closure.
    pub fn work(f: impl FnOnce() + Send + 'static) -> Self {
        Self::Work(WorkItem::new(f))
    }

    /// The discriminant of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Work(_) => EventType::Work,
            Self::ViewChangeTimer => EventType::ViewChangeTimer,
            Self::ExecDone => EventType::ExecDone,
            Self::StateUpdated(_) => EventType::StateUpdated,
            Self::StateUpdating(_) => EventType::StateUpdating,
            Self::Message(_) => EventType::Message,
        }
    }
}

impl From<WorkItem> for Event {
    fn from(item: WorkItem) -> Self {
        Self::Work(item)
    }
}

impl From<ConsensusMessage> for Event {
    fn from(msg: ConsensusMessage) -> Self {
        Self::Message(msg)
    }
}

/// Consumer of events, invoked serially by the event manager.
///
/// `process_event` runs on the manager thread and is never called
/// concurrently with itself. Returning `Some(next)` makes `next` the very next
/// event processed, ahead of anything waiting in the queue. Blocking here
/// stalls all progress.
pub trait EventReceiver: Send + 'static {
    fn process_event(&mut self, event: Event) -> Option<Event>;
}

impl<F> EventReceiver for F
where
    F: FnMut(Event) -> Option<Event> + Send + 'static,
{
    fn process_event(&mut self, event: Event) -> Option<Event> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use pbft_types::{ReplicaId, StateDigest};

    fn checkpoint() -> CheckpointDescriptor {
        CheckpointDescriptor::new(10, StateDigest::from_bytes(b"state"))
    }

    #[test]
    fn event_type_matches_variant() {
        let cases = [
            (Event::work(|| {}), EventType::Work),
            (Event::ViewChangeTimer, EventType::ViewChangeTimer),
            (Event::ExecDone, EventType::ExecDone),
            (Event::StateUpdated(checkpoint()), EventType::StateUpdated),
            (Event::StateUpdating(checkpoint()), EventType::StateUpdating),
            (
                Event::Message(ConsensusMessage::new(ReplicaId::new(0), b"m".to_vec())),
                EventType::Message,
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(event.event_type(), expected);
        }
    }

    #[test]
    fn discriminants_are_stable() {
        let values: Vec<u8> = EventType::ALL.iter().map(|t| t.as_u8()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn try_from_u8() {
        for t in EventType::ALL {
            assert_eq!(EventType::try_from(t.as_u8()), Ok(t));
        }
        assert_eq!(EventType::try_from(6), Err(6));
    }

    #[test]
    fn event_type_display() {
        assert_eq!(format!("{}", EventType::ViewChangeTimer), "ViewChangeTimer");
        assert_eq!(format!("{}", EventType::Message), "Message");
    }

    #[test]
    fn work_item_runs_once() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let event = Event::work(move || flag.store(true, Ordering::SeqCst));
        match event {
            Event::Work(item) => item.run(),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn work_item_debug_hides_closure() {
        assert_eq!(format!("{:?}", Event::work(|| {})), "Work(WorkItem(..))");
    }

    #[test]
    fn closure_is_a_receiver() {
        let mut receiver = |event: Event| match event {
            Event::ExecDone => Some(Event::ViewChangeTimer),
            _ => None,
        };
        let next = receiver.process_event(Event::ExecDone);
        assert!(matches!(next, Some(Event::ViewChangeTimer)));
        assert!(receiver.process_event(Event::ViewChangeTimer).is_none());
    }
}
