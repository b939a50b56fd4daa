//! Event bus for cross-cutting notifications
//!
//! Decouples producers and consumers of engine-wide notifications (window
//! resize, scene load/save/create, object removal, play-mode transitions,
//! quit). Supports immediate delivery (`notify`) and deferred delivery
//! (`queue_event` + `process_events`, drained once per frame boundary).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::object::ObjectKey;
use crate::scene::PlayMode;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The OS window changed size
    WindowResized,
    /// The editor's scene viewport changed size
    SceneViewResized,
    /// Replace the current scene with an empty one
    SceneCreate,
    /// Load a scene from disk
    SceneLoad,
    /// Save the current scene to disk
    SceneSave,
    /// A game object requested destruction
    ObjectRemoved,
    /// Edit/play mode transition
    PlayModeChanged,
    /// Shut the engine down
    Quit,
}

/// Event payload, tagged by [`EventType`]
#[derive(Debug, Clone)]
pub enum Event {
    /// The OS window changed size
    WindowResized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// The editor's scene viewport changed size
    SceneViewResized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// Replace the current scene with an empty one
    SceneCreate,
    /// Load a scene from the given path
    SceneLoad {
        /// Scene file path
        path: String,
    },
    /// Save the current scene to the given path
    SceneSave {
        /// Scene file path
        path: String,
    },
    /// A game object requested destruction; removal is applied at the frame
    /// boundary when this event is drained
    ObjectRemoved {
        /// The object to remove
        object: ObjectKey,
    },
    /// Edit/play mode transition
    PlayModeChanged {
        /// The mode being entered
        mode: PlayMode,
    },
    /// Shut the engine down
    Quit,
}

impl Event {
    /// The type tag of this event
    pub fn event_type(&self) -> EventType {
        match self {
            Self::WindowResized { .. } => EventType::WindowResized,
            Self::SceneViewResized { .. } => EventType::SceneViewResized,
            Self::SceneCreate => EventType::SceneCreate,
            Self::SceneLoad { .. } => EventType::SceneLoad,
            Self::SceneSave { .. } => EventType::SceneSave,
            Self::ObjectRemoved { .. } => EventType::ObjectRemoved,
            Self::PlayModeChanged { .. } => EventType::PlayModeChanged,
            Self::Quit => EventType::Quit,
        }
    }
}

/// Identity of a registered listener
///
/// A listener may be registered for several event types under the same id;
/// registering the same id twice for one type is rejected.
pub type ListenerId = u64;

/// Receiver side of the event bus
pub trait EventListener {
    /// Handle a delivered event
    ///
    /// `events` is the bus queue; handlers may enqueue follow-up events at
    /// any time, including while a drain is in progress.
    fn on_event(&mut self, event: &Event, events: &mut EventQueue);
}

/// FIFO of events awaiting deferred delivery
#[derive(Debug, Default)]
pub struct EventQueue {
    queue: VecDeque<Event>,
}

impl EventQueue {
    /// Append an event for deferred delivery
    pub fn queue_event(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop(&mut self) -> Option<Event> {
        self.queue.pop_front()
    }
}

/// Event bus errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventBusError {
    /// The listener id is already registered for the event type
    #[error("listener {id} is already registered for {event_type:?}")]
    DuplicateListener {
        /// Offending listener id
        id: ListenerId,
        /// Event type the id was already registered for
        event_type: EventType,
    },
}

struct ListenerSlot {
    id: ListenerId,
    listener: Weak<RefCell<dyn EventListener>>,
}

/// Type-keyed listener registry with immediate and queued delivery
///
/// Listeners are held weakly; a slot whose listener has been dropped is
/// skipped during fan-out and pruned together with explicit removals.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventType, Vec<ListenerSlot>>,
    queue: EventQueue,
    next_id: ListenerId,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh listener id
    pub fn allocate_listener_id(&mut self) -> ListenerId {
        self.next_id += 1;
        self.next_id
    }

    /// Register `listener` under `id` for a single event type
    ///
    /// Fails with [`EventBusError::DuplicateListener`] if the id is already
    /// registered for that type; the caller may log and continue.
    pub fn add_listener(
        &mut self,
        event_type: EventType,
        id: ListenerId,
        listener: Weak<RefCell<dyn EventListener>>,
    ) -> Result<(), EventBusError> {
        let slots = self.listeners.entry(event_type).or_default();
        if slots.iter().any(|slot| slot.id == id) {
            return Err(EventBusError::DuplicateListener { id, event_type });
        }
        slots.push(ListenerSlot { id, listener });
        Ok(())
    }

    /// Register a listener for several event types, allocating its id
    pub fn subscribe(
        &mut self,
        event_types: &[EventType],
        listener: &Rc<RefCell<dyn EventListener>>,
    ) -> Result<ListenerId, EventBusError> {
        let id = self.allocate_listener_id();
        for &event_type in event_types {
            self.add_listener(event_type, id, Rc::downgrade(listener))?;
        }
        Ok(id)
    }

    /// Remove a listener from every event type it was registered for
    ///
    /// A no-op for unknown ids; safe to call repeatedly.
    pub fn remove_listener(&mut self, id: ListenerId) {
        for slots in self.listeners.values_mut() {
            slots.retain(|slot| slot.id != id);
        }
    }

    /// Deliver an event synchronously to every current listener for its type
    ///
    /// Fan-out is in listener-registration order; expired slots are skipped.
    pub fn notify(&mut self, event: &Event) {
        let slots: Vec<Weak<RefCell<dyn EventListener>>> = match self
            .listeners
            .get(&event.event_type())
        {
            Some(slots) => slots.iter().map(|slot| slot.listener.clone()).collect(),
            None => return,
        };
        for weak in slots {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            listener.borrow_mut().on_event(event, &mut self.queue);
        }
    }

    /// Append an event to the deferred FIFO without delivering it
    pub fn queue_event(&mut self, event: Event) {
        self.queue.queue_event(event);
    }

    /// Direct access to the deferred queue
    pub fn queue_mut(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    /// Number of events awaiting deferred delivery
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Drain the deferred FIFO to empty, delivering in arrival order
    ///
    /// Emptiness is re-checked after every delivery, so events queued by a
    /// handler during the drain are delivered within the same call.
    pub fn process_events(&mut self) {
        while let Some(event) = self.queue.pop() {
            self.notify(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingListener {
        received: Vec<EventType>,
        /// Event queued from inside the handler on the first delivery
        chain: Option<Event>,
    }

    impl RecordingListener {
        fn new() -> Self {
            Self {
                received: Vec::new(),
                chain: None,
            }
        }

        fn shared(self) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(self))
        }
    }

    impl EventListener for RecordingListener {
        fn on_event(&mut self, event: &Event, events: &mut EventQueue) {
            self.received.push(event.event_type());
            if let Some(chained) = self.chain.take() {
                events.queue_event(chained);
            }
        }
    }

    fn as_dyn(listener: &Rc<RefCell<RecordingListener>>) -> Rc<RefCell<dyn EventListener>> {
        listener.clone()
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut bus = EventBus::new();
        let listener = RecordingListener::new().shared();
        let id = bus.allocate_listener_id();

        assert!(bus
            .add_listener(EventType::Quit, id, Rc::downgrade(&as_dyn(&listener)))
            .is_ok());
        assert_eq!(
            bus.add_listener(EventType::Quit, id, Rc::downgrade(&as_dyn(&listener))),
            Err(EventBusError::DuplicateListener {
                id,
                event_type: EventType::Quit
            })
        );

        // The listener still appears exactly once in the fan-out
        bus.notify(&Event::Quit);
        assert_eq!(listener.borrow().received, vec![EventType::Quit]);
    }

    #[test]
    fn test_remove_listener_is_idempotent() {
        let mut bus = EventBus::new();
        let listener = RecordingListener::new().shared();
        let id = bus
            .subscribe(&[EventType::Quit, EventType::SceneCreate], &as_dyn(&listener))
            .unwrap();

        bus.remove_listener(id);
        bus.remove_listener(id);

        bus.notify(&Event::Quit);
        bus.notify(&Event::SceneCreate);
        assert!(listener.borrow().received.is_empty());
    }

    #[test]
    fn test_queued_events_drain_in_fifo_order() {
        let mut bus = EventBus::new();
        let listener = RecordingListener::new().shared();
        bus.subscribe(&[EventType::Quit, EventType::SceneCreate], &as_dyn(&listener))
            .unwrap();

        bus.queue_event(Event::SceneCreate);
        bus.queue_event(Event::Quit);
        assert_eq!(listener.borrow().received.len(), 0);

        bus.process_events();
        assert_eq!(
            listener.borrow().received,
            vec![EventType::SceneCreate, EventType::Quit]
        );
        assert_eq!(bus.pending_events(), 0);
    }

    #[test]
    fn test_events_queued_during_drain_are_delivered() {
        let mut bus = EventBus::new();
        let mut inner = RecordingListener::new();
        inner.chain = Some(Event::Quit);
        let listener = inner.shared();
        bus.subscribe(&[EventType::SceneCreate, EventType::Quit], &as_dyn(&listener))
            .unwrap();

        bus.queue_event(Event::SceneCreate);
        bus.process_events();

        assert_eq!(
            listener.borrow().received,
            vec![EventType::SceneCreate, EventType::Quit]
        );
        assert_eq!(bus.pending_events(), 0);
    }

    #[test]
    fn test_expired_listener_slot_is_skipped() {
        let mut bus = EventBus::new();
        let listener = RecordingListener::new().shared();
        bus.subscribe(&[EventType::Quit], &as_dyn(&listener)).unwrap();

        let survivor = RecordingListener::new().shared();
        bus.subscribe(&[EventType::Quit], &as_dyn(&survivor)).unwrap();

        drop(listener);
        bus.notify(&Event::Quit);
        assert_eq!(survivor.borrow().received, vec![EventType::Quit]);
    }
}
