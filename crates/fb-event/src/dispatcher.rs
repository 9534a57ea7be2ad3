//! Event dispatcher keyed by event type.

use std::{
    any::{Any, TypeId, type_name},
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::event::Event;

/// Handle returned by [`EventDispatcher::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Type-erased listener function.
type ListenerFn = Rc<dyn Fn(&dyn Any)>;

struct Subscribers {
    /// Event type name for diagnostics.
    event_name: &'static str,
    entries: Vec<(ListenerId, ListenerFn)>,
}

/// Routes events to the listeners registered for their type.
///
/// Listeners may add or remove listeners (including themselves) while an
/// event is being dispatched; such changes apply from the next dispatch.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RefCell<FxHashMap<TypeId, Subscribers>>,
    next_id: Cell<u32>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of type `E`.
    pub fn add_listener<E: Event>(&self, listener: impl Fn(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let callback: ListenerFn = Rc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                listener(event);
            }
        });

        self.subscribers
            .borrow_mut()
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Subscribers {
                event_name: type_name::<E>(),
                entries: Vec::new(),
            })
            .entries
            .push((id, callback));
        id
    }

    /// Remove a listener previously registered for `E`.
    ///
    /// Returns false, with a warning, if no such listener exists.
    pub fn remove_listener<E: Event>(&self, id: ListenerId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some(list) = subscribers.get_mut(&TypeId::of::<E>()) else {
            warn!(event = type_name::<E>(), "remove_listener: no listeners for event type");
            return false;
        };

        match list.entries.iter().position(|(entry, _)| *entry == id) {
            Some(position) => {
                list.entries.remove(position);
                true
            }
            None => {
                warn!(
                    event = list.event_name,
                    listener = id.raw(),
                    "remove_listener: no such listener registered"
                );
                false
            }
        }
    }

    /// Deliver `event` to every listener of its type, in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch<E: Event>(&self, event: &E) -> usize {
        let callbacks: Vec<ListenerFn> = match self.subscribers.borrow().get(&TypeId::of::<E>()) {
            Some(list) => list
                .entries
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect(),
            None => return 0,
        };

        for callback in &callbacks {
            callback(event as &dyn Any);
        }
        callbacks.len()
    }

    /// Number of listeners registered for `E`.
    #[must_use]
    pub fn listener_count<E: Event>(&self) -> usize {
        self.subscribers
            .borrow()
            .get(&TypeId::of::<E>())
            .map_or(0, |list| list.entries.len())
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.borrow();
        let mut map = f.debug_map();
        for list in subscribers.values() {
            map.entry(&list.event_name, &list.entries.len());
        }
        map.finish()
    }
}
