//! Gameplay registry: identity, random access, and per-frame update.
//!
//! # Layout
//!
//! ```text
//! table:  Uid -> object                  (every tracked object)
//! dense:  [(Uid, updater), ...]          (update-capable objects only)
//! index:  Uid -> position in dense
//! ```
//!
//! Removal from `dense` is swap-to-end: the last element moves into the
//! vacated slot and its `index` entry is patched, so removal is O(1) and
//! order is not stable.
//!
//! # Mutation during update
//!
//! While [`GameplayRegistry::update`] runs, `register` and `unregister` only
//! touch the object header (identifier, liveness) and queue the structural
//! change. The queue is replayed in request order as soon as the pass ends,
//! so the position-indexed loop never observes the dense list changing.

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    rc::Rc,
};

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::{
    error::{RegistryError, RegistryResult},
    object::{Object, ObjectRef, Registrar, Uid, Update, downcast},
};

/// Structural change requested during an update pass.
enum Mutation {
    Add(Uid, ObjectRef),
    Remove(Uid),
}

#[derive(Default)]
struct RegistryState {
    /// Last identifier handed out; 0 means none yet.
    last_uid: u64,
    table: FxHashMap<Uid, ObjectRef>,
    dense: Vec<(Uid, Rc<dyn Update>)>,
    index: FxHashMap<Uid, usize>,
    pending: Vec<Mutation>,
}

impl RegistryState {
    fn next_uid(&mut self) -> Uid {
        self.last_uid += 1;
        Uid::from_raw(self.last_uid)
    }

    fn insert(&mut self, uid: Uid, object: &ObjectRef) {
        if let Some(updater) = Rc::clone(object).update_capability() {
            self.index.insert(uid, self.dense.len());
            self.dense.push((uid, updater));
        }
        self.table.insert(uid, Rc::clone(object));
    }

    /// Drop `uid` from every structure and release its identity.
    fn remove(&mut self, uid: Uid) -> Option<ObjectRef> {
        let object = self.table.remove(&uid)?;

        if let Some(slot) = self.index.remove(&uid) {
            self.dense.swap_remove(slot);
            if let Some(&(moved, _)) = self.dense.get(slot) {
                self.index.insert(moved, slot);
            }
        }
        object.header().set_uid(None);
        Some(object)
    }

    /// `object` is tracked under `uid` now, or will be once the pending
    /// queue is replayed. Objects are compared by identity, not by uid.
    fn tracks(&self, uid: Uid, object: &ObjectRef) -> bool {
        self.table
            .get(&uid)
            .is_some_and(|tracked| Rc::ptr_eq(tracked, object))
            || self.pending.iter().any(|mutation| {
                matches!(mutation, Mutation::Add(added, pending) if *added == uid && Rc::ptr_eq(pending, object))
            })
    }
}

/// Registry of live gameplay objects.
#[derive(Default)]
pub struct GameplayRegistry {
    state: RefCell<RegistryState>,
    updating: Cell<bool>,
}

impl GameplayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `object` an identifier and start tracking it.
    ///
    /// The identifier is assigned immediately. During an update pass the
    /// object only becomes visible to [`get`](Self::get) and the update list
    /// once the pass ends.
    pub fn register(&self, object: &ObjectRef) -> RegistryResult<Uid> {
        let header = object.header();
        if let Some(uid) = header.uid() {
            return Err(RegistryError::DoubleRegistration(uid));
        }

        let mut state = self.state.borrow_mut();
        let uid = state.next_uid();
        header.set_uid(Some(uid));
        header.set_alive(true);

        if self.updating.get() {
            trace!(%uid, "deferring registration");
            state.pending.push(Mutation::Add(uid, Rc::clone(object)));
        } else {
            state.insert(uid, object);
        }
        Ok(uid)
    }

    /// Stop tracking `object`.
    ///
    /// The object is marked dead immediately. During an update pass the
    /// removal itself is deferred until the pass ends. The identifier is
    /// cleared from the header once the removal completes, after which the
    /// object may be registered again under a fresh one.
    pub fn unregister(&self, object: &ObjectRef) -> RegistryResult<()> {
        let header = object.header();
        let uid = header.uid().ok_or(RegistryError::Unidentified)?;

        let mut state = self.state.borrow_mut();
        if !header.is_alive() || !state.tracks(uid, object) {
            return Err(RegistryError::NotFound(uid));
        }
        header.set_alive(false);

        if self.updating.get() {
            trace!(%uid, "deferring removal");
            state.pending.push(Mutation::Remove(uid));
        } else {
            state.remove(uid);
        }
        Ok(())
    }

    /// Look up a tracked object.
    #[must_use]
    pub fn get(&self, uid: Uid) -> Option<ObjectRef> {
        self.state.borrow().table.get(&uid).cloned()
    }

    /// Look up a tracked object of a known type.
    #[must_use]
    pub fn get_as<T: Object>(&self, uid: Uid) -> Option<Rc<T>> {
        downcast(self.get(uid)?)
    }

    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        self.state.borrow().table.contains_key(&uid)
    }

    /// Run one update pass over every update-capable object.
    ///
    /// Objects registered during the pass are first updated on the next
    /// pass; objects unregistered during the pass are still visited if they
    /// had not been reached yet, and can check
    /// [`Header::is_alive`](crate::Header::is_alive).
    pub fn update(&self, dt: f32) -> RegistryResult<()> {
        if self.updating.replace(true) {
            return Err(RegistryError::ReentrantUpdate);
        }

        let len = self.state.borrow().dense.len();
        for position in 0..len {
            let Some(updater) = self
                .state
                .borrow()
                .dense
                .get(position)
                .map(|(_, updater)| Rc::clone(updater))
            else {
                break;
            };
            updater.update(dt);
        }

        self.updating.set(false);
        self.apply_pending();
        Ok(())
    }

    fn apply_pending(&self) {
        let mut state = self.state.borrow_mut();
        for mutation in mem::take(&mut state.pending) {
            match mutation {
                Mutation::Add(uid, object) => state.insert(uid, &object),
                Mutation::Remove(uid) => {
                    if state.remove(uid).is_none() {
                        warn!(%uid, "deferred removal of untracked object");
                    }
                }
            }
        }
    }

    /// Whether an update pass is running.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.updating.get()
    }

    /// Number of tracked objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().table.is_empty()
    }

    /// Number of objects in the update list.
    #[must_use]
    pub fn update_len(&self) -> usize {
        self.state.borrow().dense.len()
    }

    /// Number of queued structural changes.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Identifiers in update-list order.
    #[must_use]
    pub fn update_order(&self) -> Vec<Uid> {
        self.state.borrow().dense.iter().map(|&(uid, _)| uid).collect()
    }

    /// Identifiers of every tracked object, in no particular order.
    #[must_use]
    pub fn uids(&self) -> Vec<Uid> {
        self.state.borrow().table.keys().copied().collect()
    }

    /// Check the dense list and index map agree with each other and with
    /// the table.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let state = self.state.borrow();
        state.dense.len() == state.index.len()
            && state.dense.iter().enumerate().all(|(position, (uid, _))| {
                state.index.get(uid) == Some(&position) && state.table.contains_key(uid)
            })
    }
}

impl Registrar for GameplayRegistry {
    fn register(&self, object: &ObjectRef) {
        if let Err(err) = GameplayRegistry::register(self, object) {
            warn!(error = %err, "registry rejected object");
        }
    }

    fn unregister(&self, object: &ObjectRef) {
        if let Err(err) = GameplayRegistry::unregister(self, object) {
            warn!(error = %err, "registry could not remove object");
        }
    }
}

impl fmt::Debug for GameplayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("GameplayRegistry")
            .field("tracked", &state.table.len())
            .field("updating", &self.updating.get())
            .field("dense", &state.dense.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}
