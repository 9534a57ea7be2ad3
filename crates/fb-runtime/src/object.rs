//! Object identity and capability traits.
//!
//! Every gameplay object carries a [`Header`] holding the state the runtime
//! needs to manage it: the class recorded by the injector, the identifier
//! assigned by a registry, and the liveness flag. Optional behavior is
//! exposed through capability traits that generic components query once,
//! when the object is handed to them.

use std::{any::Any, cell::Cell, fmt, rc::Rc};

use crate::{debug_draw::Painter, descriptor::ClassId};

/// Identifier assigned by a [`GameplayRegistry`](crate::GameplayRegistry).
///
/// Identifiers start at 1 and are never reused by the registry that
/// assigned them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(u64);

impl Uid {
    /// Create an identifier from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime bookkeeping embedded in every object.
#[derive(Default)]
pub struct Header {
    /// Class recorded by the injector; cleared on destroy.
    class: Cell<Option<ClassId>>,
    /// Identity owned by the registry that assigned it; cleared once the
    /// registry has removed the object.
    uid: Cell<Option<Uid>>,
    alive: Cell<bool>,
}

impl Header {
    /// Create an empty header.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            class: Cell::new(None),
            uid: Cell::new(None),
            alive: Cell::new(false),
        }
    }

    /// Identifier assigned by a registry, if any.
    #[must_use]
    pub fn uid(&self) -> Option<Uid> {
        self.uid.get()
    }

    /// Whether the object is registered and not yet unregistered.
    ///
    /// Turns false as soon as `unregister` is requested, even when the
    /// physical removal is deferred until the end of an update pass.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Class recorded by the injector that created the object.
    #[must_use]
    pub fn class(&self) -> Option<ClassId> {
        self.class.get()
    }

    pub(crate) fn set_class(&self, class: Option<ClassId>) {
        self.class.set(class);
    }

    pub(crate) fn set_uid(&self, uid: Option<Uid>) {
        self.uid.set(uid);
    }

    pub(crate) fn set_alive(&self, alive: bool) {
        self.alive.set(alive);
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("class", &self.class.get())
            .field("uid", &self.uid.get())
            .field("alive", &self.alive.get())
            .finish()
    }
}

/// A runtime-managed object.
///
/// Capabilities default to absent. Types opt in by returning themselves:
///
/// ```ignore
/// impl Object for Rocket {
///     fn header(&self) -> &Header {
///         &self.header
///     }
///
///     fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Object: Any {
    /// Runtime bookkeeping for this object.
    fn header(&self) -> &Header;

    /// Lifecycle hook run by [`Injector::destroy`](crate::Injector::destroy)
    /// before the object is unregistered anywhere.
    fn fini(&self) {}

    /// Per-frame update capability.
    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        None
    }

    /// Debug visualisation capability.
    fn debug_draw_capability(self: Rc<Self>) -> Option<Rc<dyn DebugDraw>> {
        None
    }
}

/// Shared, type-erased handle to an object.
pub type ObjectRef = Rc<dyn Object>;

/// Recover the concrete type behind an [`ObjectRef`].
#[must_use]
pub fn downcast<T: Object>(object: ObjectRef) -> Option<Rc<T>> {
    let any: Rc<dyn Any> = object;
    any.downcast::<T>().ok()
}

/// Objects advanced once per frame by a [`GameplayRegistry`](crate::GameplayRegistry).
///
/// The receiver is the shared handle so an object can hand itself to
/// [`Injector::destroy`](crate::Injector::destroy).
pub trait Update {
    /// Advance by `dt` seconds.
    fn update(self: Rc<Self>, dt: f32);
}

/// Objects drawn by a [`DebugDrawer`](crate::DebugDrawer).
pub trait DebugDraw {
    fn debug_draw(&self, painter: &mut dyn Painter);
}

/// Dependencies that want to observe object creation and destruction.
///
/// The injector calls these uniformly for every declared dependency that
/// was bound with [`Injector::add_registrar`](crate::Injector::add_registrar).
pub trait Registrar {
    fn register(&self, object: &ObjectRef);
    fn unregister(&self, object: &ObjectRef);
}
