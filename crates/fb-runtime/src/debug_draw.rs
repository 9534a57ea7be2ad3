//! Debug drawing: a flat list of objects asked to visualise themselves once
//! per frame.
//!
//! Unlike [`GameplayRegistry`](crate::GameplayRegistry) there are no
//! identifiers and removal is a linear search. Mutations requested while a
//! draw pass is running are queued and applied after it.

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    rc::Rc,
};

use tracing::warn;

use crate::{
    error::{RegistryError, RegistryResult},
    object::{DebugDraw, ObjectRef, Registrar},
};

/// Drawing backend. Colors are `0xRRGGBB`.
pub trait Painter {
    fn draw_line(&mut self, from: [f32; 3], to: [f32; 3], color: u32, width: f32);
    fn draw_circle(&mut self, center: [f32; 3], radius: f32, color: u32, segments: u32);
    fn draw_rect(&mut self, min: [f32; 2], max: [f32; 2], depth: f32, color: u32, width: f32);
}

enum Change {
    Add(ObjectRef, Rc<dyn DebugDraw>),
    Remove(ObjectRef),
}

#[derive(Default)]
pub struct DebugDrawer {
    entries: RefCell<Vec<(ObjectRef, Rc<dyn DebugDraw>)>>,
    pending: RefCell<Vec<Change>>,
    drawing: Cell<bool>,
}

impl DebugDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `object` to the draw list.
    pub fn register(&self, object: &ObjectRef) -> RegistryResult<()> {
        let drawer = Rc::clone(object)
            .debug_draw_capability()
            .ok_or(RegistryError::MissingCapability("debug draw"))?;

        if self.drawing.get() {
            self.pending
                .borrow_mut()
                .push(Change::Add(Rc::clone(object), drawer));
        } else {
            self.entries.borrow_mut().push((Rc::clone(object), drawer));
        }
        Ok(())
    }

    /// Remove the first entry for `object`. Absent objects are ignored.
    pub fn unregister(&self, object: &ObjectRef) {
        if self.drawing.get() {
            self.pending
                .borrow_mut()
                .push(Change::Remove(Rc::clone(object)));
        } else {
            self.remove(object);
        }
    }

    fn remove(&self, object: &ObjectRef) {
        let mut entries = self.entries.borrow_mut();
        if let Some(position) = entries
            .iter()
            .position(|(entry, _)| Rc::ptr_eq(entry, object))
        {
            entries.remove(position);
        }
    }

    /// Ask every registered object to draw itself. Returns how many drew.
    pub fn draw(&self, painter: &mut dyn Painter) -> RegistryResult<usize> {
        if self.drawing.replace(true) {
            return Err(RegistryError::ReentrantUpdate);
        }

        let len = self.entries.borrow().len();
        let mut drawn = 0;
        for position in 0..len {
            let Some(drawer) = self
                .entries
                .borrow()
                .get(position)
                .map(|(_, drawer)| Rc::clone(drawer))
            else {
                break;
            };
            drawer.debug_draw(painter);
            drawn += 1;
        }

        self.drawing.set(false);
        let pending = mem::take(&mut *self.pending.borrow_mut());
        for change in pending {
            match change {
                Change::Add(object, drawer) => self.entries.borrow_mut().push((object, drawer)),
                Change::Remove(object) => self.remove(&object),
            }
        }
        Ok(drawn)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(entry, _)| Rc::ptr_eq(entry, object))
    }
}

impl Registrar for DebugDrawer {
    fn register(&self, object: &ObjectRef) {
        if let Err(err) = DebugDrawer::register(self, object) {
            warn!(error = %err, "debug drawer rejected object");
        }
    }

    fn unregister(&self, object: &ObjectRef) {
        DebugDrawer::unregister(self, object);
    }
}

impl fmt::Debug for DebugDrawer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugDrawer")
            .field("entries", &self.entries.borrow().len())
            .field("pending", &self.pending.borrow().len())
            .field("drawing", &self.drawing.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Header, Object};

    #[derive(Default)]
    struct Recorder {
        circles: Vec<u32>,
    }

    impl Painter for Recorder {
        fn draw_line(&mut self, _from: [f32; 3], _to: [f32; 3], _color: u32, _width: f32) {}

        fn draw_circle(&mut self, _center: [f32; 3], _radius: f32, color: u32, _segments: u32) {
            self.circles.push(color);
        }

        fn draw_rect(&mut self, _min: [f32; 2], _max: [f32; 2], _depth: f32, _color: u32, _width: f32) {
        }
    }

    struct Marker {
        header: Header,
        color: u32,
        /// Removed from the drawer the first time it draws.
        drawer: Option<Rc<DebugDrawer>>,
        this: RefCell<Option<ObjectRef>>,
    }

    impl Object for Marker {
        fn header(&self) -> &Header {
            &self.header
        }

        fn debug_draw_capability(self: Rc<Self>) -> Option<Rc<dyn DebugDraw>> {
            Some(self)
        }
    }

    impl DebugDraw for Marker {
        fn debug_draw(&self, painter: &mut dyn Painter) {
            painter.draw_circle([0.0; 3], 1.0, self.color, 16);
            if let (Some(drawer), Some(this)) = (&self.drawer, self.this.borrow_mut().take()) {
                drawer.unregister(&this);
            }
        }
    }

    struct Blank {
        header: Header,
    }

    impl Object for Blank {
        fn header(&self) -> &Header {
            &self.header
        }
    }

    fn marker(color: u32) -> ObjectRef {
        Rc::new(Marker {
            header: Header::new(),
            color,
            drawer: None,
            this: RefCell::new(None),
        })
    }

    #[test]
    fn test_draws_in_registration_order() {
        let drawer = DebugDrawer::new();
        drawer.register(&marker(0xff0000)).unwrap();
        drawer.register(&marker(0x00ff00)).unwrap();

        let mut painter = Recorder::default();
        assert_eq!(drawer.draw(&mut painter).unwrap(), 2);
        assert_eq!(painter.circles, [0xff0000, 0x00ff00]);
    }

    #[test]
    fn test_unregister_first_match_and_absent() {
        let drawer = DebugDrawer::new();
        let a = marker(1);
        let b = marker(2);
        drawer.register(&a).unwrap();
        drawer.register(&b).unwrap();
        drawer.register(&a).unwrap();

        drawer.unregister(&a);
        assert_eq!(drawer.len(), 2);
        assert!(drawer.contains(&a));

        let mut painter = Recorder::default();
        drawer.draw(&mut painter).unwrap();
        assert_eq!(painter.circles, [2, 1]);

        // Silently ignored
        drawer.unregister(&marker(3));
        assert_eq!(drawer.len(), 2);
    }

    #[test]
    fn test_missing_capability() {
        let drawer = DebugDrawer::new();
        let blank: ObjectRef = Rc::new(Blank {
            header: Header::new(),
        });

        assert_eq!(
            drawer.register(&blank),
            Err(RegistryError::MissingCapability("debug draw"))
        );
        assert!(drawer.is_empty());
    }

    #[test]
    fn test_removal_during_draw_is_deferred() {
        let drawer = Rc::new(DebugDrawer::new());
        let first = Rc::new(Marker {
            header: Header::new(),
            color: 1,
            drawer: Some(Rc::clone(&drawer)),
            this: RefCell::new(None),
        });
        let first_ref: ObjectRef = first.clone();
        *first.this.borrow_mut() = Some(Rc::clone(&first_ref));

        drawer.register(&first_ref).unwrap();
        drawer.register(&marker(2)).unwrap();

        let mut painter = Recorder::default();
        assert_eq!(drawer.draw(&mut painter).unwrap(), 2);
        assert_eq!(painter.circles, [1, 2]);
        assert_eq!(drawer.len(), 1);
        assert!(!drawer.contains(&first_ref));
    }
}
