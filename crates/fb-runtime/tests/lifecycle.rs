//! Integration tests for the injector and registries working together.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fb_runtime::prelude::*;
use fb_runtime::{InjectError, Registrar};

// ============================================================================
// Test Objects
// ============================================================================

/// Records lifecycle events from objects and a registrar in one sequence.
#[derive(Default)]
struct Log {
    lines: RefCell<Vec<String>>,
}

impl Log {
    fn push(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.lines.borrow_mut())
    }
}

/// Registrar that only writes to the log.
struct Auditor {
    log: Rc<Log>,
}

impl Registrar for Auditor {
    fn register(&self, object: &ObjectRef) {
        let alive = object.header().is_alive();
        self.log.push(format!("audit register alive={alive}"));
    }

    fn unregister(&self, object: &ObjectRef) {
        let alive = object.header().is_alive();
        self.log.push(format!("audit unregister alive={alive}"));
    }
}

/// Counts down and destroys itself when the fuse runs out.
struct Bomb {
    header: Header,
    injector: Rc<Injector>,
    registry: Rc<GameplayRegistry>,
    log: Rc<Log>,
    fuse: Cell<u32>,
    updates: Cell<u32>,
}

impl Object for Bomb {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fini(&self) {
        self.log.push(format!(
            "fini tracked={}",
            self.registry.contains(self.header.uid().unwrap())
        ));
    }

    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        Some(self)
    }

    fn debug_draw_capability(self: Rc<Self>) -> Option<Rc<dyn DebugDraw>> {
        Some(self)
    }
}

impl Injectable for Bomb {
    const DEPENDENCIES: &'static [&'static str] =
        &["GameplayRegistry", "DebugDrawer", "Auditor", INJECTOR, "Log"];
    type Args = u32;

    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
        Ok(Self {
            header: Header::new(),
            injector: wiring.get(INJECTOR)?,
            registry: wiring.get("GameplayRegistry")?,
            log: wiring.get("Log")?,
            fuse: Cell::new(0),
            updates: Cell::new(0),
        })
    }

    fn init(&self, fuse: u32) {
        self.log.push(format!("init uid={:?}", self.header.uid().map(Uid::get)));
        self.fuse.set(fuse);
    }
}

impl Update for Bomb {
    fn update(self: Rc<Self>, _dt: f32) {
        self.updates.set(self.updates.get() + 1);
        let fuse = self.fuse.get().saturating_sub(1);
        self.fuse.set(fuse);
        if fuse == 0 && self.header.is_alive() {
            self.injector.destroy(self.clone()).unwrap();
        }
    }
}

impl DebugDraw for Bomb {
    fn debug_draw(&self, painter: &mut dyn Painter) {
        painter.draw_circle([0.0; 3], self.fuse.get() as f32, 0xff0000, 8);
    }
}

/// Creates a bomb every update while it has stock left.
struct Factory {
    header: Header,
    injector: Rc<Injector>,
    stock: Cell<u32>,
    made: RefCell<Vec<Rc<Bomb>>>,
    uids: RefCell<Vec<Uid>>,
}

impl Object for Factory {
    fn header(&self) -> &Header {
        &self.header
    }

    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        Some(self)
    }
}

impl Injectable for Factory {
    const DEPENDENCIES: &'static [&'static str] = &["GameplayRegistry", INJECTOR];
    type Args = u32;

    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
        Ok(Self {
            header: Header::new(),
            injector: wiring.get(INJECTOR)?,
            stock: Cell::new(0),
            made: RefCell::new(Vec::new()),
            uids: RefCell::new(Vec::new()),
        })
    }

    fn init(&self, stock: u32) {
        self.stock.set(stock);
    }
}

impl Update for Factory {
    fn update(self: Rc<Self>, _dt: f32) {
        if self.stock.get() > 0 {
            self.stock.set(self.stock.get() - 1);
            let bomb = self.injector.create::<Bomb>(2).unwrap();
            self.uids.borrow_mut().extend(bomb.header().uid());
            self.made.borrow_mut().push(bomb);
        }
    }
}

#[derive(Default)]
struct CountingPainter {
    circles: usize,
}

impl Painter for CountingPainter {
    fn draw_line(&mut self, _from: [f32; 3], _to: [f32; 3], _color: u32, _width: f32) {}

    fn draw_circle(&mut self, _center: [f32; 3], _radius: f32, _color: u32, _segments: u32) {
        self.circles += 1;
    }

    fn draw_rect(&mut self, _min: [f32; 2], _max: [f32; 2], _depth: f32, _color: u32, _width: f32) {}
}

struct World {
    injector: Rc<Injector>,
    registry: Rc<GameplayRegistry>,
    drawer: Rc<DebugDrawer>,
    log: Rc<Log>,
}

fn world() -> World {
    let injector = Injector::new();
    let registry = Rc::new(GameplayRegistry::new());
    let drawer = Rc::new(DebugDrawer::new());
    let log = Rc::new(Log::default());

    injector
        .add_registrar("GameplayRegistry", Rc::clone(&registry))
        .unwrap();
    injector.add_registrar("DebugDrawer", Rc::clone(&drawer)).unwrap();
    injector
        .add_registrar(
            "Auditor",
            Rc::new(Auditor {
                log: Rc::clone(&log),
            }),
        )
        .unwrap();
    injector.add_dependency("Log", Rc::clone(&log)).unwrap();

    World {
        injector,
        registry,
        drawer,
        log,
    }
}

// ============================================================================
// Creation and Destruction
// ============================================================================

#[test]
fn test_create_registers_everywhere_before_init() {
    let w = world();
    let bomb = w.injector.create::<Bomb>(3).unwrap();

    let uid = bomb.header().uid().unwrap();
    assert_eq!(w.log.take(), ["audit register alive=true", "init uid=Some(1)"]);
    assert!(w.registry.contains(uid));
    assert_eq!(w.drawer.len(), 1);
    assert!(Rc::ptr_eq(&bomb.registry, &w.registry));
    assert!(Rc::ptr_eq(&bomb.injector, &w.injector));
    assert_eq!(bomb.fuse.get(), 3);
}

#[test]
fn test_destroy_fini_before_any_unregister() {
    let w = world();
    let bomb = w.injector.create::<Bomb>(3).unwrap();
    let uid = bomb.header().uid().unwrap();
    w.log.take();

    w.injector.destroy(bomb.clone()).unwrap();
    assert_eq!(bomb.header().uid(), None);

    // fini saw itself still tracked; the auditor saw it already dead
    assert_eq!(w.log.take(), ["fini tracked=true", "audit unregister alive=false"]);
    assert!(w.registry.get(uid).is_none());
    assert!(w.drawer.is_empty());
    assert!(w.registry.is_consistent());
}

#[test]
fn test_destroy_twice_reports_invalid_handle() {
    let w = world();
    let bomb = w.injector.create::<Bomb>(3).unwrap();

    w.injector.destroy(bomb.clone()).unwrap();
    assert_eq!(w.injector.destroy(bomb), Err(InjectError::InvalidHandle));
}

#[test]
fn test_destroy_through_registry_handle() {
    let w = world();
    let bomb = w.injector.create::<Bomb>(3).unwrap();
    let uid = bomb.header().uid().unwrap();
    w.log.take();

    // Type-erased handle, as gameplay code gets it from a lookup
    let object = w.registry.get(uid).unwrap();
    assert_eq!(w.injector.destroy(object), Ok(()));

    assert_eq!(w.log.take(), ["fini tracked=true", "audit unregister alive=false"]);
    assert!(w.registry.is_empty());
    assert!(w.drawer.is_empty());
}

// ============================================================================
// Frame Loop
// ============================================================================

#[test]
fn test_self_destroy_during_update() {
    let w = world();
    let bombs: Vec<_> = (1..=3)
        .map(|fuse| w.injector.create::<Bomb>(fuse).unwrap())
        .collect();

    w.registry.update(0.1).unwrap();
    assert_eq!(w.registry.len(), 2);
    assert!(!bombs[0].header().is_alive());
    assert!(w.registry.is_consistent());

    w.registry.update(0.1).unwrap();
    w.registry.update(0.1).unwrap();
    assert!(w.registry.is_empty());
    assert!(w.drawer.is_empty());

    // Each bomb was updated exactly as many times as its fuse
    let updates: Vec<_> = bombs.iter().map(|bomb| bomb.updates.get()).collect();
    assert_eq!(updates, [1, 2, 3]);
}

#[test]
fn test_spawning_during_update() {
    let w = world();
    let factory = w.injector.create::<Factory>(3).unwrap();

    let mut painter = CountingPainter::default();
    let mut sizes = Vec::new();
    for _ in 0..6 {
        w.registry.update(0.1).unwrap();
        w.drawer.draw(&mut painter).unwrap();
        sizes.push(w.registry.len());
        assert!(w.registry.is_consistent());
    }

    // factory + bombs spawned one per frame, each living two updates
    assert_eq!(sizes, [2, 3, 3, 2, 1, 1]);
    assert_eq!(painter.circles, 1 + 2 + 2 + 1);

    let made = factory.made.borrow();
    assert_eq!(made.len(), 3);
    assert!(made.iter().all(|bomb| bomb.updates.get() == 2));

    let uids = factory.uids.borrow();
    assert_eq!(uids.len(), 3);
    assert!(uids.windows(2).all(|pair| pair[0] < pair[1]));

    // Identity is released once removal completes
    assert!(made.iter().all(|bomb| bomb.header().uid().is_none()));
}
