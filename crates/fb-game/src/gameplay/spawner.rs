use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use fb_runtime::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

use super::{
    names::GAMEPLAY_REGISTRY,
    nazi::{Nazi, NaziArgs},
};
use crate::math::Vec2;

const SPAWN_X: f32 = -100.0;
const SPAWN_SPREAD: f32 = 100.0;

#[derive(Debug, Clone, Copy)]
pub struct SpawnerArgs {
    pub max_enemies: usize,
    pub seed: Option<u64>,
}

/// Keeps the arena topped up with enemies, one per update.
pub struct Spawner {
    header: Header,
    injector: Weak<Injector>,
    rng: RefCell<StdRng>,
    max_enemies: Cell<usize>,
    alive: Cell<usize>,
    spawned: Cell<u64>,
    killed: Cell<u64>,
}

impl Spawner {
    /// Called by an enemy as it is destroyed.
    pub fn nazi_killed(&self) {
        self.alive.set(self.alive.get().saturating_sub(1));
        self.killed.set(self.killed.get() + 1);
    }

    /// Enemies currently alive.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.alive.get()
    }

    #[must_use]
    pub fn spawned(&self) -> u64 {
        self.spawned.get()
    }

    #[must_use]
    pub fn killed(&self) -> u64 {
        self.killed.get()
    }
}

impl Object for Spawner {
    fn header(&self) -> &Header {
        &self.header
    }

    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        Some(self)
    }
}

impl Injectable for Spawner {
    const DEPENDENCIES: &'static [&'static str] = &[GAMEPLAY_REGISTRY, INJECTOR];
    type Args = SpawnerArgs;

    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
        Ok(Self {
            header: Header::new(),
            injector: Rc::downgrade(&wiring.get::<Injector>(INJECTOR)?),
            rng: RefCell::new(StdRng::seed_from_u64(0)),
            max_enemies: Cell::new(0),
            alive: Cell::new(0),
            spawned: Cell::new(0),
            killed: Cell::new(0),
        })
    }

    fn init(&self, args: SpawnerArgs) {
        self.max_enemies.set(args.max_enemies);
        *self.rng.borrow_mut() = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
    }
}

impl Update for Spawner {
    fn update(self: Rc<Self>, _dt: f32) {
        if self.alive.get() >= self.max_enemies.get() {
            return;
        }
        let Some(injector) = self.injector.upgrade() else {
            return;
        };

        let (position, max_speed) = {
            let mut rng = self.rng.borrow_mut();
            let y = SPAWN_SPREAD * rng.gen_range(-1.0..=1.0_f32);
            (Vec2::new(SPAWN_X, y), rng.gen_range(0.5..1.5_f32))
        };

        self.alive.set(self.alive.get() + 1);
        let args = NaziArgs {
            position,
            max_speed,
            spawner: Rc::downgrade(&self),
        };
        match injector.create::<Nazi>(args) {
            Ok(nazi) => {
                self.spawned.set(self.spawned.get() + 1);
                debug!(uid = ?nazi.header().uid(), alive = self.alive.get(), "spawned enemy");
            }
            Err(e) => {
                self.alive.set(self.alive.get().saturating_sub(1));
                warn!("Failed to spawn enemy: {e}");
            }
        }
    }
}
