use std::{
    cell::Cell,
    rc::{Rc, Weak},
};

use fb_runtime::prelude::*;
use tracing::{debug, warn};

use super::names::{CROWD, DEBUG_DRAWER, GAMEPLAY_REGISTRY};
use crate::{crowd::Crowd, math::Vec2};

/// Seconds a projectile flies before it expires.
pub const LIFETIME: f32 = 2.0;
const HIT_RADIUS: f32 = 0.5;
const COLOR: u32 = 0xff_6600;

#[derive(Debug, Clone, Copy)]
pub struct ProjectileArgs {
    pub position: Vec2,
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Units per second.
    pub speed: f32,
    /// Entity the projectile never hits.
    pub owner: Option<Uid>,
}

/// Flies in a straight line and destroys the first entity it touches.
pub struct Projectile {
    header: Header,
    registry: Rc<GameplayRegistry>,
    crowd: Rc<Crowd>,
    injector: Weak<Injector>,
    position: Cell<Vec2>,
    direction: Cell<Vec2>,
    speed: Cell<f32>,
    owner: Cell<Option<Uid>>,
    age: Cell<f32>,
}

impl Projectile {
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    #[must_use]
    pub fn age(&self) -> f32 {
        self.age.get()
    }
}

impl Object for Projectile {
    fn header(&self) -> &Header {
        &self.header
    }

    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        Some(self)
    }

    fn debug_draw_capability(self: Rc<Self>) -> Option<Rc<dyn DebugDraw>> {
        Some(self)
    }
}

impl Injectable for Projectile {
    const DEPENDENCIES: &'static [&'static str] =
        &[GAMEPLAY_REGISTRY, DEBUG_DRAWER, INJECTOR, CROWD];
    type Args = ProjectileArgs;

    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
        Ok(Self {
            header: Header::new(),
            registry: wiring.get(GAMEPLAY_REGISTRY)?,
            crowd: wiring.get(CROWD)?,
            injector: Rc::downgrade(&wiring.get::<Injector>(INJECTOR)?),
            position: Cell::new(Vec2::ZERO),
            direction: Cell::new(Vec2::ZERO),
            speed: Cell::new(0.0),
            owner: Cell::new(None),
            age: Cell::new(0.0),
        })
    }

    fn init(&self, args: ProjectileArgs) {
        self.position.set(args.position);
        self.direction.set(args.direction);
        self.speed.set(args.speed);
        self.owner.set(args.owner);
    }
}

impl Update for Projectile {
    fn update(self: Rc<Self>, dt: f32) {
        let Some(injector) = self.injector.upgrade() else {
            return;
        };

        let position = self.position.get();
        let next = position + self.direction.get() * (self.speed.get() * dt);
        let hit = self
            .crowd
            .raycast(position, next, HIT_RADIUS, self.owner.get())
            .and_then(|uid| self.registry.get(uid));

        if let Some(target) = hit {
            debug!(enemy = ?target.header().uid(), "projectile hit");
            if let Err(e) = injector.destroy(target) {
                warn!("Failed to destroy projectile target: {e}");
            }
            if let Err(e) = injector.destroy(self) {
                warn!("Failed to destroy projectile: {e}");
            }
            return;
        }

        self.position.set(next);
        self.age.set(self.age.get() + dt);
        if self.age.get() >= LIFETIME {
            if let Err(e) = injector.destroy(self) {
                warn!("Failed to expire projectile: {e}");
            }
        }
    }
}

impl DebugDraw for Projectile {
    fn debug_draw(&self, painter: &mut dyn Painter) {
        let position = self.position.get();
        let tip = position + self.direction.get();
        painter.draw_line(position.extend(0.0), tip.extend(0.0), COLOR, 0.1);
    }
}
