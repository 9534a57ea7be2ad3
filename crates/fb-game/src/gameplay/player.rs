use std::{
    cell::Cell,
    rc::{Rc, Weak},
};

use fb_runtime::prelude::*;
use tracing::{debug, warn};

use super::{
    names::{CROWD, DEBUG_DRAWER, GAMEPLAY_REGISTRY, INPUT},
    projectile::{Projectile, ProjectileArgs},
};
use crate::{
    crowd::{AgentId, Crowd},
    input::Input,
    math::Vec2,
};

const MAX_SPEED: f32 = 3.0;
const PROJECTILE_SPEED: f32 = 40.0;
const COLOR: u32 = 0xff_ffff;

#[derive(Debug, Clone, Copy)]
pub struct PlayerArgs {
    pub fire_interval: f32,
}

/// Crowd agent steered by WASD that shoots at the nearest enemy.
pub struct Player {
    header: Header,
    crowd: Rc<Crowd>,
    input: Rc<Input>,
    injector: Weak<Injector>,
    agent: Cell<Option<AgentId>>,
    fire_interval: Cell<f32>,
    cooldown: Cell<f32>,
    shots: Cell<u64>,
}

impl Player {
    /// Current position, or the origin before `init`.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.agent
            .get()
            .and_then(|agent| self.crowd.position(agent))
            .unwrap_or(Vec2::ZERO)
    }

    /// Projectiles fired so far.
    #[must_use]
    pub fn shots(&self) -> u64 {
        self.shots.get()
    }

    fn fire(&self) {
        let Some(injector) = self.injector.upgrade() else {
            return;
        };
        let position = self.position();
        let Some((target, target_position)) = self.crowd.nearest(position, self.header.uid()) else {
            return;
        };

        let direction = (target_position - position).normalize_or_zero();
        if direction == Vec2::ZERO {
            return;
        }

        let args = ProjectileArgs {
            position,
            direction,
            speed: PROJECTILE_SPEED,
            owner: self.header.uid(),
        };
        match injector.create::<Projectile>(args) {
            Ok(_) => {
                self.shots.set(self.shots.get() + 1);
                debug!(enemy = %target, "player fired");
            }
            Err(e) => warn!("Failed to fire projectile: {e}"),
        }
    }
}

impl Object for Player {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fini(&self) {
        if let Some(agent) = self.agent.take() {
            self.crowd.destroy(agent);
        }
    }

    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        Some(self)
    }

    fn debug_draw_capability(self: Rc<Self>) -> Option<Rc<dyn DebugDraw>> {
        Some(self)
    }
}

impl Injectable for Player {
    const DEPENDENCIES: &'static [&'static str] =
        &[GAMEPLAY_REGISTRY, DEBUG_DRAWER, CROWD, INPUT, INJECTOR];
    type Args = PlayerArgs;

    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
        Ok(Self {
            header: Header::new(),
            crowd: wiring.get(CROWD)?,
            input: wiring.get(INPUT)?,
            injector: Rc::downgrade(&wiring.get::<Injector>(INJECTOR)?),
            agent: Cell::new(None),
            fire_interval: Cell::new(0.0),
            cooldown: Cell::new(0.0),
            shots: Cell::new(0),
        })
    }

    fn init(&self, args: PlayerArgs) {
        self.fire_interval.set(args.fire_interval);
        self.cooldown.set(args.fire_interval);

        let Some(uid) = self.header.uid() else {
            warn!("Player created without an identifier");
            return;
        };
        let agent = self.crowd.create(Vec2::ZERO, uid);
        self.crowd.set_max_speed(agent, MAX_SPEED);
        self.agent.set(Some(agent));
    }
}

impl Update for Player {
    fn update(self: Rc<Self>, dt: f32) {
        let Some(agent) = self.agent.get() else {
            return;
        };
        let (x, y) = self.input.movement_axis();
        self.crowd.set_pref_velocity(agent, Vec2::new(x, y) * MAX_SPEED);

        let cooldown = self.cooldown.get() - dt;
        if cooldown <= 0.0 {
            self.fire();
            self.cooldown.set(cooldown + self.fire_interval.get());
        } else {
            self.cooldown.set(cooldown);
        }
    }
}

impl DebugDraw for Player {
    fn debug_draw(&self, painter: &mut dyn Painter) {
        if let Some(agent) = self.agent.get() {
            let radius = self.crowd.radius(agent).unwrap_or_default();
            painter.draw_circle(self.position().extend(0.0), radius, COLOR, 16);
        }
    }
}
