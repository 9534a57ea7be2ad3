use std::{
    cell::Cell,
    rc::{Rc, Weak},
};

use fb_runtime::prelude::*;
use tracing::warn;

use super::{
    Player, Spawner,
    names::{CROWD, DEBUG_DRAWER, GAMEPLAY_REGISTRY, PLAYER},
};
use crate::{
    crowd::{AgentId, Crowd},
    math::Vec2,
};

const COLOR: u32 = 0xff_0000;

#[derive(Debug, Clone)]
pub struct NaziArgs {
    pub position: Vec2,
    pub max_speed: f32,
    /// Told when this enemy dies.
    pub spawner: Weak<Spawner>,
}

/// Enemy that walks straight at the player.
pub struct Nazi {
    header: Header,
    player: Rc<Player>,
    crowd: Rc<Crowd>,
    agent: Cell<Option<AgentId>>,
    spawner: Cell<Weak<Spawner>>,
}

impl Nazi {
    #[must_use]
    pub fn position(&self) -> Option<Vec2> {
        self.agent.get().and_then(|agent| self.crowd.position(agent))
    }
}

impl Object for Nazi {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fini(&self) {
        if let Some(agent) = self.agent.take() {
            self.crowd.destroy(agent);
        }
        if let Some(spawner) = self.spawner.take().upgrade() {
            spawner.nazi_killed();
        }
    }

    fn update_capability(self: Rc<Self>) -> Option<Rc<dyn Update>> {
        Some(self)
    }

    fn debug_draw_capability(self: Rc<Self>) -> Option<Rc<dyn DebugDraw>> {
        Some(self)
    }
}

impl Injectable for Nazi {
    const DEPENDENCIES: &'static [&'static str] =
        &[GAMEPLAY_REGISTRY, PLAYER, DEBUG_DRAWER, CROWD];
    type Args = NaziArgs;

    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
        Ok(Self {
            header: Header::new(),
            player: wiring.get(PLAYER)?,
            crowd: wiring.get(CROWD)?,
            agent: Cell::new(None),
            spawner: Cell::new(Weak::new()),
        })
    }

    fn init(&self, args: NaziArgs) {
        self.spawner.set(args.spawner);

        let Some(uid) = self.header.uid() else {
            warn!("Nazi created without an identifier");
            return;
        };
        let agent = self.crowd.create(args.position, uid);
        self.crowd.set_max_speed(agent, args.max_speed);
        self.agent.set(Some(agent));
    }
}

impl Update for Nazi {
    fn update(self: Rc<Self>, _dt: f32) {
        if !self.header.is_alive() {
            return;
        }
        if let Some(agent) = self.agent.get() {
            let position = self.crowd.position(agent).unwrap_or_default();
            self.crowd.set_pref_velocity(agent, self.player.position() - position);
        }
    }
}

impl DebugDraw for Nazi {
    fn debug_draw(&self, painter: &mut dyn Painter) {
        if let (Some(position), Some(agent)) = (self.position(), self.agent.get()) {
            let radius = self.crowd.radius(agent).unwrap_or_default();
            painter.draw_circle(position.extend(0.0), radius, COLOR, 16);
        }
    }
}
