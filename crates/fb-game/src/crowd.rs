//! Crowd simulation stand-in.
//!
//! Agents are circles steered by a preferred velocity. Each step clamps the
//! preferred velocity to the agent's max speed and integrates. There is no
//! collision avoidance; the crowd only has to move things around and answer
//! spatial queries for gameplay.

use std::{cell::RefCell, fmt};

use fb_runtime::Uid;

use crate::math::Vec2;

/// Radius given to new agents.
pub const DEFAULT_RADIUS: f32 = 1.5;
/// Max speed given to new agents.
pub const DEFAULT_MAX_SPEED: f32 = 2.0;

/// Handle to an agent. Stale handles are detected by generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({}v{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Agent {
    owner: Uid,
    position: Vec2,
    velocity: Vec2,
    pref_velocity: Vec2,
    radius: f32,
    max_speed: f32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    agent: Option<Agent>,
}

#[derive(Debug, Default)]
struct Agents {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    alive: usize,
}

impl Agents {
    fn get(&self, id: AgentId) -> Option<&Agent> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.agent.as_ref())
    }

    fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.agent.as_mut())
    }

    fn live(&self) -> impl Iterator<Item = &Agent> {
        self.slots.iter().filter_map(|slot| slot.agent.as_ref())
    }
}

/// Shared crowd, bound as a plain dependency.
#[derive(Debug, Default)]
pub struct Crowd {
    agents: RefCell<Agents>,
}

impl Crowd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent at `position`, owned by the entity `owner`.
    pub fn create(&self, position: Vec2, owner: Uid) -> AgentId {
        let mut agents = self.agents.borrow_mut();
        let agent = Agent {
            owner,
            position,
            velocity: Vec2::ZERO,
            pref_velocity: Vec2::ZERO,
            radius: DEFAULT_RADIUS,
            max_speed: DEFAULT_MAX_SPEED,
        };
        agents.alive += 1;

        if let Some(index) = agents.free_list.pop() {
            let slot = &mut agents.slots[index as usize];
            slot.agent = Some(agent);
            return AgentId {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(agents.slots.len()).unwrap_or(u32::MAX);
        agents.slots.push(Slot {
            generation: 0,
            agent: Some(agent),
        });
        AgentId {
            index,
            generation: 0,
        }
    }

    /// Remove an agent. Returns false for stale handles.
    pub fn destroy(&self, id: AgentId) -> bool {
        let mut agents = self.agents.borrow_mut();
        let Some(slot) = agents
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.agent.is_some())
        else {
            return false;
        };
        slot.agent = None;
        slot.generation = slot.generation.wrapping_add(1);
        agents.free_list.push(id.index);
        agents.alive -= 1;
        true
    }

    pub fn set_pref_velocity(&self, id: AgentId, velocity: Vec2) {
        if let Some(agent) = self.agents.borrow_mut().get_mut(id) {
            agent.pref_velocity = velocity;
        }
    }

    pub fn set_max_speed(&self, id: AgentId, max_speed: f32) {
        if let Some(agent) = self.agents.borrow_mut().get_mut(id) {
            agent.max_speed = max_speed;
        }
    }

    #[must_use]
    pub fn position(&self, id: AgentId) -> Option<Vec2> {
        self.agents.borrow().get(id).map(|agent| agent.position)
    }

    #[must_use]
    pub fn velocity(&self, id: AgentId) -> Option<Vec2> {
        self.agents.borrow().get(id).map(|agent| agent.velocity)
    }

    #[must_use]
    pub fn radius(&self, id: AgentId) -> Option<f32> {
        self.agents.borrow().get(id).map(|agent| agent.radius)
    }

    /// Advance every agent by `dt` seconds.
    pub fn step(&self, dt: f32) {
        let mut agents = self.agents.borrow_mut();
        for agent in agents.slots.iter_mut().filter_map(|slot| slot.agent.as_mut()) {
            agent.velocity = agent.pref_velocity.clamp_length(agent.max_speed);
            agent.position += agent.velocity * dt;
        }
    }

    /// Owner of the first agent touched by a circle of `radius` swept from
    /// `from` to `to`, skipping agents owned by `ignore`.
    #[must_use]
    pub fn raycast(&self, from: Vec2, to: Vec2, radius: f32, ignore: Option<Uid>) -> Option<Uid> {
        let segment = to - from;
        let length_squared = segment.length_squared();

        let agents = self.agents.borrow();
        agents
            .live()
            .filter(|agent| Some(agent.owner) != ignore)
            .filter_map(|agent| {
                let t = if length_squared > f32::EPSILON {
                    ((agent.position - from).dot(segment) / length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let closest = from + segment * t;
                let reach = radius + agent.radius;
                ((agent.position - closest).length_squared() <= reach * reach).then_some((t, agent.owner))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, owner)| owner)
    }

    /// Closest agent to `point` not owned by `ignore`.
    #[must_use]
    pub fn nearest(&self, point: Vec2, ignore: Option<Uid>) -> Option<(Uid, Vec2)> {
        let agents = self.agents.borrow();
        agents
            .live()
            .filter(|agent| Some(agent.owner) != ignore)
            .min_by(|a, b| {
                (a.position - point)
                    .length_squared()
                    .total_cmp(&(b.position - point).length_squared())
            })
            .map(|agent| (agent.owner, agent.position))
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.borrow().alive
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
