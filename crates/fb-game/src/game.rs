//! World setup and the frame loop.

use std::{
    cell::Cell,
    fmt,
    rc::Rc,
    thread,
    time::Instant,
};

use eyre::eyre;
use fb_event::{EventDispatcher, FrameClock, FrameEvent, KeyEvent};
use fb_runtime::{DebugDrawer, GameplayRegistry, Injector};
use tracing::{error, info};

use crate::{
    config::GameConfig,
    crowd::Crowd,
    gameplay::{
        Player, PlayerArgs, Spawner, SpawnerArgs,
        names::{CROWD, DEBUG_DRAWER, GAMEPLAY_REGISTRY, INPUT, PLAYER},
    },
    input::{Input, KEY_A, KEY_D, KEY_S, KEY_W},
    painter::CountingPainter,
};

/// Keys held in turn by the scripted player, one per walk period.
const WALK_CYCLE: [u32; 4] = [KEY_W, KEY_D, KEY_S, KEY_A];
const WALK_PERIOD: u64 = 40;

/// Snapshot of the world after a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub entities: usize,
    pub updaters: usize,
    pub agents: usize,
    pub drawn: usize,
    pub shots: u64,
    pub spawned: u64,
    pub killed: u64,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}: {} entities ({} updating), {} agents, {} drawn, {} shots, {} spawned, {} killed",
            self.frame,
            self.entities,
            self.updaters,
            self.agents,
            self.drawn,
            self.shots,
            self.spawned,
            self.killed
        )
    }
}

/// A fully wired world: dependency table, registries, player and spawner.
pub struct Game {
    injector: Rc<Injector>,
    registry: Rc<GameplayRegistry>,
    drawer: Rc<DebugDrawer>,
    crowd: Rc<Crowd>,
    dispatcher: EventDispatcher,
    player: Rc<Player>,
    spawner: Rc<Spawner>,
    last_paint: Rc<Cell<CountingPainter>>,
    frame: Rc<Cell<u64>>,
}

impl Game {
    pub fn new(config: &GameConfig) -> eyre::Result<Self> {
        let injector = Injector::new();
        let registry = Rc::new(GameplayRegistry::new());
        let drawer = Rc::new(DebugDrawer::new());
        let crowd = Rc::new(Crowd::new());
        let input = Rc::new(Input::new());

        injector.add_registrar(GAMEPLAY_REGISTRY, Rc::clone(&registry))?;
        injector.add_registrar(DEBUG_DRAWER, Rc::clone(&drawer))?;
        injector.add_dependency(CROWD, Rc::clone(&crowd))?;
        injector.add_dependency(INPUT, Rc::clone(&input))?;

        let player = injector.create::<Player>(PlayerArgs {
            fire_interval: config.fire_interval,
        })?;
        injector.add_dependency(PLAYER, Rc::clone(&player))?;

        let spawner = injector.create::<Spawner>(SpawnerArgs {
            max_enemies: config.max_enemies,
            seed: config.seed,
        })?;

        let dispatcher = EventDispatcher::new();
        let last_paint = Rc::new(Cell::new(CountingPainter::default()));
        let frame = Rc::new(Cell::new(0));

        dispatcher.add_listener(move |event: &KeyEvent| input.handle(event));

        {
            let registry = Rc::clone(&registry);
            let crowd = Rc::clone(&crowd);
            let drawer = Rc::clone(&drawer);
            let last_paint = Rc::clone(&last_paint);
            let frame = Rc::clone(&frame);
            dispatcher.add_listener(move |event: &FrameEvent| {
                frame.set(frame.get() + 1);
                if let Err(e) = registry.update(event.dt) {
                    error!("Update pass failed: {e}");
                }
                crowd.step(event.dt);

                let mut painter = CountingPainter::default();
                match drawer.draw(&mut painter) {
                    Ok(_) => last_paint.set(painter),
                    Err(e) => error!("Debug draw failed: {e}"),
                }
            });
        }

        info!(
            max_enemies = config.max_enemies,
            seed = ?config.seed,
            "World ready"
        );

        Ok(Self {
            injector,
            registry,
            drawer,
            crowd,
            dispatcher,
            player,
            spawner,
            last_paint,
            frame,
        })
    }

    /// Feed a key transition to the input listeners.
    pub fn key(&self, event: KeyEvent) {
        self.dispatcher.dispatch(&event);
    }

    /// Run one frame of `dt` seconds.
    pub fn step(&self, dt: f32) {
        self.dispatcher.dispatch(&FrameEvent { dt });
    }

    #[must_use]
    pub fn player(&self) -> &Rc<Player> {
        &self.player
    }

    #[must_use]
    pub fn spawner(&self) -> &Rc<Spawner> {
        &self.spawner
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<GameplayRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn crowd(&self) -> &Rc<Crowd> {
        &self.crowd
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frame: self.frame.get(),
            entities: self.registry.len(),
            updaters: self.registry.update_len(),
            agents: self.crowd.len(),
            drawn: self.last_paint.get().total(),
            shots: self.player.shots(),
            spawned: self.spawner.spawned(),
            killed: self.spawner.killed(),
        }
    }

    /// Destroy every live object, finalizing each.
    pub fn shutdown(&self) -> eyre::Result<()> {
        if self.registry.is_updating() {
            return Err(eyre!("cannot shut down during an update pass"));
        }
        for uid in self.registry.uids() {
            if let Some(object) = self.registry.get(uid) {
                self.injector.destroy(object)?;
            }
        }
        info!(
            entities = self.registry.len(),
            drawables = self.drawer.len(),
            agents = self.crowd.len(),
            "World shut down"
        );
        Ok(())
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("injector", &self.injector)
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Key transitions the scripted player makes at the start of `frame`.
fn scripted_input(frame: u64) -> Vec<KeyEvent> {
    if frame % WALK_PERIOD != 0 {
        return Vec::new();
    }
    let step = frame / WALK_PERIOD;
    let key = |step: u64| WALK_CYCLE[(step % WALK_CYCLE.len() as u64) as usize];

    let mut events = Vec::with_capacity(2);
    if step > 0 {
        events.push(KeyEvent::up(key(step - 1)));
    }
    events.push(KeyEvent::down(key(step)));
    events
}

/// Run the headless loop paced to `config.target_fps`.
pub fn run(config: &GameConfig) -> eyre::Result<FrameStats> {
    let game = Game::new(config)?;
    let frame_duration = config.frame_duration();
    let report_every = (config.target_fps.round() as u64).max(1);
    let mut clock = FrameClock::new();

    loop {
        let started = Instant::now();
        if config.frames != 0 && clock.frame() >= config.frames {
            break;
        }

        for event in scripted_input(clock.frame()) {
            game.key(event);
        }
        let frame = clock.tick(started);
        game.step(frame.dt);

        if clock.frame() % report_every == 0 {
            info!("{}", game.stats());
        }

        if let Some(remaining) = frame_duration.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    let stats = game.stats();
    info!(elapsed = clock.elapsed(), "Finished: {stats}");
    game.shutdown()?;
    Ok(stats)
}
