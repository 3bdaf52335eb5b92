use sling_engine::{
    Game, GameConfig, EngineContext,
    InputEvent, InputQueue, RenderBuffer,
    FixedTimestep, ProtocolLayout,
};
use sling_engine::bridge::protocol::HEADER_FLOATS;
use sling_engine::systems::render::build_render_buffer;

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export generic
/// structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    render_buffer: RenderBuffer,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    initialized: bool,
    frame: u64,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        let layout = ProtocolLayout::from_config(&config);

        Self {
            ctx: EngineContext::from_config(&config),
            render_buffer: RenderBuffer::with_capacity(config.max_instances),
            game,
            input: InputQueue::new(),
            timestep,
            layout,
            config,
            initialized: false,
            frame: 0,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.game.init(&mut self.ctx);
        build_render_buffer(self.ctx.scene.iter(), &mut self.render_buffer);
        self.initialized = true;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Forward host tuning to the game.
    pub fn load_settings(&mut self, json: &str) {
        self.game.load_settings(json);
    }

    /// Run one frame: zero or more fixed ticks, then rebuild the render snapshot.
    /// Events emitted by every tick of this frame stay readable until the next frame.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        // Events raised by init ride along with the first frame.
        if self.frame > 0 {
            self.ctx.clear_frame_data();
        }

        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
            // Input is consumed by the first tick that sees it.
            self.input.drain();
        }

        if self.ctx.events.len() > self.config.max_events {
            log::warn!(
                "{} game events this frame, only {} fit the shared buffer",
                self.ctx.events.len(),
                self.config.max_events
            );
            self.ctx.events.truncate(self.config.max_events);
        }

        build_render_buffer(self.ctx.scene.iter(), &mut self.render_buffer);
        self.frame += 1;
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    pub fn instances_ptr(&self) -> *const f32 {
        self.render_buffer.instances_ptr()
    }

    pub fn instance_count(&self) -> u32 {
        self.render_buffer.instance_count()
    }

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len() as u32
    }

    pub fn header(&self) -> [f32; HEADER_FLOATS] {
        self.layout.header(&self.config)
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    pub fn max_instances(&self) -> u32 {
        self.layout.max_instances as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sling_engine::{Entity, GameEvent};

    /// Spawns one entity and counts ticks and key presses.
    #[derive(Default)]
    struct Counter {
        ticks: u32,
        keys: u32,
        settings: Option<String>,
    }

    impl Game for Counter {
        fn init(&mut self, ctx: &mut EngineContext) {
            let id = ctx.next_id();
            ctx.scene.spawn(Entity::new(id, 1));
        }

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.ticks += 1;
            for event in input.iter() {
                if let InputEvent::KeyDown { .. } = event {
                    self.keys += 1;
                    ctx.emit_event(GameEvent::new(1, self.keys as f32));
                }
            }
        }

        fn load_settings(&mut self, json: &str) {
            self.settings = Some(json.to_string());
        }
    }

    #[test]
    fn init_events_survive_the_first_frame() {
        struct Announcer;
        impl Game for Announcer {
            fn init(&mut self, ctx: &mut EngineContext) {
                ctx.emit_event(GameEvent::new(4, 1.0));
            }
            fn update(&mut self, _ctx: &mut EngineContext, _input: &InputQueue) {}
        }

        let mut runner = GameRunner::new(Announcer);
        runner.init();
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game_events_len(), 1);
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game_events_len(), 0);
    }

    #[test]
    fn tick_before_init_does_nothing() {
        let mut runner = GameRunner::new(Counter::default());
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game().ticks, 0);
        assert_eq!(runner.frame(), 0);
    }

    #[test]
    fn input_is_seen_by_one_tick_only() {
        let mut runner = GameRunner::new(Counter::default());
        runner.init();
        runner.push_input(InputEvent::KeyDown { key_code: 32 });
        runner.tick(3.0 / 60.0 + 0.001);

        assert_eq!(runner.game().ticks, 3);
        assert_eq!(runner.game().keys, 1);
        assert_eq!(runner.game_events_len(), 1);
        assert_eq!(runner.instance_count(), 1);

        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game_events_len(), 0, "events are per frame");
    }

    #[test]
    fn settings_are_forwarded() {
        let mut runner = GameRunner::new(Counter::default());
        runner.load_settings("{}");
        assert_eq!(runner.game().settings.as_deref(), Some("{}"));
    }
}
