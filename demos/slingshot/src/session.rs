use sling_engine::{EngineContext, GameEvent};

/// Game event kinds sent to the UI.
pub const EVENT_SCORE: u32 = 1;
pub const EVENT_BIRDS_LEFT: u32 = 2;
/// Payload `a`: 1 won, 2 lost.
pub const EVENT_GAME_OVER: u32 = 3;
/// Payload `a`: level number, starting at 1.
pub const EVENT_LEVEL: u32 = 4;
pub const EVENT_CAMPAIGN_COMPLETE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    /// Win when no targets remain, otherwise lose when no birds remain.
    pub fn evaluate(targets_left: usize, birds_left: usize) -> Self {
        if targets_left == 0 {
            Outcome::Won
        } else if birds_left == 0 {
            Outcome::Lost
        } else {
            Outcome::InProgress
        }
    }

    fn code(self) -> f32 {
        match self {
            Outcome::InProgress => 0.0,
            Outcome::Won => 1.0,
            Outcome::Lost => 2.0,
        }
    }
}

/// Score, birds left and outcome for the level being played.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub level: usize,
    score: u32,
    birds_left: usize,
    outcome: Outcome,
}

impl Session {
    pub fn new() -> Self {
        Self {
            level: 0,
            score: 0,
            birds_left: 0,
            outcome: Outcome::InProgress,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn birds_left(&self) -> usize {
        self.birds_left
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    /// Start `level` from scratch and announce it.
    pub fn begin(&mut self, ctx: &mut EngineContext, level: usize, birds: usize) {
        self.level = level;
        self.score = 0;
        self.outcome = Outcome::InProgress;
        ctx.emit_event(GameEvent::new(EVENT_LEVEL, (level + 1) as f32));
        ctx.emit_event(GameEvent::new(EVENT_SCORE, 0.0));
        self.set_birds_left(ctx, birds);
    }

    pub fn add_score(&mut self, ctx: &mut EngineContext, points: u32) {
        self.score += points;
        ctx.emit_event(GameEvent::new(EVENT_SCORE, self.score as f32));
    }

    pub fn set_birds_left(&mut self, ctx: &mut EngineContext, birds: usize) {
        self.birds_left = birds;
        ctx.emit_event(GameEvent::new(EVENT_BIRDS_LEFT, birds as f32));
    }

    /// Re-evaluate the outcome. Emits a game-over event only on the tick the
    /// outcome first settles.
    pub fn update_outcome(&mut self, ctx: &mut EngineContext, targets_left: usize, birds_left: usize) {
        if self.is_over() {
            return;
        }
        self.outcome = Outcome::evaluate(targets_left, birds_left);
        if self.is_over() {
            log::info!("level {} over: {:?}, score {}", self.level + 1, self.outcome, self.score);
            ctx.emit_event(GameEvent::new(EVENT_GAME_OVER, self.outcome.code()));
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
