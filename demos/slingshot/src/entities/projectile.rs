use glam::Vec2;
use sling_engine::{BodyDesc, ColliderDesc, ColliderMaterial, EngineContext, Entity, EntityId};

use crate::roles::Role;

/// Side length of a bird waiting at the sling.
pub const SIZE: f32 = 1.0;
/// Side length of a split-off child.
pub const CHILD_SIZE: f32 = 0.7;

const DENSITY: f32 = 1.0;
const FRICTION: f32 = 0.3;
const LINEAR_DAMPING: f32 = 0.5;

/// What happens when the player triggers a bird mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Classic,
    /// Falls faster.
    HeavyDrop,
    /// Spawns two smaller birds alongside itself.
    Splitter,
}

impl Ability {
    pub fn variant(self) -> u32 {
        match self {
            Ability::Classic => 0,
            Ability::HeavyDrop => 1,
            Ability::Splitter => 2,
        }
    }
}

/// A bird. Waits disabled at the sling until grabbed, then lives for a fixed
/// time after launch.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: EntityId,
    pub ability: Ability,
    launched: bool,
    ability_used: bool,
    alive: bool,
    launch_time: f32,
}

impl Projectile {
    pub fn new(id: EntityId, ability: Ability) -> Self {
        Self {
            id,
            ability,
            launched: false,
            ability_used: false,
            alive: true,
            launch_time: 0.0,
        }
    }

    /// Create the bird's body. `enabled` is false for birds still queued at the sling.
    pub fn spawn(ctx: &mut EngineContext, ability: Ability, pos: Vec2, size: f32, enabled: bool) -> Self {
        let id = ctx.next_id();
        let entity = Entity::new(id, Role::Projectile.code())
            .with_variant(ability.variant())
            .with_active(enabled);
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: radius(size) })
            .with_position(pos)
            .with_linear_damping(LINEAR_DAMPING)
            .with_ccd(true)
            .with_enabled(enabled);
        let material = ColliderMaterial {
            restitution: 0.0,
            friction: FRICTION,
            density: DENSITY,
        };
        ctx.spawn_with_body(entity, desc, material);
        Self::new(id, ability)
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn ability_used(&self) -> bool {
        self.ability_used
    }

    pub fn launch_time(&self) -> f32 {
        self.launch_time
    }

    /// Mark the bird as flying. Its lifetime starts now.
    pub fn launch(&mut self, now: f32) {
        if !self.launched {
            self.launched = true;
            self.launch_time = now;
        }
    }

    /// Expire the bird once it has flown for `lifetime` seconds.
    pub fn update(&mut self, now: f32, lifetime: f32) {
        if self.launched && now - self.launch_time >= lifetime {
            self.alive = false;
        }
    }

    /// Use the ability. Returns it the first time after launch, `None` otherwise.
    pub fn trigger_ability(&mut self) -> Option<Ability> {
        if !self.launched || self.ability_used {
            return None;
        }
        self.ability_used = true;
        Some(self.ability)
    }

    /// Share the parent's flight: same launch time, so both expire together.
    /// Children never get an ability of their own.
    pub fn inherit_flight(&mut self, parent: &Projectile) {
        self.launched = parent.launched;
        self.launch_time = parent.launch_time;
        self.alive = parent.alive;
        self.ability_used = true;
    }
}

/// Collision radius for a bird of the given sprite size.
pub fn radius(size: f32) -> f32 {
    size / 2.0 - 0.1
}
