use glam::Vec2;
use sling_engine::{BodyDesc, ColliderDesc, ColliderMaterial, EngineContext, Entity, EntityId};

use crate::roles::Role;

/// Sprite footprint of a target.
pub const SIZE: Vec2 = Vec2::new(0.4, 0.55);

const DENSITY: f32 = 10.0;
const FRICTION: f32 = 0.3;
const LINEAR_DAMPING: f32 = 1.0;

/// An enemy. Dies once, when hit hard enough by a projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardTarget {
    pub id: EntityId,
    alive: bool,
}

impl HazardTarget {
    pub fn new(id: EntityId) -> Self {
        Self { id, alive: true }
    }

    pub fn spawn(ctx: &mut EngineContext, pos: Vec2) -> Self {
        let id = ctx.next_id();
        let entity = Entity::new(id, Role::HazardTarget.code());
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: SIZE.x / 2.0 })
            .with_position(pos)
            .with_linear_damping(LINEAR_DAMPING);
        let material = ColliderMaterial {
            restitution: 0.0,
            friction: FRICTION,
            density: DENSITY,
        };
        ctx.spawn_with_body(entity, desc, material);
        Self::new(id)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Returns true only for the call that actually killed it.
    pub fn kill(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }
}
