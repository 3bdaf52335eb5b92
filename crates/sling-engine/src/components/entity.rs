use glam::Vec2;
use crate::api::types::EntityId;
#[cfg(feature = "physics")]
use crate::core::physics::PhysicsBody;

/// One game object: where it is, how it draws, and the body behind it.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Game-defined role code. Fixed at construction.
    role: u32,
    /// Whether this entity is active (inactive entities are not rendered).
    pub active: bool,
    /// Position in world space, synced from the body after each step.
    pub pos: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Half width and half height in world units.
    pub half_extents: Vec2,
    /// Visual variant for the renderer (e.g. a damaged sprite).
    pub variant: u32,
    /// Physics body, when the object takes part in the simulation.
    #[cfg(feature = "physics")]
    pub body: Option<PhysicsBody>,
}

impl Entity {
    /// Create a new entity with the given ID and role at the origin.
    pub fn new(id: EntityId, role: u32) -> Self {
        Self {
            id,
            role,
            active: true,
            pos: Vec2::ZERO,
            rotation: 0.0,
            half_extents: Vec2::splat(0.5),
            variant: 0,
            #[cfg(feature = "physics")]
            body: None,
        }
    }

    pub fn role(&self) -> u32 {
        self.role
    }

    // -- Builder pattern --

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_half_extents(mut self, half_extents: Vec2) -> Self {
        self.half_extents = half_extents;
        self
    }

    pub fn with_variant(mut self, variant: u32) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[cfg(feature = "physics")]
    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether a world-space point lies inside the entity's unrotated bounds.
    pub fn contains(&self, point: Vec2) -> bool {
        let d = (point - self.pos).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }
}
