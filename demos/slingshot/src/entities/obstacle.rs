use glam::Vec2;
use sling_engine::{BodyDesc, ColliderDesc, ColliderMaterial, EngineContext, Entity, EntityId};

use crate::roles::Role;

const FRICTION: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleClass {
    DestructiblePlank,
    DestructibleBlock,
    IndestructiblePlank,
    IndestructibleBlock,
}

impl ObstacleClass {
    /// Full width and height.
    pub fn size(self) -> Vec2 {
        match self {
            ObstacleClass::DestructiblePlank | ObstacleClass::IndestructiblePlank => {
                Vec2::new(1.5, 0.2)
            }
            ObstacleClass::DestructibleBlock | ObstacleClass::IndestructibleBlock => {
                Vec2::new(0.8, 0.8)
            }
        }
    }

    pub fn max_health(self) -> i32 {
        match self {
            ObstacleClass::DestructiblePlank => 8,
            ObstacleClass::DestructibleBlock => 10,
            ObstacleClass::IndestructiblePlank | ObstacleClass::IndestructibleBlock => 100,
        }
    }

    pub fn density(self) -> f32 {
        match self {
            ObstacleClass::DestructiblePlank => 0.5,
            ObstacleClass::DestructibleBlock => 2.0,
            ObstacleClass::IndestructiblePlank => 5.0,
            ObstacleClass::IndestructibleBlock => 10.0,
        }
    }

    fn index(self) -> u32 {
        match self {
            ObstacleClass::DestructiblePlank => 0,
            ObstacleClass::DestructibleBlock => 1,
            ObstacleClass::IndestructiblePlank => 2,
            ObstacleClass::IndestructibleBlock => 3,
        }
    }
}

/// A plank or block with integer health.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: EntityId,
    pub class: ObstacleClass,
    health: i32,
    damaged: bool,
}

impl Obstacle {
    pub fn new(id: EntityId, class: ObstacleClass) -> Self {
        Self {
            id,
            class,
            health: class.max_health(),
            damaged: false,
        }
    }

    /// Create the obstacle's body, rotated by `angle_deg` degrees.
    pub fn spawn(ctx: &mut EngineContext, class: ObstacleClass, pos: Vec2, angle_deg: f32) -> Self {
        let id = ctx.next_id();
        let half = class.size() / 2.0;
        let obstacle = Self::new(id, class);
        let entity = Entity::new(id, Role::Obstacle.code()).with_variant(obstacle.variant());
        let desc = BodyDesc::dynamic(ColliderDesc::Cuboid {
            half_width: half.x,
            half_height: half.y,
        })
        .with_position(pos)
        .with_rotation(angle_deg.to_radians());
        let material = ColliderMaterial {
            restitution: 0.0,
            friction: FRICTION,
            density: class.density(),
        };
        ctx.spawn_with_body(entity, desc, material);
        obstacle
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Subtract `amount` (negative amounts are ignored). Returns true when this
    /// hit is the one that first takes health to half or below.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health -= amount.max(0);
        if !self.damaged && self.health <= self.class.max_health() / 2 {
            self.damaged = true;
            return true;
        }
        false
    }

    /// Render variant: class index, doubled, plus one when damaged.
    pub fn variant(&self) -> u32 {
        self.class.index() * 2 + self.damaged as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_table() {
        assert_eq!(ObstacleClass::DestructiblePlank.size(), Vec2::new(1.5, 0.2));
        assert_eq!(ObstacleClass::IndestructibleBlock.size(), Vec2::new(0.8, 0.8));
        assert_eq!(ObstacleClass::DestructiblePlank.max_health(), 8);
        assert_eq!(ObstacleClass::DestructibleBlock.max_health(), 10);
        assert_eq!(ObstacleClass::IndestructiblePlank.max_health(), 100);
        assert_eq!(ObstacleClass::DestructibleBlock.density(), 2.0);
    }

    #[test]
    fn damage_sequence_on_destructible_block() {
        let mut block = Obstacle::new(EntityId(1), ObstacleClass::DestructibleBlock);
        let mut seen = Vec::new();
        let mut turned_damaged = Vec::new();
        for hit in [3, 4, 5] {
            turned_damaged.push(block.take_damage(hit));
            seen.push(block.health());
        }
        assert_eq!(seen, vec![7, 3, -2]);
        assert_eq!(turned_damaged, vec![false, true, false]);
        assert!(!block.is_alive());
    }

    #[test]
    fn health_never_increases() {
        let mut plank = Obstacle::new(EntityId(1), ObstacleClass::DestructiblePlank);
        plank.take_damage(-5);
        assert_eq!(plank.health(), 8);
        plank.take_damage(0);
        assert_eq!(plank.health(), 8);
    }

    #[test]
    fn damaged_at_exactly_half() {
        let mut plank = Obstacle::new(EntityId(1), ObstacleClass::DestructiblePlank);
        assert!(!plank.take_damage(3));
        assert!(plank.take_damage(1), "health 4 is half of 8");
        assert!(plank.is_damaged());
        assert!(plank.is_alive());
    }

    #[test]
    fn variant_reflects_class_and_damage() {
        let mut block = Obstacle::new(EntityId(1), ObstacleClass::DestructibleBlock);
        assert_eq!(block.variant(), 2);
        block.take_damage(6);
        assert_eq!(block.variant(), 3);
    }
}
