use glam::Vec2;
use sling_engine::{
    BodyDesc, ColliderDesc, ColliderMaterial, EngineContext, Entity, EntityId, JointDesc,
    JointHandle, PhysicsBody, PrismaticState,
};

use crate::roles::Role;

/// Platform footprint.
pub const SIZE: Vec2 = Vec2::new(1.0, 0.25);
/// Travel limit either side of the rest position.
pub const TRAVEL: f32 = 1.5;

const DENSITY: f32 = 5.0;
const RESTITUTION: f32 = 1.5;
const STIFFNESS: f32 = 1000.0;
const DAMPING: f32 = 5.0;
const DRIVE_SPEED: f32 = 10000.0;

/// A bouncy platform sliding vertically on a prismatic joint. Its motor is
/// re-aimed every tick toward the rest position, emulating a spring.
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    pub platform: EntityId,
    pub joint: JointHandle,
}

impl Oscillator {
    /// Create the platform at `pos`, sliding against `anchor` (the ground).
    pub fn spawn(ctx: &mut EngineContext, pos: Vec2, anchor: &PhysicsBody) -> Option<Self> {
        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Cuboid {
            half_width: SIZE.x / 2.0,
            half_height: SIZE.y / 2.0,
        })
        .with_position(pos)
        .with_can_sleep(false);
        let material = ColliderMaterial {
            restitution: RESTITUTION,
            friction: 0.0,
            density: DENSITY,
        };
        ctx.spawn_with_body(Entity::new(id, Role::Oscillator.code()), desc, material);
        let platform = ctx.body(id)?;

        let anchor_a = ctx.physics.local_point(anchor, pos);
        let joint = ctx.physics.create_joint(anchor, &platform, &JointDesc::Prismatic {
            anchor_a,
            anchor_b: Vec2::ZERO,
            axis: Vec2::Y,
            limits: [-TRAVEL, TRAVEL],
            collide_connected: true,
        });
        Some(Self { platform: id, joint })
    }

    /// Re-aim the motor from the joint's current state.
    pub fn update(&self, ctx: &mut EngineContext) {
        if let Some(state) = ctx.physics.prismatic_state(self.joint) {
            let (speed, force) = motor_command(state);
            ctx.physics.set_prismatic_motor(self.joint, speed, force);
        }
    }
}

/// Bang-bang drive: full speed back toward the rest position, with force
/// proportional to displacement plus a little speed damping.
pub fn motor_command(state: PrismaticState) -> (f32, f32) {
    let force = (state.translation * STIFFNESS + state.speed * DAMPING).abs();
    let speed = if state.translation > 0.0 { -DRIVE_SPEED } else { DRIVE_SPEED };
    (speed, force)
}
