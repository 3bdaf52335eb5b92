use glam::Vec2;
use sling_engine::{
    BodyDesc, ColliderDesc, ColliderMaterial, EngineContext, Entity, EntityId, JointDesc,
    JointHandle, PhysicsBody,
};

use crate::roles::Role;

/// Side length of a rope segment.
pub const SEGMENT_SIZE: f32 = 0.2;

const DENSITY: f32 = 1.0;
const FRICTION: f32 = 0.3;

/// A rope: a row of segments pinned to each other, hanging between two obstacles.
///
/// `joints[i]` attaches segment `i` to whatever precedes it (the head anchor
/// for `i == 0`). A trailing joint to the tail anchor follows when present.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
    segments: Vec<EntityId>,
    joints: Vec<JointHandle>,
    broken: bool,
}

impl Linkage {
    pub fn new(segments: Vec<EntityId>, joints: Vec<JointHandle>) -> Self {
        Self {
            segments,
            joints,
            broken: false,
        }
    }

    /// Build `length + 1` segments rightwards from `start`, pinned to `head`
    /// at the first segment and to `tail` (if any) at the last.
    pub fn spawn(
        ctx: &mut EngineContext,
        start: Vec2,
        length: usize,
        head: PhysicsBody,
        tail: Option<PhysicsBody>,
    ) -> Self {
        let mut segments = Vec::with_capacity(length + 1);
        let mut joints = Vec::with_capacity(length + 2);
        let mut previous = head;

        for i in 0..=length {
            let pos = start + Vec2::new(i as f32 * SEGMENT_SIZE, 0.0);
            let id = ctx.next_id();
            let desc = BodyDesc::dynamic(ColliderDesc::Cuboid {
                half_width: SEGMENT_SIZE / 2.0,
                half_height: SEGMENT_SIZE / 2.0,
            })
            .with_position(pos);
            let material = ColliderMaterial {
                restitution: 0.0,
                friction: FRICTION,
                density: DENSITY,
            };
            ctx.spawn_with_body(Entity::new(id, Role::LinkageSegment.code()), desc, material);
            let Some(body) = ctx.body(id) else {
                continue;
            };

            joints.push(pin(ctx, &previous, &body, pos));
            segments.push(id);
            previous = body;
        }

        if let (Some(tail), Some(last)) = (tail, segments.last().and_then(|id| ctx.body(*id))) {
            let pos = ctx.physics.body_position(&last).0;
            joints.push(pin(ctx, &last, &tail, pos));
        }

        Self::new(segments, joints)
    }

    pub fn segments(&self) -> &[EntityId] {
        &self.segments
    }

    pub fn joints(&self) -> &[JointHandle] {
        &self.joints
    }

    pub fn owns(&self, segment: EntityId) -> bool {
        self.segments.contains(&segment)
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Snap the rope at its middle. Returns the joint to destroy the first
    /// time, `None` ever after.
    pub fn break_link(&mut self) -> Option<JointHandle> {
        if self.broken {
            return None;
        }
        self.broken = true;
        self.joints.get(self.segments.len() / 2).copied()
    }
}

/// Pin two bodies together at a world-space point. Pinned neighbours do not collide.
fn pin(ctx: &mut EngineContext, a: &PhysicsBody, b: &PhysicsBody, at: Vec2) -> JointHandle {
    let desc = JointDesc::Revolute {
        anchor_a: ctx.physics.local_point(a, at),
        anchor_b: ctx.physics.local_point(b, at),
        collide_connected: false,
    };
    ctx.physics.create_joint(a, b, &desc)
}
