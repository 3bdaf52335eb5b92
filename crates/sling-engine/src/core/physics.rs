use glam::Vec2;
use rapier2d::prelude::*;
use std::num::NonZeroUsize;

use crate::api::types::EntityId;

// ---------------------------------------------------------------------------
// glam <-> nalgebra conversions
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> nalgebra::Point2<f32> {
    nalgebra::Point2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn point_to_vec2(p: &nalgebra::Point2<f32>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

/// Damping factor handed to velocity motors. High values make the motor track
/// its target speed rigidly, bounded only by its max force.
const MOTOR_DAMPING: f32 = 100.0;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    KinematicPositionBased,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
        }
    }

    /// Half extents of the shape's local bounding box.
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            ColliderDesc::Ball { radius } => Vec2::splat(radius),
            ColliderDesc::Cuboid { half_width, half_height } => Vec2::new(half_width, half_height),
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.3,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub ccd: bool,
    pub collider: ColliderDesc,
    pub linear_damping: f32,
    /// Disabled bodies keep their state but take no part in the simulation.
    pub enabled: bool,
    pub sensor: bool,
    pub can_sleep: bool,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            ccd: false,
            collider,
            linear_damping: 0.0,
            enabled: true,
            sensor: false,
            can_sleep: true,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            ..Self::dynamic(collider)
        }
    }

    /// Kinematic body moved by explicit position targets. Used as a drag anchor.
    pub fn kinematic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::KinematicPositionBased,
            ..Self::dynamic(collider)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    /// Set the linear damping (velocity decay). Higher values slow the body faster.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sensor colliders detect overlap but never generate contacts.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }
}

/// Identity stamped on a rigid body: the owning entity plus an opaque role
/// code chosen by the game. Packed into the body's `user_data`.
///
/// Bodies created without an owner (drag anchors) decode to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyTag {
    pub entity: EntityId,
    pub role: u32,
}

impl BodyTag {
    pub fn new(entity: EntityId, role: u32) -> Self {
        Self { entity, role }
    }

    fn encode(self) -> u128 {
        ((self.role as u128) << 32) | self.entity.0 as u128
    }

    fn decode(user_data: u128) -> Option<Self> {
        let entity = (user_data & 0xFFFF_FFFF) as u32;
        if entity == 0 {
            return None;
        }
        Some(Self {
            entity: EntityId(entity),
            role: ((user_data >> 32) & 0xFFFF_FFFF) as u32,
        })
    }
}

/// Handle pair stored on an Entity, referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// Handle to a joint in the physics simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointHandle(pub(crate) ImpulseJointHandle);

/// Description of a joint to create between two bodies.
/// Anchors are in each body's local space.
#[derive(Debug, Clone, Copy)]
pub enum JointDesc {
    /// Spring/distance joint that applies forces to maintain rest length.
    Spring {
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    },
    /// Pin: free rotation around the shared anchor point.
    Revolute {
        anchor_a: Vec2,
        anchor_b: Vec2,
        collide_connected: bool,
    },
    /// Slider along `axis` (in body A's frame), limited to `limits`, with a
    /// velocity motor that starts idle.
    Prismatic {
        anchor_a: Vec2,
        anchor_b: Vec2,
        axis: Vec2,
        limits: [f32; 2],
        collide_connected: bool,
    },
}

/// Current displacement and speed of a prismatic joint along its axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrismaticState {
    pub translation: f32,
    pub speed: f32,
}

/// A body held to a kinematic anchor by a damped spring on each axis. Moving
/// the anchor drags the body after it.
#[derive(Debug, Clone, Copy)]
pub struct DragJoint {
    pub anchor: PhysicsBody,
    pub joint: JointHandle,
}

// ---------------------------------------------------------------------------
// Pre-solve contact hook
// ---------------------------------------------------------------------------

/// A contact manifold as seen right before the solver resolves it.
///
/// Velocities are sampled at the contact point and still include the incoming
/// motion of both bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreSolveContact {
    pub body_a: Option<BodyTag>,
    pub body_b: Option<BodyTag>,
    /// World-space position of the first touching point.
    pub point: Vec2,
    /// World-space normal, pointing from body A toward body B.
    pub normal: Vec2,
    pub velocity_a: Vec2,
    pub velocity_b: Vec2,
    /// Touching points on this manifold during the previous step.
    pub previous_points: u32,
    /// Touching points on this manifold now.
    pub current_points: u32,
}

impl PreSolveContact {
    /// Whether a touching point was added since the previous step.
    pub fn is_new(&self) -> bool {
        self.current_points > self.previous_points
    }

    /// Relative velocity of B with respect to A, projected on the normal.
    pub fn approach_velocity(&self) -> f32 {
        (self.velocity_b - self.velocity_a).dot(self.normal)
    }
}

/// Receives every contact manifold before the solver runs.
///
/// Called from inside `PhysicsWorld::step`. Implementations must only record
/// what they observe; the world cannot be touched until the step returns.
pub trait ContactListener: Send + Sync {
    fn pre_solve(&self, contact: &PreSolveContact);
}

/// Listener that ignores every contact.
impl ContactListener for () {
    fn pre_solve(&self, _contact: &PreSolveContact) {}
}

struct PreSolveBridge<'a> {
    listener: &'a dyn ContactListener,
}

impl PhysicsHooks for PreSolveBridge<'_> {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        // The manifold's user data persists across steps; it remembers how many
        // points were touching last time so additions can be detected.
        let previous_points = *context.user_data;
        let current_points = context.solver_contacts.len() as u32;
        *context.user_data = current_points;

        let Some(first) = context.solver_contacts.first() else {
            return;
        };
        let (Some(h1), Some(h2)) = (context.rigid_body1, context.rigid_body2) else {
            return;
        };
        let (Some(rb1), Some(rb2)) = (context.bodies.get(h1), context.bodies.get(h2)) else {
            return;
        };

        let contact = PreSolveContact {
            body_a: BodyTag::decode(rb1.user_data),
            body_b: BodyTag::decode(rb2.user_data),
            point: point_to_vec2(&first.point),
            normal: na_to_vec2(context.normal),
            velocity_a: na_to_vec2(&rb1.velocity_at_point(&first.point)),
            velocity_b: na_to_vec2(&rb2.velocity_at_point(&first.point)),
            previous_points,
            current_points,
        };
        self.listener.pre_solve(&contact);
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single, easy-to-use struct.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// The game uses a Y-up frame in meters, e.g. `Vec2::new(0.0, -9.81)`.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Set the number of solver iterations per step (minimum 1).
    pub fn set_solver_iterations(&mut self, iterations: usize) {
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(iterations).unwrap_or(NonZeroUsize::MIN);
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vec2_to_na(gravity);
    }

    /// Create a rigid body + collider and return handles.
    /// The tag is stored in the body's `user_data` for contact classification.
    pub fn create_body(
        &mut self,
        tag: Option<BodyTag>,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linvel(vec2_to_na(desc.velocity))
            .ccd_enabled(desc.ccd)
            .linear_damping(desc.linear_damping)
            .enabled(desc.enabled)
            .can_sleep(desc.can_sleep)
            .user_data(tag.map(BodyTag::encode).unwrap_or(0))
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .sensor(desc.sensor)
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body, its colliders and every joint attached to it.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Advance the simulation by one step.
    ///
    /// `listener` sees every contact manifold before the solver runs. The world
    /// is borrowed mutably for the whole call, so nothing can be created or
    /// destroyed until it returns.
    pub fn step(&mut self, listener: &dyn ContactListener) {
        let hooks = PreSolveBridge { listener };
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &(),
        );
    }

    /// Apply an instantaneous impulse to a body at its center of mass.
    pub fn apply_impulse(&mut self, body: &PhysicsBody, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    /// Set the linear velocity of a body directly.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_angular_velocity(&mut self, body: &PhysicsBody, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_angvel(angvel, true);
        }
    }

    pub fn angular_velocity(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    pub fn set_gravity_scale(&mut self, body: &PhysicsBody, scale: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_gravity_scale(scale, true);
        }
    }

    pub fn gravity_scale(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.gravity_scale())
            .unwrap_or(1.0)
    }

    /// Enable or disable a body. Disabled bodies are invisible to the simulation.
    pub fn set_enabled(&mut self, body: &PhysicsBody, enabled: bool) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_enabled(enabled);
        }
    }

    pub fn is_enabled(&self, body: &PhysicsBody) -> bool {
        self.bodies
            .get(body.body_handle)
            .is_some_and(|rb| rb.is_enabled())
    }

    /// Set the target position of a kinematic body for the next step.
    pub fn set_kinematic_target(&mut self, body: &PhysicsBody, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_next_kinematic_translation(vec2_to_na(pos));
        }
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Convert a world-space point into the body's local frame.
    pub fn local_point(&self, body: &PhysicsBody, world: Vec2) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| point_to_vec2(&rb.position().inverse_transform_point(&vec2_to_point(world))))
            .unwrap_or(world)
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // -- Joint methods --

    /// Create a joint between two bodies. Returns a handle for later removal.
    pub fn create_joint(
        &mut self,
        body_a: &PhysicsBody,
        body_b: &PhysicsBody,
        desc: &JointDesc,
    ) -> JointHandle {
        let joint: GenericJoint = match *desc {
            JointDesc::Spring { anchor_a, anchor_b, rest_length, stiffness, damping } => {
                SpringJointBuilder::new(rest_length, stiffness, damping)
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .contacts_enabled(false)
                    .build()
                    .into()
            }
            JointDesc::Revolute { anchor_a, anchor_b, collide_connected } => {
                RevoluteJointBuilder::new()
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .contacts_enabled(collide_connected)
                    .build()
                    .into()
            }
            JointDesc::Prismatic { anchor_a, anchor_b, axis, limits, collide_connected } => {
                let axis = nalgebra::Unit::new_normalize(vec2_to_na(axis));
                PrismaticJointBuilder::new(axis)
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .limits(limits)
                    .motor_velocity(0.0, MOTOR_DAMPING)
                    .motor_max_force(0.0)
                    .contacts_enabled(collide_connected)
                    .build()
                    .into()
            }
        };
        let handle = self
            .impulse_joints
            .insert(body_a.body_handle, body_b.body_handle, joint, true);
        JointHandle(handle)
    }

    /// Remove a joint from the simulation. Stale handles are ignored.
    pub fn remove_joint(&mut self, handle: JointHandle) {
        self.impulse_joints.remove(handle.0, true);
    }

    /// Whether the joint is still part of the simulation.
    pub fn contains_joint(&self, handle: JointHandle) -> bool {
        self.impulse_joints.get(handle.0).is_some()
    }

    /// Number of joints in the simulation.
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    /// Displacement and speed of body B relative to body A along a prismatic axis.
    pub fn prismatic_state(&self, handle: JointHandle) -> Option<PrismaticState> {
        let joint = self.impulse_joints.get(handle.0)?;
        let rb1 = self.bodies.get(joint.body1)?;
        let rb2 = self.bodies.get(joint.body2)?;

        let frame1 = rb1.position() * joint.data.local_frame1;
        let frame2 = rb2.position() * joint.data.local_frame2;
        let axis = frame1 * nalgebra::Vector2::x();
        let delta = frame2.translation.vector - frame1.translation.vector;

        Some(PrismaticState {
            translation: delta.dot(&axis),
            speed: (rb2.linvel() - rb1.linvel()).dot(&axis),
        })
    }

    /// Drive a prismatic joint's motor toward `speed`, capped at `max_force`.
    pub fn set_prismatic_motor(&mut self, handle: JointHandle, speed: f32, max_force: f32) {
        let Some((_, joint)) = self
            .impulse_joints
            .iter_mut()
            .find(|(h, _)| *h == handle.0)
        else {
            return;
        };
        joint
            .data
            .set_motor_velocity(JointAxis::LinX, speed, MOTOR_DAMPING)
            .set_motor_max_force(JointAxis::LinX, max_force);
        let (body1, body2) = (joint.body1, joint.body2);
        for body in [body1, body2] {
            if let Some(rb) = self.bodies.get_mut(body) {
                rb.wake_up(true);
            }
        }
    }

    /// Attach `body` to a new kinematic anchor at `target`.
    ///
    /// The body's center hangs off the anchor at its current offset and is
    /// held by an independent spring-damper on each world axis, so motion is
    /// damped in every direction and the body settles where it is dragged.
    /// Pass `damping = 2 * sqrt(stiffness)` for a critically damped hold.
    pub fn create_drag_joint(
        &mut self,
        body: &PhysicsBody,
        target: Vec2,
        stiffness: f32,
        damping: f32,
    ) -> DragJoint {
        let (center, _) = self.body_position(body);
        let anchor = self.create_body(
            None,
            &BodyDesc::kinematic(ColliderDesc::Ball { radius: 0.05 })
                .with_position(target)
                .with_sensor(true),
            ColliderMaterial::default(),
        );
        let joint = GenericJointBuilder::new(JointAxesMask::empty())
            .local_anchor1(vec2_to_point(center - target))
            .local_anchor2(nalgebra::Point2::origin())
            .motor_position(JointAxis::LinX, 0.0, stiffness, damping)
            .motor_position(JointAxis::LinY, 0.0, stiffness, damping)
            .contacts_enabled(false)
            .build();
        let handle = self
            .impulse_joints
            .insert(anchor.body_handle, body.body_handle, joint, true);
        DragJoint {
            anchor,
            joint: JointHandle(handle),
        }
    }

    /// Move the drag anchor; the spring pulls the body along on the next step.
    pub fn set_drag_target(&mut self, drag: &DragJoint, target: Vec2) {
        self.set_kinematic_target(&drag.anchor, target);
    }

    /// Remove the drag joint and its anchor body.
    pub fn remove_drag_joint(&mut self, drag: DragJoint) {
        self.remove_joint(drag.joint);
        self.remove_body(&drag.anchor);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
