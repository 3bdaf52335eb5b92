use crate::core::scene::Scene;
use crate::api::types::{EntityId, GameEvent};
use crate::input::queue::InputQueue;
#[cfg(feature = "physics")]
use crate::core::physics::{
    BodyDesc, BodyTag, ColliderMaterial, ContactListener, JointHandle, PhysicsBody, PhysicsWorld,
};
#[cfg(feature = "physics")]
use crate::components::entity::Entity;
#[cfg(feature = "physics")]
use glam::Vec2;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of render instances (default: 512).
    pub max_instances: usize,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
    /// Gravity vector for physics simulation. Y-up worlds use negative Y.
    #[cfg(feature = "physics")]
    pub gravity: glam::Vec2,
    /// Solver iterations per step.
    #[cfg(feature = "physics")]
    pub velocity_iterations: usize,
    /// Position correction passes per step. Rapier folds position correction
    /// into its velocity solver, so this is recorded but not applied.
    #[cfg(feature = "physics")]
    pub position_iterations: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 16.0,
            world_height: 9.0,
            max_instances: 512,
            max_events: 32,
            #[cfg(feature = "physics")]
            gravity: glam::Vec2::ZERO,
            #[cfg(feature = "physics")]
            velocity_iterations: 8,
            #[cfg(feature = "physics")]
            position_iterations: 3,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// One fixed tick. Read input, step physics, check win conditions.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Apply host-provided tuning, as JSON. Unknown or malformed input is the
    /// game's to report; the default ignores it.
    fn load_settings(&mut self, _json: &str) {}
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub events: Vec<GameEvent>,
    next_id: u32,
    #[cfg(feature = "physics")]
    pub physics: PhysicsWorld,
    /// Joints to destroy once the current step has returned.
    #[cfg(feature = "physics")]
    pending_joints: Vec<JointHandle>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            events: Vec::new(),
            next_id: 1,
            #[cfg(feature = "physics")]
            physics: PhysicsWorld::new(Vec2::ZERO),
            #[cfg(feature = "physics")]
            pending_joints: Vec::new(),
        }
    }

    /// Create an EngineContext whose physics world follows the config.
    pub fn from_config(config: &GameConfig) -> Self {
        #[allow(unused_mut)]
        let mut ctx = Self::new();
        ctx.scene = Scene::with_capacity(config.max_instances);
        #[cfg(feature = "physics")]
        {
            ctx.physics.set_gravity(config.gravity);
            ctx.physics.set_dt(config.fixed_dt);
            ctx.physics.set_solver_iterations(config.velocity_iterations);
        }
        ctx
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a game event to be forwarded to TypeScript.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Clear per-frame transient data.
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
    }

    // -- Physics convenience methods --

    /// Spawn an entity with a physics body. Returns the EntityId.
    /// The body is tagged with the entity's id and role.
    #[cfg(feature = "physics")]
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> EntityId {
        let id = entity.id;
        let tag = BodyTag::new(id, entity.role());
        let body = self.physics.create_body(Some(tag), &desc, material);
        let entity = entity
            .with_pos(desc.position)
            .with_rotation(desc.rotation)
            .with_half_extents(desc.collider.half_extents())
            .with_body(body);
        self.scene.spawn(entity);
        id
    }

    /// Despawn an entity, cleaning up its physics body (and attached joints).
    #[cfg(feature = "physics")]
    pub fn despawn(&mut self, id: EntityId) {
        if let Some(entity) = self.scene.despawn(id) {
            if let Some(body) = &entity.body {
                self.physics.remove_body(body);
            }
        }
    }

    /// Despawn every entity for which `keep` returns false.
    #[cfg(feature = "physics")]
    pub fn despawn_unless(&mut self, keep: impl Fn(&Entity) -> bool) {
        for entity in self.scene.take_unless(keep) {
            if let Some(body) = &entity.body {
                self.physics.remove_body(body);
            }
        }
    }

    /// The physics body backing an entity.
    #[cfg(feature = "physics")]
    pub fn body(&self, id: EntityId) -> Option<PhysicsBody> {
        self.scene.get(id).and_then(|e| e.body)
    }

    /// Apply an instantaneous impulse to an entity's physics body.
    #[cfg(feature = "physics")]
    pub fn apply_impulse(&mut self, id: EntityId, impulse: Vec2) {
        if let Some(body) = self.body(id) {
            self.physics.apply_impulse(&body, impulse);
        }
    }

    /// Set the linear velocity of an entity's physics body.
    #[cfg(feature = "physics")]
    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) {
        if let Some(body) = self.body(id) {
            self.physics.set_velocity(&body, vel);
        }
    }

    /// Get the linear velocity of an entity's physics body.
    #[cfg(feature = "physics")]
    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.body(id)
            .map(|body| self.physics.velocity(&body))
            .unwrap_or(Vec2::ZERO)
    }

    /// Queue a joint for destruction after the current step.
    #[cfg(feature = "physics")]
    pub fn defer_joint_removal(&mut self, joint: JointHandle) {
        self.pending_joints.push(joint);
    }

    /// Number of joints waiting for the next flush.
    #[cfg(feature = "physics")]
    pub fn pending_joint_removals(&self) -> usize {
        self.pending_joints.len()
    }

    /// Destroy every queued joint. Returns how many were queued.
    #[cfg(feature = "physics")]
    pub fn flush_destruction_queue(&mut self) -> usize {
        let count = self.pending_joints.len();
        for joint in self.pending_joints.drain(..) {
            self.physics.remove_joint(joint);
        }
        count
    }

    /// Step the physics simulation and sync positions back to entities.
    /// `listener` observes contacts during the step; it cannot mutate the world.
    #[cfg(feature = "physics")]
    pub fn step_physics(&mut self, listener: &dyn ContactListener) {
        self.physics.step(listener);

        for entity in self.scene.iter_mut() {
            if let Some(body) = &entity.body {
                let (pos, rot) = self.physics.body_position(body);
                entity.pos = pos;
                entity.rotation = rot;
            }
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg(feature = "physics")]
mod physics_tests {
    use super::*;
    use crate::core::physics::{ColliderDesc, JointDesc};

    #[test]
    fn spawn_with_body_creates_entity_and_physics() {
        let mut ctx = EngineContext::new();
        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.4 })
            .with_position(Vec2::new(1.0, 2.0));

        ctx.spawn_with_body(Entity::new(id, 1), desc, ColliderMaterial::default());

        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
        let entity = ctx.scene.get(id).unwrap();
        assert!(entity.body.is_some());
        assert_eq!(entity.pos, Vec2::new(1.0, 2.0));
        assert_eq!(entity.half_extents, Vec2::splat(0.4));
    }

    #[test]
    fn despawn_cleans_up_physics() {
        let mut ctx = EngineContext::new();
        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 });

        ctx.spawn_with_body(Entity::new(id, 0), desc, ColliderMaterial::default());
        assert_eq!(ctx.physics.body_count(), 1);

        ctx.despawn(id);
        assert_eq!(ctx.scene.len(), 0);
        assert_eq!(ctx.physics.body_count(), 0);
    }

    #[test]
    fn despawn_unless_keeps_matching_entities() {
        let mut ctx = EngineContext::new();
        for role in [0, 1, 1] {
            let id = ctx.next_id();
            let desc = BodyDesc::fixed(ColliderDesc::Ball { radius: 0.5 });
            ctx.spawn_with_body(Entity::new(id, role), desc, ColliderMaterial::default());
        }

        ctx.despawn_unless(|e| e.role() == 0);
        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
    }

    #[test]
    fn step_physics_syncs_positions() {
        let mut ctx = EngineContext::from_config(&GameConfig {
            gravity: Vec2::new(0.0, -9.81),
            ..GameConfig::default()
        });

        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 });
        ctx.spawn_with_body(Entity::new(id, 0), desc, ColliderMaterial::default());

        for _ in 0..10 {
            ctx.step_physics(&());
        }

        let entity = ctx.scene.get(id).unwrap();
        assert!(entity.pos.y < 0.0, "Entity should have fallen: y={}", entity.pos.y);
    }

    #[test]
    fn deferred_joints_survive_until_flush() {
        let mut ctx = EngineContext::new();
        let a = ctx.next_id();
        let b = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(a, 0),
            BodyDesc::fixed(ColliderDesc::Ball { radius: 0.1 }),
            ColliderMaterial::default(),
        );
        ctx.spawn_with_body(
            Entity::new(b, 0),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.1 }).with_position(Vec2::new(0.3, 0.0)),
            ColliderMaterial::default(),
        );
        let (body_a, body_b) = (ctx.body(a).unwrap(), ctx.body(b).unwrap());
        let joint = ctx.physics.create_joint(&body_a, &body_b, &JointDesc::Revolute {
            anchor_a: Vec2::new(0.3, 0.0),
            anchor_b: Vec2::ZERO,
            collide_connected: false,
        });

        ctx.defer_joint_removal(joint);
        ctx.step_physics(&());
        assert!(ctx.physics.contains_joint(joint));
        assert_eq!(ctx.pending_joint_removals(), 1);

        assert_eq!(ctx.flush_destruction_queue(), 1);
        assert!(!ctx.physics.contains_joint(joint));
        assert_eq!(ctx.flush_destruction_queue(), 0);
    }
}
