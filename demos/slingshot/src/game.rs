use glam::Vec2;
use sling_engine::*;

use crate::entities::{projectile, Ability, HazardTarget, Linkage, Obstacle, ObstacleClass, Oscillator, Projectile};
use crate::levels::{self, LevelLayout, LEVELS};
use crate::resolver::{CollisionResolver, Consequence};
use crate::roles::Role;
use crate::session::{Session, EVENT_CAMPAIGN_COMPLETE};
use crate::settings::Settings;

const FIXED_DT: f32 = 1.0 / 60.0;
const GRAVITY: Vec2 = Vec2::new(0.0, -9.81);
const GROUND_FRICTION: f32 = 1.0;
const WORLD_H: f32 = 10.0;

/// Custom event kinds from the UI
pub const CUSTOM_RETRY: u32 = 1;
pub const CUSTOM_NEXT_LEVEL: u32 = 2;

/// Space bar: fire the current bird's ability.
pub const KEY_ABILITY: u32 = 32;

/// The bird currently held on the sling.
struct Drag {
    projectile: EntityId,
    origin: Vec2,
    target: Vec2,
    joint: DragJoint,
}

pub struct SlingshotGame {
    settings: Settings,
    resolver: CollisionResolver,
    session: Session,
    elapsed: f32,
    ground: Option<EntityId>,
    /// Birds in firing order; only the first is playable.
    projectiles: Vec<Projectile>,
    /// Children of split birds. They never count toward birds left.
    splits: Vec<Projectile>,
    targets: Vec<HazardTarget>,
    obstacles: Vec<Obstacle>,
    linkages: Vec<Linkage>,
    oscillators: Vec<Oscillator>,
    drag: Option<Drag>,
}

impl SlingshotGame {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            resolver: CollisionResolver::new(settings.thresholds()),
            settings,
            session: Session::new(),
            elapsed: 0.0,
            ground: None,
            projectiles: Vec::new(),
            splits: Vec::new(),
            targets: Vec::new(),
            obstacles: Vec::new(),
            linkages: Vec::new(),
            oscillators: Vec::new(),
            drag: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn splits(&self) -> &[Projectile] {
        &self.splits
    }

    pub fn targets(&self) -> &[HazardTarget] {
        &self.targets
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn linkages(&self) -> &[Linkage] {
        &self.linkages
    }

    pub fn oscillators(&self) -> &[Oscillator] {
        &self.oscillators
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Seconds of simulation since the game started.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // -- World building --

    fn build_ground(&mut self, ctx: &mut EngineContext) {
        let id = ctx.next_id();
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: levels::GROUND_HALF_WIDTH,
            half_height: levels::GROUND_HALF_HEIGHT,
        })
        .with_position(levels::GROUND_CENTER);
        let material = ColliderMaterial {
            restitution: 0.0,
            friction: GROUND_FRICTION,
            density: 1.0,
        };
        ctx.spawn_with_body(Entity::new(id, Role::Other.code()), desc, material);
        self.ground = Some(id);
    }

    /// Queue a bird at `pos`. It stays disabled until grabbed.
    pub fn add_projectile(&mut self, ctx: &mut EngineContext, ability: Ability, pos: Vec2) -> EntityId {
        let bird = Projectile::spawn(ctx, ability, pos, projectile::SIZE, false);
        let id = bird.id;
        self.projectiles.push(bird);
        id
    }

    pub fn add_obstacle(
        &mut self,
        ctx: &mut EngineContext,
        class: ObstacleClass,
        pos: Vec2,
        angle_deg: f32,
    ) -> EntityId {
        let obstacle = Obstacle::spawn(ctx, class, pos, angle_deg);
        let id = obstacle.id;
        self.obstacles.push(obstacle);
        id
    }

    pub fn add_target(&mut self, ctx: &mut EngineContext, pos: Vec2) -> EntityId {
        let target = HazardTarget::spawn(ctx, pos);
        let id = target.id;
        self.targets.push(target);
        id
    }

    /// Hang a rope from obstacle `head` (and `tail`, if any), by index.
    pub fn add_linkage(
        &mut self,
        ctx: &mut EngineContext,
        start: Vec2,
        length: usize,
        head: usize,
        tail: Option<usize>,
    ) -> bool {
        let body_of = |index: usize| self.obstacles.get(index).and_then(|o| ctx.body(o.id));
        let Some(head_body) = body_of(head) else {
            log::warn!("linkage anchor {} does not exist", head);
            return false;
        };
        let tail_body = tail.and_then(body_of);
        let linkage = Linkage::spawn(ctx, start, length, head_body, tail_body);
        self.linkages.push(linkage);
        true
    }

    pub fn add_oscillator(&mut self, ctx: &mut EngineContext, pos: Vec2) -> bool {
        let Some(ground) = self.ground.and_then(|id| ctx.body(id)) else {
            log::warn!("oscillator needs the ground to slide against");
            return false;
        };
        match Oscillator::spawn(ctx, pos, &ground) {
            Some(osc) => {
                self.oscillators.push(osc);
                true
            }
            None => false,
        }
    }

    fn build_level(&mut self, ctx: &mut EngineContext, layout: &LevelLayout) {
        let sling = levels::to_world(levels::SLING.0, levels::SLING.1);
        for &ability in layout.birds {
            self.add_projectile(ctx, ability, sling);
        }
        for o in layout.obstacles {
            self.add_obstacle(ctx, o.class, levels::to_world(o.x, o.y), o.angle_deg);
        }
        for &(x, y) in layout.targets {
            self.add_target(ctx, levels::to_world(x, y));
        }
        if let Some(link) = layout.linkage {
            self.add_linkage(ctx, levels::to_world(link.x, link.y), link.length, link.head, link.tail);
        }
        if let Some((x, y)) = layout.oscillator {
            self.add_oscillator(ctx, levels::to_world(x, y));
        }
        self.show_front_projectile(ctx);
    }

    /// Destroy everything but the ground.
    fn clear_level(&mut self, ctx: &mut EngineContext) {
        if let Some(drag) = self.drag.take() {
            ctx.physics.remove_drag_joint(drag.joint);
        }
        let ground = self.ground;
        ctx.despawn_unless(|e| Some(e.id) == ground);
        ctx.flush_destruction_queue();
        self.resolver.drain();

        self.projectiles.clear();
        self.splits.clear();
        self.targets.clear();
        self.obstacles.clear();
        self.linkages.clear();
        self.oscillators.clear();
    }

    /// Tear down the current level and set up `index` from its layout.
    pub fn load_level(&mut self, ctx: &mut EngineContext, index: usize) {
        let Some(layout) = LEVELS.get(index) else {
            log::warn!("no level {}", index + 1);
            return;
        };
        self.clear_level(ctx);
        self.build_level(ctx, layout);
        self.session.begin(ctx, index, self.projectiles.len());
        log::info!(
            "level {}: {} birds, {} targets, {} obstacles",
            index + 1,
            self.projectiles.len(),
            self.targets.len(),
            self.obstacles.len()
        );
    }

    pub fn retry(&mut self, ctx: &mut EngineContext) {
        self.load_level(ctx, self.session.level);
    }

    /// Advance a level; after the last one, announce completion and start over.
    pub fn next_level(&mut self, ctx: &mut EngineContext) {
        let next = self.session.level + 1;
        if next < LEVELS.len() {
            self.load_level(ctx, next);
        } else {
            log::info!("campaign complete");
            ctx.emit_event(GameEvent::new(EVENT_CAMPAIGN_COMPLETE, 0.0));
            self.load_level(ctx, 0);
        }
    }

    // -- Sling --

    /// Grab the front bird if `pos` is on it and it has not flown yet.
    pub fn begin_drag(&mut self, ctx: &mut EngineContext, pos: Vec2) -> bool {
        if self.drag.is_some() || self.session.is_over() {
            return false;
        }
        let Some(front) = self.projectiles.first() else {
            return false;
        };
        if front.is_launched() {
            return false;
        }
        let id = front.id;
        if !ctx.scene.get(id).is_some_and(|e| e.contains(pos)) {
            return false;
        }
        let Some(body) = ctx.body(id) else {
            return false;
        };

        ctx.physics.set_enabled(&body, true);
        let joint = ctx.physics.create_drag_joint(
            &body,
            pos,
            self.settings.drag_stiffness,
            self.settings.drag_damping,
        );
        self.drag = Some(Drag {
            projectile: id,
            origin: pos,
            target: pos,
            joint,
        });
        log::debug!("drag start at {:?}", pos);
        true
    }

    /// Move the drag target, kept within the drag radius of where it began.
    pub fn drag_to(&mut self, pos: Vec2) {
        if let Some(drag) = &mut self.drag {
            drag.target = clamp_to_radius(drag.origin, pos, self.settings.drag_radius);
        }
    }

    /// Let go: drop the drag constraint and fling the bird back past the origin.
    /// The raw release point sets the pull; only `max_pull` caps it.
    pub fn end_drag(&mut self, ctx: &mut EngineContext, pos: Vec2) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        ctx.physics.remove_drag_joint(drag.joint);

        // The shot depends on the pull alone, not on how the bird was moving.
        let impulse = launch_impulse(drag.origin, pos, &self.settings);
        if let Some(body) = ctx.body(drag.projectile) {
            ctx.physics.set_velocity(&body, Vec2::ZERO);
            ctx.physics.set_angular_velocity(&body, 0.0);
            ctx.physics.apply_impulse(&body, impulse);
        }

        if let Some(bird) = self.projectiles.iter_mut().find(|p| p.id == drag.projectile) {
            bird.launch(self.elapsed);
        }
        let left = self.projectiles.len().saturating_sub(1);
        self.session.set_birds_left(ctx, left);
        log::debug!("launch with impulse {:?}", impulse);
        true
    }

    /// Fire the front bird's ability. Only works once, and only in flight.
    pub fn trigger_ability(&mut self, ctx: &mut EngineContext) -> bool {
        let Some(front) = self.projectiles.first_mut() else {
            return false;
        };
        let Some(ability) = front.trigger_ability() else {
            return false;
        };
        let parent = front.clone();

        match ability {
            Ability::Classic => {}
            Ability::HeavyDrop => {
                if let Some(body) = ctx.body(parent.id) {
                    ctx.physics.set_gravity_scale(&body, self.settings.heavy_drop_gravity_scale);
                }
            }
            Ability::Splitter => self.split(ctx, &parent),
        }
        true
    }

    fn split(&mut self, ctx: &mut EngineContext, parent: &Projectile) {
        let Some(body) = ctx.body(parent.id) else {
            return;
        };
        let (pos, _) = ctx.physics.body_position(&body);
        let vel = ctx.physics.velocity(&body);
        let spin = ctx.physics.angular_velocity(&body);
        let offset = self.settings.split_offset / levels::ASPECT;

        for side in [1.0, -1.0] {
            let child_pos = pos + Vec2::new(side * offset, 0.0);
            let mut child = Projectile::spawn(ctx, parent.ability, child_pos, projectile::CHILD_SIZE, true);
            child.inherit_flight(parent);
            if let Some(child_body) = ctx.body(child.id) {
                ctx.physics.set_velocity(&child_body, vel + Vec2::new(side * self.settings.split_speed, 0.0));
                ctx.physics.set_angular_velocity(&child_body, -spin);
            }
            self.splits.push(child);
        }
    }

    // -- Tick --

    /// Everything after the physics step: consequences, lifetimes, removal,
    /// deferred joints and the win/lose check, in that order.
    fn after_step(&mut self, ctx: &mut EngineContext) {
        self.apply_consequences(ctx);
        self.update_entities(ctx);
        self.sweep_dead(ctx);
        ctx.flush_destruction_queue();
        self.show_front_projectile(ctx);
        self.session
            .update_outcome(ctx, self.targets.len(), self.projectiles.len());
    }

    fn apply_consequences(&mut self, ctx: &mut EngineContext) {
        for consequence in self.resolver.drain() {
            match consequence {
                Consequence::Kill(id) => {
                    let killed = self
                        .targets
                        .iter_mut()
                        .find(|t| t.id == id)
                        .is_some_and(HazardTarget::kill);
                    if killed {
                        self.session.add_score(ctx, self.settings.kill_score);
                    }
                }
                Consequence::Damage { target, amount } => {
                    let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == target) else {
                        continue;
                    };
                    if obstacle.take_damage(amount) {
                        if let Some(entity) = ctx.scene.get_mut(target) {
                            entity.variant = obstacle.variant();
                        }
                    }
                }
                Consequence::Break(segment) => {
                    let joint = self
                        .linkages
                        .iter_mut()
                        .find(|l| l.owns(segment))
                        .and_then(Linkage::break_link);
                    if let Some(joint) = joint {
                        ctx.defer_joint_removal(joint);
                    }
                }
            }
        }
    }

    fn update_entities(&mut self, ctx: &mut EngineContext) {
        self.elapsed += FIXED_DT;
        let lifetime = self.settings.projectile_lifetime;
        for bird in self.projectiles.iter_mut().chain(self.splits.iter_mut()) {
            bird.update(self.elapsed, lifetime);
        }
        for osc in &self.oscillators {
            osc.update(ctx);
        }
    }

    fn sweep_dead(&mut self, ctx: &mut EngineContext) {
        sweep(ctx, &mut self.projectiles, Projectile::is_alive, |p| p.id);
        sweep(ctx, &mut self.splits, Projectile::is_alive, |p| p.id);
        sweep(ctx, &mut self.targets, HazardTarget::is_alive, |t| t.id);
        let destroyed = sweep(ctx, &mut self.obstacles, Obstacle::is_alive, |o| o.id);
        if destroyed > 0 {
            self.session
                .add_score(ctx, destroyed as u32 * self.settings.obstacle_score);
        }
    }

    /// Only the bird on the sling is drawn; the rest of the queue waits unseen.
    fn show_front_projectile(&self, ctx: &mut EngineContext) {
        for (i, bird) in self.projectiles.iter().enumerate() {
            if let Some(entity) = ctx.scene.get_mut(bird.id) {
                entity.active = i == 0;
            }
        }
    }
}

impl Default for SlingshotGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for SlingshotGame {
    fn config(&self) -> GameConfig {
        GameConfig {
            fixed_dt: FIXED_DT,
            world_width: levels::GROUND_HALF_WIDTH * 2.0,
            world_height: WORLD_H,
            max_instances: 128,
            max_events: 32,
            gravity: GRAVITY,
            velocity_iterations: 8,
            position_iterations: 3,
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        self.build_ground(ctx);
        self.load_level(ctx, 0);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        for event in input.iter() {
            if let Some(pos) = event.pointer_pos() {
                match event {
                    InputEvent::PointerDown { .. } => {
                        self.begin_drag(ctx, pos);
                    }
                    InputEvent::PointerMove { .. } => self.drag_to(pos),
                    _ => {
                        self.end_drag(ctx, pos);
                    }
                }
                continue;
            }
            match *event {
                InputEvent::Custom { kind: CUSTOM_RETRY, .. } => {
                    self.retry(ctx);
                    return;
                }
                InputEvent::Custom { kind: CUSTOM_NEXT_LEVEL, .. } => {
                    self.next_level(ctx);
                    return;
                }
                InputEvent::KeyDown { key_code: KEY_ABILITY } => {
                    self.trigger_ability(ctx);
                }
                _ => {}
            }
        }

        if let Some(drag) = &self.drag {
            ctx.physics.set_drag_target(&drag.joint, drag.target);
        }

        ctx.step_physics(&self.resolver);
        self.after_step(ctx);
    }

    fn load_settings(&mut self, json: &str) {
        match Settings::from_json(json) {
            Ok(settings) => {
                self.resolver = CollisionResolver::new(settings.thresholds());
                self.settings = settings;
                log::info!("settings loaded");
            }
            Err(e) => log::warn!("ignoring settings: {}", e),
        }
    }
}

/// `point`, pulled back to at most `radius` from `origin`.
pub fn clamp_to_radius(origin: Vec2, point: Vec2, radius: f32) -> Vec2 {
    origin + (point - origin).clamp_length_max(radius)
}

/// Impulse for a bird released at `release` after a drag that began at `origin`.
pub fn launch_impulse(origin: Vec2, release: Vec2, settings: &Settings) -> Vec2 {
    (origin - release).clamp_length_max(settings.max_pull) * settings.launch_impulse
}

/// Despawn every dead item and drop it from `items`. Returns how many went.
fn sweep<T>(
    ctx: &mut EngineContext,
    items: &mut Vec<T>,
    is_alive: impl Fn(&T) -> bool,
    id_of: impl Fn(&T) -> EntityId,
) -> usize {
    let before = items.len();
    items.retain(|item| {
        if is_alive(item) {
            return true;
        }
        ctx.despawn(id_of(item));
        false
    });
    before - items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{impact, tag};
    use crate::session::{Outcome, EVENT_BIRDS_LEFT, EVENT_GAME_OVER, EVENT_LEVEL, EVENT_SCORE};

    fn zero_g_context() -> EngineContext {
        EngineContext::from_config(&GameConfig {
            gravity: Vec2::ZERO,
            ..SlingshotGame::new().config()
        })
    }

    fn started() -> (SlingshotGame, EngineContext) {
        let mut game = SlingshotGame::new();
        let mut ctx = EngineContext::from_config(&game.config());
        game.init(&mut ctx);
        (game, ctx)
    }

    fn sling() -> Vec2 {
        levels::to_world(levels::SLING.0, levels::SLING.1)
    }

    fn has_event(ctx: &EngineContext, kind: u32) -> bool {
        ctx.events.iter().any(|e| e.kind as u32 == kind)
    }

    /// Grab the front bird and release it `pull` away from the grab point.
    fn fling(game: &mut SlingshotGame, ctx: &mut EngineContext, pull: Vec2) {
        assert!(game.begin_drag(ctx, sling()));
        game.drag_to(sling() + pull);
        assert!(game.end_drag(ctx, sling() + pull));
    }

    #[test]
    fn fast_projectile_kills_target_end_to_end() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        let target = game.add_target(&mut ctx, Vec2::ZERO);
        let bird = game.add_projectile(&mut ctx, Ability::Classic, Vec2::new(0.65, 0.0));

        let body = ctx.body(bird).unwrap();
        ctx.physics.set_enabled(&body, true);
        ctx.physics.set_velocity(&body, Vec2::new(-3.0, 0.0));
        game.projectiles[0].launch(0.0);

        let input = InputQueue::new();
        for _ in 0..30 {
            game.update(&mut ctx, &input);
            if game.targets().is_empty() {
                break;
            }
        }

        assert!(game.targets().is_empty(), "target should be dead");
        assert!(ctx.scene.get(target).is_none());
        assert_eq!(game.session().score(), 50);
        assert_eq!(game.session().outcome(), Outcome::Won);
    }

    #[test]
    fn slow_projectile_leaves_target_alive() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        game.add_target(&mut ctx, Vec2::ZERO);
        let bird = game.add_projectile(&mut ctx, Ability::Classic, Vec2::new(0.65, 0.0));

        let body = ctx.body(bird).unwrap();
        ctx.physics.set_enabled(&body, true);
        ctx.physics.set_velocity(&body, Vec2::new(-1.0, 0.0));
        game.projectiles[0].launch(0.0);

        let input = InputQueue::new();
        for _ in 0..30 {
            game.update(&mut ctx, &input);
        }
        assert_eq!(game.targets().len(), 1);
        assert_eq!(game.session().score(), 0);
    }

    #[test]
    fn destructible_block_breaks_on_third_hit_with_one_bonus() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        game.add_target(&mut ctx, Vec2::new(5.0, 0.0));
        game.add_projectile(&mut ctx, Ability::Classic, Vec2::new(-5.0, 0.0));
        let block = game.add_obstacle(&mut ctx, ObstacleClass::DestructibleBlock, Vec2::ZERO, 0.0);
        let bird = tag(999, Role::Projectile);
        let wall = tag(block.0, Role::Obstacle);

        let mut health = Vec::new();
        for speed in [3.0, 4.0, 5.0] {
            game.resolver.pre_solve(&impact(bird, wall, speed));
            game.apply_consequences(&mut ctx);
            health.push(game.obstacles.first().map(Obstacle::health));
            if health.len() == 2 {
                assert_eq!(ctx.scene.get(block).unwrap().variant, game.obstacles[0].variant());
                assert!(game.obstacles[0].is_damaged());
            }
            game.after_step(&mut ctx);
        }

        assert_eq!(health, vec![Some(7), Some(3), Some(-2)]);
        assert!(game.obstacles().is_empty());
        assert!(ctx.scene.get(block).is_none());
        assert_eq!(game.session().score(), 10);

        game.after_step(&mut ctx);
        assert_eq!(game.session().score(), 10, "bonus is awarded once");
    }

    #[test]
    fn repeated_kills_score_once() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        let target = game.add_target(&mut ctx, Vec2::ZERO);
        game.add_target(&mut ctx, Vec2::new(3.0, 0.0));
        game.add_projectile(&mut ctx, Ability::Classic, Vec2::new(-5.0, 0.0));
        let hit = impact(tag(999, Role::Projectile), tag(target.0, Role::HazardTarget), 4.0);

        game.resolver.pre_solve(&hit);
        game.resolver.pre_solve(&hit);
        game.after_step(&mut ctx);
        game.resolver.pre_solve(&hit);
        game.after_step(&mut ctx);

        assert_eq!(game.session().score(), 50);
        assert_eq!(game.targets().len(), 1);
        assert_eq!(game.session().outcome(), Outcome::InProgress);
    }

    #[test]
    fn double_break_destroys_one_joint() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        game.add_target(&mut ctx, Vec2::new(5.0, 0.0));
        game.add_projectile(&mut ctx, Ability::Classic, Vec2::new(-5.0, 0.0));
        game.add_obstacle(&mut ctx, ObstacleClass::IndestructibleBlock, Vec2::new(-0.6, 0.0), 0.0);
        game.add_obstacle(&mut ctx, ObstacleClass::IndestructibleBlock, Vec2::new(2.4, 0.0), 0.0);
        assert!(game.add_linkage(&mut ctx, Vec2::new(0.0, 0.3), 9, 0, Some(1)));
        let joints = ctx.physics.joint_count();
        let segments = game.linkages()[0].segments().to_vec();
        let bird = tag(999, Role::Projectile);

        game.resolver.pre_solve(&impact(bird, tag(segments[2].0, Role::LinkageSegment), 3.0));
        game.resolver.pre_solve(&impact(bird, tag(segments[7].0, Role::LinkageSegment), 3.0));
        game.apply_consequences(&mut ctx);
        assert_eq!(ctx.pending_joint_removals(), 1);
        assert_eq!(ctx.physics.joint_count(), joints, "nothing is destroyed before the flush");

        game.after_step(&mut ctx);
        assert_eq!(ctx.physics.joint_count(), joints - 1);
        assert!(game.linkages()[0].is_broken());
    }

    #[test]
    fn no_targets_means_won() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        game.add_projectile(&mut ctx, Ability::Classic, Vec2::ZERO);

        game.after_step(&mut ctx);
        assert_eq!(game.session().outcome(), Outcome::Won);
        assert!(has_event(&ctx, EVENT_GAME_OVER));
    }

    #[test]
    fn no_birds_with_targets_left_means_lost() {
        let mut game = SlingshotGame::new();
        let mut ctx = zero_g_context();
        game.add_target(&mut ctx, Vec2::ZERO);

        game.after_step(&mut ctx);
        assert_eq!(game.session().outcome(), Outcome::Lost);
    }

    #[test]
    fn init_builds_first_level() {
        let (game, ctx) = started();
        assert_eq!(game.projectiles().len(), 3);
        assert_eq!(game.obstacles().len(), 4);
        assert_eq!(game.targets().len(), 1);
        assert_eq!(game.session().birds_left(), 3);
        assert!(has_event(&ctx, EVENT_LEVEL));
        assert!(has_event(&ctx, EVENT_BIRDS_LEFT));

        let visible: Vec<bool> = game
            .projectiles()
            .iter()
            .map(|p| ctx.scene.get(p.id).unwrap().active)
            .collect();
        assert_eq!(visible, vec![true, false, false]);
    }

    #[test]
    fn later_levels_carry_rope_and_spring() {
        let (mut game, mut ctx) = started();
        game.load_level(&mut ctx, 1);
        assert_eq!(game.linkages().len(), 1);
        assert_eq!(game.linkages()[0].segments().len(), 10);
        assert_eq!(game.targets().len(), 2);

        game.load_level(&mut ctx, 2);
        assert!(game.linkages().is_empty());
        assert_eq!(game.oscillators().len(), 1);
        assert_eq!(game.obstacles().len(), 7);
        assert_eq!(ctx.scene.count_role(Role::LinkageSegment.code()), 0);
    }

    #[test]
    fn drag_and_release_launches_front_bird() {
        let (mut game, mut ctx) = started();
        ctx.clear_frame_data();
        let front = game.projectiles()[0].id;

        assert!(game.begin_drag(&mut ctx, sling()));
        assert!(game.is_dragging());
        assert!(!game.begin_drag(&mut ctx, sling()), "one drag at a time");

        game.drag_to(sling() + Vec2::new(-3.0, 0.0));
        assert!(game.end_drag(&mut ctx, sling() + Vec2::new(-3.0, 0.0)));

        assert!(!game.is_dragging());
        assert!(game.projectiles()[0].is_launched());
        assert_eq!(game.session().birds_left(), 2);
        assert!(has_event(&ctx, EVENT_BIRDS_LEFT));
        assert!(ctx.velocity(front).x > 0.0, "pulled left, flies right");
        assert!(!game.begin_drag(&mut ctx, sling()), "launched birds cannot be grabbed");
    }

    /// Grab the front bird, hold it at `sling + pull` for `hold` ticks, let go.
    /// Returns the bird and its velocity right after release.
    fn hold_and_release(
        game: &mut SlingshotGame,
        ctx: &mut EngineContext,
        pull: Vec2,
        hold: usize,
    ) -> (EntityId, Vec2) {
        let bird = game.projectiles()[0].id;
        let input = InputQueue::new();
        assert!(game.begin_drag(ctx, sling()));
        game.drag_to(sling() + pull);
        for _ in 0..hold {
            game.update(ctx, &input);
        }
        assert!(game.end_drag(ctx, sling() + pull));
        (bird, ctx.velocity(bird))
    }

    #[test]
    fn released_bird_flies_along_the_pull() {
        let (mut game, mut ctx) = started();
        let pull = Vec2::new(-0.7, -0.7);
        let (bird, _) = hold_and_release(&mut game, &mut ctx, pull, 30);
        let released_at = ctx.scene.get(bird).unwrap().pos;

        let input = InputQueue::new();
        let ticks = 30;
        for _ in 0..ticks {
            game.update(&mut ctx, &input);
        }

        let landed_at = ctx.scene.get(bird).unwrap().pos;
        assert!(landed_at.x > sling().x, "bird moved right of the sling: {:?}", landed_at);
        let mean_vel = (landed_at - released_at) / (ticks as f32 * FIXED_DT);
        let aim = (-pull).normalize();
        assert!(mean_vel.x > 0.0 && mean_vel.y > 0.0, "mean velocity {:?}", mean_vel);
        assert!(mean_vel.normalize().dot(aim) > 0.9, "mean velocity {:?} vs aim {:?}", mean_vel, aim);
    }

    #[test]
    fn shot_does_not_depend_on_hold_time() {
        let pull = Vec2::new(-0.7, -0.7);
        let mut shots = Vec::new();
        for hold in [1, 20, 60, 180] {
            let (mut game, mut ctx) = started();
            let (_, vel) = hold_and_release(&mut game, &mut ctx, pull, hold);
            shots.push(vel);
        }
        for vel in &shots[1..] {
            assert!((*vel - shots[0]).length() < 1e-3, "{:?} vs {:?}", vel, shots[0]);
        }
    }

    #[test]
    fn held_bird_settles_at_the_drag_target() {
        let (mut game, mut ctx) = started();
        let bird = game.projectiles()[0].id;
        let input = InputQueue::new();
        assert!(game.begin_drag(&mut ctx, sling()));
        game.drag_to(sling() + Vec2::new(-0.7, -0.7));
        for _ in 0..180 {
            game.update(&mut ctx, &input);
        }
        assert!(ctx.velocity(bird).length() < 0.1, "still moving: {:?}", ctx.velocity(bird));
        let pos = ctx.scene.get(bird).unwrap().pos;
        assert!((pos - (sling() + Vec2::new(-0.7, -0.7))).length() < 0.1, "held at {:?}", pos);
    }

    #[test]
    fn longer_pull_launches_harder_up_to_the_cap() {
        let speed_for = |pull: Vec2| {
            let (mut game, mut ctx) = started();
            let (_, vel) = hold_and_release(&mut game, &mut ctx, pull, 0);
            vel.length()
        };
        let short = speed_for(Vec2::new(-1.0, 0.0));
        let long = speed_for(Vec2::new(-3.0, 0.0));
        let capped = speed_for(Vec2::new(-5.0, 0.0));
        let beyond = speed_for(Vec2::new(-8.0, 0.0));

        assert!((long / short - 3.0).abs() < 1e-3, "{} vs {}", long, short);
        assert!((capped / short - 5.0).abs() < 1e-3);
        assert!((beyond - capped).abs() < 1e-3, "max_pull caps the shot");
    }

    #[test]
    fn pointer_events_drive_the_sling() {
        let (mut game, mut ctx) = started();
        let mut input = InputQueue::new();
        let pulled = sling() + Vec2::new(-0.5, -0.2);

        input.push(InputEvent::PointerDown { x: sling().x, y: sling().y });
        input.push(InputEvent::PointerMove { x: pulled.x, y: pulled.y });
        game.update(&mut ctx, &input);
        input.drain();
        assert!(game.is_dragging());

        input.push(InputEvent::PointerUp { x: pulled.x, y: pulled.y });
        game.update(&mut ctx, &input);
        assert!(!game.is_dragging());
        assert!(game.projectiles()[0].is_launched());
        assert!(ctx.velocity(game.projectiles()[0].id).x > 0.0);
    }

    #[test]
    fn drag_misses_outside_the_bird() {
        let (mut game, mut ctx) = started();
        assert!(!game.begin_drag(&mut ctx, sling() + Vec2::new(2.0, 0.0)));
        assert!(!game.end_drag(&mut ctx, sling()));
    }

    #[test]
    fn drag_target_stays_within_radius() {
        let origin = Vec2::new(1.0, 1.0);
        let clamped = clamp_to_radius(origin, Vec2::new(10.0, 1.0), 1.0);
        assert!((clamped - Vec2::new(2.0, 1.0)).length() < 1e-5);
        assert_eq!(clamp_to_radius(origin, Vec2::new(1.5, 1.0), 1.0), Vec2::new(1.5, 1.0));

        let settings = Settings::default();
        let impulse = launch_impulse(Vec2::ZERO, Vec2::new(-10.0, 0.0), &settings);
        assert!((impulse.x - settings.max_pull * settings.launch_impulse).abs() < 1e-4);
    }

    #[test]
    fn ability_needs_launch_and_fires_once() {
        let (mut game, mut ctx) = started();
        game.load_level(&mut ctx, 2);
        assert!(!game.trigger_ability(&mut ctx));

        fling(&mut game, &mut ctx, Vec2::new(-1.0, -0.5));
        assert!(game.trigger_ability(&mut ctx));
        assert!(!game.trigger_ability(&mut ctx));

        let body = ctx.body(game.projectiles()[0].id).unwrap();
        assert!((ctx.physics.gravity_scale(&body) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn splitter_spawns_two_children_sharing_the_flight() {
        let (mut game, mut ctx) = started();
        game.load_level(&mut ctx, 1);
        fling(&mut game, &mut ctx, Vec2::new(-1.0, 0.0));
        let parent = game.projectiles()[0].clone();
        let parent_vel = ctx.velocity(parent.id);

        assert!(game.trigger_ability(&mut ctx));
        assert_eq!(game.splits().len(), 2);
        assert_eq!(game.projectiles().len(), 3, "children are not queued birds");
        for child in game.splits() {
            assert!(child.is_launched());
            assert_eq!(child.launch_time(), parent.launch_time());
            assert!(ctx.scene.get(child.id).unwrap().active);
        }

        let spread = ctx.velocity(game.splits()[0].id) - ctx.velocity(game.splits()[1].id);
        assert!((spread - Vec2::new(2.0, 0.0)).length() < 1e-4);
        let mean = (ctx.velocity(game.splits()[0].id) + ctx.velocity(game.splits()[1].id)) / 2.0;
        assert!((mean - parent_vel).length() < 1e-4);
    }

    #[test]
    fn launched_bird_expires_and_next_one_takes_the_sling() {
        let (mut game, mut ctx) = started();
        fling(&mut game, &mut ctx, Vec2::new(-0.5, 0.0));
        let first = game.projectiles()[0].id;

        let input = InputQueue::new();
        let ticks = (game.settings().projectile_lifetime / FIXED_DT) as usize + 5;
        for _ in 0..ticks {
            game.update(&mut ctx, &input);
        }

        assert!(ctx.scene.get(first).is_none());
        assert_eq!(game.projectiles().len(), 2);
        let next = game.projectiles()[0].id;
        assert!(ctx.scene.get(next).unwrap().active);
        assert!(!game.projectiles()[0].is_launched());
    }

    #[test]
    fn custom_events_retry_and_advance() {
        let (mut game, mut ctx) = started();
        let mut input = InputQueue::new();

        input.push(InputEvent::Custom { kind: CUSTOM_NEXT_LEVEL, a: 0.0, b: 0.0, c: 0.0 });
        game.update(&mut ctx, &input);
        assert_eq!(game.session().level, 1);
        input.drain();

        input.push(InputEvent::Custom { kind: CUSTOM_RETRY, a: 0.0, b: 0.0, c: 0.0 });
        game.update(&mut ctx, &input);
        assert_eq!(game.session().level, 1);
        assert_eq!(game.projectiles().len(), 3);
        input.drain();

        game.load_level(&mut ctx, 2);
        ctx.clear_frame_data();
        input.push(InputEvent::Custom { kind: CUSTOM_NEXT_LEVEL, a: 0.0, b: 0.0, c: 0.0 });
        game.update(&mut ctx, &input);
        assert!(has_event(&ctx, EVENT_CAMPAIGN_COMPLETE));
        assert_eq!(game.session().level, 0);
    }

    #[test]
    fn reset_keeps_only_the_ground() {
        let (mut game, mut ctx) = started();
        game.load_level(&mut ctx, 1);
        game.load_level(&mut ctx, 0);

        // ground + 3 birds + 4 obstacles + 1 target
        assert_eq!(ctx.scene.len(), 9);
        assert_eq!(ctx.physics.body_count(), 9);
        assert_eq!(ctx.physics.joint_count(), 0);
        assert_eq!(game.session().score(), 0);
        assert!(has_event(&ctx, EVENT_SCORE));
    }

    #[test]
    fn settings_reload_changes_thresholds() {
        let mut game = SlingshotGame::new();
        game.load_settings(r#"{"kill_velocity": 9.0}"#);
        assert_eq!(game.resolver.thresholds().kill_velocity, 9.0);

        game.load_settings("not json");
        assert_eq!(game.settings().kill_velocity, 9.0, "bad input keeps current settings");
    }

    #[test]
    fn drags_are_ignored_once_the_game_is_over() {
        let (mut game, mut ctx) = started();
        let target = game.targets()[0].id;
        game.resolver
            .pre_solve(&impact(tag(999, Role::Projectile), tag(target.0, Role::HazardTarget), 5.0));
        game.after_step(&mut ctx);
        assert_eq!(game.session().outcome(), Outcome::Won);

        assert!(!game.begin_drag(&mut ctx, sling()));
    }
}
