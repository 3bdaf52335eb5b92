use std::sync::{Mutex, PoisonError};

use sling_engine::{BodyTag, ContactListener, EntityId, PreSolveContact};

use crate::roles::Role;

/// Approach speeds above which a projectile kills or breaks what it hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub kill_velocity: f32,
    pub break_velocity: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            kill_velocity: 2.0,
            break_velocity: 2.0,
        }
    }
}

/// A gameplay effect decided during a physics step, applied after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consequence {
    Kill(EntityId),
    Damage { target: EntityId, amount: i32 },
    /// Break the linkage owning this segment.
    Break(EntityId),
}

/// Turns pre-solve contacts into consequences.
///
/// Runs inside the physics step, so it only records. The coordinator drains
/// the queue once the step has returned.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    thresholds: Thresholds,
    pending: Mutex<Vec<Consequence>>,
}

impl CollisionResolver {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify a contact and decide what it does, if anything.
    ///
    /// Only contacts that gained a touching point this step count. The role
    /// pair is unordered: a projectile may be either body.
    pub fn resolve(&self, contact: &PreSolveContact) -> Option<Consequence> {
        if !contact.is_new() {
            return None;
        }

        let target = projectile_partner(contact.body_a, contact.body_b)?;
        let approach = contact.approach_velocity().abs();

        match Role::from_code(target.role) {
            Role::HazardTarget if approach > self.thresholds.kill_velocity => {
                Some(Consequence::Kill(target.entity))
            }
            Role::Obstacle => {
                let amount = approach as i32;
                (amount > 0).then_some(Consequence::Damage {
                    target: target.entity,
                    amount,
                })
            }
            Role::LinkageSegment if approach > self.thresholds.break_velocity => {
                Some(Consequence::Break(target.entity))
            }
            _ => None,
        }
    }

    /// Take every consequence recorded since the last drain, in contact order.
    pub fn drain(&self) -> Vec<Consequence> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pending)
    }
}

impl ContactListener for CollisionResolver {
    fn pre_solve(&self, contact: &PreSolveContact) {
        if let Some(consequence) = self.resolve(contact) {
            log::debug!("contact -> {:?}", consequence);
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(consequence);
        }
    }
}

/// The body touching a projectile, when exactly one side is a projectile.
fn projectile_partner(a: Option<BodyTag>, b: Option<BodyTag>) -> Option<BodyTag> {
    match (Role::of(a), Role::of(b)) {
        (Role::Projectile, Role::Projectile) => None,
        (Role::Projectile, _) => b,
        (_, Role::Projectile) => a,
        _ => None,
    }
}
