use serde::{Deserialize, Serialize};

use crate::resolver::Thresholds;

/// Gameplay tuning. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Approach speed a projectile needs to kill a hazard target.
    pub kill_velocity: f32,
    /// Approach speed a projectile needs to snap a linkage.
    pub break_velocity: f32,
    /// Seconds a projectile survives after launch.
    pub projectile_lifetime: f32,
    pub kill_score: u32,
    pub obstacle_score: u32,
    /// Furthest the drag target may stray from where the drag began.
    pub drag_radius: f32,
    /// Longest pull vector honoured at release.
    pub max_pull: f32,
    /// Impulse per unit of pull.
    pub launch_impulse: f32,
    pub drag_stiffness: f32,
    /// Critically damped at `2 * sqrt(drag_stiffness)`.
    pub drag_damping: f32,
    pub heavy_drop_gravity_scale: f32,
    /// Horizontal offset of split children, in layout units.
    pub split_offset: f32,
    /// Horizontal speed added to (and subtracted from) split children.
    pub split_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kill_velocity: 2.0,
            break_velocity: 2.0,
            projectile_lifetime: 6.0,
            kill_score: 50,
            obstacle_score: 10,
            drag_radius: 1.0,
            max_pull: 5.0,
            launch_impulse: 6.4,
            drag_stiffness: 400.0,
            drag_damping: 40.0,
            heavy_drop_gravity_scale: 2.5,
            split_offset: 0.05,
            split_speed: 1.0,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            kill_velocity: self.kill_velocity,
            break_velocity: self.break_velocity,
        }
    }
}
