pub mod hazard;
pub mod linkage;
pub mod obstacle;
pub mod oscillator;
pub mod projectile;

pub use hazard::HazardTarget;
pub use linkage::Linkage;
pub use obstacle::{Obstacle, ObstacleClass};
pub use oscillator::Oscillator;
pub use projectile::{Ability, Projectile};
