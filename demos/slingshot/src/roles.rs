use sling_engine::BodyTag;

/// What a body stands for in the game. Stamped on every body at creation and
/// never changed afterwards; contact classification reads nothing else.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Other = 0,
    Projectile = 1,
    HazardTarget = 2,
    Obstacle = 3,
    Linkage = 4,
    LinkageSegment = 5,
    Oscillator = 6,
}

impl Role {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Unknown codes classify as `Other`.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Role::Projectile,
            2 => Role::HazardTarget,
            3 => Role::Obstacle,
            4 => Role::Linkage,
            5 => Role::LinkageSegment,
            6 => Role::Oscillator,
            _ => Role::Other,
        }
    }

    /// Role of a contact participant; untagged bodies are `Other`.
    pub fn of(tag: Option<BodyTag>) -> Self {
        tag.map(|t| Self::from_code(t.role)).unwrap_or(Role::Other)
    }
}
