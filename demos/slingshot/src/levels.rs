use glam::Vec2;

use crate::entities::{Ability, ObstacleClass};
use ObstacleClass::{DestructibleBlock, DestructiblePlank, IndestructibleBlock, IndestructiblePlank};

/// Layout coordinates are authored on a 16:9 screen; x shrinks by this ratio.
pub const ASPECT: f32 = 720.0 / 1280.0;

/// Where birds wait, in layout units.
pub const SLING: (f32, f32) = (-3.6, -2.0);

/// Ground slab centre and half height, in world units.
pub const GROUND_CENTER: Vec2 = Vec2::new(0.0, -4.5);
pub const GROUND_HALF_HEIGHT: f32 = 1.0;
/// Ground half width, in world units: the full screen.
pub const GROUND_HALF_WIDTH: f32 = 5.0 / ASPECT;

/// Convert a layout coordinate to world units.
pub fn to_world(x: f32, y: f32) -> Vec2 {
    Vec2::new(x / ASPECT, y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstaclePlacement {
    pub class: ObstacleClass,
    pub x: f32,
    pub y: f32,
    pub angle_deg: f32,
}

/// A rope from obstacle `head` to obstacle `tail` (indices into `obstacles`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkagePlacement {
    pub x: f32,
    pub y: f32,
    pub length: usize,
    pub head: usize,
    pub tail: Option<usize>,
}

/// Everything a level starts with. Positions are layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelLayout {
    pub birds: &'static [Ability],
    pub obstacles: &'static [ObstaclePlacement],
    pub targets: &'static [(f32, f32)],
    pub linkage: Option<LinkagePlacement>,
    pub oscillator: Option<(f32, f32)>,
}

const fn block(class: ObstacleClass, x: f32, y: f32) -> ObstaclePlacement {
    ObstaclePlacement { class, x, y, angle_deg: 0.0 }
}

pub static LEVELS: [LevelLayout; 3] = [
    LevelLayout {
        birds: &[Ability::Classic, Ability::Classic, Ability::Classic],
        obstacles: &[
            block(DestructibleBlock, 2.6, -3.0),
            block(DestructibleBlock, 3.8, -3.0),
            block(DestructibleBlock, 3.8, -2.3),
            ObstaclePlacement { class: DestructiblePlank, x: 4.2, y: -3.0, angle_deg: 110.0 },
        ],
        targets: &[(3.2, -3.0)],
        linkage: None,
        oscillator: None,
    },
    LevelLayout {
        birds: &[Ability::Splitter, Ability::Splitter, Ability::Splitter],
        obstacles: &[
            block(IndestructibleBlock, 2.6, -3.0),
            block(IndestructibleBlock, 1.15, -3.0),
            block(DestructibleBlock, 2.6, -2.3),
            block(DestructibleBlock, 1.15, -2.3),
            block(DestructibleBlock, 3.8, -2.3),
        ],
        targets: &[(3.2, -3.0), (1.9, -3.0)],
        linkage: Some(LinkagePlacement { x: 1.42, y: -2.0, length: 9, head: 3, tail: Some(2) }),
        oscillator: None,
    },
    LevelLayout {
        birds: &[Ability::HeavyDrop, Ability::HeavyDrop, Ability::HeavyDrop],
        obstacles: &[
            block(DestructibleBlock, 2.6, -3.0),
            block(IndestructiblePlank, 2.6, -2.5),
            block(DestructibleBlock, 2.6, -2.0),
            block(IndestructiblePlank, 2.6, -1.5),
            block(DestructibleBlock, 2.6, -1.0),
            block(IndestructiblePlank, 2.6, -0.5),
            block(DestructibleBlock, 2.6, 0.0),
        ],
        targets: &[(3.5, -3.0)],
        linkage: None,
        oscillator: Some((1.5, -2.9)),
    },
];
