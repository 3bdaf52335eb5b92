use bytemuck::{Pod, Zeroable};

/// Unique identifier for an entity in the scene.
/// `EntityId(0)` is never handed out; bodies carrying it are treated as unowned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// A game event communicated from Rust to TypeScript via SharedArrayBuffer.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: u32, a: f32) -> Self {
        Self {
            kind: kind as f32,
            a,
            b: 0.0,
            c: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_event_is_4_floats() {
        assert_eq!(std::mem::size_of::<GameEvent>(), GameEvent::FLOATS * 4);
    }

    #[test]
    fn new_event_carries_kind_and_payload() {
        let ev = GameEvent::new(3, 1.0);
        assert_eq!(ev.kind, 3.0);
        assert_eq!(ev.a, 1.0);
        assert_eq!(ev.b, 0.0);
    }
}
