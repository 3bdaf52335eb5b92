use crate::components::entity::Entity;
use crate::renderer::instance::{RenderBuffer, RenderInstance};

/// Build the render buffer from a set of entities.
/// Inactive entities are skipped; entities past the buffer capacity are dropped.
pub fn build_render_buffer<'a>(entities: impl Iterator<Item = &'a Entity>, buffer: &mut RenderBuffer) {
    buffer.clear();

    for entity in entities.filter(|e| e.active) {
        let instance = RenderInstance {
            x: entity.pos.x,
            y: entity.pos.y,
            rotation: entity.rotation,
            half_width: entity.half_extents.x,
            half_height: entity.half_extents.y,
            role: entity.role() as f32,
            variant: entity.variant as f32,
            alpha: 1.0,
        };
        if !buffer.push(instance) {
            log::warn!("render buffer full, dropping remaining entities");
            break;
        }
    }
}
