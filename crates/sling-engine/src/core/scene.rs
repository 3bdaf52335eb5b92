use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// Every live entity of the running level, in spawn order until something is
/// removed. Lookups are linear; a level holds a few dozen bodies at most.
pub struct Scene {
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
        }
    }

    pub fn spawn(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Take `id` out of the scene. Order of the rest is not preserved.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.swap_remove(idx))
    }

    /// Take out every entity `keep` rejects, returning them.
    pub fn take_unless(&mut self, keep: impl Fn(&Entity) -> bool) -> Vec<Entity> {
        let (kept, taken): (Vec<Entity>, Vec<Entity>) = std::mem::take(&mut self.entities)
            .into_iter()
            .partition(|e| keep(e));
        self.entities = kept;
        taken
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Entities whose collision role is `role`.
    pub fn iter_role(&self, role: u32) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.role() == role)
    }

    pub fn count_role(&self, role: u32) -> usize {
        self.iter_role(role).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
