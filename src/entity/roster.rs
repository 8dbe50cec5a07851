use super::types::{Entity, EntityId, Side};
use std::collections::BTreeMap;

/// Every entity the world knows about, keyed and iterated by id.
///
/// Ids are allocated in creation order, so iteration order is creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entities: BTreeMap<EntityId, Entity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity, returning the one it replaced, if any.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.id(), entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn on_side(&self, side: Side) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.side() == side)
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Entity::is_active)
    }
}

impl FromIterator<Entity> for Roster {
    fn from_iter<T: IntoIterator<Item = Entity>>(iter: T) -> Self {
        let mut roster = Roster::new();
        for entity in iter {
            roster.insert(entity);
        }
        roster
    }
}
