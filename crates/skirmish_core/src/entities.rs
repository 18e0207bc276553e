//! Entity records and their storage.
//!
//! Every entity shares one base record ([`Entity`]) and carries its
//! kind-specific state in [`EntityBody`]. Entities refer to one another by
//! [`EntityId`] only; a handle is valid while the target is `active`.

use std::collections::HashMap;

use crate::components::{
    Barracks, EntityBody, EntityId, EntityKind, Health, Side, Spearman, Worker,
};
use crate::math::Vec2Fixed;
use crate::movement::Motion;
use crate::timers::TimerList;

/// One simulated object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Owner.
    pub side: Side,
    /// World position (bottom-centre of the sprite box).
    pub position: Vec2Fixed,
    /// Health; zero means dead except for a barracks under construction.
    pub health: Health,
    /// Cleared on death; inactive entities are purged at the end of a tick.
    pub active: bool,
    /// Sprite mirrored to face left.
    pub facing_left: bool,
    /// In-flight travel, units only.
    pub motion: Option<Motion>,
    /// Pending delayed actions.
    pub timers: TimerList,
    /// Kind-specific state.
    pub body: EntityBody,
}

impl Entity {
    /// Create an active entity. The id is assigned on insert.
    #[must_use]
    pub fn new(side: Side, position: Vec2Fixed, health: Health, body: EntityBody) -> Self {
        Self {
            id: 0,
            side,
            position,
            health,
            active: true,
            facing_left: side == Side::Ai,
            motion: None,
            timers: TimerList::new(),
            body,
        }
    }

    /// Type tag.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.body.kind()
    }

    /// Worker payload, if this is a worker.
    #[must_use]
    pub fn worker(&self) -> Option<&Worker> {
        match &self.body {
            EntityBody::Worker(w) => Some(w),
            _ => None,
        }
    }

    /// Mutable worker payload.
    pub fn worker_mut(&mut self) -> Option<&mut Worker> {
        match &mut self.body {
            EntityBody::Worker(w) => Some(w),
            _ => None,
        }
    }

    /// Spearman payload, if this is a spearman.
    #[must_use]
    pub fn spearman(&self) -> Option<&Spearman> {
        match &self.body {
            EntityBody::Spearman(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable spearman payload.
    pub fn spearman_mut(&mut self) -> Option<&mut Spearman> {
        match &mut self.body {
            EntityBody::Spearman(s) => Some(s),
            _ => None,
        }
    }

    /// Barracks payload, if this is a barracks.
    #[must_use]
    pub fn barracks(&self) -> Option<&Barracks> {
        match &self.body {
            EntityBody::Barracks(b) => Some(b),
            _ => None,
        }
    }

    /// Mutable barracks payload.
    pub fn barracks_mut(&mut self) -> Option<&mut Barracks> {
        match &mut self.body {
            EntityBody::Barracks(b) => Some(b),
            _ => None,
        }
    }

    /// Whether the entity is travelling.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// Whether the entity can take damage right now.
    ///
    /// A barracks under construction starts at zero health and is immune
    /// until it has some structure.
    #[must_use]
    pub const fn is_damageable(&self) -> bool {
        self.active && self.health.current > 0
    }
}

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) entity lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone, Default)]
pub struct EntityStorage {
    /// Map of entity ID to entity data.
    entities: HashMap<EntityId, Entity>,
    /// Next entity ID to assign.
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Get an entity only while it is active.
    #[must_use]
    pub fn get_active(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).filter(|e| e.active)
    }

    /// Whether `id` refers to a live entity.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.get_active(id).is_some()
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted ids of active entities of one kind.
    #[must_use]
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .entities
            .values()
            .filter(|e| e.active && e.kind() == kind)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Active entities in ascending id order.
    pub fn iter_active(&self) -> impl Iterator<Item = &Entity> {
        self.sorted_ids()
            .into_iter()
            .filter_map(|id| self.get_active(id))
    }

    /// Count active entities of a kind owned by `side`.
    #[must_use]
    pub fn count(&self, side: Side, kind: EntityKind) -> usize {
        self.entities
            .values()
            .filter(|e| e.active && e.side == side && e.kind() == kind)
            .count()
    }

    /// Remove every inactive entity, returning the purged ids in order.
    pub fn purge_inactive(&mut self) -> Vec<EntityId> {
        let mut dead: Vec<_> = self
            .entities
            .values()
            .filter(|e| !e.active)
            .map(|e| e.id)
            .collect();
        dead.sort_unstable();
        for id in &dead {
            self.entities.remove(id);
        }
        dead
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_at(x: i32, y: i32) -> Entity {
        Entity::new(Side::Neutral, Vec2Fixed::from_ints(x, y), Health::new(10), EntityBody::Tree)
    }

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut storage = EntityStorage::new();
        let a = storage.insert(tree_at(0, 0));
        let b = storage.insert(tree_at(10, 0));
        assert_eq!((a, b), (1, 2));

        storage.remove(b);
        let c = storage.insert(tree_at(20, 0));
        assert_eq!(c, 3);
    }

    #[test]
    fn test_purge_only_removes_inactive() {
        let mut storage = EntityStorage::new();
        let a = storage.insert(tree_at(0, 0));
        let b = storage.insert(tree_at(10, 0));
        if let Some(e) = storage.get_mut(a) {
            e.active = false;
        }

        assert_eq!(storage.purge_inactive(), vec![a]);
        assert!(storage.get(a).is_none());
        assert!(storage.is_active(b));
    }

    #[test]
    fn test_count_by_side_and_kind() {
        let mut storage = EntityStorage::new();
        storage.insert(tree_at(0, 0));
        storage.insert(Entity::new(
            Side::Player,
            Vec2Fixed::ZERO,
            Health::new(30),
            EntityBody::Worker(Worker::default()),
        ));
        assert_eq!(storage.count(Side::Player, EntityKind::Worker), 1);
        assert_eq!(storage.count(Side::Ai, EntityKind::Worker), 0);
        assert_eq!(storage.ids_of_kind(EntityKind::Tree), vec![1]);
    }
}
