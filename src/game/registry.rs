//! # Entity Registry
//!
//! Owns the live entities of a map or arena and applies structural changes
//! (additions and removals) only at the end of a tick, after every entity has
//! been updated.

use crate::{Activity, DeltaTime, EntityId, Footprint, Identified, Occupant, Position, Updatable};

/// Structural changes scheduled during a tick.
#[derive(Debug)]
pub struct Pending<E> {
    to_add: Vec<E>,
    to_remove: Vec<EntityId>,
}

impl<E> Default for Pending<E> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

impl<E> Pending<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules an entity to become live at the end of the tick.
    pub fn add(&mut self, entity: E) {
        self.to_add.push(entity);
    }

    /// Schedules an entity for removal. Scheduling the same id twice is a no-op.
    pub fn remove(&mut self, id: EntityId) {
        if !self.to_remove.contains(&id) {
            self.to_remove.push(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn is_removal_scheduled(&self, id: EntityId) -> bool {
        self.to_remove.contains(&id)
    }
}

/// Authoritative set of live entities plus the pending queues.
///
/// Live entities are kept in insertion order, which is also the update order.
///
/// # Examples
///
/// ```
/// use tactica::{Combatant, DeltaTime, EntityRegistry, Position, Team, UnitTemplate};
///
/// let mut registry = EntityRegistry::new();
/// let unit = Combatant::from_template(&UnitTemplate::default(), Team::Red, Position::origin());
/// let id = unit.id;
///
/// registry.add(unit);
/// assert!(!registry.contains(id));
/// assert!(registry.is_pending_add(id));
///
/// registry.update(DeltaTime::from_secs(0.016));
/// assert!(registry.contains(id));
/// ```
#[derive(Debug)]
pub struct EntityRegistry<E: Identified> {
    live: Vec<E>,
    pending: Pending<E>,
}

impl<E: Identified> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self {
            live: Vec::new(),
            pending: Pending::default(),
        }
    }
}

impl<E: Identified> EntityRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `entity` to become live at the end of the next update.
    pub fn add(&mut self, entity: E) {
        self.pending.add(entity);
    }

    /// Schedules removal of the entity with `id`. Idempotent.
    pub fn remove(&mut self, id: EntityId) {
        self.pending.remove(id);
    }

    /// Applies pending additions, then pending removals.
    pub fn drain(&mut self) {
        for entity in std::mem::take(&mut self.pending.to_add) {
            let id = entity.id();
            if self.contains(id) {
                log::warn!("Entity {} is already live, ignoring duplicate add", id);
                continue;
            }
            self.live.push(entity);
        }

        let removals = std::mem::take(&mut self.pending.to_remove);
        if !removals.is_empty() {
            self.live.retain(|entity| !removals.contains(&entity.id()));
        }
    }

    /// Live entity by id.
    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.live.iter().find(|entity| entity.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut E> {
        self.live.iter_mut().find(|entity| entity.id() == id)
    }

    /// Whether `id` is live. Entities waiting to be added are not.
    pub fn contains(&self, id: EntityId) -> bool {
        self.live.iter().any(|entity| entity.id() == id)
    }

    pub fn is_pending_add(&self, id: EntityId) -> bool {
        self.pending.to_add.iter().any(|entity| entity.id() == id)
    }

    pub fn is_pending_remove(&self, id: EntityId) -> bool {
        self.pending.is_removal_scheduled(id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.live.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.live.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl<E: Updatable> EntityRegistry<E> {
    /// Updates every live entity, then drains the pending queues once.
    ///
    /// Returns the events raised by the entities during the update.
    pub fn update(&mut self, delta: DeltaTime) -> Vec<E::Event> {
        let mut events = Vec::new();
        for entity in &mut self.live {
            entity.update(delta, &mut self.pending, &mut events);
        }
        self.drain();
        events
    }
}

impl<E: Identified + Occupant> EntityRegistry<E> {
    /// Footprints of every live entity.
    pub fn footprints(&self) -> impl Iterator<Item = Footprint> + '_ {
        self.live.iter().map(Occupant::footprint)
    }

    /// First live entity whose footprint covers `cell`.
    pub fn entity_at(&self, cell: Position) -> Option<&E> {
        self.live.iter().find(|entity| entity.footprint().contains(cell))
    }
}

impl<E: Identified + Activity> EntityRegistry<E> {
    /// Whether every living-kind entity has no pending route and is idle or dead.
    pub fn all_entities_inactive(&self) -> bool {
        self.live
            .iter()
            .filter(|entity| entity.is_living())
            .all(Activity::is_inactive)
    }
}
