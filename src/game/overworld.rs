//! # Overworld
//!
//! The strategic map: static terrain, props and wandering parties. Parties are
//! routed with a long-range pathfinder, and an encounter is raised when a
//! party reaches an enemy party.

use crate::{
    config::MAP_SEARCH_DISTANCE, new_entity_id, AStarPathfinder, Activity, Army, DeltaTime,
    EntityId, EntityRegistry, Footprint, GridSnapshot, Identified, Mover, Occupant,
    OverworldConfig, Pending, Position, Posture, Route, Size, TacticaError, TacticaResult, Team,
    TerrainMap, Updatable, Walker,
};
use serde::{Deserialize, Serialize};

/// A static obstacle, such as a rock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub id: EntityId,
    pub name: String,
    pub footprint: Footprint,
}

impl Prop {
    pub fn new(name: impl Into<String>, position: Position, size: Size) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            footprint: Footprint::new(position, size),
        }
    }
}

/// A moving group on the map, carrying the army it fights with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: EntityId,
    pub name: String,
    pub team: Team,
    pub position: Position,
    pub size: Size,
    pub walker: Walker,
    pub posture: Posture,
    pub army: Army,
    interact_target: Option<EntityId>,
}

impl Party {
    pub fn new(name: impl Into<String>, position: Position, army: Army, time_between_moves: f64) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            team: army.team,
            position,
            size: Size::unit(),
            walker: Walker::new(MAP_SEARCH_DISTANCE, time_between_moves),
            posture: Posture::Idle,
            army,
            interact_target: None,
        }
    }

    /// Starts walking `route` with a full step budget.
    pub fn assign_route(&mut self, route: Route, target: Option<EntityId>) {
        self.walker.reset_movement();
        self.walker.assign(route, self.position);
        self.interact_target = target;
        if !self.walker.is_stationary() {
            self.posture = Posture::Run;
        }
    }

    pub fn interact_target(&self) -> Option<EntityId> {
        self.interact_target
    }
}

impl Identified for Party {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Mover for Party {
    fn position(&self) -> Position {
        self.position
    }

    fn movement(&self) -> u32 {
        self.walker.movement()
    }
}

/// Everything that lives on the overworld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEntity {
    Prop(Prop),
    Party(Party),
}

impl MapEntity {
    pub fn as_party(&self) -> Option<&Party> {
        match self {
            MapEntity::Party(party) => Some(party),
            MapEntity::Prop(_) => None,
        }
    }

    pub fn as_party_mut(&mut self) -> Option<&mut Party> {
        match self {
            MapEntity::Party(party) => Some(party),
            MapEntity::Prop(_) => None,
        }
    }
}

impl Identified for MapEntity {
    fn id(&self) -> EntityId {
        match self {
            MapEntity::Prop(prop) => prop.id,
            MapEntity::Party(party) => party.id,
        }
    }
}

impl Occupant for MapEntity {
    fn footprint(&self) -> Footprint {
        match self {
            MapEntity::Prop(prop) => prop.footprint,
            MapEntity::Party(party) => Footprint::new(party.position, party.size),
        }
    }
}

impl Activity for MapEntity {
    fn is_living(&self) -> bool {
        matches!(self, MapEntity::Party(_))
    }

    fn is_inactive(&self) -> bool {
        match self {
            MapEntity::Prop(_) => true,
            MapEntity::Party(party) => {
                party.walker.is_stationary() && matches!(party.posture, Posture::Idle | Posture::Dead)
            }
        }
    }
}

/// Events raised by the overworld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverworldEvent {
    Moved {
        id: EntityId,
        from: Position,
        to: Position,
    },
    /// A party stopped walking a route that ended at `target`
    ApproachEnded { id: EntityId, target: EntityId },
    /// Two hostile parties met
    Encounter { attacker: EntityId, defender: EntityId },
}

impl Updatable for MapEntity {
    type Event = OverworldEvent;

    fn update(&mut self, delta: DeltaTime, _pending: &mut Pending<Self>, events: &mut Vec<OverworldEvent>) {
        let MapEntity::Party(party) = self else {
            return;
        };
        if let Some(step) = party.walker.advance(delta) {
            let from = party.position;
            party.position = step;
            log::trace!("Party {} moved {} -> {}", party.id, from, step);
            events.push(OverworldEvent::Moved {
                id: party.id,
                from,
                to: step,
            });
        }
        if party.walker.is_stationary() {
            party.posture = Posture::Idle;
            if let Some(target) = party.interact_target.take() {
                events.push(OverworldEvent::ApproachEnded {
                    id: party.id,
                    target,
                });
            }
        }
    }
}

/// The strategic map.
#[derive(Debug)]
pub struct Overworld {
    config: OverworldConfig,
    terrain: TerrainMap,
    registry: EntityRegistry<MapEntity>,
    finder: AStarPathfinder,
    snapshot: GridSnapshot,
    focus: Option<EntityId>,
    queued_events: Vec<OverworldEvent>,
}

impl Overworld {
    /// Creates an overworld over `terrain`, which must match the configured size.
    pub fn new(config: OverworldConfig, terrain: TerrainMap) -> TacticaResult<Self> {
        if terrain.width() != config.width || terrain.height() != config.height {
            return Err(TacticaError::InvalidState(format!(
                "terrain is {}x{} but the overworld is {}x{}",
                terrain.width(),
                terrain.height(),
                config.width,
                config.height
            )));
        }
        Ok(Self {
            finder: AStarPathfinder::new(config.width, config.height, &config.search),
            snapshot: GridSnapshot::from_terrain(&terrain),
            registry: EntityRegistry::new(),
            focus: None,
            queued_events: Vec::new(),
            terrain,
            config,
        })
    }

    pub fn config(&self) -> &OverworldConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    pub fn snapshot(&self) -> &GridSnapshot {
        &self.snapshot
    }

    /// Schedules an entity to appear at the end of the next tick.
    pub fn spawn(&mut self, entity: MapEntity) -> EntityId {
        let id = entity.id();
        self.registry.add(entity);
        id
    }

    /// Schedules a party for removal, dropping focus from it.
    pub fn remove_party(&mut self, id: EntityId) {
        if self.focus == Some(id) {
            self.focus = None;
        }
        self.registry.remove(id);
    }

    pub fn entities(&self) -> impl Iterator<Item = &MapEntity> {
        self.registry.iter()
    }

    pub fn parties(&self) -> impl Iterator<Item = &Party> {
        self.registry.iter().filter_map(MapEntity::as_party)
    }

    pub fn party(&self, id: EntityId) -> Option<&Party> {
        self.registry.get(id).and_then(MapEntity::as_party)
    }

    pub fn party_mut(&mut self, id: EntityId) -> Option<&mut Party> {
        self.registry.get_mut(id).and_then(MapEntity::as_party_mut)
    }

    /// Whether every party is standing still.
    pub fn is_settled(&self) -> bool {
        self.registry.all_entities_inactive()
    }

    /// Focuses the entity covering `cell`. Focus is kept when nothing is there.
    pub fn select(&mut self, cell: Position) -> Option<EntityId> {
        if let Some(entity) = self.registry.entity_at(cell) {
            self.focus = Some(entity.id());
        }
        self.focus
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    pub fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    /// Orders the focused party toward `cell`.
    pub fn command(&mut self, cell: Position) -> bool {
        match self.focus {
            Some(id) => self.command_party(id, cell),
            None => false,
        }
    }

    /// Orders a party toward `cell`.
    ///
    /// When a hostile party stands on `cell` and is already within reach, the
    /// encounter is raised at the next tick. Otherwise the party walks to the
    /// cell or next to it, and meets the hostile party on arrival.
    pub fn command_party(&mut self, id: EntityId, cell: Position) -> bool {
        if !self.snapshot.contains(cell) {
            return false;
        }
        let Some((team, reach)) = self
            .party(id)
            .map(|party| (party.team, Footprint::new(party.position, party.size)))
        else {
            return false;
        };
        let enemy = self
            .registry
            .entity_at(cell)
            .and_then(MapEntity::as_party)
            .filter(|other| other.team != team)
            .map(|other| (other.id, Footprint::new(other.position, other.size)));

        if let Some((enemy_id, enemy_footprint)) = enemy {
            if reach.is_within_reach(&enemy_footprint) {
                log::debug!("Party {} engages {} on the spot", id, enemy_id);
                self.queued_events.push(OverworldEvent::Encounter {
                    attacker: id,
                    defender: enemy_id,
                });
                return true;
            }
        }

        let Some(route) = self.compute_adjacent_route(id, cell) else {
            log::debug!("No overworld route for {} toward {}", id, cell);
            return false;
        };
        if route.moves() == 0 {
            return false;
        }
        log::debug!("Party {} heads {} steps toward {}", id, route.moves(), cell);
        match self.party_mut(id) {
            Some(party) => {
                party.assign_route(route, enemy.map(|(enemy_id, _)| enemy_id));
                true
            }
            None => false,
        }
    }

    /// Route from the party's position to `cell`. Blocked cells have none.
    pub fn compute_route(&mut self, id: EntityId, cell: Position) -> Option<Route> {
        let party = self.registry.get(id).and_then(MapEntity::as_party)?;
        self.finder.find_path(&self.snapshot, party, party.position, cell)
    }

    /// Route from the party's position to `cell`, or next to it.
    pub fn compute_adjacent_route(&mut self, id: EntityId, cell: Position) -> Option<Route> {
        let party = self.registry.get(id).and_then(MapEntity::as_party)?;
        self.finder
            .find_path_adjacent(&self.snapshot, party, party.position, cell)
    }

    /// Takes the army out of a party, leaving it empty.
    pub fn take_army(&mut self, id: EntityId) -> Option<Army> {
        let party = self.party_mut(id)?;
        let team = party.team;
        Some(std::mem::replace(&mut party.army, Army::new(team)))
    }

    /// Puts an army back into a party.
    pub fn return_army(&mut self, id: EntityId, army: Army) -> TacticaResult<()> {
        let party = self
            .party_mut(id)
            .ok_or_else(|| TacticaError::InvalidAction(format!("no party {} on the map", id)))?;
        party.army = army;
        Ok(())
    }

    /// Advances every entity, then rebuilds the blocked-cell snapshot.
    pub fn tick(&mut self, delta: DeltaTime) -> Vec<OverworldEvent> {
        let mut events = std::mem::take(&mut self.queued_events);
        let updates = self.registry.update(delta);
        for event in &updates {
            if let OverworldEvent::ApproachEnded { id, target } = *event {
                if self.within_reach(id, target) {
                    log::debug!("Party {} caught up with {}", id, target);
                    events.push(OverworldEvent::Encounter {
                        attacker: id,
                        defender: target,
                    });
                }
            }
        }
        events.extend(updates);
        self.rebuild_snapshot();
        events
    }

    fn within_reach(&self, id: EntityId, target: EntityId) -> bool {
        match (self.party(id), self.party(target)) {
            (Some(party), Some(other)) => Footprint::new(party.position, party.size)
                .is_within_reach(&Footprint::new(other.position, other.size)),
            _ => false,
        }
    }

    fn rebuild_snapshot(&mut self) {
        match GridSnapshot::build(
            self.config.width,
            self.config.height,
            Some(&self.terrain),
            self.registry.footprints(),
        ) {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(err) => log::warn!("Keeping the previous overworld snapshot: {}", err),
        }
    }
}
