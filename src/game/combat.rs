//! # Combat
//!
//! Arena battles between two armies: unit placement, click-to-act routing,
//! strike resolution, turn hand-over and victory detection.
//!
//! A session is driven by [`CombatSession::tick`], which updates every unit,
//! rebuilds the arena snapshot at the registry's phase boundary and, while no
//! unit is moving, keeps a movement shade for the acting unit.

use crate::{
    config::{ATTACK_DURATION, DEFAULT_MAX_MOVEMENT, STARTING_SLOTS, TIME_BETWEEN_MOVES},
    new_entity_id, AStarPathfinder, Activity, CombatConfig, DeltaTime, Direction, EntityId,
    EntityRegistry, Footprint, GridSnapshot, Identified, MovementShade, Mover, Occupant, Pending,
    Position, Posture, Route, Size, TacticaError, TacticaResult, Team, TurnSequencer, Updatable,
    Walker,
};
use serde::{Deserialize, Serialize};

/// Stats a combat unit is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitTemplate {
    pub name: String,
    pub max_health: i32,
    pub attack_power: i32,
    pub max_movement: u32,
    pub size: Size,
}

impl Default for UnitTemplate {
    fn default() -> Self {
        Self {
            name: "ninja".to_string(),
            max_health: 10,
            attack_power: 4,
            max_movement: DEFAULT_MAX_MOVEMENT,
            size: Size::unit(),
        }
    }
}

/// Events raised while a battle runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A new unit holds the turn and has its movement restored
    TurnStarted { id: EntityId },
    Moved {
        id: EntityId,
        from: Position,
        to: Position,
    },
    /// A unit finished an approach and wants to strike its target
    StrikeReady { attacker: EntityId, defender: EntityId },
    Struck {
        attacker: EntityId,
        defender: EntityId,
        damage: i32,
        remaining_health: i32,
    },
    Died { id: EntityId, team: Team },
    Victory { winner: Team },
}

/// A unit fighting in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: EntityId,
    pub name: String,
    pub team: Team,
    pub position: Position,
    pub size: Size,
    pub facing: Direction,
    pub health: i32,
    pub max_health: i32,
    pub attack_power: i32,
    pub walker: Walker,
    pub posture: Posture,
    posture_timer: f64,
    attack_duration: f64,
    interact_target: Option<EntityId>,
}

impl Combatant {
    pub fn from_template(template: &UnitTemplate, team: Team, position: Position) -> Self {
        Self {
            id: new_entity_id(),
            name: template.name.clone(),
            team,
            position,
            size: template.size,
            facing: match team {
                Team::Red => Direction::East,
                Team::Blue => Direction::West,
            },
            health: template.max_health,
            max_health: template.max_health,
            attack_power: template.attack_power,
            walker: Walker::new(template.max_movement, TIME_BETWEEN_MOVES),
            posture: Posture::Idle,
            posture_timer: 0.0,
            attack_duration: ATTACK_DURATION,
            interact_target: None,
        }
    }

    /// Replaces the step interval and strike duration.
    pub fn with_timing(mut self, time_between_moves: f64, attack_duration: f64) -> Self {
        self.set_timing(time_between_moves, attack_duration);
        self
    }

    pub fn set_timing(&mut self, time_between_moves: f64, attack_duration: f64) {
        let mut walker = Walker::new(self.walker.max_movement(), time_between_moves);
        walker.set_movement(self.walker.movement());
        self.walker = walker;
        self.attack_duration = attack_duration.max(0.0);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0 && self.posture != Posture::Dead
    }

    /// Starts walking `route`. The unit's own cell at the head of the route is skipped.
    pub fn assign_route(&mut self, route: Route) {
        self.walker.assign(route, self.position);
        if !self.walker.is_stationary() {
            self.posture = Posture::Run;
        }
    }

    /// The enemy to strike once the current route is walked.
    pub fn interact_target(&self) -> Option<EntityId> {
        self.interact_target
    }

    pub fn set_interact_target(&mut self, target: Option<EntityId>) {
        self.interact_target = target;
    }

    /// Subtracts `amount` from health and returns what is left.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount.max(0)).max(0);
        self.health
    }

    /// Plays a strike toward `target`.
    pub fn begin_attack(&mut self, target: Position) {
        let toward = Position::new(
            (target.x - self.position.x).signum(),
            (target.y - self.position.y).signum(),
        );
        if let Some(direction) = Direction::from_delta(toward) {
            self.facing = direction;
        }
        self.posture = Posture::Attack;
        self.posture_timer = self.attack_duration;
    }

    /// Clears any route, target or animation and restores movement.
    pub fn stand_down(&mut self) {
        self.walker.cancel();
        self.walker.reset_movement();
        self.interact_target = None;
        if self.posture != Posture::Dead {
            self.posture = Posture::Idle;
        }
        self.posture_timer = 0.0;
    }
}

impl Identified for Combatant {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Mover for Combatant {
    fn position(&self) -> Position {
        self.position
    }

    fn movement(&self) -> u32 {
        self.walker.movement()
    }
}

impl Occupant for Combatant {
    fn footprint(&self) -> Footprint {
        Footprint::new(self.position, self.size)
    }
}

impl Activity for Combatant {
    fn is_living(&self) -> bool {
        true
    }

    fn is_inactive(&self) -> bool {
        self.walker.is_stationary() && matches!(self.posture, Posture::Idle | Posture::Dead)
    }
}

impl Updatable for Combatant {
    type Event = CombatEvent;

    fn update(&mut self, delta: DeltaTime, pending: &mut Pending<Self>, events: &mut Vec<CombatEvent>) {
        if self.posture == Posture::Dead {
            return;
        }
        if self.health <= 0 {
            log::debug!("{} {} has fallen at {}", self.team, self.name, self.position);
            self.posture = Posture::Dead;
            self.walker.cancel();
            self.interact_target = None;
            pending.remove(self.id);
            events.push(CombatEvent::Died {
                id: self.id,
                team: self.team,
            });
            return;
        }

        if self.posture == Posture::Attack {
            self.posture_timer -= delta.as_secs();
            if self.posture_timer <= 0.0 {
                self.posture = Posture::Idle;
            }
            return;
        }

        if let Some(step) = self.walker.advance(delta) {
            let from = self.position;
            if let Some(direction) = Direction::from_delta(step - from) {
                self.facing = direction;
            }
            self.position = step;
            log::trace!("{} moved {} -> {}", self.id, from, step);
            events.push(CombatEvent::Moved {
                id: self.id,
                from,
                to: step,
            });
        }

        if self.walker.is_stationary() {
            if self.posture == Posture::Run {
                self.posture = Posture::Idle;
            }
            if let Some(defender) = self.interact_target.take() {
                events.push(CombatEvent::StrikeReady {
                    attacker: self.id,
                    defender,
                });
            }
        } else {
            self.posture = Posture::Run;
        }
    }
}

/// One side's units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    pub team: Team,
    pub units: Vec<Combatant>,
}

impl Army {
    pub fn new(team: Team) -> Self {
        Self {
            team,
            units: Vec::new(),
        }
    }

    /// One unit per template, placed at the origin until battle set-up.
    pub fn from_templates(team: Team, templates: &[UnitTemplate]) -> Self {
        Self {
            team,
            units: templates
                .iter()
                .map(|template| Combatant::from_template(template, team, Position::origin()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn living_count(&self) -> usize {
        self.units.iter().filter(|unit| unit.is_alive()).count()
    }
}

/// Outcome of a finished battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatReport {
    pub winner: Team,
    /// Living units of the winning side, restored for the next battle
    pub survivors: Vec<Combatant>,
    pub turns: u64,
}

/// A battle in the arena.
///
/// # Examples
///
/// ```
/// use tactica::{Army, CombatConfig, CombatSession, DeltaTime, Team, UnitTemplate};
///
/// let roster = vec![UnitTemplate::default(); 2];
/// let mut session = CombatSession::new(CombatConfig::default());
/// session
///     .set_up_battlefield(
///         Army::from_templates(Team::Red, &roster),
///         Army::from_templates(Team::Blue, &roster),
///     )
///     .unwrap();
///
/// session.tick(DeltaTime::from_secs(0.016));
/// assert!(session.is_accepting_input());
/// assert!(session.movement_shade().is_some());
/// ```
#[derive(Debug)]
pub struct CombatSession {
    config: CombatConfig,
    registry: EntityRegistry<Combatant>,
    sequencer: TurnSequencer,
    finder: AStarPathfinder,
    shade_finder: AStarPathfinder,
    snapshot: GridSnapshot,
    movement_shade: Option<MovementShade>,
    entities_stationary: bool,
    teams: Option<(Team, Team)>,
    turn_owner: Option<EntityId>,
    winner: Option<Team>,
    queued_events: Vec<CombatEvent>,
}

impl CombatSession {
    pub fn new(config: CombatConfig) -> Self {
        let (width, height) = (config.arena_width, config.arena_height);
        Self {
            finder: AStarPathfinder::new(width, height, &config.search),
            shade_finder: AStarPathfinder::new(width, height, &config.search),
            snapshot: GridSnapshot::new(width, height),
            registry: EntityRegistry::new(),
            sequencer: TurnSequencer::new(),
            movement_shade: None,
            entities_stationary: true,
            teams: None,
            turn_owner: None,
            winner: None,
            queued_events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Places both armies and sets up the turn order, attackers first.
    ///
    /// Attackers line up in the left column, defenders against the right edge,
    /// one unit per row in army order. Units become live at the end of the next
    /// tick.
    pub fn set_up_battlefield(&mut self, attacker: Army, defender: Army) -> TacticaResult<()> {
        if attacker.team == defender.team {
            return Err(TacticaError::InvalidState(format!(
                "both armies belong to team {}",
                attacker.team
            )));
        }
        let width = self.config.arena_width;
        let height = self.config.arena_height;
        for army in [&attacker, &defender] {
            if army.len() > STARTING_SLOTS {
                log::warn!("Rejecting {} army of {} units", army.team, army.len());
                return Err(TacticaError::InvalidState(format!(
                    "an army holds at most {} units, {} has {}",
                    STARTING_SLOTS,
                    army.team,
                    army.len()
                )));
            }
            for (row, unit) in army.units.iter().enumerate() {
                if unit.size.width > width || row as i32 + unit.size.height > height {
                    return Err(TacticaError::InvalidState(format!(
                        "{} does not fit the {}x{} arena at row {}",
                        unit.name, width, height, row
                    )));
                }
            }
        }

        self.reset();
        let mut order = Vec::with_capacity(attacker.len() + defender.len());
        let teams = (attacker.team, defender.team);
        for (row, mut unit) in attacker.units.into_iter().enumerate() {
            unit.position = Position::new(0, row as i32);
            self.enlist(unit, &mut order);
        }
        for (row, mut unit) in defender.units.into_iter().enumerate() {
            unit.position = Position::new(width - unit.size.width, row as i32);
            self.enlist(unit, &mut order);
        }

        log::info!(
            "Battle set up: {} attacks {} with {} units in the rotation",
            teams.0,
            teams.1,
            order.len()
        );
        self.sequencer.set_up(order);
        self.teams = Some(teams);
        Ok(())
    }

    fn enlist(&mut self, mut unit: Combatant, order: &mut Vec<EntityId>) {
        unit.set_timing(self.config.time_between_moves, self.config.attack_duration);
        unit.stand_down();
        order.push(unit.id);
        self.registry.add(unit);
    }

    fn reset(&mut self) {
        self.registry = EntityRegistry::new();
        self.sequencer = TurnSequencer::new();
        self.snapshot = GridSnapshot::new(self.config.arena_width, self.config.arena_height);
        self.movement_shade = None;
        self.entities_stationary = true;
        self.teams = None;
        self.turn_owner = None;
        self.winner = None;
        self.queued_events.clear();
    }

    /// Whether a battle has been set up and not yet finished.
    pub fn is_battle(&self) -> bool {
        self.teams.is_some()
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// The unit whose turn it is.
    pub fn current_actor(&self) -> Option<EntityId> {
        if !self.sequencer.is_set_up() {
            return None;
        }
        self.sequencer.current_entity_turn()
    }

    pub fn unit(&self, id: EntityId) -> Option<&Combatant> {
        self.registry.get(id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Combatant> {
        self.registry.iter()
    }

    pub fn sequencer(&self) -> &TurnSequencer {
        &self.sequencer
    }

    /// Blocked cells as of the last phase boundary.
    pub fn snapshot(&self) -> &GridSnapshot {
        &self.snapshot
    }

    /// Reachability of the acting unit, present while nothing moves.
    pub fn movement_shade(&self) -> Option<&MovementShade> {
        self.movement_shade.as_ref()
    }

    pub fn entities_stationary(&self) -> bool {
        self.entities_stationary
    }

    /// Whether the acting unit may be given an order now.
    pub fn is_accepting_input(&self) -> bool {
        self.winner.is_none()
            && self.entities_stationary
            && !self.registry.has_pending()
            && self
                .current_actor()
                .and_then(|id| self.registry.get(id))
                .is_some_and(Combatant::is_alive)
    }

    /// Routes `actor` from its position to `target` over the current snapshot.
    pub fn compute_route(&mut self, actor: EntityId, target: Position) -> Option<Route> {
        let unit = self.registry.get(actor)?;
        self.finder
            .find_path(&self.snapshot, unit, unit.position, target)
    }

    /// Routes `actor` to `target` or the nearest reachable cell next to it.
    pub fn compute_adjacent_route(&mut self, actor: EntityId, target: Position) -> Option<Route> {
        let unit = self.registry.get(actor)?;
        self.finder
            .find_path_adjacent(&self.snapshot, unit, unit.position, target)
    }

    /// Shade of the acting unit, bounded by its remaining movement.
    pub fn compute_reachability(&mut self) -> Option<MovementShade> {
        let unit = self.current_actor().and_then(|id| self.registry.get(id))?;
        self.shade_finder.set_max_search_distance(unit.movement());
        Some(self.shade_finder.movement_shade(&self.snapshot, unit))
    }

    /// Handles a target cell chosen for `actor`.
    ///
    /// Strikes an adjacent enemy on the cell, or routes toward the cell and, if
    /// an enemy stands there, strikes it on arrival. Returns `true` when an
    /// action was taken, which ends the actor's turn.
    pub fn on_target_selected(&mut self, actor: EntityId, cell: Position) -> bool {
        if !self.is_accepting_input() || self.current_actor() != Some(actor) {
            log::debug!("Ignoring target {} for {}: not accepting input", cell, actor);
            return false;
        }
        if !self.snapshot.contains(cell) {
            return false;
        }
        let Some((team, reach)) = self
            .registry
            .get(actor)
            .map(|unit| (unit.team, unit.footprint()))
        else {
            return false;
        };
        let enemy = self
            .registry
            .entity_at(cell)
            .filter(|other| other.team != team && other.is_alive())
            .map(|other| (other.id, other.footprint()));

        if let Some((enemy_id, enemy_footprint)) = enemy {
            if reach.is_within_reach(&enemy_footprint) {
                if let Some(event) = self.resolve_strike(actor, enemy_id) {
                    self.queued_events.push(event);
                    self.end_turn();
                    return true;
                }
                return false;
            }
        }

        let Some(unit) = self.registry.get(actor) else {
            return false;
        };
        let Some(route) = self
            .finder
            .find_path_adjacent(&self.snapshot, unit, unit.position, cell)
        else {
            log::debug!("No route for {} toward {}", actor, cell);
            return false;
        };
        if route.moves() == 0 {
            return false;
        }

        log::debug!("{} walks {} steps toward {}", actor, route.moves(), cell);
        if let Some(unit) = self.registry.get_mut(actor) {
            unit.assign_route(route);
            unit.set_interact_target(enemy.map(|(id, _)| id));
        }
        self.entities_stationary = false;
        self.movement_shade = None;
        self.end_turn();
        true
    }

    /// Passes the turn without acting.
    pub fn skip_turn(&mut self) -> bool {
        if !self.is_accepting_input() {
            return false;
        }
        log::debug!("{:?} skips its turn", self.current_actor());
        self.end_turn();
        true
    }

    /// Advances the battle by `delta`.
    pub fn tick(&mut self, delta: DeltaTime) -> Vec<CombatEvent> {
        let mut events = std::mem::take(&mut self.queued_events);
        if !self.is_battle() {
            return events;
        }

        let updates = self.registry.update(delta);
        for event in &updates {
            match *event {
                CombatEvent::StrikeReady { attacker, defender } => {
                    if let Some(struck) = self.resolve_strike(attacker, defender) {
                        events.push(struck);
                    }
                }
                CombatEvent::Died { id, .. } => {
                    self.sequencer.remove(id);
                    self.movement_shade = None;
                }
                CombatEvent::Moved { .. } => self.movement_shade = None,
                _ => {}
            }
        }
        events.extend(updates);

        self.begin_current_turn(&mut events);
        self.rebuild_snapshot();

        self.entities_stationary = self.registry.all_entities_inactive();
        if !self.entities_stationary {
            self.movement_shade = None;
        } else if self.movement_shade.is_none() {
            self.movement_shade = self.compute_reachability();
        }

        self.check_victory(&mut events);
        events
    }

    /// Ends a decided battle, returning the winner's survivors.
    pub fn finish(&mut self) -> TacticaResult<CombatReport> {
        let Some(winner) = self.winner else {
            return Err(TacticaError::InvalidState(
                "the battle has not been decided".to_string(),
            ));
        };
        self.registry.drain();
        let turns = self.sequencer.turn_counter();
        let mut registry = std::mem::take(&mut self.registry);
        let survivors = registry
            .iter_mut()
            .filter(|unit| unit.team == winner && unit.is_alive())
            .map(|unit| {
                unit.stand_down();
                unit.clone()
            })
            .collect();
        self.reset();
        log::info!("Battle finished after {} turns, {} wins", turns, winner);
        Ok(CombatReport {
            winner,
            survivors,
            turns,
        })
    }

    fn end_turn(&mut self) {
        self.sequencer.end_entity_turn();
        let mut events = Vec::new();
        self.begin_current_turn(&mut events);
        self.queued_events.extend(events);
    }

    fn begin_current_turn(&mut self, events: &mut Vec<CombatEvent>) {
        let current = self.current_actor();
        if current == self.turn_owner {
            return;
        }
        let Some(id) = current else {
            self.turn_owner = None;
            return;
        };
        // Wait for the unit to become live before handing it the turn
        let Some(unit) = self.registry.get_mut(id) else {
            return;
        };
        unit.walker.reset_movement();
        self.turn_owner = Some(id);
        self.movement_shade = None;
        log::debug!("Turn {} starts for {}", self.sequencer.turn_counter(), id);
        events.push(CombatEvent::TurnStarted { id });
    }

    fn resolve_strike(&mut self, attacker: EntityId, defender: EntityId) -> Option<CombatEvent> {
        let striker = self.registry.get(attacker).filter(|unit| unit.is_alive())?;
        let (damage, reach) = (striker.attack_power, striker.footprint());
        let target = self.registry.get(defender).filter(|unit| unit.is_alive())?;
        if !reach.is_within_reach(&target.footprint()) {
            log::debug!("{} ended its approach out of reach of {}", attacker, defender);
            return None;
        }
        let target_position = target.position;

        let remaining_health = self.registry.get_mut(defender)?.take_damage(damage);
        if let Some(striker) = self.registry.get_mut(attacker) {
            striker.begin_attack(target_position);
        }
        self.entities_stationary = false;
        log::debug!(
            "{} strikes {} for {}, {} health left",
            attacker,
            defender,
            damage,
            remaining_health
        );
        Some(CombatEvent::Struck {
            attacker,
            defender,
            damage,
            remaining_health,
        })
    }

    fn rebuild_snapshot(&mut self) {
        match GridSnapshot::build(
            self.config.arena_width,
            self.config.arena_height,
            None,
            self.registry.footprints(),
        ) {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(err) => log::warn!("Keeping the previous arena snapshot: {}", err),
        }
    }

    fn check_victory(&mut self, events: &mut Vec<CombatEvent>) {
        if self.winner.is_some() || self.registry.has_pending() {
            return;
        }
        let Some((attacker, defender)) = self.teams else {
            return;
        };
        // Fallen units have to leave the arena first
        if self.registry.iter().any(|unit| unit.health <= 0) {
            return;
        }
        let standing = |team: Team| {
            self.registry
                .iter()
                .any(|unit| unit.team == team && unit.is_alive())
        };
        let winner = if !standing(attacker) {
            defender
        } else if !standing(defender) {
            attacker
        } else {
            return;
        };
        log::info!("Team {} has no units left standing", winner.opponent());
        self.winner = Some(winner);
        events.push(CombatEvent::Victory { winner });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    fn quick_config() -> CombatConfig {
        CombatConfig {
            time_between_moves: 0.0,
            attack_duration: 0.0,
            ..CombatConfig::default()
        }
    }

    fn army(team: Team, size: usize) -> Army {
        Army::from_templates(team, &vec![UnitTemplate::default(); size])
    }

    fn settle(session: &mut CombatSession) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(session.tick(DeltaTime::from_secs(FRAME)));
            if session.is_accepting_input() || session.winner().is_some() {
                break;
            }
        }
        events
    }

    fn started(attackers: usize, defenders: usize) -> CombatSession {
        let mut session = CombatSession::new(quick_config());
        session
            .set_up_battlefield(army(Team::Red, attackers), army(Team::Blue, defenders))
            .unwrap();
        settle(&mut session);
        session
    }

    #[test]
    fn test_set_up_places_units_and_orders_turns() {
        let session = started(3, 2);
        let order = session.sequencer().order().to_vec();
        assert_eq!(order.len(), 5);

        let positions: Vec<_> = order
            .iter()
            .map(|id| session.unit(*id).unwrap().position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(17, 0),
                Position::new(17, 1),
            ]
        );
        assert_eq!(session.current_actor(), Some(order[0]));
        assert_eq!(session.unit(order[0]).unwrap().team, Team::Red);
    }

    #[test]
    fn test_units_live_only_after_first_tick() {
        let mut session = CombatSession::new(quick_config());
        session
            .set_up_battlefield(army(Team::Red, 1), army(Team::Blue, 1))
            .unwrap();
        assert_eq!(session.units().count(), 0);
        assert!(!session.is_accepting_input());

        session.tick(DeltaTime::from_secs(FRAME));
        assert_eq!(session.units().count(), 2);
        assert!(session.is_accepting_input());
    }

    #[test]
    fn test_oversized_army_is_rejected() {
        let mut session = CombatSession::new(quick_config());
        let result = session.set_up_battlefield(army(Team::Red, 8), army(Team::Blue, 1));
        assert!(matches!(result, Err(TacticaError::InvalidState(_))));
        assert!(!session.is_battle());

        let same_side = session.set_up_battlefield(army(Team::Red, 1), army(Team::Red, 1));
        assert!(same_side.is_err());
    }

    #[test]
    fn test_move_order_walks_and_ends_turn() {
        let mut session = started(1, 1);
        let order = session.sequencer().order().to_vec();
        let actor = order[0];

        assert!(session.on_target_selected(actor, Position::new(4, 4)));
        assert_eq!(session.current_actor(), Some(order[1]));
        assert!(!session.on_target_selected(order[1], Position::new(10, 0)));

        settle(&mut session);
        let unit = session.unit(actor).unwrap();
        assert_eq!(unit.position, Position::new(4, 4));
        assert_eq!(unit.movement(), DEFAULT_MAX_MOVEMENT - 4);
        assert!(session.is_accepting_input());
    }

    #[test]
    fn test_rejects_wrong_actor_and_out_of_bounds() {
        let mut session = started(1, 1);
        let order = session.sequencer().order().to_vec();
        assert!(!session.on_target_selected(order[1], Position::new(5, 5)));
        assert!(!session.on_target_selected(order[0], Position::new(18, 0)));
        assert!(!session.on_target_selected(order[0], Position::new(0, 0)));
        assert_eq!(session.current_actor(), Some(order[0]));
    }

    #[test]
    fn test_snapshot_blocks_every_unit() {
        let session = started(2, 2);
        let snapshot = session.snapshot();
        assert!(snapshot.is_blocked(Position::new(0, 1)).unwrap());
        assert!(snapshot.is_blocked(Position::new(17, 1)).unwrap());
        assert_eq!(snapshot.blocked_count(), 4);
    }

    #[test]
    fn test_movement_shade_bounded_by_movement() {
        let session = started(1, 1);
        let shade = session.movement_shade().unwrap();
        assert!(shade.is_reachable(Position::new(0, 0)));
        assert!(shade.is_reachable(Position::new(10, 9)));
        assert!(shade.is_unreachable(Position::new(11, 0)));
        assert!(shade.is_unreachable(Position::new(17, 0)));
    }

    #[test]
    fn test_adjacent_enemy_is_struck_immediately() {
        let mut session = started(1, 1);
        let order = session.sequencer().order().to_vec();
        let (red, blue) = (order[0], order[1]);

        if let Some(unit) = session.registry.get_mut(red) {
            unit.position = Position::new(16, 0);
        }
        session.tick(DeltaTime::from_secs(FRAME));

        assert!(session.on_target_selected(red, Position::new(17, 0)));
        assert_eq!(session.current_actor(), Some(blue));
        let events = settle(&mut session);
        assert!(events.iter().any(|event| matches!(
            event,
            CombatEvent::Struck { defender, remaining_health: 6, .. } if *defender == blue
        )));
        assert_eq!(session.unit(red).unwrap().position, Position::new(16, 0));
        assert_eq!(session.unit(blue).unwrap().health, 6);
    }

    #[test]
    fn test_distant_enemy_is_approached_then_struck() {
        let mut session = started(1, 1);
        let order = session.sequencer().order().to_vec();
        let (red, blue) = (order[0], order[1]);
        if let Some(unit) = session.registry.get_mut(red) {
            unit.position = Position::new(10, 3);
        }
        session.tick(DeltaTime::from_secs(FRAME));

        assert!(session.on_target_selected(red, Position::new(17, 0)));
        let events = settle(&mut session);
        let unit = session.unit(red).unwrap();
        assert!(unit.footprint().is_within_reach(&session.unit(blue).unwrap().footprint()));
        assert!(events
            .iter()
            .any(|event| matches!(event, CombatEvent::Struck { attacker, .. } if *attacker == red)));
    }

    #[test]
    fn test_dead_unit_leaves_rotation_and_battle_ends() {
        let mut session = started(1, 2);
        let order = session.sequencer().order().to_vec();
        let (red, blue_a, blue_b) = (order[0], order[1], order[2]);
        if let Some(unit) = session.registry.get_mut(blue_a) {
            unit.health = 0;
        }

        let events = settle(&mut session);
        assert!(events
            .iter()
            .any(|event| matches!(event, CombatEvent::Died { id, .. } if *id == blue_a)));
        assert!(session.unit(blue_a).is_none());
        assert_eq!(session.sequencer().order(), &[red, blue_b]);
        assert!(session.winner().is_none());

        if let Some(unit) = session.registry.get_mut(blue_b) {
            unit.health = 0;
        }
        let events = settle(&mut session);
        assert!(events
            .iter()
            .any(|event| matches!(event, CombatEvent::Victory { winner: Team::Red })));

        let report = session.finish().unwrap();
        assert_eq!(report.winner, Team::Red);
        assert_eq!(report.survivors.len(), 1);
        assert_eq!(report.survivors[0].id, red);
        assert!(!session.is_battle());
    }

    #[test]
    fn test_finish_before_victory_is_an_error() {
        let mut session = started(1, 1);
        assert!(session.finish().is_err());
    }

    #[test]
    fn test_new_actor_gets_movement_restored() {
        let mut session = started(1, 1);
        let order = session.sequencer().order().to_vec();
        let red = order[0];
        assert!(session.on_target_selected(red, Position::new(3, 0)));
        settle(&mut session);
        assert_eq!(session.unit(red).unwrap().movement(), DEFAULT_MAX_MOVEMENT - 3);

        assert!(session.skip_turn());
        settle(&mut session);
        assert_eq!(session.current_actor(), Some(red));
        assert_eq!(session.unit(red).unwrap().movement(), DEFAULT_MAX_MOVEMENT);
    }

    #[test]
    fn test_unit_update_marks_itself_dead() {
        let mut unit = Combatant::from_template(&UnitTemplate::default(), Team::Blue, Position::new(2, 2));
        let mut pending = Pending::new();
        let mut events = Vec::new();
        unit.take_damage(25);
        assert_eq!(unit.health, 0);

        unit.update(DeltaTime::from_secs(FRAME), &mut pending, &mut events);
        assert_eq!(unit.posture, Posture::Dead);
        assert!(pending.is_removal_scheduled(unit.id));
        assert_eq!(events.len(), 1);

        unit.update(DeltaTime::from_secs(FRAME), &mut pending, &mut events);
        assert_eq!(events.len(), 1);
        assert!(unit.is_inactive());
    }
}
