//! # Game State Module
//!
//! Central coordination between the overworld and combat.
//!
//! [`GameState`] owns the overworld and the combat session and drives whichever
//! one is active. Encounters on the map move the armies of both parties into
//! the arena; when the battle is decided the survivors go back to the winning
//! party and the defeated party leaves the map.

use crate::{
    create_rng, Army, CombatEvent, CombatSession, DeltaTime, EngineConfig, EntityId, Generator,
    MovementShade, Overworld, OverworldEvent, OverworldGenerator, Position, Route, TacticaError,
    TacticaResult, Team,
};
use serde::{Deserialize, Serialize};

/// Which part of the game receives ticks and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Overworld,
    Combat,
}

/// Events surfaced to the caller of [`GameState::tick`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Overworld(OverworldEvent),
    Combat(CombatEvent),
    CombatStarted {
        attacker: EntityId,
        defender: EntityId,
    },
    CombatEnded {
        winner: Team,
        winning_party: EntityId,
        defeated_party: EntityId,
        survivors: usize,
        turns: u64,
    },
}

/// Running totals over a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub steps_taken: u64,
    pub strikes: u64,
    pub damage_dealt: u64,
    pub units_lost: u32,
    pub battles_fought: u32,
    pub combat_turns: u64,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Overworld(OverworldEvent::Moved { .. })
            | GameEvent::Combat(CombatEvent::Moved { .. }) => {
                self.steps_taken += 1;
            }
            GameEvent::Combat(CombatEvent::Struck { damage, .. }) => {
                self.strikes += 1;
                self.damage_dealt += (*damage).max(0) as u64;
            }
            GameEvent::Combat(CombatEvent::Died { .. }) => {
                self.units_lost += 1;
            }
            GameEvent::CombatEnded { turns, .. } => {
                self.battles_fought += 1;
                self.combat_turns += turns;
            }
            _ => {}
        }
    }
}

/// The parties fighting the current battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Engagement {
    attacker: EntityId,
    defender: EntityId,
    attacker_team: Team,
}

/// Central game state.
///
/// # Examples
///
/// ```
/// use tactica::{DeltaTime, EngineConfig, GameMode, GameState};
///
/// let mut state = GameState::generate(EngineConfig::default()).unwrap();
/// assert_eq!(state.mode(), GameMode::Overworld);
///
/// state.tick(DeltaTime::from_secs(0.016));
/// assert!(state.overworld().parties().count() >= 2);
/// ```
#[derive(Debug)]
pub struct GameState {
    config: EngineConfig,
    overworld: Overworld,
    combat: CombatSession,
    engagement: Option<Engagement>,
    statistics: GameStatistics,
    elapsed: f64,
}

impl GameState {
    /// Creates a game over an existing overworld.
    pub fn new(config: EngineConfig, overworld: Overworld) -> TacticaResult<Self> {
        config.validate()?;
        Ok(Self {
            combat: CombatSession::new(config.combat.clone()),
            overworld,
            engagement: None,
            statistics: GameStatistics::new(),
            elapsed: 0.0,
            config,
        })
    }

    /// Creates a game over a freshly generated overworld.
    pub fn generate(config: EngineConfig) -> TacticaResult<Self> {
        config.validate()?;
        let mut rng = create_rng(&config.generation);
        let overworld =
            OverworldGenerator::new(config.overworld.clone()).generate(&config.generation, &mut rng)?;
        Self::new(config, overworld)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        if self.engagement.is_some() {
            GameMode::Combat
        } else {
            GameMode::Overworld
        }
    }

    pub fn overworld(&self) -> &Overworld {
        &self.overworld
    }

    pub fn overworld_mut(&mut self) -> &mut Overworld {
        &mut self.overworld
    }

    pub fn combat(&self) -> &CombatSession {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut CombatSession {
        &mut self.combat
    }

    pub fn statistics(&self) -> &GameStatistics {
        &self.statistics
    }

    /// Simulated seconds since the game started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advances the active mode by `delta`.
    pub fn tick(&mut self, delta: DeltaTime) -> Vec<GameEvent> {
        self.elapsed += delta.as_secs();
        let mut events = Vec::new();
        match self.mode() {
            GameMode::Overworld => {
                for event in self.overworld.tick(delta) {
                    let encounter = match event {
                        OverworldEvent::Encounter { attacker, defender } => Some((attacker, defender)),
                        _ => None,
                    };
                    events.push(GameEvent::Overworld(event));
                    if let Some((attacker, defender)) = encounter {
                        if self.engagement.is_some() {
                            continue;
                        }
                        match self.start_combat(attacker, defender) {
                            Ok(()) => events.push(GameEvent::CombatStarted { attacker, defender }),
                            Err(err) => log::warn!("Encounter could not start a battle: {}", err),
                        }
                    }
                }
            }
            GameMode::Combat => {
                for event in self.combat.tick(delta) {
                    events.push(GameEvent::Combat(event));
                }
                if self.combat.winner().is_some() {
                    match self.end_combat() {
                        Ok(ended) => events.push(ended),
                        Err(err) => log::warn!("Could not wrap up the battle: {}", err),
                    }
                }
            }
        }
        for event in &events {
            self.statistics.update_from_event(event);
        }
        events
    }

    /// Moves both parties' armies into the arena.
    pub fn start_combat(&mut self, attacker: EntityId, defender: EntityId) -> TacticaResult<()> {
        if self.engagement.is_some() {
            return Err(TacticaError::InvalidState(
                "a battle is already running".to_string(),
            ));
        }
        let attacking = self.take_army(attacker)?;
        let defending = match self.take_army(defender) {
            Ok(army) => army,
            Err(err) => {
                self.overworld.return_army(attacker, attacking)?;
                return Err(err);
            }
        };

        let attacker_team = attacking.team;
        // Keep copies so a rejected set-up leaves both parties intact
        let (attacking_backup, defending_backup) = (attacking.clone(), defending.clone());
        if let Err(err) = self.combat.set_up_battlefield(attacking, defending) {
            self.overworld.return_army(attacker, attacking_backup)?;
            self.overworld.return_army(defender, defending_backup)?;
            return Err(err);
        }
        log::info!("Party {} engages party {}", attacker, defender);
        self.engagement = Some(Engagement {
            attacker,
            defender,
            attacker_team,
        });
        Ok(())
    }

    fn take_army(&mut self, party: EntityId) -> TacticaResult<Army> {
        self.overworld
            .take_army(party)
            .ok_or_else(|| TacticaError::InvalidAction(format!("no party {} on the map", party)))
    }

    /// Returns the survivors to the winning party and removes the defeated one.
    fn end_combat(&mut self) -> TacticaResult<GameEvent> {
        let engagement = self
            .engagement
            .ok_or_else(|| TacticaError::InvalidState("no battle is running".to_string()))?;
        let winner = self
            .combat
            .winner()
            .ok_or_else(|| TacticaError::InvalidState("the battle has not been decided".to_string()))?;
        let (winning_party, defeated_party) = if engagement.attacker_team == winner {
            (engagement.attacker, engagement.defender)
        } else {
            (engagement.defender, engagement.attacker)
        };
        // The session keeps the survivors until a party can take them
        if self.overworld.party(winning_party).is_none() {
            return Err(TacticaError::InvalidState(format!(
                "winning party {} is no longer on the map",
                winning_party
            )));
        }

        let report = self.combat.finish()?;
        self.engagement = None;

        let survivors = report.survivors.len();
        self.overworld.return_army(
            winning_party,
            Army {
                team: report.winner,
                units: report.survivors,
            },
        )?;
        self.overworld.remove_party(defeated_party);

        log::info!(
            "Team {} won after {} turns with {} survivors",
            report.winner,
            report.turns,
            survivors
        );
        Ok(GameEvent::CombatEnded {
            winner: report.winner,
            winning_party,
            defeated_party,
            survivors,
            turns: report.turns,
        })
    }

    /// Focuses the party or prop on `cell`. Only meaningful on the overworld.
    pub fn select(&mut self, cell: Position) -> Option<EntityId> {
        match self.mode() {
            GameMode::Overworld => self.overworld.select(cell),
            GameMode::Combat => None,
        }
    }

    /// Routes input to the active mode: the acting unit in combat, the focused
    /// party on the overworld.
    pub fn on_target_selected(&mut self, cell: Position) -> bool {
        match self.mode() {
            GameMode::Overworld => self.overworld.command(cell),
            GameMode::Combat => match self.combat.current_actor() {
                Some(actor) => self.combat.on_target_selected(actor, cell),
                None => false,
            },
        }
    }

    /// The acting unit in combat, or the focused entity on the overworld.
    pub fn current_actor(&self) -> Option<EntityId> {
        match self.mode() {
            GameMode::Overworld => self.overworld.focus(),
            GameMode::Combat => self.combat.current_actor(),
        }
    }

    pub fn compute_route(&mut self, id: EntityId, target: Position) -> Option<Route> {
        match self.mode() {
            GameMode::Overworld => self.overworld.compute_route(id, target),
            GameMode::Combat => self.combat.compute_route(id, target),
        }
    }

    pub fn compute_adjacent_route(&mut self, id: EntityId, target: Position) -> Option<Route> {
        match self.mode() {
            GameMode::Overworld => self.overworld.compute_adjacent_route(id, target),
            GameMode::Combat => self.combat.compute_adjacent_route(id, target),
        }
    }

    /// Reachability of the acting unit. Only available in combat.
    pub fn compute_reachability(&mut self) -> Option<MovementShade> {
        match self.mode() {
            GameMode::Overworld => None,
            GameMode::Combat => self.combat.compute_reachability(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapEntity, OverworldConfig, Party, Prop, Size, TerrainMap, UnitTemplate};

    const FRAME: f64 = 1.0 / 60.0;

    fn quick_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.combat.time_between_moves = 0.0;
        config.combat.attack_duration = 0.0;
        config.overworld = OverworldConfig {
            width: 20,
            height: 20,
            time_between_moves: 0.0,
            ..OverworldConfig::default()
        };
        config
    }

    fn fragile() -> UnitTemplate {
        UnitTemplate {
            max_health: 1,
            ..UnitTemplate::default()
        }
    }

    fn game_with_parties(
        red: Vec<UnitTemplate>,
        blue: Vec<UnitTemplate>,
    ) -> (GameState, EntityId, EntityId) {
        let config = quick_config();
        let mut overworld =
            Overworld::new(config.overworld.clone(), TerrainMap::new(20, 20)).unwrap();
        let red = overworld.spawn(MapEntity::Party(Party::new(
            "red",
            Position::new(2, 2),
            Army::from_templates(Team::Red, &red),
            0.0,
        )));
        let blue = overworld.spawn(MapEntity::Party(Party::new(
            "blue",
            Position::new(3, 3),
            Army::from_templates(Team::Blue, &blue),
            0.0,
        )));
        let mut state = GameState::new(config, overworld).unwrap();
        state.tick(DeltaTime::from_secs(FRAME));
        (state, red, blue)
    }

    /// Red charges the first blue unit, blue always passes.
    fn fight(state: &mut GameState) -> Option<GameEvent> {
        for _ in 0..2000 {
            for event in state.tick(DeltaTime::from_secs(FRAME)) {
                if matches!(event, GameEvent::CombatEnded { .. }) {
                    return Some(event);
                }
            }
            let combat = state.combat_mut();
            if !combat.is_accepting_input() {
                continue;
            }
            let Some(actor) = combat.current_actor() else {
                continue;
            };
            let team = combat.unit(actor).map(|unit| unit.team);
            let target = combat
                .units()
                .find(|unit| unit.team == Team::Blue)
                .map(|unit| unit.position);
            let acted = match (team, target) {
                (Some(Team::Red), Some(cell)) => combat.on_target_selected(actor, cell),
                _ => false,
            };
            if !acted {
                combat.skip_turn();
            }
        }
        None
    }

    #[test]
    fn test_encounter_starts_combat() {
        let (mut state, red, blue) =
            game_with_parties(vec![UnitTemplate::default(); 2], vec![UnitTemplate::default()]);
        assert_eq!(state.select(Position::new(2, 2)), Some(red));
        assert_eq!(state.current_actor(), Some(red));
        assert!(state.on_target_selected(Position::new(3, 3)));

        let events = state.tick(DeltaTime::from_secs(FRAME));
        assert!(events.contains(&GameEvent::CombatStarted {
            attacker: red,
            defender: blue
        }));
        assert_eq!(state.mode(), GameMode::Combat);
        assert!(state.overworld().party(red).unwrap().army.is_empty());
        assert!(state.select(Position::new(2, 2)).is_none());
    }

    #[test]
    fn test_battle_outcome_returns_survivors() {
        let (mut state, red, blue) =
            game_with_parties(vec![UnitTemplate::default(); 2], vec![fragile()]);
        state.start_combat(red, blue).unwrap();
        assert!(state.start_combat(red, blue).is_err());

        let ended = fight(&mut state);
        assert!(matches!(
            ended,
            Some(GameEvent::CombatEnded {
                winner: Team::Red,
                winning_party,
                defeated_party,
                survivors: 2,
                ..
            }) if winning_party == red && defeated_party == blue
        ));
        assert_eq!(state.mode(), GameMode::Overworld);
        assert_eq!(state.overworld().party(red).unwrap().army.len(), 2);

        state.tick(DeltaTime::from_secs(FRAME));
        assert!(state.overworld().party(blue).is_none());
        assert_eq!(state.statistics().battles_fought, 1);
        assert_eq!(state.statistics().units_lost, 1);
        assert_eq!(state.statistics().strikes, 1);
    }

    #[test]
    fn test_oversized_army_leaves_parties_intact() {
        let (mut state, red, blue) =
            game_with_parties(vec![UnitTemplate::default(); 8], vec![UnitTemplate::default()]);
        assert!(state.start_combat(red, blue).is_err());
        assert_eq!(state.mode(), GameMode::Overworld);
        assert_eq!(state.overworld().party(red).unwrap().army.len(), 8);
        assert_eq!(state.overworld().party(blue).unwrap().army.len(), 1);
    }

    #[test]
    fn test_overworld_has_no_reachability() {
        let (mut state, red, _) =
            game_with_parties(vec![UnitTemplate::default()], vec![UnitTemplate::default()]);
        assert!(state.compute_reachability().is_none());
        assert!(state.compute_route(red, Position::new(10, 10)).is_some());
    }

    #[test]
    fn test_overworld_route_to_rock_needs_fallback() {
        let config = quick_config();
        let mut overworld =
            Overworld::new(config.overworld.clone(), TerrainMap::new(20, 20)).unwrap();
        let red = overworld.spawn(MapEntity::Party(Party::new(
            "red",
            Position::new(2, 2),
            Army::from_templates(Team::Red, &[UnitTemplate::default()]),
            0.0,
        )));
        overworld.spawn(MapEntity::Prop(Prop::new("rock", Position::new(8, 8), Size::unit())));
        let mut state = GameState::new(config, overworld).unwrap();
        state.tick(DeltaTime::from_secs(FRAME));

        assert!(state.compute_route(red, Position::new(8, 8)).is_none());
        let fallback = state.compute_adjacent_route(red, Position::new(8, 8)).unwrap();
        assert_eq!(fallback.destination(), Some(Position::new(7, 7)));
        assert!(state.compute_route(red, Position::new(7, 7)).is_some());
    }

    #[test]
    fn test_survivors_wait_for_missing_winning_party() {
        let (mut state, red, blue) =
            game_with_parties(vec![UnitTemplate::default(); 2], vec![fragile()]);
        state.start_combat(red, blue).unwrap();
        state.overworld_mut().remove_party(red);
        state.overworld_mut().tick(DeltaTime::from_secs(FRAME));
        assert!(state.overworld().party(red).is_none());

        assert!(fight(&mut state).is_none());
        assert_eq!(state.mode(), GameMode::Combat);
        assert_eq!(state.combat().winner(), Some(Team::Red));
        let survivors = state
            .combat()
            .units()
            .filter(|unit| unit.team == Team::Red && unit.is_alive())
            .count();
        assert_eq!(survivors, 2);
    }
}
