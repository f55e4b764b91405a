//! # Auto Commander
//!
//! A scripted commander that plays the acting unit of a battle, and marches
//! idle parties across the overworld toward the nearest hostile party.
//!
//! Decisions are spaced by a configurable delay and any random choice is drawn
//! from a seeded [`StdRng`], so a headless run with the same seed and tick
//! stream replays identically.

use crate::{
    CombatSession, Combatant, DeltaTime, EntityId, GameMode, GameState, Mover, Occupant,
    Overworld, Position, Team,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Seconds between two decisions by default.
pub const DEFAULT_DECISION_DELAY: f64 = 0.2;

/// An order the commander has given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommanderOrder {
    /// Struck an enemy within reach
    Strike { actor: EntityId, target: EntityId },
    /// Walked toward an enemy, striking it on arrival when in reach
    Approach { actor: EntityId, target: EntityId },
    /// Walked to a random reachable cell
    Wander { actor: EntityId, cell: Position },
    /// Passed the turn
    Skip { actor: EntityId },
    /// Sent a party toward a hostile party on the overworld
    March { party: EntityId, target: EntityId },
}

/// Scripted decision maker.
///
/// # Examples
///
/// ```
/// use tactica::{AutoCommander, DeltaTime, EngineConfig, GameState};
///
/// let mut state = GameState::generate(EngineConfig::default()).unwrap();
/// let mut commander = AutoCommander::new(7).with_decision_delay(0.0);
///
/// let order = commander.tick(DeltaTime::from_secs(0.016), &mut state);
/// assert!(order.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct AutoCommander {
    /// Whether the commander gives orders
    pub enabled: bool,
    /// Seconds between two decisions
    pub decision_delay: f64,
    time_until_decision: f64,
    teams: Vec<Team>,
    rng: StdRng,
}

impl AutoCommander {
    /// Creates an enabled commander playing both teams.
    pub fn new(seed: u64) -> Self {
        Self {
            enabled: true,
            decision_delay: DEFAULT_DECISION_DELAY,
            time_until_decision: 0.0,
            teams: vec![Team::Red, Team::Blue],
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_decision_delay(mut self, seconds: f64) -> Self {
        self.decision_delay = seconds.max(0.0);
        self
    }

    /// Restricts the commander to the given teams.
    pub fn with_teams(mut self, teams: &[Team]) -> Self {
        self.teams = teams.to_vec();
        self
    }

    pub fn controls(&self, team: Team) -> bool {
        self.teams.contains(&team)
    }

    /// Toggles the commander on/off.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.time_until_decision = 0.0;
        self.enabled
    }

    /// Gives at most one order to whichever part of the game is active.
    pub fn tick(&mut self, delta: DeltaTime, state: &mut GameState) -> Option<CommanderOrder> {
        match state.mode() {
            GameMode::Overworld => self.command_overworld(delta, state.overworld_mut()),
            GameMode::Combat => self.command_combat(delta, state.combat_mut()),
        }
    }

    /// Plays the acting unit of `session` once it accepts input.
    pub fn command_combat(
        &mut self,
        delta: DeltaTime,
        session: &mut CombatSession,
    ) -> Option<CommanderOrder> {
        if !self.is_due(delta) || !session.is_accepting_input() {
            return None;
        }
        let actor = session.current_actor()?;
        let unit = session.unit(actor)?;
        if !self.controls(unit.team) {
            return None;
        }
        let order = self.decide(actor, session)?;
        log::debug!("Commander order: {:?}", order);
        self.time_until_decision = self.decision_delay;
        Some(order)
    }

    /// Marches the first idle party toward its nearest hostile party.
    pub fn command_overworld(
        &mut self,
        delta: DeltaTime,
        overworld: &mut Overworld,
    ) -> Option<CommanderOrder> {
        if !self.is_due(delta) || !overworld.is_settled() {
            return None;
        }
        let mut marches: Vec<(EntityId, EntityId, Position)> = Vec::new();
        for party in overworld
            .parties()
            .filter(|party| self.controls(party.team) && !party.army.is_empty())
        {
            let nearest = overworld
                .parties()
                .filter(|other| other.team != party.team)
                .min_by_key(|other| other.position.chebyshev_distance(party.position));
            if let Some(other) = nearest {
                marches.push((party.id, other.id, other.position));
            }
        }
        for (party, target, cell) in marches {
            if overworld.command_party(party, cell) {
                self.time_until_decision = self.decision_delay;
                let order = CommanderOrder::March { party, target };
                log::debug!("Commander order: {:?}", order);
                return Some(order);
            }
        }
        None
    }

    fn is_due(&mut self, delta: DeltaTime) -> bool {
        if !self.enabled {
            return false;
        }
        self.time_until_decision -= delta.as_secs();
        self.time_until_decision <= 0.0
    }

    fn decide(&mut self, actor: EntityId, session: &mut CombatSession) -> Option<CommanderOrder> {
        let unit = session.unit(actor)?;
        let (team, origin, reach) = (unit.team, unit.position(), unit.footprint());
        let rotation = |id: EntityId| {
            session
                .sequencer()
                .order()
                .iter()
                .position(|other| *other == id)
                .unwrap_or(usize::MAX)
        };
        let mut enemies: Vec<(u32, usize, EntityId, Position, bool)> = session
            .units()
            .filter(|other| other.team != team && other.is_alive())
            .map(|other: &Combatant| {
                (
                    other.position.chebyshev_distance(origin),
                    rotation(other.id),
                    other.id,
                    other.position,
                    reach.is_within_reach(&other.footprint()),
                )
            })
            .collect();
        enemies.sort_by_key(|(distance, order, ..)| (*distance, *order));

        let adjacent = enemies
            .iter()
            .filter(|enemy| enemy.4)
            .min_by_key(|enemy| enemy.1)
            .copied();
        if let Some((_, _, target, cell, _)) = adjacent {
            if session.on_target_selected(actor, cell) {
                return Some(CommanderOrder::Strike { actor, target });
            }
        }

        for (_, _, target, cell, _) in &enemies {
            let has_way = session
                .compute_adjacent_route(actor, *cell)
                .is_some_and(|route| route.moves() > 0);
            if has_way && session.on_target_selected(actor, *cell) {
                return Some(CommanderOrder::Approach {
                    actor,
                    target: *target,
                });
            }
        }

        let mut cells = session
            .compute_reachability()
            .map(|shade| shade.reachable_cells())
            .unwrap_or_default();
        cells.retain(|cell| *cell != origin);
        if let Some(cell) = cells.choose(&mut self.rng).copied() {
            if session.on_target_selected(actor, cell) {
                return Some(CommanderOrder::Wander { actor, cell });
            }
        }

        session
            .skip_turn()
            .then_some(CommanderOrder::Skip { actor })
    }
}
