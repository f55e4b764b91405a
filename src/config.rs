//! # Engine Configuration
//!
//! Compile-time defaults and the runtime [`EngineConfig`] loaded from JSON.

use crate::{GenerationConfig, PathfinderSettings, TacticaError, TacticaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Width of the combat arena in tiles
pub const ARENA_WIDTH: i32 = 18;

/// Height of the combat arena in tiles
pub const ARENA_HEIGHT: i32 = 10;

/// Default overworld width in tiles
pub const MAP_WIDTH: i32 = 100;

/// Default overworld height in tiles
pub const MAP_HEIGHT: i32 = 100;

/// Search distance of the combat click router
pub const COMBAT_SEARCH_DISTANCE: u32 = 50;

/// Search distance of the overworld router
pub const MAP_SEARCH_DISTANCE: u32 = 500;

/// Seconds a walker waits between two steps
pub const TIME_BETWEEN_MOVES: f64 = 0.3;

/// Seconds a strike keeps the attacker busy
pub const ATTACK_DURATION: f64 = 0.4;

/// Movement points a unit starts each turn with
pub const DEFAULT_MAX_MOVEMENT: u32 = 10;

/// Number of starting slots per side of the arena
pub const STARTING_SLOTS: usize = 7;

/// Frames per second target for the headless driver
pub const TARGET_FPS: u64 = 60;

/// Settings for combat sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub arena_width: i32,
    pub arena_height: i32,
    /// Router used for move and attack clicks
    pub search: PathfinderSettings,
    pub time_between_moves: f64,
    pub attack_duration: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            search: PathfinderSettings::new(COMBAT_SEARCH_DISTANCE),
            time_between_moves: TIME_BETWEEN_MOVES,
            attack_duration: ATTACK_DURATION,
        }
    }
}

/// Settings for the overworld map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverworldConfig {
    pub width: i32,
    pub height: i32,
    pub search: PathfinderSettings,
    pub time_between_moves: f64,
}

impl Default for OverworldConfig {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            search: PathfinderSettings::new(MAP_SEARCH_DISTANCE),
            time_between_moves: TIME_BETWEEN_MOVES,
        }
    }
}

/// Complete runtime configuration of the engine.
///
/// Every field has a default, so a partial JSON document is accepted.
///
/// # Examples
///
/// ```
/// use tactica::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "combat": { "arena_width": 12 } }"#).unwrap();
/// assert_eq!(config.combat.arena_width, 12);
/// assert_eq!(config.combat.arena_height, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub combat: CombatConfig,
    pub overworld: OverworldConfig,
    pub generation: GenerationConfig,
}

impl EngineConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> TacticaResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> TacticaResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Self::from_json(&contents)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> TacticaResult<String> {
        serde_json::to_string_pretty(self).map_err(TacticaError::from)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> TacticaResult<()> {
        let combat = &self.combat;
        if combat.arena_width <= 0 || combat.arena_height <= 0 {
            return Err(TacticaError::InvalidConfig(format!(
                "arena must have positive dimensions, got {}x{}",
                combat.arena_width, combat.arena_height
            )));
        }
        if combat.arena_height < STARTING_SLOTS as i32 {
            return Err(TacticaError::InvalidConfig(format!(
                "arena height {} cannot hold {} starting slots",
                combat.arena_height, STARTING_SLOTS
            )));
        }
        if self.overworld.width <= 0 || self.overworld.height <= 0 {
            return Err(TacticaError::InvalidConfig(format!(
                "overworld must have positive dimensions, got {}x{}",
                self.overworld.width, self.overworld.height
            )));
        }
        if combat.search.max_search_distance == 0 || self.overworld.search.max_search_distance == 0
        {
            return Err(TacticaError::InvalidConfig(
                "max_search_distance must be at least 1".to_string(),
            ));
        }
        if combat.time_between_moves < 0.0 || self.overworld.time_between_moves < 0.0 {
            return Err(TacticaError::InvalidConfig(
                "time_between_moves cannot be negative".to_string(),
            ));
        }
        self.generation.validate()
    }
}
