//! # Generation Module
//!
//! Seeded content generation: army rosters and overworld maps.
//!
//! Every generator draws from a [`StdRng`] created from [`GenerationConfig::seed`],
//! so the same configuration always produces the same layout.

pub mod roster;
pub mod terrain;

pub use roster::*;
pub use terrain::*;

use crate::{config::STARTING_SLOTS, TacticaError, TacticaResult, UnitTemplate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of lakes carved into the overworld
    pub lakes: u32,
    /// Largest lake radius in tiles
    pub max_lake_radius: i32,
    /// Number of rocks scattered in addition to the landmark rocks
    pub rocks: u32,
    /// Number of hostile parties placed on the map
    pub hostile_parties: u32,
    /// Units per generated army
    pub army_size: usize,
    /// Templates armies are drawn from
    pub roster: Vec<UnitTemplate>,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            lakes: 6,
            max_lake_radius: 6,
            rocks: 40,
            hostile_parties: 2,
            army_size: 3,
            roster: default_roster(),
        }
    }

    /// Creates a configuration for testing with a bare map.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            lakes: 1,
            max_lake_radius: 2,
            rocks: 3,
            hostile_parties: 1,
            army_size: 2,
            roster: vec![UnitTemplate::default()],
        }
    }

    pub fn validate(&self) -> TacticaResult<()> {
        if self.army_size == 0 || self.army_size > STARTING_SLOTS {
            return Err(TacticaError::InvalidConfig(format!(
                "army_size must be between 1 and {}, got {}",
                STARTING_SLOTS, self.army_size
            )));
        }
        if self.roster.is_empty() {
            return Err(TacticaError::InvalidConfig(
                "roster needs at least one unit template".to_string(),
            ));
        }
        if let Some(template) = self
            .roster
            .iter()
            .find(|template| template.max_health <= 0 || template.size.width <= 0 || template.size.height <= 0)
        {
            return Err(TacticaError::InvalidConfig(format!(
                "unit template {} needs positive health and size",
                template.name
            )));
        }
        if self.max_lake_radius < 0 {
            return Err(TacticaError::InvalidConfig(
                "max_lake_radius cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

fn default_roster() -> Vec<UnitTemplate> {
    vec![
        UnitTemplate {
            name: "ninja".to_string(),
            ..UnitTemplate::default()
        },
        UnitTemplate {
            name: "shadow ninja".to_string(),
            max_health: 8,
            attack_power: 5,
            ..UnitTemplate::default()
        },
        UnitTemplate {
            name: "masked ninja".to_string(),
            max_health: 12,
            attack_power: 3,
            max_movement: 8,
            ..UnitTemplate::default()
        },
    ]
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> TacticaResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> TacticaResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Creates a seeded random number generator from the config.
pub fn create_rng(config: &GenerationConfig) -> StdRng {
    StdRng::seed_from_u64(config.seed)
}
