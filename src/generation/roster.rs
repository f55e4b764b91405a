//! # Roster Generation
//!
//! Draws armies from the configured unit templates.

use crate::{config::STARTING_SLOTS, Army, Combatant, GenerationConfig, Generator, Position};
use crate::{TacticaError, TacticaResult, Team};
use rand::rngs::StdRng;
use rand::Rng;

/// Builds an army of `army_size` units for one team.
///
/// The first units follow the roster order, so a roster at least as long as the
/// army yields one of each template. Further units are drawn at random.
#[derive(Debug, Clone, Copy)]
pub struct ArmyGenerator {
    pub team: Team,
}

impl ArmyGenerator {
    pub fn new(team: Team) -> Self {
        Self { team }
    }
}

impl Generator<Army> for ArmyGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> TacticaResult<Army> {
        config.validate()?;
        let mut army = Army::new(self.team);
        for slot in 0..config.army_size {
            let template = if slot < config.roster.len() {
                &config.roster[slot]
            } else {
                &config.roster[rng.gen_range(0..config.roster.len())]
            };
            army.units
                .push(Combatant::from_template(template, self.team, Position::origin()));
        }
        self.validate(&army, config)?;
        log::debug!("Generated {} army of {} units", self.team, army.len());
        Ok(army)
    }

    fn validate(&self, content: &Army, config: &GenerationConfig) -> TacticaResult<()> {
        if content.len() != config.army_size || content.len() > STARTING_SLOTS {
            return Err(TacticaError::InvalidState(format!(
                "generated army has {} units, expected {}",
                content.len(),
                config.army_size
            )));
        }
        if content.units.iter().any(|unit| unit.team != self.team) {
            return Err(TacticaError::InvalidState(
                "generated army mixes teams".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "ArmyGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_rng;

    #[test]
    fn test_default_army_uses_each_template() {
        let config = GenerationConfig::new(3);
        let army = ArmyGenerator::new(Team::Red)
            .generate(&config, &mut create_rng(&config))
            .unwrap();
        let names: Vec<_> = army.units.iter().map(|unit| unit.name.as_str()).collect();
        assert_eq!(names, vec!["ninja", "shadow ninja", "masked ninja"]);
        assert!(army.units.iter().all(|unit| unit.team == Team::Red && unit.is_alive()));
    }

    #[test]
    fn test_large_army_draws_from_roster() {
        let mut config = GenerationConfig::new(3);
        config.army_size = 7;
        let army = ArmyGenerator::new(Team::Blue)
            .generate(&config, &mut create_rng(&config))
            .unwrap();
        assert_eq!(army.len(), 7);
        assert!(army
            .units
            .iter()
            .all(|unit| config.roster.iter().any(|template| template.name == unit.name)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = GenerationConfig::new(3);
        config.army_size = 0;
        let result = ArmyGenerator::new(Team::Blue).generate(&config, &mut create_rng(&config));
        assert!(result.is_err());
    }
}
