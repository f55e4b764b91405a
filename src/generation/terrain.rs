//! # Overworld Generation
//!
//! Carves lakes into a grass map, scatters rocks and places the parties.
//!
//! The player party always spawns on dry land next to a fixed cluster of
//! landmark rocks. Hostile parties are only placed where the player party can
//! walk up to them.

use crate::{
    ArmyGenerator, DeltaTime, GenerationConfig, Generator, MapEntity, Overworld, OverworldConfig,
    Party, Position, Prop, Size, TacticaError, TacticaResult, Team, TerrainKind, TerrainMap,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Team the player party fights for.
pub const PLAYER_TEAM: Team = Team::Blue;

/// Hostile parties never spawn this close to the player.
const SPAWN_CLEARANCE: u32 = 4;

const LANDMARK_ROCKS: [(i32, i32); 3] = [(10, 10), (11, 11), (10, 12)];
const PLAYER_SPAWN: (i32, i32) = (10, 18);

pub struct OverworldGenerator {
    config: OverworldConfig,
}

impl OverworldGenerator {
    pub fn new(config: OverworldConfig) -> Self {
        Self { config }
    }

    /// Spawn cell of the player party, clamped into the map.
    pub fn player_spawn(&self) -> Position {
        Position::new(
            PLAYER_SPAWN.0.min(self.config.width - 1).max(0),
            PLAYER_SPAWN.1.min(self.config.height - 1).max(0),
        )
    }

    fn carve_lakes(
        &self,
        terrain: &mut TerrainMap,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> TacticaResult<()> {
        if config.max_lake_radius == 0 || terrain.width() == 0 || terrain.height() == 0 {
            return Ok(());
        }
        for _ in 0..config.lakes {
            let center = Position::new(
                rng.gen_range(0..terrain.width()),
                rng.gen_range(0..terrain.height()),
            );
            let radius = rng.gen_range(1..=config.max_lake_radius);
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx * dx + dy * dy > radius * radius {
                        continue;
                    }
                    let cell = center + Position::new(dx, dy);
                    if terrain.contains(cell) {
                        terrain.set(cell, TerrainKind::Water)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Cells a party starting at `start` can walk to, ignoring other parties.
    fn reachable_from(
        terrain: &TerrainMap,
        rocks: &HashSet<Position>,
        start: Position,
    ) -> HashSet<Position> {
        ::pathfinding::prelude::bfs_reach(start, |cell| {
            let cell = *cell;
            cell.adjacent_positions()
                .into_iter()
                .filter(|next| {
                    terrain.get(*next).is_some_and(TerrainKind::is_passable) && !rocks.contains(next)
                })
                .collect::<Vec<_>>()
        })
        .collect()
    }
}

impl Generator<Overworld> for OverworldGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> TacticaResult<Overworld> {
        config.validate()?;
        log::info!(
            "Generating {}x{} overworld with seed {}",
            self.config.width,
            self.config.height,
            config.seed
        );

        let mut terrain = TerrainMap::new(self.config.width, self.config.height);
        self.carve_lakes(&mut terrain, config, rng)?;

        let spawn = self.player_spawn();
        let mut reserved: Vec<Position> = vec![spawn];
        reserved.extend(spawn.adjacent_positions());
        for cell in &reserved {
            if terrain.contains(*cell) {
                terrain.set(*cell, TerrainKind::Grass)?;
            }
        }

        let mut rocks: HashSet<Position> = LANDMARK_ROCKS
            .iter()
            .map(|(x, y)| Position::new(*x, *y))
            .filter(|cell| terrain.contains(*cell) && !reserved.contains(cell))
            .collect();
        for cell in &rocks {
            terrain.set(*cell, TerrainKind::Grass)?;
        }

        let mut open: Vec<Position> = terrain
            .cells_of(TerrainKind::Grass)
            .into_iter()
            .filter(|cell| !reserved.contains(cell) && !rocks.contains(cell))
            .collect();
        open.shuffle(rng);
        rocks.extend(open.iter().take(config.rocks as usize).copied());

        let reachable = Self::reachable_from(&terrain, &rocks, spawn);
        // A camp needs a reachable cell the router can fall back to.
        let mut camps: Vec<Position> = reachable
            .iter()
            .copied()
            .filter(|cell| cell.chebyshev_distance(spawn) > SPAWN_CLEARANCE)
            .filter(|cell| {
                self.config
                    .search
                    .adjacent
                    .candidates(*cell)
                    .iter()
                    .any(|candidate| reachable.contains(candidate))
            })
            .collect();
        // HashSet order is unstable; sort before drawing from the rng.
        camps.sort_by_key(|cell| (cell.y, cell.x));
        camps.shuffle(rng);

        let mut overworld = Overworld::new(self.config.clone(), terrain)?;
        let mut rock_cells: Vec<Position> = rocks.into_iter().collect();
        rock_cells.sort_by_key(|cell| (cell.y, cell.x));
        for cell in rock_cells {
            overworld.spawn(MapEntity::Prop(Prop::new("rock", cell, Size::unit())));
        }

        let player_army = ArmyGenerator::new(PLAYER_TEAM).generate(config, rng)?;
        overworld.spawn(MapEntity::Party(Party::new(
            "player",
            spawn,
            player_army,
            self.config.time_between_moves,
        )));

        let mut placed: Vec<Position> = Vec::new();
        for cell in camps {
            if placed.len() == config.hostile_parties as usize {
                break;
            }
            if placed.iter().any(|other| other.chebyshev_distance(cell) <= 1) {
                continue;
            }
            let army = ArmyGenerator::new(PLAYER_TEAM.opponent()).generate(config, rng)?;
            let name = format!("raiders {}", placed.len() + 1);
            overworld.spawn(MapEntity::Party(Party::new(
                name,
                cell,
                army,
                self.config.time_between_moves,
            )));
            placed.push(cell);
        }
        if placed.len() < config.hostile_parties as usize {
            log::warn!(
                "Only {} of {} hostile parties fit on the map",
                placed.len(),
                config.hostile_parties
            );
        }

        // Settle the spawn queue.
        overworld.tick(DeltaTime::from_secs(0.0));
        self.validate(&overworld, config)?;
        Ok(overworld)
    }

    fn validate(&self, content: &Overworld, _config: &GenerationConfig) -> TacticaResult<()> {
        let player_count = content
            .parties()
            .filter(|party| party.team == PLAYER_TEAM)
            .count();
        if player_count != 1 {
            return Err(TacticaError::InvalidState(format!(
                "expected one player party, found {}",
                player_count
            )));
        }
        for party in content.parties() {
            if content.terrain().get(party.position) != Some(TerrainKind::Grass) {
                return Err(TacticaError::InvalidState(format!(
                    "party {} spawned off dry land at {}",
                    party.name, party.position
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "OverworldGenerator"
    }
}
