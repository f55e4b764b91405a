//! # Search Heuristics
//!
//! Distance estimates used to order the A* open set.

use crate::{Mover, Position};
use serde::{Deserialize, Serialize};

/// Estimated remaining cost from a cell to the search target.
pub trait Heuristic: std::fmt::Debug {
    fn cost(&self, mover: &dyn Mover, from: Position, target: Position) -> f32;
}

/// Squared Euclidean distance.
///
/// Not admissible. Routes come out direct and greedy-looking rather than strictly
/// shortest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestSquaredHeuristic;

impl Heuristic for ClosestSquaredHeuristic {
    fn cost(&self, _mover: &dyn Mover, from: Position, target: Position) -> f32 {
        let dx = (target.x - from.x) as f32;
        let dy = (target.y - from.y) as f32;
        dx * dx + dy * dy
    }
}

/// Euclidean distance. Admissible for unit step costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestHeuristic;

impl Heuristic for ClosestHeuristic {
    fn cost(&self, _mover: &dyn Mover, from: Position, target: Position) -> f32 {
        from.euclidean_distance(target) as f32
    }
}

/// Manhattan distance, for grids without diagonal movement.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanHeuristic;

impl Heuristic for ManhattanHeuristic {
    fn cost(&self, _mover: &dyn Mover, from: Position, target: Position) -> f32 {
        from.manhattan_distance(target) as f32
    }
}

/// Serializable selector for the built-in heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    #[default]
    ClosestSquared,
    Closest,
    Manhattan,
}

impl HeuristicKind {
    pub fn build(self) -> Box<dyn Heuristic> {
        match self {
            HeuristicKind::ClosestSquared => Box::new(ClosestSquaredHeuristic),
            HeuristicKind::Closest => Box::new(ClosestHeuristic),
            HeuristicKind::Manhattan => Box::new(ManhattanHeuristic),
        }
    }
}
