//! # Game Module
//!
//! Grid coordinates, entity identity, and the stateful parts of the engine.
//!
//! This module contains the building blocks the pathfinding core is driven by:
//! - Cell coordinates, directions and entity footprints
//! - Capability traits and the walker component for movable entities
//! - The deferred-mutation entity registry and the turn sequencer
//! - Combat sessions, the overworld, and the top-level game state

pub mod ai;
pub mod combat;
pub mod entities;
pub mod overworld;
pub mod registry;
pub mod state;
pub mod turn;

pub use ai::*;
pub use combat::*;
pub use entities::*;
pub use overworld::*;
pub use registry::*;
pub use state::*;
pub use turn::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a cell coordinate on a grid.
///
/// # Examples
///
/// ```
/// use tactica::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.adjacent_positions();
/// assert_eq!(adjacent.len(), 8); // All 8 surrounding positions
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Calculates the Chebyshev (king-move) distance to another position.
    ///
    /// This is the number of steps a mover needs when diagonal movement is allowed.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether `other` is one of the 8 cells surrounding this one.
    pub fn is_adjacent(self, other: Position) -> bool {
        self.chebyshev_distance(other) == 1
    }

    /// Returns all 8 adjacent positions (including diagonals).
    pub fn adjacent_positions(self) -> Vec<Position> {
        vec![
            Position::new(self.x - 1, self.y - 1), // NW
            Position::new(self.x, self.y - 1),     // N
            Position::new(self.x + 1, self.y - 1), // NE
            Position::new(self.x - 1, self.y),     // W
            Position::new(self.x + 1, self.y),     // E
            Position::new(self.x - 1, self.y + 1), // SW
            Position::new(self.x, self.y + 1),     // S
            Position::new(self.x + 1, self.y + 1), // SE
        ]
    }

    /// Returns only the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        vec![
            Position::new(self.x, self.y - 1), // N
            Position::new(self.x - 1, self.y), // W
            Position::new(self.x + 1, self.y), // E
            Position::new(self.x, self.y + 1), // S
        ]
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Directions for movement and facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
            Direction::Northeast => Position::new(1, -1),
            Direction::Northwest => Position::new(-1, -1),
            Direction::Southeast => Position::new(1, 1),
            Direction::Southwest => Position::new(-1, 1),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None if the delta doesn't correspond to a single grid step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        Direction::all()
            .into_iter()
            .find(|direction| direction.to_delta() == delta)
    }

    /// Returns all 8 directions.
    pub fn all() -> Vec<Direction> {
        vec![
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::Northeast,
            Direction::Northwest,
            Direction::Southeast,
            Direction::Southwest,
        ]
    }
}

/// Width and height of an entity, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// A single-cell footprint.
    pub fn unit() -> Self {
        Self::new(1, 1)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::unit()
    }
}

/// The rectangle of cells an entity occupies: its position plus its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Top-left cell
    pub position: Position,
    pub size: Size,
}

impl Footprint {
    pub fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    /// Whether the footprint covers the given cell.
    pub fn contains(&self, cell: Position) -> bool {
        cell.x >= self.position.x
            && cell.y >= self.position.y
            && cell.x < self.position.x + self.size.width
            && cell.y < self.position.y + self.size.height
    }

    /// Whether some cell of `other` is at most one king move away from some
    /// cell of this footprint. Overlapping footprints are within reach.
    pub fn is_within_reach(&self, other: &Footprint) -> bool {
        other.position.x <= self.position.x + self.size.width
            && other.position.x + other.size.width >= self.position.x
            && other.position.y <= self.position.y + self.size.height
            && other.position.y + other.size.height >= self.position.y
    }

    /// Every covered cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size.height).flat_map(move |dy| {
            (0..self.size.width)
                .map(move |dx| Position::new(self.position.x + dx, self.position.y + dy))
        })
    }
}

/// Unique identifier for game entities.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_manhattan_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(pos2), 7);
    }

    #[test]
    fn test_position_chebyshev_distance() {
        let pos1 = Position::new(0, 0);
        assert_eq!(pos1.chebyshev_distance(Position::new(17, 9)), 17);
        assert_eq!(pos1.chebyshev_distance(Position::new(-2, 5)), 5);
    }

    #[test]
    fn test_position_euclidean_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.euclidean_distance(pos2), 5.0);
    }

    #[test]
    fn test_position_adjacency() {
        let pos = Position::new(5, 5);
        assert!(pos.is_adjacent(Position::new(4, 4)));
        assert!(pos.is_adjacent(Position::new(5, 6)));
        assert!(!pos.is_adjacent(pos));
        assert!(!pos.is_adjacent(Position::new(7, 5)));

        let cardinal = pos.cardinal_adjacent_positions();
        assert_eq!(cardinal.len(), 4);
        assert!(!cardinal.contains(&Position::new(4, 4)));
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_direction_round_trip_through_delta() {
        for direction in Direction::all() {
            assert_eq!(Direction::from_delta(direction.to_delta()), Some(direction));
        }
        assert_eq!(Direction::from_delta(Position::new(2, 0)), None);
    }

    #[test]
    fn test_footprint_cells() {
        let footprint = Footprint::new(Position::new(2, 3), Size::new(2, 2));
        let cells: Vec<_> = footprint.cells().collect();
        assert_eq!(
            cells,
            vec![
                Position::new(2, 3),
                Position::new(3, 3),
                Position::new(2, 4),
                Position::new(3, 4)
            ]
        );
        assert!(footprint.contains(Position::new(3, 4)));
        assert!(!footprint.contains(Position::new(4, 4)));
    }

    #[test]
    fn test_footprint_reach() {
        let unit = Footprint::new(Position::new(3, 3), Size::unit());
        assert!(unit.is_within_reach(&Footprint::new(Position::new(4, 4), Size::unit())));
        assert!(unit.is_within_reach(&Footprint::new(Position::new(2, 3), Size::unit())));
        assert!(!unit.is_within_reach(&Footprint::new(Position::new(5, 3), Size::unit())));

        let wide = Footprint::new(Position::new(0, 0), Size::new(3, 1));
        assert!(wide.is_within_reach(&Footprint::new(Position::new(3, 1), Size::unit())));
        assert!(!wide.is_within_reach(&Footprint::new(Position::new(4, 0), Size::unit())));
    }

    #[test]
    fn test_entity_id_uniqueness() {
        let id1 = new_entity_id();
        let id2 = new_entity_id();
        assert_ne!(id1, id2);
    }
}
