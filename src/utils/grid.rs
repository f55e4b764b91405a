//! # Grid Model
//!
//! Blocked-cell views of a map, as seen by the pathfinder.
//!
//! A [`GridSnapshot`] is built from static terrain plus the footprints of every
//! live entity, used for the queries of one tick, and then thrown away. Entity
//! occupancy changes every tick, so snapshots are never cached across ticks.

use crate::{Footprint, Mover, Position, TacticaError, TacticaResult};
use ::pathfinding::matrix::Matrix;
use serde::{Deserialize, Serialize};

/// The contract the pathfinder routes over.
///
/// `blocked` and `cost` expect in-bounds cells; callers check [`GridModel::contains`]
/// first.
pub trait GridModel {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Whether `mover` may not enter `position` during this query.
    fn blocked(&self, mover: &dyn Mover, position: Position) -> bool;

    /// Cost of a single step between two adjacent cells.
    fn cost(&self, mover: &dyn Mover, from: Position, to: Position) -> f32;

    fn contains(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width() && position.y < self.height()
    }
}

/// Static ground types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    #[default]
    Grass,
    Water,
}

impl TerrainKind {
    pub fn is_passable(self) -> bool {
        matches!(self, TerrainKind::Grass)
    }
}

/// Static terrain of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainMap {
    tiles: Matrix<TerrainKind>,
}

impl TerrainMap {
    /// Creates an all-grass map.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            tiles: Matrix::new(
                height.max(0) as usize,
                width.max(0) as usize,
                TerrainKind::Grass,
            ),
        }
    }

    pub fn width(&self) -> i32 {
        self.tiles.columns as i32
    }

    pub fn height(&self) -> i32 {
        self.tiles.rows as i32
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width() && position.y < self.height()
    }

    pub fn get(&self, position: Position) -> Option<TerrainKind> {
        self.contains(position)
            .then(|| self.tiles[(position.y as usize, position.x as usize)])
    }

    pub fn set(&mut self, position: Position, kind: TerrainKind) -> TacticaResult<()> {
        if !self.contains(position) {
            return Err(out_of_bounds(position, self.width(), self.height()));
        }
        self.tiles[(position.y as usize, position.x as usize)] = kind;
        Ok(())
    }

    /// All cells of the given kind, row by row.
    pub fn cells_of(&self, kind: TerrainKind) -> Vec<Position> {
        let mut cells = Vec::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                let position = Position::new(x, y);
                if self.get(position) == Some(kind) {
                    cells.push(position);
                }
            }
        }
        cells
    }
}

/// A width × height blocked-cell grid for one query window.
///
/// # Examples
///
/// ```
/// use tactica::{Footprint, GridSnapshot, Position, Size};
///
/// let rock = Footprint::new(Position::new(2, 2), Size::new(2, 1));
/// let grid = GridSnapshot::build(5, 5, None, [rock]).unwrap();
/// assert!(grid.is_blocked(Position::new(3, 2)).unwrap());
/// assert!(!grid.is_blocked(Position::new(3, 3)).unwrap());
/// assert!(grid.is_blocked(Position::new(9, 9)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    blocked: Matrix<bool>,
}

impl GridSnapshot {
    /// Creates a grid with every cell free.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            blocked: Matrix::new(height.max(0) as usize, width.max(0) as usize, false),
        }
    }

    /// Creates a grid with impassable terrain blocked.
    pub fn from_terrain(terrain: &TerrainMap) -> Self {
        let mut grid = Self::new(terrain.width(), terrain.height());
        for y in 0..terrain.height() {
            for x in 0..terrain.width() {
                let position = Position::new(x, y);
                if terrain.get(position).is_some_and(|kind| !kind.is_passable()) {
                    grid.blocked[(y as usize, x as usize)] = true;
                }
            }
        }
        grid
    }

    /// Builds a snapshot from optional terrain and the footprints of live entities.
    ///
    /// When terrain is given it must match the requested dimensions.
    pub fn build(
        width: i32,
        height: i32,
        terrain: Option<&TerrainMap>,
        footprints: impl IntoIterator<Item = Footprint>,
    ) -> TacticaResult<Self> {
        let mut grid = match terrain {
            Some(terrain) => {
                if terrain.width() != width || terrain.height() != height {
                    return Err(TacticaError::InvalidState(format!(
                        "terrain is {}x{} but the grid is {}x{}",
                        terrain.width(),
                        terrain.height(),
                        width,
                        height
                    )));
                }
                Self::from_terrain(terrain)
            }
            None => Self::new(width, height),
        };
        for footprint in footprints {
            grid.block_footprint(&footprint)?;
        }
        Ok(grid)
    }

    pub fn contains(&self, position: Position) -> bool {
        GridModel::contains(self, position)
    }

    /// Checked blocked lookup.
    pub fn is_blocked(&self, position: Position) -> TacticaResult<bool> {
        if !self.contains(position) {
            return Err(out_of_bounds(position, self.width(), self.height()));
        }
        Ok(self.blocked[(position.y as usize, position.x as usize)])
    }

    pub fn block(&mut self, position: Position) -> TacticaResult<()> {
        self.set_blocked(position, true)
    }

    /// Marks every cell of a footprint blocked.
    ///
    /// Nothing is marked if any cell lies outside of the grid.
    pub fn block_footprint(&mut self, footprint: &Footprint) -> TacticaResult<()> {
        if let Some(outside) = footprint.cells().find(|cell| !self.contains(*cell)) {
            return Err(out_of_bounds(outside, self.width(), self.height()));
        }
        for cell in footprint.cells() {
            self.blocked[(cell.y as usize, cell.x as usize)] = true;
        }
        Ok(())
    }

    pub fn blocked_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.blocked.rows {
            for column in 0..self.blocked.columns {
                if self.blocked[(row, column)] {
                    count += 1;
                }
            }
        }
        count
    }

    fn set_blocked(&mut self, position: Position, value: bool) -> TacticaResult<()> {
        if !self.contains(position) {
            return Err(out_of_bounds(position, self.width(), self.height()));
        }
        self.blocked[(position.y as usize, position.x as usize)] = value;
        Ok(())
    }
}

impl GridModel for GridSnapshot {
    fn width(&self) -> i32 {
        self.blocked.columns as i32
    }

    fn height(&self) -> i32 {
        self.blocked.rows as i32
    }

    /// # Panics
    ///
    /// Panics if `position` is outside of the grid.
    fn blocked(&self, _mover: &dyn Mover, position: Position) -> bool {
        assert!(
            self.contains(position),
            "blocked query at {} outside of the {}x{} grid",
            position,
            self.width(),
            self.height()
        );
        self.blocked[(position.y as usize, position.x as usize)]
    }

    fn cost(&self, _mover: &dyn Mover, _from: Position, _to: Position) -> f32 {
        1.0
    }
}

/// Per-cell reachability of a mover, as computed by the pathfinder.
///
/// The grid stores `true` for cells the mover can NOT reach. Presentation code
/// highlighting the move range wants [`MovementShade::is_reachable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementShade {
    unreachable: Matrix<bool>,
}

impl MovementShade {
    /// Creates a shade with every cell unreachable.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            unreachable: Matrix::new(height.max(0) as usize, width.max(0) as usize, true),
        }
    }

    pub fn width(&self) -> i32 {
        self.unreachable.columns as i32
    }

    pub fn height(&self) -> i32 {
        self.unreachable.rows as i32
    }

    pub(crate) fn set_unreachable(&mut self, position: Position, unreachable: bool) {
        self.unreachable[(position.y as usize, position.x as usize)] = unreachable;
    }

    /// `true` when no route reaches the cell. Out-of-bounds cells are unreachable.
    pub fn is_unreachable(&self, position: Position) -> bool {
        if position.x < 0 || position.y < 0 || position.x >= self.width() || position.y >= self.height()
        {
            return true;
        }
        self.unreachable[(position.y as usize, position.x as usize)]
    }

    pub fn is_reachable(&self, position: Position) -> bool {
        !self.is_unreachable(position)
    }

    /// Every reachable cell, row by row.
    pub fn reachable_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                let position = Position::new(x, y);
                if self.is_reachable(position) {
                    cells.push(position);
                }
            }
        }
        cells
    }

    /// The raw grid, indexed `[x][y]`, `true` meaning unreachable.
    pub fn to_columns(&self) -> Vec<Vec<bool>> {
        (0..self.width())
            .map(|x| {
                (0..self.height())
                    .map(|y| self.unreachable[(y as usize, x as usize)])
                    .collect()
            })
            .collect()
    }
}

fn out_of_bounds(position: Position, width: i32, height: i32) -> TacticaError {
    TacticaError::InvalidQuery {
        position,
        width,
        height,
    }
}
