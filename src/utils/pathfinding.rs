//! # Pathfinding Algorithms
//!
//! A* routing over a [`GridModel`], with an adjacent-cell fallback and the
//! movement shade used for move-range highlighting.

use crate::{
    config::COMBAT_SEARCH_DISTANCE, GridModel, Heuristic, HeuristicKind, MovementShade, Mover,
    Position, Route,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Which cells around a target [`AStarPathfinder::find_path_adjacent`] falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacentSearch {
    /// The 2×2 block spanning `(tx - 1, ty - 1)` to `(tx, ty)`
    #[default]
    Quadrant,
    /// All 8 cells around the target
    Surrounding,
}

impl AdjacentSearch {
    /// Fallback cells for `target`, in search order. The target itself is excluded.
    pub fn candidates(self, target: Position) -> Vec<Position> {
        match self {
            AdjacentSearch::Quadrant => {
                let mut cells = Vec::with_capacity(3);
                for x in target.x - 1..target.x + 1 {
                    for y in target.y - 1..target.y + 1 {
                        let cell = Position::new(x, y);
                        if cell != target {
                            cells.push(cell);
                        }
                    }
                }
                cells
            }
            AdjacentSearch::Surrounding => target.adjacent_positions(),
        }
    }
}

/// Tunables of a pathfinder instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfinderSettings {
    /// Deepest search depth, in steps from the start, before giving up
    pub max_search_distance: u32,
    pub allow_diagonal: bool,
    pub heuristic: HeuristicKind,
    pub adjacent: AdjacentSearch,
}

impl PathfinderSettings {
    pub fn new(max_search_distance: u32) -> Self {
        Self {
            max_search_distance,
            allow_diagonal: true,
            heuristic: HeuristicKind::default(),
            adjacent: AdjacentSearch::default(),
        }
    }
}

impl Default for PathfinderSettings {
    fn default() -> Self {
        Self::new(COMBAT_SEARCH_DISTANCE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeStatus {
    Unvisited,
    Open,
    Closed,
}

/// Per-cell search state. Only meaningful while `query` matches the
/// pathfinder's current query.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    cost: f32,
    heuristic: f32,
    parent: Option<usize>,
    depth: u32,
    status: NodeStatus,
    query: u32,
    open_seq: u64,
}

impl SearchNode {
    fn fresh(query: u32) -> Self {
        Self {
            cost: f32::INFINITY,
            heuristic: 0.0,
            parent: None,
            depth: 0,
            status: NodeStatus::Unvisited,
            query,
            open_seq: 0,
        }
    }
}

/// Open set entry. Entries are never removed from the heap; an entry is live
/// only while its node is open under the same insertion sequence.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    priority: f32,
    seq: u64,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap, FIFO among ties
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A* pathfinder with a reusable node grid.
///
/// The node grid is sized to the first grid queried and reallocated only when a
/// query arrives with different dimensions.
///
/// # Examples
///
/// ```
/// use tactica::{AStarPathfinder, Combatant, GridSnapshot, PathfinderSettings, Position, Team, UnitTemplate};
///
/// let grid = GridSnapshot::new(18, 10);
/// let mover = Combatant::from_template(&UnitTemplate::default(), Team::Red, Position::origin());
/// let mut finder = AStarPathfinder::new(18, 10, &PathfinderSettings::new(50));
///
/// let route = finder
///     .find_path(&grid, &mover, Position::new(0, 0), Position::new(17, 9))
///     .unwrap();
/// assert_eq!(route.first(), Some(Position::new(0, 0)));
/// assert_eq!(route.destination(), Some(Position::new(17, 9)));
/// assert_eq!(route.moves(), 17);
/// ```
#[derive(Debug)]
pub struct AStarPathfinder {
    width: i32,
    height: i32,
    nodes: Vec<SearchNode>,
    open: BinaryHeap<OpenEntry>,
    query: u32,
    next_seq: u64,
    max_search_distance: u32,
    allow_diagonal: bool,
    adjacent: AdjacentSearch,
    heuristic: Box<dyn Heuristic>,
}

impl AStarPathfinder {
    /// Creates a pathfinder for a `width` × `height` grid.
    pub fn new(width: i32, height: i32, settings: &PathfinderSettings) -> Self {
        let mut finder = Self::with_heuristic(
            width,
            height,
            settings.max_search_distance,
            settings.allow_diagonal,
            settings.heuristic.build(),
        );
        finder.adjacent = settings.adjacent;
        finder
    }

    /// Creates a pathfinder with a custom heuristic.
    pub fn with_heuristic(
        width: i32,
        height: i32,
        max_search_distance: u32,
        allow_diagonal: bool,
        heuristic: Box<dyn Heuristic>,
    ) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            nodes: vec![SearchNode::fresh(0); (width * height) as usize],
            open: BinaryHeap::new(),
            query: 0,
            next_seq: 0,
            max_search_distance,
            allow_diagonal,
            adjacent: AdjacentSearch::default(),
            heuristic,
        }
    }

    pub fn max_search_distance(&self) -> u32 {
        self.max_search_distance
    }

    pub fn set_max_search_distance(&mut self, max_search_distance: u32) {
        self.max_search_distance = max_search_distance;
    }

    pub fn allows_diagonal(&self) -> bool {
        self.allow_diagonal
    }

    pub fn adjacent_search(&self) -> AdjacentSearch {
        self.adjacent
    }

    pub fn set_adjacent_search(&mut self, adjacent: AdjacentSearch) {
        self.adjacent = adjacent;
    }

    /// Computes a least-cost route from `start` to `target`.
    ///
    /// Returns `None` when the target is out of bounds, blocked, or not reached
    /// within the search distance. The start cell is exempt from the blocked
    /// check, so a mover standing on its own footprint can route out of it and
    /// `start == target` yields the single-step route `[start]`.
    pub fn find_path<G: GridModel + ?Sized>(
        &mut self,
        grid: &G,
        mover: &dyn Mover,
        start: Position,
        target: Position,
    ) -> Option<Route> {
        if !grid.contains(start) || !grid.contains(target) {
            log::trace!("No route {} -> {}: out of bounds", start, target);
            return None;
        }
        if start == target {
            return Some(std::iter::once(start).collect());
        }
        if grid.blocked(mover, target) {
            log::trace!("No route {} -> {}: target blocked", start, target);
            return None;
        }

        self.fit(grid);
        self.begin_query();

        let start_index = self.index(start);
        let target_index = self.index(target);
        let start_heuristic = self.heuristic.cost(mover, start, target);
        {
            let node = self.node_mut(start_index);
            node.cost = 0.0;
            node.depth = 0;
            node.parent = None;
            node.heuristic = start_heuristic;
        }
        self.push_open(start_index);

        let mut max_depth = 0;
        while max_depth < self.max_search_distance {
            let Some(current) = self.pop_open() else {
                break;
            };
            if current == target_index {
                break;
            }

            self.node_mut(current).status = NodeStatus::Closed;
            let current_position = self.position(current);
            let SearchNode {
                cost: current_cost,
                depth: current_depth,
                ..
            } = self.node(current);

            for dx in -1..=1 {
                for dy in -1..=1 {
                    if (dx == 0 && dy == 0) || (!self.allow_diagonal && dx != 0 && dy != 0) {
                        continue;
                    }
                    let neighbor = Position::new(current_position.x + dx, current_position.y + dy);
                    if !Self::is_valid_location(grid, mover, start, neighbor) {
                        continue;
                    }

                    let next_cost = current_cost + grid.cost(mover, current_position, neighbor);
                    let heuristic = self.heuristic.cost(mover, neighbor, target);
                    let neighbor_index = self.index(neighbor);
                    let node = self.node_mut(neighbor_index);

                    // A cheaper route re-opens the node, even if it was closed
                    if next_cost < node.cost {
                        node.status = NodeStatus::Unvisited;
                    }

                    if node.status == NodeStatus::Unvisited {
                        node.cost = next_cost;
                        node.heuristic = heuristic;
                        node.parent = Some(current);
                        node.depth = current_depth + 1;
                        max_depth = max_depth.max(node.depth);
                        self.push_open(neighbor_index);
                    }
                }
            }
        }

        self.node(target_index).parent?;
        self.reconstruct(start_index, target_index)
    }

    /// Routes to `target`, or failing that to the nearest reachable cell of the
    /// configured [`AdjacentSearch`] neighbourhood.
    ///
    /// Among the fallback candidates the shortest route wins, the earliest
    /// candidate on ties. Returns `None` when no candidate is reachable.
    pub fn find_path_adjacent<G: GridModel + ?Sized>(
        &mut self,
        grid: &G,
        mover: &dyn Mover,
        start: Position,
        target: Position,
    ) -> Option<Route> {
        if let Some(route) = self.find_path(grid, mover, start, target) {
            return Some(route);
        }

        let route = self
            .adjacent
            .candidates(target)
            .into_iter()
            .filter_map(|cell| self.find_path(grid, mover, start, cell))
            .min_by_key(Route::len);
        if route.is_none() {
            log::debug!("No route from {} to {} or any cell next to it", start, target);
        }
        route
    }

    /// For every cell of `grid`, whether `mover` can NOT reach it from its
    /// current position within the search distance.
    pub fn movement_shade<G: GridModel + ?Sized>(
        &mut self,
        grid: &G,
        mover: &dyn Mover,
    ) -> MovementShade {
        let origin = mover.position();
        let mut shade = MovementShade::new(grid.width(), grid.height());
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let cell = Position::new(x, y);
                let unreachable = self.find_path(grid, mover, origin, cell).is_none();
                shade.set_unreachable(cell, unreachable);
            }
        }
        shade
    }

    fn is_valid_location<G: GridModel + ?Sized>(
        grid: &G,
        mover: &dyn Mover,
        start: Position,
        position: Position,
    ) -> bool {
        grid.contains(position) && (position == start || !grid.blocked(mover, position))
    }

    fn reconstruct(&self, start_index: usize, target_index: usize) -> Option<Route> {
        let mut route = Route::new();
        let mut index = target_index;
        // Parent links form a tree; the bound guards against zero-cost cycles
        for _ in 0..self.nodes.len() {
            if index == start_index {
                route.prepend_step(self.position(start_index));
                return Some(route);
            }
            route.prepend_step(self.position(index));
            index = self.node(index).parent?;
        }
        log::warn!("Route reconstruction did not terminate");
        None
    }

    fn fit<G: GridModel + ?Sized>(&mut self, grid: &G) {
        if grid.width() != self.width || grid.height() != self.height {
            log::debug!(
                "Resizing search grid from {}x{} to {}x{}",
                self.width,
                self.height,
                grid.width(),
                grid.height()
            );
            self.width = grid.width();
            self.height = grid.height();
            self.nodes = vec![SearchNode::fresh(0); (self.width * self.height) as usize];
            self.query = 0;
        }
    }

    fn begin_query(&mut self) {
        self.query = self.query.wrapping_add(1);
        if self.query == 0 {
            // Stamps wrapped around, old stamps could collide with new ones
            self.nodes.fill(SearchNode::fresh(0));
            self.query = 1;
        }
        self.open.clear();
        self.next_seq = 0;
    }

    fn index(&self, position: Position) -> usize {
        (position.y * self.width + position.x) as usize
    }

    fn position(&self, index: usize) -> Position {
        let index = index as i32;
        Position::new(index % self.width, index / self.width)
    }

    fn node(&self, index: usize) -> SearchNode {
        let node = self.nodes[index];
        if node.query == self.query {
            node
        } else {
            SearchNode::fresh(self.query)
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut SearchNode {
        let query = self.query;
        let node = &mut self.nodes[index];
        if node.query != query {
            *node = SearchNode::fresh(query);
        }
        node
    }

    fn push_open(&mut self, index: usize) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let node = self.node_mut(index);
        node.status = NodeStatus::Open;
        node.open_seq = seq;
        let priority = node.cost + node.heuristic;
        self.open.push(OpenEntry {
            priority,
            seq,
            index,
        });
    }

    fn pop_open(&mut self) -> Option<usize> {
        while let Some(entry) = self.open.pop() {
            let node = self.node(entry.index);
            if node.status == NodeStatus::Open && node.open_seq == entry.seq {
                return Some(entry.index);
            }
        }
        None
    }
}
