//! # Routes
//!
//! The step sequence produced by the pathfinder and consumed by walkers.

use crate::Position;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// An ordered sequence of grid steps.
///
/// A route returned by the pathfinder starts with the mover's own cell and ends
/// with the destination. Steps are consumed from the front.
///
/// # Examples
///
/// ```
/// use tactica::{Position, Route};
///
/// let mut route = Route::new();
/// route.prepend_step(Position::new(1, 1));
/// route.prepend_step(Position::new(0, 0));
/// assert_eq!(route.len(), 2);
/// assert_eq!(route.pop_step(), Some(Position::new(0, 0)));
/// assert_eq!(route.destination(), Some(Position::new(1, 1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    steps: VecDeque<Position>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps, including the starting cell when present.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of moves needed to walk the route from its first step.
    pub fn moves(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn step(&self, index: usize) -> Option<Position> {
        self.steps.get(index).copied()
    }

    pub fn first(&self) -> Option<Position> {
        self.steps.front().copied()
    }

    pub fn destination(&self) -> Option<Position> {
        self.steps.back().copied()
    }

    pub fn prepend_step(&mut self, step: Position) {
        self.steps.push_front(step);
    }

    /// Removes and returns the next step.
    pub fn pop_step(&mut self) -> Option<Position> {
        self.steps.pop_front()
    }

    pub fn contains(&self, step: Position) -> bool {
        self.steps.contains(&step)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.steps.iter().copied()
    }

    /// Whether every consecutive pair of steps is grid-adjacent.
    pub fn is_contiguous(&self) -> bool {
        self.steps
            .iter()
            .zip(self.steps.iter().skip(1))
            .all(|(a, b)| a.is_adjacent(*b))
    }
}

impl FromIterator<Position> for Route {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_consumption_order() {
        let mut route: Route = (0..3).map(|x| Position::new(x, 0)).collect();
        assert_eq!(route.moves(), 2);
        assert_eq!(route.pop_step(), Some(Position::new(0, 0)));
        assert_eq!(route.pop_step(), Some(Position::new(1, 0)));
        assert_eq!(route.first(), Some(Position::new(2, 0)));
        assert_eq!(route.pop_step(), Some(Position::new(2, 0)));
        assert!(route.is_empty());
        assert_eq!(route.pop_step(), None);
    }

    #[test]
    fn test_route_contiguity() {
        let diagonal: Route = (0..4).map(|i| Position::new(i, i)).collect();
        assert!(diagonal.is_contiguous());

        let gap: Route = [Position::new(0, 0), Position::new(2, 0)].into_iter().collect();
        assert!(!gap.is_contiguous());
    }

    #[test]
    fn test_empty_route_moves() {
        let route = Route::new();
        assert_eq!(route.moves(), 0);
        assert_eq!(route.destination(), None);
    }
}
