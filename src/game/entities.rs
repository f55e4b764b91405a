//! # Entity Capabilities
//!
//! Small traits entity kinds compose instead of inheriting from a common base,
//! and the [`Walker`] component that moves an entity along a [`Route`].

use crate::{EntityId, Footprint, Pending, Position, Route};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Elapsed time of one tick, in seconds. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct DeltaTime(f64);

impl DeltaTime {
    /// Creates a delta from seconds. Negative and NaN inputs become zero.
    pub fn from_secs(seconds: f64) -> Self {
        if seconds.is_nan() || seconds < 0.0 {
            Self(0.0)
        } else {
            Self(seconds)
        }
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }
}

impl From<Duration> for DeltaTime {
    fn from(duration: Duration) -> Self {
        Self::from_secs(duration.as_secs_f64())
    }
}

/// A stable identity usable as a map key.
pub trait Identified {
    fn id(&self) -> EntityId;
}

/// The minimal contract of something the pathfinder can route.
pub trait Mover: Identified {
    fn position(&self) -> Position;

    /// Movement points left. The pathfinder does not consume these.
    fn movement(&self) -> u32;
}

/// Something that blocks the cells it covers.
pub trait Occupant {
    fn footprint(&self) -> Footprint;
}

/// Whether an entity is still doing something worth waiting for.
pub trait Activity {
    /// Living-kind entities move and act; props do not.
    fn is_living(&self) -> bool;

    /// No pending route and idle or dead.
    fn is_inactive(&self) -> bool;
}

/// Per-tick behavior of registry entities.
pub trait Updatable: Identified + Sized {
    type Event;

    /// Advances the entity by `delta`.
    ///
    /// Structural changes go through `pending` and are applied after every
    /// entity of the tick has been updated.
    fn update(&mut self, delta: DeltaTime, pending: &mut Pending<Self>, events: &mut Vec<Self::Event>);
}

/// Sides of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Red => write!(f, "red"),
            Team::Blue => write!(f, "blue"),
        }
    }
}

/// What a living entity is visibly doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Posture {
    #[default]
    Idle,
    Run,
    Attack,
    Dead,
}

/// Route-following component shared by every movable entity kind.
///
/// One step is taken each time `time_between_moves` seconds have elapsed, and
/// each step spends one movement point. When the route runs out, or the points
/// do, the walker becomes stationary and forgets the route.
///
/// # Examples
///
/// ```
/// use tactica::{DeltaTime, Position, Route, Walker};
///
/// let mut walker = Walker::new(10, 0.3);
/// let route: Route = (0..3).map(|x| Position::new(x, 0)).collect();
/// walker.assign(route, Position::new(0, 0));
///
/// assert_eq!(walker.advance(DeltaTime::from_secs(0.016)), Some(Position::new(1, 0)));
/// assert_eq!(walker.advance(DeltaTime::from_secs(0.1)), None);
/// assert_eq!(walker.advance(DeltaTime::from_secs(0.2)), Some(Position::new(2, 0)));
/// assert!(walker.is_stationary());
/// assert_eq!(walker.movement(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walker {
    route: Option<Route>,
    movement: u32,
    max_movement: u32,
    time_until_move: f64,
    time_between_moves: f64,
}

impl Walker {
    pub fn new(max_movement: u32, time_between_moves: f64) -> Self {
        Self {
            route: None,
            movement: max_movement,
            max_movement,
            time_until_move: 0.0,
            time_between_moves: time_between_moves.max(0.0),
        }
    }

    /// Replaces the current route. A leading step equal to `from` is dropped.
    pub fn assign(&mut self, mut route: Route, from: Position) {
        if route.first() == Some(from) {
            route.pop_step();
        }
        self.route = (!route.is_empty()).then_some(route);
    }

    /// Discards the current route.
    pub fn cancel(&mut self) {
        self.route = None;
    }

    pub fn is_stationary(&self) -> bool {
        self.route.as_ref().map_or(true, Route::is_empty)
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// The cell the walker will step into next.
    pub fn next_step(&self) -> Option<Position> {
        self.route.as_ref().and_then(Route::first)
    }

    /// Counts down the step timer and returns the new cell when a step is taken.
    pub fn advance(&mut self, delta: DeltaTime) -> Option<Position> {
        if self.is_stationary() || self.movement == 0 {
            self.route = None;
            return None;
        }

        self.time_until_move -= delta.as_secs();
        if self.time_until_move > 0.0 {
            return None;
        }

        let step = self.route.as_mut().and_then(Route::pop_step);
        self.time_until_move = self.time_between_moves;
        self.movement = self.movement.saturating_sub(1);
        if self.is_stationary() {
            self.route = None;
        }
        step
    }

    /// How far the walker is between its current cell and the next one, in [0, 1].
    pub fn step_progress(&self) -> f64 {
        if self.is_stationary() || self.time_between_moves <= 0.0 {
            return 0.0;
        }
        (1.0 - self.time_until_move / self.time_between_moves).clamp(0.0, 1.0)
    }

    pub fn movement(&self) -> u32 {
        self.movement
    }

    pub fn max_movement(&self) -> u32 {
        self.max_movement
    }

    pub fn set_movement(&mut self, movement: u32) {
        self.movement = movement;
    }

    pub fn reset_movement(&mut self) {
        self.movement = self.max_movement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_route(length: i32) -> Route {
        (0..=length).map(|x| Position::new(x, 0)).collect()
    }

    #[test]
    fn test_delta_time_never_negative() {
        assert_eq!(DeltaTime::from_secs(-1.0).as_secs(), 0.0);
        assert_eq!(DeltaTime::from_secs(f64::NAN).as_secs(), 0.0);
        assert_eq!(DeltaTime::from(Duration::from_millis(250)).as_secs(), 0.25);
    }

    #[test]
    fn test_walker_drops_leading_start_step() {
        let mut walker = Walker::new(10, 0.3);
        walker.assign(straight_route(2), Position::new(0, 0));
        assert_eq!(walker.next_step(), Some(Position::new(1, 0)));
        assert_eq!(walker.route().map(Route::len), Some(2));
    }

    #[test]
    fn test_walker_single_step_route_is_stationary() {
        let mut walker = Walker::new(10, 0.3);
        walker.assign(straight_route(0), Position::new(0, 0));
        assert!(walker.is_stationary());
        assert_eq!(walker.advance(DeltaTime::from_secs(1.0)), None);
    }

    #[test]
    fn test_walker_stops_when_movement_runs_out() {
        let mut walker = Walker::new(2, 0.0);
        walker.assign(straight_route(5), Position::new(0, 0));

        let dt = DeltaTime::from_secs(0.1);
        assert_eq!(walker.advance(dt), Some(Position::new(1, 0)));
        assert_eq!(walker.advance(dt), Some(Position::new(2, 0)));
        assert_eq!(walker.advance(dt), None);
        assert!(walker.is_stationary());
        assert_eq!(walker.movement(), 0);

        walker.reset_movement();
        assert_eq!(walker.movement(), 2);
    }

    #[test]
    fn test_walker_reassign_cancels_previous_route() {
        let mut walker = Walker::new(10, 0.3);
        walker.assign(straight_route(5), Position::new(0, 0));
        let detour: Route = [Position::new(0, 0), Position::new(0, 1)].into_iter().collect();
        walker.assign(detour, Position::new(0, 0));
        assert_eq!(walker.advance(DeltaTime::from_secs(0.0)), Some(Position::new(0, 1)));
        assert!(walker.is_stationary());
    }

    #[test]
    fn test_walker_step_progress() {
        let mut walker = Walker::new(10, 0.4);
        walker.assign(straight_route(3), Position::new(0, 0));
        walker.advance(DeltaTime::from_secs(0.0));
        assert_eq!(walker.step_progress(), 0.0);
        walker.advance(DeltaTime::from_secs(0.1));
        assert!((walker.step_progress() - 0.25).abs() < 1e-9);

        walker.cancel();
        assert_eq!(walker.step_progress(), 0.0);
    }

    #[test]
    fn test_team_opponent() {
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert_eq!(Team::Blue.opponent(), Team::Red);
    }
}
