//! # Utilities Module
//!
//! Grid model, routes, heuristics and the A* pathfinder.

pub mod grid;
pub mod math;
pub mod pathfinding;
pub mod route;

pub use grid::*;
pub use math::*;
pub use pathfinding::*;
pub use route::*;
