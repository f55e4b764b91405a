//! # Tactica
//!
//! A deterministic turn-based tactics engine core.
//!
//! ## Architecture Overview
//!
//! Entities occupy cells on a bounded grid, move along computed routes and take
//! turns in combat. The engine is organized around a few concepts:
//!
//! - **Grid Model**: a short-lived blocked-cell snapshot built from terrain and
//!   entity footprints before routing
//! - **Pathfinder**: an A* router with an adjacent-cell fallback and a
//!   movement-shade (reachability) computation
//! - **Entity Registry**: live entities with deferred additions and removals,
//!   drained once per tick
//! - **Turn Sequencer**: a fixed rotation granting one combatant at a time the
//!   right to act
//!
//! Rendering, asset loading and input dispatch are left to the caller. The core
//! consumes an elapsed time per tick and produces routes and reachability grids.

pub mod config;
pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use config::*;
pub use game::*;
pub use generation::*;
pub use utils::*;

/// Core error type for the Tactica engine.
#[derive(thiserror::Error, Debug)]
pub enum TacticaError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A grid was queried outside of its bounds
    #[error("Position {position} is outside of the {width}x{height} grid")]
    InvalidQuery {
        position: Position,
        width: i32,
        height: i32,
    },

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Configuration values are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type used throughout the Tactica codebase.
pub type TacticaResult<T> = Result<T, TacticaError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
