//! # Turn Sequencing
//!
//! Round-robin rotation over the combatants of a battle.
//!
//! The sequencer only tracks whose turn it is. The combat session decides when a
//! turn ends, and removes dead units from the rotation explicitly.

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// Not set up yet
    NoActiveTurn,
    /// Index into the rotation of the acting entity
    ActorTurn(usize),
    /// The rotation was emptied
    Finished,
}

/// Fixed-order turn rotation.
///
/// # Examples
///
/// ```
/// use tactica::{new_entity_id, TurnSequencer};
///
/// let (a, b) = (new_entity_id(), new_entity_id());
/// let mut turns = TurnSequencer::new();
/// turns.set_up(vec![a, b]);
///
/// assert_eq!(turns.current_entity_turn(), Some(a));
/// turns.end_entity_turn();
/// assert_eq!(turns.current_entity_turn(), Some(b));
/// turns.end_entity_turn();
/// assert_eq!(turns.current_entity_turn(), Some(a));
/// assert_eq!(turns.turn_counter(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSequencer {
    order: Vec<EntityId>,
    state: TurnState,
    turn_counter: u64,
    round: u64,
}

impl Default for TurnSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSequencer {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            state: TurnState::NoActiveTurn,
            turn_counter: 0,
            round: 0,
        }
    }

    /// Starts a fresh rotation. The first entity of `order` acts first.
    pub fn set_up(&mut self, order: Vec<EntityId>) {
        self.state = if order.is_empty() {
            TurnState::Finished
        } else {
            TurnState::ActorTurn(0)
        };
        self.order = order;
        self.turn_counter = 0;
        self.round = 0;
        log::debug!("Turn order set up with {} entities", self.order.len());
    }

    /// The entity whose turn it is.
    ///
    /// Calling this before [`TurnSequencer::set_up`] is a contract violation:
    /// it asserts in debug builds and returns `None` otherwise.
    pub fn current_entity_turn(&self) -> Option<EntityId> {
        match self.state {
            TurnState::NoActiveTurn => {
                debug_assert!(false, "current_entity_turn called before set_up");
                None
            }
            TurnState::ActorTurn(index) => self.order.get(index).copied(),
            TurnState::Finished => None,
        }
    }

    /// Passes the turn to the next entity in the rotation, wrapping around.
    pub fn end_entity_turn(&mut self) {
        match self.state {
            TurnState::NoActiveTurn => {
                debug_assert!(false, "end_entity_turn called before set_up");
            }
            TurnState::ActorTurn(index) => {
                let next = (index + 1) % self.order.len();
                if next == 0 {
                    self.round += 1;
                }
                self.turn_counter += 1;
                self.state = TurnState::ActorTurn(next);
                log::trace!("Turn {} goes to entity {}", self.turn_counter, self.order[next]);
            }
            TurnState::Finished => {}
        }
    }

    /// Takes an entity out of the rotation.
    ///
    /// The rotation continues with the entity that followed the removed one.
    /// Returns `false` if the entity was not in the rotation.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(removed) = self.order.iter().position(|entry| *entry == id) else {
            return false;
        };
        self.order.remove(removed);

        if self.order.is_empty() {
            self.state = TurnState::Finished;
        } else if let TurnState::ActorTurn(index) = self.state {
            let index = if removed < index {
                index - 1
            } else if index >= self.order.len() {
                0
            } else {
                index
            };
            self.state = TurnState::ActorTurn(index);
        }
        log::debug!("Entity {} left the turn order", id);
        true
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_set_up(&self) -> bool {
        self.state != TurnState::NoActiveTurn
    }

    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// Turns ended since set-up.
    pub fn turn_counter(&self) -> u64 {
        self.turn_counter
    }

    /// Times the rotation wrapped around since set-up.
    pub fn round(&self) -> u64 {
        self.round
    }
}
