//! Battle rules for Duelhub: pure, synchronous game logic.
//!
//! Three pieces, no shared state between them:
//!
//! - [`calc_damage`] / [`effectiveness`] — the type-effectiveness damage
//!   resolver
//! - [`draw`] / [`ProbabilityTable`] — the weighted loot draw engine used
//!   by the store for pack openings
//! - [`BattleState`] — the per-room turn-based state machine
//!
//! Nothing here does I/O or knows about rooms; the lobby owns a
//! `BattleState` per in-game room and calls the transitions.

mod damage;
mod error;
mod loot;
mod state;

pub use damage::{Strike, calc_damage, effectiveness};
pub use error::BattleError;
pub use loot::{PackGrade, ProbabilityTable, draw};
pub use state::{
    BattleState, COST_PER_TURN, FIELD_EVENT_INTERVAL, HAND_SIZE, MAX_COST,
    MAX_HP, START_COST, TURN_SECONDS, TurnChange, roll_field_event,
};
