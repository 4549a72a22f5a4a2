//! Room orchestration for duelhub: matchmaking rooms keyed by short
//! codes, the lobby driving their lifecycle, and the reaper that evicts
//! stale ones.
//!
//! This crate is deliberately transport-free. The lobby speaks
//! [`duelhub_protocol::ServerEvent`] through plain channels; wiring those
//! channels to sockets is the server crate's job, which is what keeps the
//! whole room layer testable without opening a port.

mod config;
mod error;
mod lifecycle;
pub mod reaper;
mod registry;
mod room;

pub use config::LobbyConfig;
pub use error::RoomError;
pub use lifecycle::{CardSource, EventSender, Lobby};
pub use registry::RoomRegistry;
pub use room::{MAX_PLAYERS, Room};
