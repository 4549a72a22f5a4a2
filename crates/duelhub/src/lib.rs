//! # duelhub
//!
//! WebSocket battle server for a browser collectible-card game: room
//! matchmaking by short codes, server-authoritative turn-based battles,
//! and a reaper that clears abandoned rooms.
//!
//! Plug in a [`CardSource`] (your card inventory) and an
//! [`Authenticator`] (your credential service) and run:
//!
//! ```rust,no_run
//! use duelhub::prelude::*;
//!
//! // let server = DuelhubServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_cards, my_auth)
//! //     .await?;
//! // server.run().await
//! ```

mod auth;
mod error;
mod handler;
mod server;
pub mod transport;

pub use auth::{AuthError, Authenticator};
pub use error::DuelhubError;
pub use server::{DuelhubServer, DuelhubServerBuilder};

/// The commonly used surface, for a one-line import.
pub mod prelude {
    pub use duelhub_battle::{
        BattleState, HAND_SIZE, MAX_COST, MAX_HP, PackGrade, START_COST,
        TURN_SECONDS, calc_damage, draw,
    };
    pub use duelhub_protocol::{
        BattleSnapshot, Card, CardId, Category, ClientEvent, Envelope,
        ErrorKind, FieldEvent, FieldEventKind, PlayerId, RoomCode,
        RoomListEntry, ServerEvent,
    };
    pub use duelhub_room::{CardSource, Lobby, LobbyConfig, RoomError};

    pub use crate::auth::{AuthError, Authenticator};
    pub use crate::error::DuelhubError;
    pub use crate::server::{DuelhubServer, DuelhubServerBuilder};
}
