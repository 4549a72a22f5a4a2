//! The bidirectional event language: what clients send and what the server
//! emits back.
//!
//! Both enums are internally tagged (`#[serde(tag = "type")]`), so a
//! `JoinRoom` travels as `{ "type": "JoinRoom", "code": "AB12CD" }`. That
//! shape is what the browser client pattern-matches on.

use serde::{Deserialize, Serialize};

use crate::{Card, CardId, ErrorKind, PlayerId, RoomCode, RoomListEntry};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// `Hello` must be the first event on a fresh connection; all room events
/// are rejected until the handshake completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Handshake: presents the identity token issued by the external
    /// credential service.
    Hello { token: String },

    /// Create a fresh room with the caller as host and sole player.
    CreateRoom,

    /// Join an existing room by code.
    JoinRoom { code: RoomCode },

    /// Toggle the caller's ready flag in a room.
    PlayerReady { code: RoomCode, ready: bool },

    /// Host-only: start the battle once both players are ready.
    StartGame { code: RoomCode },

    /// Play a card from the caller's hand. The server resolves the id
    /// against the authoritative hand; only the id is trusted.
    PlayCard { code: RoomCode, card: CardId },

    /// End the caller's turn. The presentation layer also sends this on
    /// the caller's behalf when the turn timer runs out.
    EndTurn { code: RoomCode },

    /// Leave a room without closing the connection.
    LeaveRoom { code: RoomCode },

    /// Request the list of open rooms for lobby browsing.
    ListRooms,

    /// Clean goodbye before closing the socket.
    Bye,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// A random battle event raised by the host process every few turns.
///
/// The event itself is a broadcast decoration; its effect mutates hp/cost
/// through the battle machine's bounded clamps when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEvent {
    pub kind: FieldEventKind,
    /// Effect strength; grows with the turn count.
    pub magnitude: u32,
}

/// What a [`FieldEvent`] does when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldEventKind {
    /// Restores hp to the affected player.
    Heal,
    /// Grants extra cost to the affected player.
    CostSurge,
    /// Deals direct damage to the affected player.
    Eruption,
}

/// One player's half of a battle snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSide {
    pub id: PlayerId,
    pub hp: u32,
    pub cost: u32,
    pub hand: Vec<Card>,
    pub deck_size: usize,
    pub zone: Vec<Card>,
    pub graveyard_size: usize,
}

/// Full battle state as sent to both players on game start.
///
/// The design trusts clients with the complete state (including the
/// opponent's hand), matching the store-and-battle presentation layer this
/// server was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub current_turn: PlayerId,
    pub turn_index: u32,
    pub time_left: u32,
    pub sides: Vec<PlayerSide>,
}

/// Everything the server can push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Handshake accepted; here is who you are.
    Welcome { player_id: PlayerId },

    /// Emitted to the creator only.
    RoomCreated { code: RoomCode, is_host: bool },

    /// Emitted to the joiner (idempotently re-emitted on duplicate joins).
    RoomJoined { code: RoomCode, is_host: bool },

    /// Emitted to existing members when someone joins.
    OpponentJoined { opponent: PlayerId },

    /// Emitted to the other member when a player flips their ready flag.
    OpponentReady { ready: bool },

    /// Emitted to both members when the host starts the battle.
    GameStart { snapshot: BattleSnapshot },

    /// Emitted to the other member when a card is played.
    OpponentPlayCard { card: Card },

    /// Emitted to both members when the turn passes.
    TurnChanged {
        next_player: PlayerId,
        turn_index: u32,
        /// The new turn-holder's cost after accrual.
        cost: u32,
    },

    /// A random battle event, broadcast to both members.
    FieldSurge { event: FieldEvent },

    /// Emitted to the remaining member when their opponent disconnects
    /// or leaves. Any in-progress battle is already torn down.
    OpponentLeft,

    /// Open-room listing for the lobby.
    RoomList { rooms: Vec<RoomListEntry> },

    /// A rejected operation, reported to the initiating connection only.
    Error { kind: ErrorKind, message: String },
}

// =========================================================================
// Tests
// =========================================================================
