//! Identity types and the top-level wire envelope.
//!
//! Everything in this module travels on the wire between the browser client
//! and the server, so the serde attributes here define the exact JSON the
//! client SDK must speak.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for an authenticated connection.
///
/// One authenticated connection is one player: the identity service hands the
/// server an opaque id during the handshake and every room event is keyed by
/// it afterwards. `#[serde(transparent)]` makes `PlayerId(42)` serialize as
/// plain `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// Alphabet room codes are drawn from: uppercase alphanumerics.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fixed length of a room code.
pub const CODE_LEN: usize = 6;

/// A 6-character room code, the primary key of a matchmaking room.
///
/// The inner string is guaranteed to be exactly [`CODE_LEN`] characters from
/// [`CODE_ALPHABET`]; the only way to build one is [`RoomCode::parse`], so a
/// `RoomCode` in hand is always well-formed. Serialized as the bare string
/// (`"AB12CD"`), validated on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validates and wraps a candidate code. Lowercase input is rejected,
    /// not normalized — clients are expected to uppercase before sending.
    pub fn parse(code: &str) -> Result<Self, ProtocolError> {
        if code.len() != CODE_LEN
            || !code.bytes().all(|b| CODE_ALPHABET.contains(&b))
        {
            return Err(ProtocolError::BadRoomCode(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    /// The raw 6-character code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Classification of a rejected operation, reported to the initiating
/// connection only.
///
/// Every failed lifecycle or battle transition maps to exactly one of these;
/// the room's observable state is unchanged and nothing is broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The room code is unknown.
    NotFound,
    /// The room already has two players.
    Full,
    /// A host-only action was attempted by a non-host.
    Unauthorized,
    /// The operation is legal in some state, but not this one
    /// (start before all-ready, play out of turn, double-start, ...).
    IllegalState,
    /// Room-code generation exhausted its retry budget.
    Exhausted,
    /// The event itself was malformed.
    BadRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "NotFound",
            Self::Full => "Full",
            Self::Unauthorized => "Unauthorized",
            Self::IllegalState => "IllegalState",
            Self::Exhausted => "Exhausted",
            Self::BadRequest => "BadRequest",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Room listing
// ---------------------------------------------------------------------------

/// A summary of a room returned for lobby browsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    /// The room's code.
    pub code: RoomCode,
    /// Number of players currently in the room.
    pub players: usize,
    /// Whether a battle is running.
    pub in_game: bool,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level wire wrapper. Every message in either direction is an
/// `Envelope` around a [`ClientEvent`](crate::ClientEvent) or
/// [`ServerEvent`](crate::ServerEvent).
///
/// Each side maintains its own `seq` counter; `timestamp` is milliseconds
/// since that side started. Both exist for debugging and ordering checks,
/// neither is interpreted by the game logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<E> {
    /// Auto-incrementing sequence number, per direction.
    pub seq: u64,
    /// Milliseconds since the sender started.
    pub timestamp: u64,
    /// The actual event.
    pub event: E,
}

// =========================================================================
// Tests
// =========================================================================
