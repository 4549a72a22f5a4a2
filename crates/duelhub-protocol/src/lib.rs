//! Wire protocol for Duelhub: the language the card-battle client and
//! server speak.
//!
//! # Key types
//!
//! - [`PlayerId`], [`RoomCode`] — identity types
//! - [`Card`], [`Category`] — the card value type supplied by the
//!   external inventory store
//! - [`ClientEvent`], [`ServerEvent`] — the bidirectional event language
//! - [`Envelope`] — the top-level wire wrapper
//! - [`Codec`] / [`JsonCodec`] — pluggable serialization
//! - [`ErrorKind`] — the taxonomy every rejected operation maps to

mod card;
mod codec;
mod error;
mod events;
mod types;

pub use card::{Card, CardId, Category};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use codec::Codec;
pub use error::ProtocolError;
pub use events::{
    BattleSnapshot, ClientEvent, FieldEvent, FieldEventKind, PlayerSide,
    ServerEvent,
};
pub use types::{
    CODE_ALPHABET, CODE_LEN, Envelope, ErrorKind, PlayerId, RoomCode,
    RoomListEntry,
};
