//! Unified error type for the duelhub server.

use duelhub_protocol::ProtocolError;
use duelhub_room::RoomError;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Top-level error wrapping every layer's failures.
///
/// The `#[from]` impls let `?` lift sub-crate errors automatically, so
/// server and handler code deals with this single type.
#[derive(Debug, thiserror::Error)]
pub enum DuelhubError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The handshake token was rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A room lifecycle error that escaped the per-event reporting path.
    #[error(transparent)]
    Room(#[from] RoomError),
}
