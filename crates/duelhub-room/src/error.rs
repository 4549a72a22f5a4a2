//! Error types for the room layer.

use duelhub_battle::BattleError;
use duelhub_protocol::{ErrorKind, PlayerId, RoomCode};

/// Errors from room lifecycle operations.
///
/// Every variant is reported to the initiating connection only and never
/// mutates the room it was raised against.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room code is unknown.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room already has two players.
    #[error("room {0} is full")]
    Full(RoomCode),

    /// A host-only action was attempted by a non-host.
    #[error("player {0} is not the host")]
    Unauthorized(PlayerId),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    IllegalState(String),

    /// Room-code generation ran out of retry attempts.
    #[error("could not generate a free room code")]
    Exhausted,

    /// A battle transition was rejected.
    #[error(transparent)]
    Battle(#[from] BattleError),
}

impl RoomError {
    /// Maps this error onto the wire-level taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Full(_) => ErrorKind::Full,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::IllegalState(_) | Self::Battle(_) => {
                ErrorKind::IllegalState
            }
            Self::Exhausted => ErrorKind::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let code = RoomCode::parse("AB12CD").unwrap();
        assert_eq!(RoomError::NotFound(code.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(RoomError::Full(code).kind(), ErrorKind::Full);
        assert_eq!(
            RoomError::Unauthorized(PlayerId(1)).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(RoomError::Exhausted.kind(), ErrorKind::Exhausted);
        assert_eq!(
            RoomError::Battle(BattleError::NotYourTurn(PlayerId(1))).kind(),
            ErrorKind::IllegalState
        );
    }
}
