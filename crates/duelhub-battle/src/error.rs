//! Error types for the battle layer.

use duelhub_protocol::{CardId, PlayerId};

/// Errors from battle state transitions. Each one leaves the battle state
/// exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// The player is not one of this battle's two participants.
    #[error("player {0} is not in this battle")]
    NotInBattle(PlayerId),

    /// The acting player is not the current turn-holder.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The played card id is not in the sender's hand.
    #[error("card {0} is not in hand")]
    CardNotInHand(CardId),

    /// The sender cannot afford the card this turn.
    #[error("card costs {need} but only {have} cost is available")]
    InsufficientCost { need: u32, have: u32 },
}
