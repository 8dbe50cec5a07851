use crate::entity::EntityId;
use crate::items::ItemId;
use thiserror::Error;

/// Every failure the game core can report.
///
/// `InvalidAction` and `InsufficientQuantity` are recoverable: the operation
/// that produced them left all state untouched and the caller may simply
/// prompt again. `CorruptRecord` and `NotFound` end a load attempt and are
/// shown to the player. `InvariantViolation` is a bug and must abort.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{actor} cannot do that: {reason}")]
    InvalidAction { actor: EntityId, reason: String },

    #[error("cannot remove {requested} of item {item}: only {held} held")]
    InsufficientQuantity {
        item: ItemId,
        requested: u32,
        held: u32,
    },

    #[error("save slot '{slot}' is corrupt: {reason}")]
    CorruptRecord { slot: String, reason: String },

    #[error("no save found in slot '{slot}'")]
    NotFound { slot: String },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GameResult<T> = Result<T, GameError>;

impl GameError {
    pub fn invalid_action(actor: EntityId, reason: impl Into<String>) -> Self {
        GameError::InvalidAction {
            actor,
            reason: reason.into(),
        }
    }

    pub fn corrupt(slot: &str, reason: impl Into<String>) -> Self {
        GameError::CorruptRecord {
            slot: slot.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the state is unchanged and the same prompt can be retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::InvalidAction { .. } | GameError::InsufficientQuantity { .. }
        )
    }

    /// True for programmer errors that must never be swallowed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::InvariantViolation(_))
    }
}
