use thiserror::Error;

use crate::validation::ValidationViolation;

/// Errors that can arise while authoring or playing an escape room.
#[derive(Debug, Error)]
pub enum EscapeError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON snapshot encoding and decoding errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a room, icon, or catalog entry is not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Editor save blocked; every unmet rule is listed.
    #[error("room failed validation: {}", format_violations(.0))]
    Validation(Vec<ValidationViolation>),

    /// The registry already holds a room with this code.
    #[error("room code already in use: {0}")]
    DuplicateRoomCode(String),

    /// Room code is not 6-8 uppercase alphanumerics.
    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),

    #[error("unknown icon: {0}")]
    UnknownIcon(String),

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    /// Adding or removing an answer slot would leave the allowed range.
    #[error("answer slots must stay between {min} and {max}")]
    AnswerSlotLimit { min: usize, max: usize },

    #[error("answer index {index} out of range ({len} slots)")]
    AnswerIndexOutOfRange { index: usize, len: usize },

    #[error("lock slot {index} out of range ({len} slots)")]
    LockSlotOutOfRange { index: usize, len: usize },

    /// Chest opening attempted before every lock slot is unlocked.
    #[error("chest is locked ({unlocked}/{required} locks open)")]
    ChestLocked { unlocked: usize, required: usize },

    /// The chest icon has no question; it is opened with key codes.
    #[error("the chest is opened with key codes, not a question")]
    ChestHasNoQuestion,

    /// Host-enforced time limit ran out.
    #[error("time limit expired")]
    TimeExpired,

    /// The win was already delivered; the chest stays open.
    #[error("room {0} is already completed")]
    RoomCompleted(String),

    /// Answer attempts for this icon are used up.
    #[error("no attempts left for icon {0}")]
    AttemptsExhausted(String),

    /// Shell input that does not parse.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Draft files that reference unknown icon types or bad fields.
    #[error("invalid draft: {0}")]
    InvalidDraft(String),
}

fn format_violations(violations: &[ValidationViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
