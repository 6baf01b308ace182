//! Error types for chat operations
//!
//! Three failure classes reach callers:
//! - [`ValidationError`]: detected locally, before any state changes
//! - [`RemoteError`]: the remote store rejected or failed a call; local
//!   state has already been rolled back when the caller sees it
//! - [`ChatError::NotFound`]: the operation named an id that local state
//!   no longer holds

use std::fmt;

use crate::models::NoteId;

/// Failure reported by the remote store, carrying a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why a candidate note range was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("start {from} must be before end {to}")]
    Empty { from: usize, to: usize },

    #[error("end {to} is past the end of the text ({len} characters)")]
    OutOfBounds { to: usize, len: usize },

    #[error("overlaps with existing note {0}")]
    Overlaps(NoteId),
}

/// Local input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Note content cannot be empty")]
    EmptyContent,

    #[error("Folder name cannot be empty")]
    EmptyName,

    #[error("Invalid range: {0}")]
    Range(#[from] RangeError),

    #[error("Note {0} is still being saved")]
    PendingNote(NoteId),

    #[error("The root folder cannot be deleted")]
    RootFolder,
}

/// Kind of entity an id refers to, for not-found reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Note,
    Folder,
    Conversation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Note => "Note",
            EntityKind::Folder => "Folder",
            EntityKind::Conversation => "Conversation",
        })
    }
}

/// Error returned by store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
}

impl ChatError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        ChatError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ChatError::Remote(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatError::NotFound { .. })
    }
}

impl From<RangeError> for ChatError {
    fn from(e: RangeError) -> Self {
        ChatError::Validation(ValidationError::Range(e))
    }
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
