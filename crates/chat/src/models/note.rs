//! Note model representing a comment anchored to part of a response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a note
///
/// Ids created on the client before the server has confirmed the note
/// carry a reserved prefix (see [`crate::ClientSettings::temp_id_prefix`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(pub String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id was generated locally with the given prefix
    pub fn is_temporary(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the assistant response a note is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A user comment anchored to the character range `[from_index, to_index)`
/// of a response's plain text
///
/// Offsets count `char`s, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Response this note belongs to
    #[serde(rename = "responseId", alias = "response_Id", alias = "targetId")]
    pub target_id: TargetId,
    pub content: String,
    pub from_index: usize,
    pub to_index: usize,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Soft-delete tombstone
    #[serde(default)]
    pub is_deleted: bool,
    /// Set while a local mutation waits for server confirmation
    #[serde(default, skip_serializing)]
    pub is_optimistic: bool,
}

impl Note {
    /// Create a confirmed note created now
    pub fn new(
        id: impl Into<NoteId>,
        target_id: impl Into<TargetId>,
        content: impl Into<String>,
        from_index: usize,
        to_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            content: content.into(),
            from_index,
            to_index,
            created_at: Utc::now(),
            is_deleted: false,
            is_optimistic: false,
        }
    }

    /// Builder method to mark the note as unconfirmed
    pub fn optimistic(mut self) -> Self {
        self.is_optimistic = true;
        self
    }

    /// Builder method to mark the note as soft-deleted
    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    /// The note as confirmed by the server
    pub fn confirmed(mut self) -> Self {
        self.is_optimistic = false;
        self
    }

    /// Whether the note covers at least one character
    pub fn is_well_formed(&self) -> bool {
        self.from_index < self.to_index
    }
}
