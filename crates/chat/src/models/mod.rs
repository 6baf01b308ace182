//! Domain models for chat entities

mod folder;
mod note;

pub use folder::{Conversation, ConversationId, Folder, FolderId};
pub use note::{Note, NoteId, TargetId};
