//! Remote store trait definitions

use std::future::Future;

use crate::error::RemoteError;
use crate::models::{ConversationId, Folder, FolderId, Note, NoteId, TargetId};

/// Trait for the server-side note collection
///
/// All calls are single-shot: they resolve once, with no partial results.
pub trait NotesRemote: Send + Sync {
    /// Create a note and return it as stored by the server
    fn create_note(
        &self,
        target_id: &TargetId,
        content: &str,
        from_index: usize,
        to_index: usize,
    ) -> impl Future<Output = Result<Note, RemoteError>> + Send;

    /// List every note of a target, soft-deleted ones included
    fn list_notes(
        &self,
        target_id: &TargetId,
    ) -> impl Future<Output = Result<Vec<Note>, RemoteError>> + Send;

    /// Replace a note's content and range
    fn update_note(
        &self,
        target_id: &TargetId,
        id: &NoteId,
        content: &str,
        from_index: usize,
        to_index: usize,
    ) -> impl Future<Output = Result<Note, RemoteError>> + Send;

    /// Tombstone a note
    fn soft_delete_note(
        &self,
        target_id: &TargetId,
        id: &NoteId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Trait for the server-side folder hierarchy
pub trait FolderRemote: Send + Sync {
    /// Fetch the whole tree, rooted at the user's root folder
    fn list_folder_tree(&self) -> impl Future<Output = Result<Folder, RemoteError>> + Send;

    fn create_folder(
        &self,
        name: &str,
        parent_id: &FolderId,
    ) -> impl Future<Output = Result<Folder, RemoteError>> + Send;

    fn rename_folder(
        &self,
        id: &FolderId,
        name: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Soft delete a folder together with everything under it
    fn soft_delete_folder(
        &self,
        id: &FolderId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn delete_conversation(
        &self,
        id: &ConversationId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
