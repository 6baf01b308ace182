//! In-memory remote store
//!
//! Behaves like the notes and folder services: it assigns ids, stamps
//! creation times and tombstones deleted notes. Calls can be made to fail
//! or to wait until released, which lets tests observe optimistic state
//! while a request is still in flight.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;

use super::{FolderRemote, NotesRemote};
use crate::error::RemoteError;
use crate::models::{ConversationId, Folder, FolderId, Note, NoteId, TargetId};

/// Remote operations, for failure injection and call tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    CreateNote,
    ListNotes,
    UpdateNote,
    DeleteNote,
    ListFolders,
    CreateFolder,
    RenameFolder,
    DeleteFolder,
    DeleteConversation,
}

impl RemoteOp {
    /// Message returned when the operation fails
    pub fn failure_message(self) -> &'static str {
        match self {
            RemoteOp::CreateNote => "Failed to add note",
            RemoteOp::ListNotes => "Failed to fetch notes",
            RemoteOp::UpdateNote => "Failed to edit note",
            RemoteOp::DeleteNote => "Failed to delete note",
            RemoteOp::ListFolders => "Failed to fetch folders",
            RemoteOp::CreateFolder => "Failed to create folder",
            RemoteOp::RenameFolder => "Failed to edit folder",
            RemoteOp::DeleteFolder => "Failed to delete folder",
            RemoteOp::DeleteConversation => "Failed to delete conversation",
        }
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Once,
    Always,
}

/// Test controls: injected failures, held calls and the call log
#[derive(Default)]
struct Control {
    failures: HashMap<RemoteOp, Failure>,
    gates: HashMap<RemoteOp, Arc<Notify>>,
    calls: Vec<RemoteOp>,
}

/// Server-side data
struct ServerData {
    notes: Vec<Note>,
    root: Folder,
    next_id: u64,
}

impl ServerData {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory implementation of [`NotesRemote`] and [`FolderRemote`]
pub struct InMemoryRemote {
    data: Mutex<ServerData>,
    control: Mutex<Control>,
}

impl InMemoryRemote {
    /// Create a remote with no notes and an empty root folder
    pub fn new() -> Self {
        Self::with_folder_tree(Folder::new("root", "Root"))
    }

    /// Create a remote serving the given folder tree
    pub fn with_folder_tree(root: Folder) -> Self {
        Self {
            data: Mutex::new(ServerData {
                notes: Vec::new(),
                root,
                next_id: 0,
            }),
            control: Mutex::new(Control::default()),
        }
    }

    /// Store a note as-is, bypassing validation (seeding server state)
    pub fn insert_note(&self, note: Note) {
        self.data.lock().notes.push(note.confirmed());
    }

    /// Server copy of every note of a target, tombstones included
    pub fn stored_notes(&self, target_id: &TargetId) -> Vec<Note> {
        self.data
            .lock()
            .notes
            .iter()
            .filter(|n| &n.target_id == target_id)
            .cloned()
            .collect()
    }

    /// Server copy of the folder tree
    pub fn stored_tree(&self) -> Folder {
        self.data.lock().root.clone()
    }

    /// Make the next call of `op` fail
    pub fn fail_next(&self, op: RemoteOp) {
        self.control.lock().failures.insert(op, Failure::Once);
    }

    /// Make every call of `op` fail until [`recover`](Self::recover)
    pub fn fail_always(&self, op: RemoteOp) {
        self.control.lock().failures.insert(op, Failure::Always);
    }

    pub fn recover(&self, op: RemoteOp) {
        self.control.lock().failures.remove(&op);
    }

    /// Park calls of `op` until [`release`](Self::release) is called
    pub fn hold(&self, op: RemoteOp) {
        self.control
            .lock()
            .gates
            .insert(op, Arc::new(Notify::new()));
    }

    /// Let a held call of `op` continue
    pub fn release(&self, op: RemoteOp) {
        if let Some(gate) = self.control.lock().gates.remove(&op) {
            gate.notify_one();
        }
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<RemoteOp> {
        self.control.lock().calls.clone()
    }

    /// Number of calls of `op` received so far
    pub fn call_count(&self, op: RemoteOp) -> usize {
        self.control.lock().calls.iter().filter(|c| **c == op).count()
    }

    /// Record the call, wait if held, then apply any injected failure
    async fn enter(&self, op: RemoteOp) -> Result<(), RemoteError> {
        let gate = {
            let mut control = self.control.lock();
            control.calls.push(op);
            control.gates.get(&op).cloned()
        };

        if let Some(gate) = gate {
            debug!("Holding {} until released", op);
            gate.notified().await;
        }

        let mut control = self.control.lock();
        match control.failures.get(&op).copied() {
            Some(Failure::Once) => {
                control.failures.remove(&op);
                Err(RemoteError::new(op.failure_message()))
            }
            Some(Failure::Always) => Err(RemoteError::new(op.failure_message())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl NotesRemote for InMemoryRemote {
    async fn create_note(
        &self,
        target_id: &TargetId,
        content: &str,
        from_index: usize,
        to_index: usize,
    ) -> Result<Note, RemoteError> {
        self.enter(RemoteOp::CreateNote).await?;

        let mut data = self.data.lock();
        let id = data.next_id("note");
        let note = Note::new(id, target_id.clone(), content, from_index, to_index);
        data.notes.push(note.clone());
        Ok(note)
    }

    async fn list_notes(&self, target_id: &TargetId) -> Result<Vec<Note>, RemoteError> {
        self.enter(RemoteOp::ListNotes).await?;
        Ok(self.stored_notes(target_id))
    }

    async fn update_note(
        &self,
        target_id: &TargetId,
        id: &NoteId,
        content: &str,
        from_index: usize,
        to_index: usize,
    ) -> Result<Note, RemoteError> {
        self.enter(RemoteOp::UpdateNote).await?;

        let mut data = self.data.lock();
        let note = data
            .notes
            .iter_mut()
            .find(|n| &n.target_id == target_id && &n.id == id && !n.is_deleted)
            .ok_or_else(|| RemoteError::new("Note not found"))?;
        note.content = content.to_string();
        note.from_index = from_index;
        note.to_index = to_index;
        Ok(note.clone())
    }

    async fn soft_delete_note(&self, target_id: &TargetId, id: &NoteId) -> Result<(), RemoteError> {
        self.enter(RemoteOp::DeleteNote).await?;

        let mut data = self.data.lock();
        let note = data
            .notes
            .iter_mut()
            .find(|n| &n.target_id == target_id && &n.id == id)
            .ok_or_else(|| RemoteError::new("Note not found"))?;
        note.is_deleted = true;
        Ok(())
    }
}

impl FolderRemote for InMemoryRemote {
    async fn list_folder_tree(&self) -> Result<Folder, RemoteError> {
        self.enter(RemoteOp::ListFolders).await?;
        Ok(self.stored_tree())
    }

    async fn create_folder(&self, name: &str, parent_id: &FolderId) -> Result<Folder, RemoteError> {
        self.enter(RemoteOp::CreateFolder).await?;

        let mut data = self.data.lock();
        let id = data.next_id("folder");
        let parent = data
            .root
            .find_folder_mut(parent_id)
            .ok_or_else(|| RemoteError::new("Parent folder not found"))?;
        let mut folder = Folder::new(id, name);
        folder.parent_id = Some(parent_id.clone());
        parent.sub_folders.push(folder.clone());
        Ok(folder)
    }

    async fn rename_folder(&self, id: &FolderId, name: &str) -> Result<(), RemoteError> {
        self.enter(RemoteOp::RenameFolder).await?;

        let mut data = self.data.lock();
        let folder = data
            .root
            .find_folder_mut(id)
            .ok_or_else(|| RemoteError::new("Folder not found"))?;
        folder.name = name.to_string();
        Ok(())
    }

    async fn soft_delete_folder(&self, id: &FolderId) -> Result<(), RemoteError> {
        self.enter(RemoteOp::DeleteFolder).await?;

        let mut data = self.data.lock();
        data.root
            .remove_sub_folder(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::new("Folder not found"))
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<(), RemoteError> {
        self.enter(RemoteOp::DeleteConversation).await?;

        let mut data = self.data.lock();
        data.root
            .remove_conversation(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::new("Conversation not found"))
    }
}
