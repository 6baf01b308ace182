//! Folder tree state with the active conversation
//!
//! Folder create/rename/delete go to the remote store first and then
//! refetch the whole tree. Deleting a conversation is optimistic: the
//! conversation disappears locally before the remote call resolves and
//! comes back if it fails.

use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::tree::FolderTree;
use crate::error::{ChatError, EntityKind, Result, ValidationError};
use crate::models::{Conversation, ConversationId, Folder, FolderId};
use crate::optimistic::{self, InFlight};
use crate::remote::FolderRemote;

struct TreeState {
    tree: FolderTree,
    active: Option<ConversationId>,
}

/// Owns the folder tree; UI code reads snapshots and calls these methods
/// to change it
pub struct FolderTreeStore<R: FolderRemote> {
    remote: Arc<R>,
    state: RwLock<TreeState>,
    in_flight: AtomicUsize,
    last_error: RwLock<Option<String>>,
}

impl<R: FolderRemote> FolderTreeStore<R> {
    /// Create a store holding an empty root; call [`fetch_tree`](Self::fetch_tree) to load it
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            state: RwLock::new(TreeState {
                tree: FolderTree::from_folder(Folder::new("root", "Root")),
                active: None,
            }),
            in_flight: AtomicUsize::new(0),
            last_error: RwLock::new(None),
        }
    }

    /// Replace the tree with the remote one
    pub async fn fetch_tree(&self) -> Result<()> {
        let _busy = self.busy();
        *self.last_error.write() = None;
        match self.refetch().await {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    /// Create a folder under `parent_id`, or under the root when `None`
    pub async fn create_folder(&self, name: &str, parent_id: Option<&FolderId>) -> Result<()> {
        let _busy = self.busy();
        *self.last_error.write() = None;

        let name = name.trim();
        if name.is_empty() {
            return self.fail(ValidationError::EmptyName.into());
        }
        let parent_id = match parent_id {
            Some(id) => id.clone(),
            None => self.state.read().tree.root_id().clone(),
        };
        if !self.state.read().tree.contains_folder(&parent_id) {
            return self.fail(ChatError::not_found(EntityKind::Folder, &parent_id));
        }

        match self.remote.create_folder(name, &parent_id).await {
            Ok(folder) => info!("Created folder {} under {}", folder.id, parent_id),
            Err(e) => return self.fail(e.into()),
        }
        self.refetch().await.or_else(|e| self.fail(e))
    }

    pub async fn rename_folder(&self, id: &FolderId, name: &str) -> Result<()> {
        let _busy = self.busy();
        *self.last_error.write() = None;

        let name = name.trim();
        if name.is_empty() {
            return self.fail(ValidationError::EmptyName.into());
        }
        if !self.state.read().tree.contains_folder(id) {
            return self.fail(ChatError::not_found(EntityKind::Folder, id));
        }

        if let Err(e) = self.remote.rename_folder(id, name).await {
            return self.fail(e.into());
        }
        info!("Renamed folder {}", id);
        self.refetch().await.or_else(|e| self.fail(e))
    }

    /// Delete a folder and everything under it
    ///
    /// The active conversation is cleared when it went away with the folder.
    pub async fn delete_folder(&self, id: &FolderId) -> Result<()> {
        let _busy = self.busy();
        *self.last_error.write() = None;

        {
            let state = self.state.read();
            if !state.tree.contains_folder(id) {
                drop(state);
                return self.fail(ChatError::not_found(EntityKind::Folder, id));
            }
            if state.tree.root_id() == id {
                drop(state);
                return self.fail(ValidationError::RootFolder.into());
            }
        }

        if let Err(e) = self.remote.soft_delete_folder(id).await {
            return self.fail(e.into());
        }
        info!("Deleted folder {}", id);
        self.refetch().await.or_else(|e| self.fail(e))?;

        let mut state = self.state.write();
        if let Some(active) = state.active.clone()
            && !state.tree.contains_conversation(&active)
        {
            info!("Active conversation {} went away with its folder", active);
            state.active = None;
        }
        Ok(())
    }

    /// Delete a conversation, removing it locally before the remote call
    /// resolves
    ///
    /// On failure the previous tree and active conversation are restored.
    pub async fn delete_conversation(&self, id: &ConversationId) -> Result<()> {
        let _busy = self.busy();
        *self.last_error.write() = None;
        let remote = &self.remote;

        let result = optimistic::run(
            &self.state,
            |s: &mut TreeState| -> Result<(FolderTree, Option<ConversationId>)> {
                let snapshot = (s.tree.clone(), s.active.clone());
                if s.tree.remove_conversation(id).is_none() {
                    return Err(ChatError::not_found(EntityKind::Conversation, id));
                }
                if s.active.as_ref() == Some(id) {
                    s.active = None;
                }
                Ok(snapshot)
            },
            move || remote.delete_conversation(id),
            |_, _| {},
            |s, (tree, active)| {
                s.tree = tree;
                s.active = active;
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!("Deleted conversation {}", id);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Make a conversation the active one
    pub fn set_active_conversation(&self, id: &ConversationId) -> Result<()> {
        let mut state = self.state.write();
        if !state.tree.contains_conversation(id) {
            return Err(ChatError::not_found(EntityKind::Conversation, id));
        }
        state.active = Some(id.clone());
        Ok(())
    }

    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.state.read().active.clone()
    }

    pub fn clear_active_conversation(&self) {
        self.state.write().active = None;
    }

    /// Snapshot of the tree; nodes are shared, so this is cheap
    pub fn tree(&self) -> FolderTree {
        self.state.read().tree.clone()
    }

    /// A conversation and the id of the folder holding it
    pub fn find_conversation(&self, id: &ConversationId) -> Option<(FolderId, Conversation)> {
        let state = self.state.read();
        state
            .tree
            .find_conversation(id)
            .map(|(folder, conversation)| (folder.clone(), conversation.clone()))
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    async fn refetch(&self) -> Result<()> {
        let root = self.remote.list_folder_tree().await?;
        let tree = FolderTree::from_folder(root);
        let folders = tree.len();
        self.state.write().tree = tree;
        info!("Loaded folder tree ({} folders)", folders);
        Ok(())
    }

    fn busy(&self) -> InFlight<'_> {
        InFlight::enter(&self.in_flight)
    }

    fn fail<T>(&self, error: ChatError) -> Result<T> {
        warn!("Folder operation failed: {}", error);
        *self.last_error.write() = Some(error.to_string());
        Err(error)
    }
}
