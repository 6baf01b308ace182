//! Folder and conversation models, in the nested shape the server sends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(pub String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FolderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A chat conversation, always stored under exactly one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(alias = "conversation_Id")]
    pub id: ConversationId,
    pub title: String,
    /// Model the conversation talks to
    #[serde(alias = "aiModel_Id", alias = "aI_Id", default)]
    pub model_id: String,
    #[serde(default)]
    pub system_message: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        id: impl Into<ConversationId>,
        title: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            model_id: model_id.into(),
            system_message: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Builder method to set the system message
    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = message.into();
        self
    }
}

/// A folder with its conversations and nested sub-folders
///
/// This is the wire shape. Clients work on [`crate::folders::FolderTree`],
/// which flattens it into an id-addressed arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub sub_folders: Vec<Folder>,
}

impl Folder {
    pub fn new(id: impl Into<FolderId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            conversations: Vec::new(),
            sub_folders: Vec::new(),
        }
    }

    /// Builder method to append a conversation
    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversations.push(conversation);
        self
    }

    /// Builder method to append a sub-folder, setting its parent id
    pub fn with_sub_folder(mut self, mut folder: Folder) -> Self {
        folder.parent_id = Some(self.id.clone());
        self.sub_folders.push(folder);
        self
    }

    /// Find a folder in this subtree (including self)
    pub fn find_folder_mut(&mut self, id: &FolderId) -> Option<&mut Folder> {
        if &self.id == id {
            return Some(self);
        }
        self.sub_folders
            .iter_mut()
            .find_map(|sub| sub.find_folder_mut(id))
    }

    /// Detach a descendant folder and return it
    pub fn remove_sub_folder(&mut self, id: &FolderId) -> Option<Folder> {
        if let Some(pos) = self.sub_folders.iter().position(|f| &f.id == id) {
            return Some(self.sub_folders.remove(pos));
        }
        self.sub_folders
            .iter_mut()
            .find_map(|sub| sub.remove_sub_folder(id))
    }

    /// Remove a conversation from whichever folder in this subtree holds it
    pub fn remove_conversation(&mut self, id: &ConversationId) -> Option<Conversation> {
        if let Some(pos) = self.conversations.iter().position(|c| &c.id == id) {
            return Some(self.conversations.remove(pos));
        }
        self.sub_folders
            .iter_mut()
            .find_map(|sub| sub.remove_conversation(id))
    }
}
