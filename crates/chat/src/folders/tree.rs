//! Id-addressed arena for the folder hierarchy
//!
//! Nodes are shared through `Arc`, so cloning a tree is cheap and a
//! rewrite only copies the node it touches (`Arc::make_mut`). Every other
//! node stays pointer-identical to the snapshot it was cloned from.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Conversation, ConversationId, Folder, FolderId};

/// One folder of the tree, children referenced by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub id: FolderId,
    pub name: String,
    pub parent_id: Option<FolderId>,
    /// Sub-folders in stored order
    pub children: Vec<FolderId>,
    pub conversations: Vec<Conversation>,
}

/// The folder hierarchy of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderTree {
    root: FolderId,
    nodes: HashMap<FolderId, Arc<FolderNode>>,
}

impl FolderTree {
    /// Flatten the nested server shape
    ///
    /// Parent ids are taken from the nesting, not from the payload.
    pub fn from_folder(root: Folder) -> Self {
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        let mut stack = vec![(root, None)];

        while let Some((folder, parent_id)) = stack.pop() {
            let Folder {
                id,
                name,
                conversations,
                sub_folders,
                ..
            } = folder;
            let children = sub_folders.iter().map(|f| f.id.clone()).collect();
            for sub in sub_folders {
                stack.push((sub, Some(id.clone())));
            }
            nodes.insert(
                id.clone(),
                Arc::new(FolderNode {
                    id,
                    name,
                    parent_id,
                    children,
                    conversations,
                }),
            );
        }

        Self {
            root: root_id,
            nodes,
        }
    }

    /// Rebuild the nested shape
    pub fn to_folder(&self) -> Folder {
        self.build_folder(&self.root)
            .unwrap_or_else(|| Folder::new(self.root.clone(), ""))
    }

    fn build_folder(&self, id: &FolderId) -> Option<Folder> {
        let node = self.nodes.get(id)?;
        Some(Folder {
            id: node.id.clone(),
            name: node.name.clone(),
            parent_id: node.parent_id.clone(),
            conversations: node.conversations.clone(),
            sub_folders: node
                .children
                .iter()
                .filter_map(|child| self.build_folder(child))
                .collect(),
        })
    }

    pub fn root_id(&self) -> &FolderId {
        &self.root
    }

    pub fn root(&self) -> Option<&FolderNode> {
        self.get(&self.root)
    }

    pub fn get(&self, id: &FolderId) -> Option<&FolderNode> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    /// Shared handle to a node, to check structural sharing between snapshots
    pub fn node_arc(&self, id: &FolderId) -> Option<&Arc<FolderNode>> {
        self.nodes.get(id)
    }

    pub fn contains_folder(&self, id: &FolderId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of folders, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: &FolderId) -> &[FolderId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Find a conversation and the folder holding it
    ///
    /// Depth-first: a folder's own conversations are checked before its
    /// sub-folders, which are visited in stored order.
    pub fn find_conversation(&self, id: &ConversationId) -> Option<(&FolderId, &Conversation)> {
        let (folder, index) = self.locate_conversation(id)?;
        let node = self.nodes.get(&folder)?;
        Some((&node.id, &node.conversations[index]))
    }

    pub fn contains_conversation(&self, id: &ConversationId) -> bool {
        self.locate_conversation(id).is_some()
    }

    /// Remove a conversation from the folder holding it
    ///
    /// Only that folder's node is copied; all others keep sharing.
    pub fn remove_conversation(&mut self, id: &ConversationId) -> Option<Conversation> {
        let (folder, index) = self.locate_conversation(id)?;
        let node = Arc::make_mut(self.nodes.get_mut(&folder)?);
        Some(node.conversations.remove(index))
    }

    fn locate_conversation(&self, id: &ConversationId) -> Option<(FolderId, usize)> {
        let mut stack = vec![&self.root];
        while let Some(folder) = stack.pop() {
            let Some(node) = self.nodes.get(folder) else { continue };
            if let Some(index) = node.conversations.iter().position(|c| &c.id == id) {
                return Some((folder.clone(), index));
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

impl From<Folder> for FolderTree {
    fn from(root: Folder) -> Self {
        Self::from_folder(root)
    }
}
