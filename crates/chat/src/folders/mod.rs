//! Folder hierarchy of conversations

mod store;
mod tree;

pub use store::FolderTreeStore;
pub use tree::{FolderNode, FolderTree};
