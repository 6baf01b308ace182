//! Chat crate - Business logic for the Parley chat client
//!
//! This crate provides platform-independent functionality including:
//! - Domain models (Note, Folder, Conversation)
//! - Selection capture and offset mapping over rendered messages
//! - Note range validation and segment rendering
//! - Optimistic note and folder-tree stores with rollback
//! - Remote store contracts and an in-memory implementation
//!
//! This crate has zero UI dependencies and no network transport.

pub mod config;
pub mod error;
pub mod folders;
pub mod models;
pub mod notes;
pub mod optimistic;
pub mod remote;
pub mod selection;

pub use config::ClientSettings;
pub use error::{ChatError, EntityKind, RangeError, RemoteError, Result, ValidationError};
pub use folders::{FolderNode, FolderTree, FolderTreeStore};
pub use models::{Conversation, ConversationId, Folder, FolderId, Note, NoteId, TargetId};
pub use notes::{
    AnnotationStore, OverlapPolicy, RangeValidator, Segment, SegmentKind, Segments,
    build_segments, check_range, is_valid_range, notes_in_range,
};
pub use remote::{FolderRemote, InMemoryRemote, NotesRemote, RemoteOp};
pub use selection::{
    Boundary, Debouncer, NativeRange, NodeId, OffsetMapper, PopupPosition, Rect,
    RenderedDocument, SelectionSource, SelectionTracker, TextSelection, popup_position,
};
