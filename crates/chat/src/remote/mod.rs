//! Remote store contracts and implementations
//!
//! The stores only need calls that resolve to a value or a
//! [`RemoteError`](crate::error::RemoteError);
//! transports live outside this crate. [`InMemoryRemote`] is an
//! in-process implementation used by tests and offline tools.

mod memory;
mod traits;

pub use memory::{InMemoryRemote, RemoteOp};
pub use traits::{FolderRemote, NotesRemote};
