//! Notes engine: range rules, segment rendering and the optimistic store

mod range;
mod segments;
mod store;

pub use range::{OverlapPolicy, RangeValidator, check_range, is_valid_range, notes_in_range};
pub use segments::{Segment, SegmentKind, Segments, build_segments};
pub use store::AnnotationStore;
