//! Maps native selections to character offsets over a message's plain text

use super::document::{NativeRange, NodeId, RenderedDocument};
use super::{Rect, SelectionSource};

/// A usable selection inside a message
#[derive(Debug, Clone, PartialEq)]
pub struct TextSelection {
    pub from_index: usize,
    pub to_index: usize,
    pub selected_text: String,
    /// Viewport rectangle of the selection, when the source can measure it
    pub rect: Option<Rect>,
}

impl TextSelection {
    pub fn len(&self) -> usize {
        self.to_index - self.from_index
    }

    pub fn is_empty(&self) -> bool {
        self.from_index == self.to_index
    }
}

/// Where to anchor the "add note" popup, relative to the container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupPosition {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Popup placement: just below the selection, horizontally centered on it
pub fn popup_position(selection: &TextSelection, container: Rect) -> Option<PopupPosition> {
    let rect = selection.rect?;
    Some(PopupPosition {
        top: rect.bottom() - container.top,
        left: rect.left - container.left + rect.width / 2.0,
        width: rect.width,
        height: rect.height,
    })
}

/// Converts ranges inside one container into `[from, to)` char offsets
#[derive(Debug, Clone, Copy)]
pub struct OffsetMapper<'a> {
    document: &'a RenderedDocument,
    container: NodeId,
}

impl<'a> OffsetMapper<'a> {
    pub fn new(document: &'a RenderedDocument, container: NodeId) -> Self {
        Self {
            document,
            container,
        }
    }

    /// Plain text of the container, the coordinate space of the offsets
    pub fn text(&self) -> String {
        self.document.text_content(self.container)
    }

    /// Map a range to offsets and its text
    ///
    /// Returns `None` when the range is not inside the container, is
    /// collapsed, or selects only whitespace.
    pub fn map_range(&self, range: &NativeRange) -> Option<(usize, usize, String)> {
        let ancestor = self
            .document
            .common_ancestor(range.start.node, range.end.node);
        if !self.document.contains(self.container, ancestor) {
            return None;
        }
        if range.is_collapsed() {
            return None;
        }

        let start = self.document.offset_of(self.container, range.start)?;
        let end = self.document.offset_of(self.container, range.end)?;
        let (from, to) = if start <= end { (start, end) } else { (end, start) };

        let selected: String = self
            .text()
            .chars()
            .skip(from)
            .take(to - from)
            .collect();
        let to = from + selected.chars().count();

        if from == to || selected.trim().is_empty() {
            return None;
        }
        Some((from, to, selected))
    }

    /// Read the source's current selection and map it
    pub fn map<S: SelectionSource + ?Sized>(&self, source: &S) -> Option<TextSelection> {
        let range = source.current_range()?;
        let (from_index, to_index, selected_text) = self.map_range(&range)?;
        Some(TextSelection {
            from_index,
            to_index,
            selected_text,
            rect: source.bounding_rect(&range),
        })
    }
}
