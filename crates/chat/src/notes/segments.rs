//! Splits a response's text into plain and highlighted segments for rendering

use log::debug;

use crate::models::Note;

/// How a segment should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind<'a> {
    Plain,
    /// Text covered by a note
    Highlighted(&'a Note),
}

/// A contiguous run of text with a single rendering kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind<'a>,
}

impl<'a> Segment<'a> {
    pub fn is_highlighted(&self) -> bool {
        matches!(self.kind, SegmentKind::Highlighted(_))
    }

    /// The note behind a highlighted segment
    pub fn note(&self) -> Option<&'a Note> {
        match self.kind {
            SegmentKind::Highlighted(note) => Some(note),
            SegmentKind::Plain => None,
        }
    }
}

/// Build the segment sequence for `text` annotated with `notes`
///
/// Deleted notes are ignored. Notes whose offsets no longer fit the text,
/// that are empty, or that start inside an earlier highlight are skipped,
/// so concatenating the segments always reproduces `text`.
pub fn build_segments<'a>(text: &'a str, notes: &'a [Note]) -> Segments<'a> {
    let mut ordered: Vec<&'a Note> = notes.iter().filter(|n| !n.is_deleted).collect();
    ordered.sort_by_key(|n| n.from_index);

    Segments {
        text,
        text_len: text.chars().count(),
        notes: ordered.into_iter(),
        pending: None,
        cursor_char: 0,
        cursor_byte: 0,
    }
}

/// Lazy iterator over the segments of an annotated text
///
/// Nothing is cached between passes: call [`build_segments`] again to
/// start over. A clone continues from the position it was taken at.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    text_len: usize,
    notes: std::vec::IntoIter<&'a Note>,
    /// Highlight to emit once the gap before it has been yielded
    pending: Option<&'a Note>,
    cursor_char: usize,
    cursor_byte: usize,
}

impl<'a> Segments<'a> {
    /// Slice from the cursor up to char offset `until` and move the cursor there
    fn take_until(&mut self, until: usize) -> &'a str {
        let rest = &self.text[self.cursor_byte..];
        let span = until - self.cursor_char;
        let byte_len = rest
            .char_indices()
            .nth(span)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.cursor_char = until;
        self.cursor_byte += byte_len;
        &rest[..byte_len]
    }

    fn is_renderable(&self, note: &Note) -> bool {
        note.is_well_formed()
            && note.to_index <= self.text_len
            && note.from_index >= self.cursor_char
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(note) = self.pending.take() {
                let text = self.take_until(note.to_index);
                return Some(Segment {
                    text,
                    kind: SegmentKind::Highlighted(note),
                });
            }

            let Some(note) = self.notes.next() else {
                if self.cursor_char < self.text_len {
                    let text = self.take_until(self.text_len);
                    return Some(Segment {
                        text,
                        kind: SegmentKind::Plain,
                    });
                }
                return None;
            };

            if !self.is_renderable(note) {
                debug!(
                    "Skipping note {} [{}..{}) for text of {} chars",
                    note.id, note.from_index, note.to_index, self.text_len
                );
                continue;
            }

            self.pending = Some(note);
            if note.from_index > self.cursor_char {
                let text = self.take_until(note.from_index);
                return Some(Segment {
                    text,
                    kind: SegmentKind::Plain,
                });
            }
        }
    }
}
