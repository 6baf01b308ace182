//! Plain-text rendering of an annotated response

use chat::{Note, SegmentKind, build_segments};

/// Render `text` with each note's span bracketed and numbered, followed
/// by the numbered note contents
///
/// ```text
/// The [quick]^1 brown fox
///
/// [1] 4..9 adjective
/// ```
pub fn render_annotated(text: &str, notes: &[Note]) -> String {
    let mut body = String::with_capacity(text.len() + notes.len() * 8);
    let mut footnotes = Vec::new();

    for segment in build_segments(text, notes) {
        match segment.kind {
            SegmentKind::Plain => body.push_str(segment.text),
            SegmentKind::Highlighted(note) => {
                footnotes.push(note);
                body.push_str(&format!("[{}]^{}", segment.text, footnotes.len()));
            }
        }
    }

    if footnotes.is_empty() {
        return body;
    }

    body.push_str("\n\n");
    let lines: Vec<String> = footnotes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            format!(
                "[{}] {}..{} {}",
                i + 1,
                note.from_index,
                note.to_index,
                note.content
            )
        })
        .collect();
    body.push_str(&lines.join("\n"));
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(render_annotated("The quick brown fox", &[]), "The quick brown fox");
    }

    #[test]
    fn test_notes_are_numbered_in_text_order() {
        let notes = vec![
            Note::new("n2", "r", "animal", 16, 19),
            Note::new("n1", "r", "adjective", 4, 9),
        ];
        assert_eq!(
            render_annotated("The quick brown fox", &notes),
            "The [quick]^1 brown [fox]^2\n\n[1] 4..9 adjective\n[2] 16..19 animal"
        );
    }

    #[test]
    fn test_stale_note_is_not_rendered() {
        let notes = vec![Note::new("n1", "r", "gone", 10, 99)];
        assert_eq!(render_annotated("short text", &notes), "short text");
    }
}
