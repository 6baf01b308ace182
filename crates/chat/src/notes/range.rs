//! Range validation for new and edited notes
//!
//! Pure functions over a note slice; shared by UI pre-checks and the
//! [`AnnotationStore`](super::AnnotationStore) pre-flight.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RangeError;
use crate::models::{Note, NoteId};

/// How interval end points are compared when testing for overlap
///
/// A candidate `[f1, t1)` is tested against each existing `[f2, t2)`:
/// it overlaps when `f1` lies in the existing interval, when `t1` lies in
/// it, or when the candidate contains it. The policies differ only in
/// which end points count as "in".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Both end points of the existing interval are inclusive, so a
    /// candidate that merely touches a note (`[9, 15)` next to `[4, 9)`)
    /// is rejected.
    // NOTE: this is the historical server-compatible behavior. Whether
    // rejecting adjacent notes is intended has not been confirmed.
    #[default]
    Inclusive,
    /// `f1 ∈ [f2, t2)`, `t1 ∈ (f2, t2]`; adjacent notes are allowed.
    HalfOpen,
}

impl OverlapPolicy {
    /// Whether `[from, to)` collides with `existing`
    pub fn overlaps(self, from: usize, to: usize, existing: &Note) -> bool {
        let (f2, t2) = (existing.from_index, existing.to_index);
        let contains = from <= f2 && to >= t2;
        match self {
            OverlapPolicy::Inclusive => {
                (from >= f2 && from <= t2) || (to >= f2 && to <= t2) || contains
            }
            OverlapPolicy::HalfOpen => {
                (from >= f2 && from < t2) || (to > f2 && to <= t2) || contains
            }
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(OverlapPolicy::Inclusive),
            "half_open" | "half-open" | "halfopen" => Ok(OverlapPolicy::HalfOpen),
            other => Err(format!("unknown overlap policy: {other}")),
        }
    }
}

/// Validates candidate ranges against a set of notes
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeValidator {
    policy: OverlapPolicy,
    text_len: Option<usize>,
}

impl RangeValidator {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            text_len: None,
        }
    }

    /// Builder method to also reject ranges past the end of the text
    pub fn with_text_len(mut self, text_len: Option<usize>) -> Self {
        self.text_len = text_len;
        self
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Check `[from, to)`, skipping deleted notes and the note `exclude`
    pub fn check(
        &self,
        notes: &[Note],
        from: usize,
        to: usize,
        exclude: Option<&NoteId>,
    ) -> Result<(), RangeError> {
        if from >= to {
            return Err(RangeError::Empty { from, to });
        }
        if let Some(len) = self.text_len
            && to > len
        {
            return Err(RangeError::OutOfBounds { to, len });
        }

        let collision = notes
            .iter()
            .filter(|note| !note.is_deleted)
            .filter(|note| exclude != Some(&note.id))
            .find(|note| self.policy.overlaps(from, to, note));

        match collision {
            Some(note) => Err(RangeError::Overlaps(note.id.clone())),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self, notes: &[Note], from: usize, to: usize, exclude: Option<&NoteId>) -> bool {
        self.check(notes, from, to, exclude).is_ok()
    }
}

/// Check `[from, to)` with the default policy and no length bound
pub fn check_range(
    notes: &[Note],
    from: usize,
    to: usize,
    exclude: Option<&NoteId>,
) -> Result<(), RangeError> {
    RangeValidator::default().check(notes, from, to, exclude)
}

/// Whether `[from, to)` may become a note, using the default policy
pub fn is_valid_range(notes: &[Note], from: usize, to: usize, exclude: Option<&NoteId>) -> bool {
    check_range(notes, from, to, exclude).is_ok()
}

/// Notes intersecting `[from, to)`, e.g. to find the note under a click
pub fn notes_in_range(notes: &[Note], from: usize, to: usize) -> Vec<&Note> {
    notes
        .iter()
        .filter(|note| !note.is_deleted)
        .filter(|note| OverlapPolicy::HalfOpen.overlaps(from, to, note))
        .collect()
}
