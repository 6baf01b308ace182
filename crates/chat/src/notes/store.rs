//! Optimistic note collection for one response
//!
//! Mutations are applied locally first and reconciled when the remote
//! call resolves:
//! 1. validate against the current notes (nothing changes on failure)
//! 2. apply the change, marking affected notes optimistic
//! 3. call the remote store
//! 4. replace the optimistic entry with the server's, or roll back
//!
//! Responses that arrive after the store has been retargeted or closed
//! are dropped.

use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::range::{OverlapPolicy, RangeValidator, notes_in_range};
use crate::config::ClientSettings;
use crate::error::{ChatError, EntityKind, RangeError, Result, ValidationError};
use crate::models::{Note, NoteId, TargetId};
use crate::optimistic::{self, InFlight};
use crate::remote::NotesRemote;

struct NotesState {
    target_id: TargetId,
    /// Length in chars of the target text, when known
    text_len: Option<usize>,
    notes: Vec<Note>,
    /// Bumped on retarget and close to invalidate in-flight responses
    epoch: u64,
}

/// Owns the notes of a single target and keeps them in sync with the
/// remote store
///
/// This is the only writer of its collection, and so the place where the
/// non-overlap and bounds rules are enforced.
pub struct AnnotationStore<R: NotesRemote> {
    remote: Arc<R>,
    policy: OverlapPolicy,
    temp_id_prefix: String,
    state: RwLock<NotesState>,
    in_flight: AtomicUsize,
    last_error: RwLock<Option<String>>,
    next_temp: AtomicU64,
}

impl<R: NotesRemote> AnnotationStore<R> {
    /// Create an empty store for `target_id`; call [`fetch`](Self::fetch) to load it
    pub fn new(remote: Arc<R>, target_id: impl Into<TargetId>, settings: &ClientSettings) -> Self {
        Self {
            remote,
            policy: settings.overlap_policy,
            temp_id_prefix: settings.temp_id_prefix.clone(),
            state: RwLock::new(NotesState {
                target_id: target_id.into(),
                text_len: None,
                notes: Vec::new(),
                epoch: 0,
            }),
            in_flight: AtomicUsize::new(0),
            last_error: RwLock::new(None),
            next_temp: AtomicU64::new(0),
        }
    }

    /// Builder method to bound note ranges by the target text length
    pub fn with_text_len(self, text_len: usize) -> Self {
        self.state.write().text_len = Some(text_len);
        self
    }

    /// Set or forget the target text length
    pub fn set_text_len(&self, text_len: Option<usize>) {
        self.state.write().text_len = text_len;
    }

    /// Switch to another target
    ///
    /// Clears the collection; responses to calls issued for the previous
    /// target are ignored.
    pub fn retarget(&self, target_id: impl Into<TargetId>, text_len: Option<usize>) {
        let mut state = self.state.write();
        state.target_id = target_id.into();
        state.text_len = text_len;
        state.notes.clear();
        state.epoch += 1;
        debug!("Retargeted note store to {}", state.target_id);
    }

    /// Stop applying responses from calls that are still in flight
    pub fn close(&self) {
        let mut state = self.state.write();
        state.notes.clear();
        state.epoch += 1;
    }

    /// Load the target's notes, replacing the local collection
    pub async fn fetch(&self) -> Result<()> {
        let _busy = InFlight::enter(&self.in_flight);
        self.clear_error();
        let (target_id, epoch) = self.snapshot_target();

        let fetched = match self.remote.list_notes(&target_id).await {
            Ok(notes) => notes,
            Err(e) => return self.fail(ChatError::from(e)),
        };

        let mut state = self.state.write();
        if state.epoch != epoch {
            debug!("Discarding stale notes for {}", target_id);
            return Ok(());
        }
        state.notes = fetched
            .into_iter()
            .filter(|n| !n.is_deleted)
            .map(Note::confirmed)
            .collect();
        info!("Loaded {} notes for {}", state.notes.len(), target_id);
        Ok(())
    }

    /// Create a note over `[from_index, to_index)`
    ///
    /// The note is visible immediately with a temporary id and replaced by
    /// the server's copy once the create call succeeds.
    pub async fn add(&self, content: &str, from_index: usize, to_index: usize) -> Result<Note> {
        let _busy = InFlight::enter(&self.in_flight);
        self.clear_error();

        let content = content.trim();
        if content.is_empty() {
            return self.fail(ValidationError::EmptyContent.into());
        }

        let (target_id, epoch) = self.snapshot_target();
        let temp_id = self.next_temp_id();
        let validator = self.validator();
        let remote = &self.remote;
        let target = &target_id;

        let result = optimistic::run(
            &self.state,
            |s: &mut NotesState| -> Result<()> {
                validator
                    .with_text_len(s.text_len)
                    .check(&s.notes, from_index, to_index, None)?;
                s.notes.push(
                    Note::new(temp_id.clone(), target.clone(), content, from_index, to_index)
                        .optimistic(),
                );
                Ok(())
            },
            move || remote.create_note(target, content, from_index, to_index),
            |s, created: &Note| {
                if s.epoch != epoch {
                    return;
                }
                if let Some(slot) = s.notes.iter_mut().find(|n| n.id == temp_id) {
                    *slot = created.clone().confirmed();
                }
            },
            |s, ()| {
                if s.epoch == epoch {
                    s.notes.retain(|n| n.id != temp_id);
                }
            },
        )
        .await;

        match result {
            Ok(note) => {
                info!("Added note {} to {}", note.id, target_id);
                Ok(note.confirmed())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Replace a note's content and range
    pub async fn edit(
        &self,
        id: &NoteId,
        content: &str,
        from_index: usize,
        to_index: usize,
    ) -> Result<Note> {
        let _busy = InFlight::enter(&self.in_flight);
        self.clear_error();

        if self.get(id).is_none() {
            return self.fail(ChatError::not_found(EntityKind::Note, id));
        }
        if id.is_temporary(&self.temp_id_prefix) {
            return self.fail(ValidationError::PendingNote(id.clone()).into());
        }
        let content = content.trim();
        if content.is_empty() {
            return self.fail(ValidationError::EmptyContent.into());
        }

        let (target_id, epoch) = self.snapshot_target();
        let validator = self.validator();
        let remote = &self.remote;
        let target = &target_id;

        let result = optimistic::run(
            &self.state,
            |s: &mut NotesState| -> Result<Note> {
                validator
                    .with_text_len(s.text_len)
                    .check(&s.notes, from_index, to_index, Some(id))?;
                let slot = s
                    .notes
                    .iter_mut()
                    .find(|n| &n.id == id)
                    .ok_or_else(|| ChatError::not_found(EntityKind::Note, id))?;

                let mut updated = slot.clone().optimistic();
                updated.content = content.to_string();
                updated.from_index = from_index;
                updated.to_index = to_index;
                Ok(std::mem::replace(slot, updated))
            },
            move || remote.update_note(target, id, content, from_index, to_index),
            |s, server: &Note| {
                if s.epoch != epoch {
                    return;
                }
                if let Some(slot) = s.notes.iter_mut().find(|n| &n.id == id) {
                    *slot = server.clone().confirmed();
                }
            },
            |s, previous: Note| {
                if s.epoch != epoch {
                    return;
                }
                if let Some(slot) = s.notes.iter_mut().find(|n| &n.id == id) {
                    *slot = previous;
                }
            },
        )
        .await;

        match result {
            Ok(note) => {
                info!("Edited note {}", note.id);
                Ok(note.confirmed())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Soft delete a note; it disappears locally right away
    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        let _busy = InFlight::enter(&self.in_flight);
        self.clear_error();

        if self.get(id).is_none() {
            return self.fail(ChatError::not_found(EntityKind::Note, id));
        }
        if id.is_temporary(&self.temp_id_prefix) {
            return self.fail(ValidationError::PendingNote(id.clone()).into());
        }

        let (target_id, epoch) = self.snapshot_target();
        let remote = &self.remote;
        let target = &target_id;

        let result = optimistic::run(
            &self.state,
            |s: &mut NotesState| -> Result<(usize, Note)> {
                let index = s
                    .notes
                    .iter()
                    .position(|n| &n.id == id)
                    .ok_or_else(|| ChatError::not_found(EntityKind::Note, id))?;
                Ok((index, s.notes.remove(index)))
            },
            move || remote.soft_delete_note(target, id),
            |_, _| {},
            |s, (index, note)| {
                if s.epoch == epoch {
                    let index = index.min(s.notes.len());
                    s.notes.insert(index, note);
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!("Deleted note {}", id);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Snapshot of the current notes, optimistic ones included
    pub fn notes(&self) -> Vec<Note> {
        self.state.read().notes.clone()
    }

    pub fn get(&self, id: &NoteId) -> Option<Note> {
        self.state.read().notes.iter().find(|n| &n.id == id).cloned()
    }

    pub fn target_id(&self) -> TargetId {
        self.state.read().target_id.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().notes.is_empty()
    }

    /// Check a candidate range the way [`add`](Self::add) and
    /// [`edit`](Self::edit) will
    pub fn check_range(
        &self,
        from_index: usize,
        to_index: usize,
        exclude: Option<&NoteId>,
    ) -> Result<(), RangeError> {
        let state = self.state.read();
        self.validator()
            .with_text_len(state.text_len)
            .check(&state.notes, from_index, to_index, exclude)
    }

    pub fn is_valid_range(&self, from_index: usize, to_index: usize, exclude: Option<&NoteId>) -> bool {
        self.check_range(from_index, to_index, exclude).is_ok()
    }

    /// Notes intersecting `[from_index, to_index)`
    pub fn notes_in_range(&self, from_index: usize, to_index: usize) -> Vec<Note> {
        let state = self.state.read();
        notes_in_range(&state.notes, from_index, to_index)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Whether any remote call is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message of the most recent failed operation
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn validator(&self) -> RangeValidator {
        RangeValidator::new(self.policy)
    }

    fn snapshot_target(&self) -> (TargetId, u64) {
        let state = self.state.read();
        (state.target_id.clone(), state.epoch)
    }

    fn next_temp_id(&self) -> NoteId {
        let n = self.next_temp.fetch_add(1, Ordering::SeqCst);
        NoteId::new(format!(
            "{}{}-{}",
            self.temp_id_prefix,
            Utc::now().timestamp_millis(),
            n
        ))
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    fn fail<T>(&self, error: ChatError) -> Result<T> {
        if error.is_remote() {
            warn!("Note operation failed, rolled back: {}", error);
        } else {
            debug!("Note operation rejected: {}", error);
        }
        *self.last_error.write() = Some(error.to_string());
        Err(error)
    }
}
