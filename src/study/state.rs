//! View state of the browse and study screens
//!
//! Every transition here is synchronous and applied as one step; the
//! controller runs them under its lock.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::flashcards::{Flashcard, UpdateFlashcardCommand};

/// Which screen the cards are shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Full list in id order
    #[default]
    Browse,
    /// Shuffled snapshot of the list
    Study,
}

/// Snapshot of the deck taken in random order when studying starts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub flashcards: Vec<Flashcard>,
    pub current_index: usize,
    /// Ids of cards finished in this session
    pub completed: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
}

impl StudySession {
    pub fn new(flashcards: Vec<Flashcard>) -> Self {
        Self {
            flashcards,
            current_index: 0,
            completed: BTreeSet::new(),
            started_at: Utc::now(),
        }
    }
}

/// Position within an active study session, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StudyProgress {
    pub current: usize,
    pub total: usize,
}

/// Everything the study screen renders from
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Browse set
    pub flashcards: Vec<Flashcard>,
    /// Index into the displayed set, 0 when it is empty
    pub current_index: usize,
    pub mode: ViewMode,
    pub is_study_session_active: bool,
    pub study_session: Option<StudySession>,
    /// True only while a fetch is in flight
    pub is_loading: bool,
    pub error: Option<ApiError>,
    /// Target of the edit dialog
    pub editing_flashcard: Option<Flashcard>,
    /// Target of the delete dialog
    pub deleting_flashcard: Option<Flashcard>,
    pub is_card_flipped: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session's cards in study mode, otherwise the browse set
    pub fn displayed_flashcards(&self) -> &[Flashcard] {
        match (self.mode, &self.study_session) {
            (ViewMode::Study, Some(session)) => &session.flashcards,
            _ => &self.flashcards,
        }
    }

    pub fn current_flashcard(&self) -> Option<&Flashcard> {
        self.displayed_flashcards().get(self.current_index)
    }

    /// Progress through the active study session
    pub fn progress(&self) -> Option<StudyProgress> {
        match (self.mode, &self.study_session) {
            (ViewMode::Study, Some(session)) => Some(StudyProgress {
                current: self.current_index + 1,
                total: session.flashcards.len(),
            }),
            _ => None,
        }
    }

    /// Number of cards in the browse set
    pub fn flashcard_count(&self) -> usize {
        self.flashcards.len()
    }

    fn max_index(&self) -> usize {
        self.displayed_flashcards().len().saturating_sub(1)
    }

    pub(crate) fn begin_loading(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub(crate) fn finish_fetch(&mut self, result: Result<Vec<Flashcard>, ApiError>) {
        self.is_loading = false;
        match result {
            Ok(flashcards) => {
                self.flashcards = flashcards;
                self.current_index = 0;
                self.is_card_flipped = false;
                self.error = None;
            }
            Err(error) => {
                self.flashcards.clear();
                self.error = Some(error);
            }
        }
    }

    pub(crate) fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.reset_session();
    }

    /// Settle a study-session fetch; an empty deck leaves the session inactive
    pub(crate) fn finish_session_start(&mut self, result: Result<Vec<Flashcard>, ApiError>) {
        self.is_loading = false;
        match result {
            Ok(flashcards) if flashcards.is_empty() => {}
            Ok(flashcards) => {
                self.mode = ViewMode::Study;
                self.is_study_session_active = true;
                self.study_session = Some(StudySession::new(flashcards));
                self.current_index = 0;
                self.is_card_flipped = false;
                self.error = None;
            }
            Err(error) => {
                self.error = Some(error);
            }
        }
    }

    pub(crate) fn reset_session(&mut self) {
        self.is_study_session_active = false;
        self.study_session = None;
        self.current_index = 0;
        self.is_card_flipped = false;
    }

    pub(crate) fn navigate_to(&mut self, index: isize) {
        let max_index = self.max_index() as isize;
        self.current_index = index.clamp(0, max_index) as usize;
        self.is_card_flipped = false;
    }

    /// Step back one card; returns false at the first card
    pub(crate) fn go_to_previous(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        self.is_card_flipped = false;
        true
    }

    /// Step forward one card; returns false at the last card
    pub(crate) fn go_to_next(&mut self) -> bool {
        if self.current_index >= self.max_index() {
            return false;
        }
        self.current_index += 1;
        self.is_card_flipped = false;
        true
    }

    pub(crate) fn flip(&mut self) {
        self.is_card_flipped = !self.is_card_flipped;
    }

    fn for_each_sequence(&mut self, mut f: impl FnMut(&mut Vec<Flashcard>)) {
        f(&mut self.flashcards);
        if let Some(session) = self.study_session.as_mut() {
            f(&mut session.flashcards);
        }
    }

    /// Optimistic phase of an update: patch the card wherever it appears
    pub(crate) fn apply_patch(&mut self, id: &str, command: &UpdateFlashcardCommand) {
        self.for_each_sequence(|cards| {
            cards
                .iter_mut()
                .filter(|card| card.id == id)
                .for_each(|card| card.apply_patch(command));
        });
        self.editing_flashcard = None;
    }

    /// Replace the card with the server's record wherever it appears
    pub(crate) fn reconcile(&mut self, id: &str, record: &Flashcard) {
        self.for_each_sequence(|cards| {
            cards
                .iter_mut()
                .filter(|card| card.id == id)
                .for_each(|card| *card = record.clone());
        });
        self.editing_flashcard = None;
    }

    /// Optimistic phase of a delete
    ///
    /// The index is clamped against the displayed set, which in study mode
    /// can be shorter than the browse set.
    pub(crate) fn remove(&mut self, id: &str) {
        self.for_each_sequence(|cards| cards.retain(|card| card.id != id));

        let len = self.displayed_flashcards().len();
        if len == 0 {
            self.current_index = 0;
        } else if self.current_index >= len {
            self.current_index = len - 1;
        }
        self.deleting_flashcard = None;
    }

    /// Put a card back after a failed delete, before the first larger id
    ///
    /// Ids are compared as strings, so the original position is only
    /// recovered when ids sort in creation order. Sequences that already hold
    /// the card, e.g. after a reload finished during the delete, are left alone.
    pub(crate) fn restore(&mut self, removed: &Flashcard) {
        self.for_each_sequence(|cards| {
            if cards.iter().any(|card| card.id == removed.id) {
                return;
            }
            let position = cards
                .iter()
                .position(|card| card.id > removed.id)
                .unwrap_or(cards.len());
            cards.insert(position, removed.clone());
        });
        self.deleting_flashcard = None;
    }
}
