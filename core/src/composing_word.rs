//! The word currently being typed.
//!
//! `ComposingWord` logs the applied events and derives the typed word from
//! them through the `CombinerChain`. The derived text is never edited
//! directly: every change goes through `process_event` and
//! `apply_processed_event`, then the cache is refreshed from the chain.

use crate::combiner::{Combiner, CombinerChain};
use crate::commit_history::{CommitHistory, CommitType};
use crate::event::{Event, EventKind};

/// The composing word and its intra-word cursor.
#[derive(Debug, Default)]
pub struct ComposingWord {
    events: Vec<Event>,
    chain: CombinerChain,
    typed_word: String,
    code_point_size: usize,
    /// Cursor position in code points, 0..=code_point_size
    cursor: usize,
    only_first_char_capitalized: bool,
}

impl ComposingWord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty word that runs events through `combiners`.
    pub fn with_combiners(combiners: Vec<Box<dyn Combiner>>) -> Self {
        Self {
            chain: CombinerChain::new("", combiners),
            ..Self::default()
        }
    }

    /// Replace the combiners (subtype change). Clears the word.
    pub fn set_combiners(&mut self, combiners: Vec<Box<dyn Combiner>>) {
        self.chain = CombinerChain::new("", combiners);
        self.reset();
    }

    /// Clear events and derived text.
    pub fn reset(&mut self) {
        self.chain.reset();
        self.events.clear();
        self.only_first_char_capitalized = false;
        self.cursor = 0;
        self.refresh_typed_word();
    }

    fn refresh_typed_word(&mut self) {
        self.typed_word = self.chain.composing_word_with_feedback();
        self.code_point_size = self.typed_word.chars().count();
    }

    /// Run `event` through the combiners.
    ///
    /// The returned events are what the caller should dispatch; nothing is
    /// applied to the word or logged until `apply_processed_event`.
    pub fn process_event(&mut self, event: Event) -> Vec<Event> {
        let processed = self.chain.process_event(&self.events, event);
        // Combiner state may have changed; feedback is part of the word.
        self.refresh_typed_word();
        processed
    }

    /// Apply a processed event to the running state and log it.
    ///
    /// The cursor moves to the end of the word. The "only first char
    /// capitalized" flag holds while every code point after the first is
    /// not uppercase.
    pub fn apply_processed_event(&mut self, event: &Event) {
        let new_index = self.code_point_size;
        self.chain.apply_processed_event(event);
        if !matches!(event.kind(), EventKind::CursorMoved(_)) {
            self.events.push(event.clone());
        }
        self.refresh_typed_word();
        self.cursor = self.code_point_size;
        if self.code_point_size == 0 {
            self.only_first_char_capitalized = false;
        }
        if !event.is_delete() {
            let is_upper = event.code_point().is_some_and(char::is_uppercase);
            if new_index == 0 {
                self.only_first_char_capitalized = is_upper;
            } else {
                self.only_first_char_capitalized &= !is_upper;
            }
        }
    }

    /// Move the intra-word cursor by `delta` UTF-16 units.
    ///
    /// Returns false without moving when the target would fall outside the
    /// word or in the middle of a code point.
    pub fn move_cursor_within_word(&mut self, delta: isize) -> bool {
        let units: Vec<usize> = self.typed_word.chars().map(char::len_utf16).collect();
        let mut moved: isize = 0;
        let mut cursor = self.cursor;
        if delta >= 0 {
            while moved < delta && cursor < units.len() {
                moved += units[cursor] as isize;
                cursor += 1;
            }
        } else {
            while moved > delta && cursor > 0 {
                cursor -= 1;
                moved -= units[cursor] as isize;
            }
        }
        if moved != delta {
            return false;
        }
        self.cursor = cursor;
        let processed = self
            .chain
            .process_event(&self.events, Event::cursor_moved(cursor));
        for event in &processed {
            self.chain.apply_processed_event(event);
        }
        self.refresh_typed_word();
        true
    }

    /// Replace the word with `word`, as if typed letter by letter.
    pub fn set_composing_word(&mut self, word: &str) {
        self.reset();
        for ch in word.chars() {
            for processed in self.process_event(Event::printable(ch)) {
                self.apply_processed_event(&processed);
            }
        }
    }

    /// Freeze the word into a `CommitHistory` and clear it.
    ///
    /// The record is deactivated right away unless `commit_type` is
    /// revertible.
    pub fn commit(
        &mut self,
        commit_type: CommitType,
        committed_word: &str,
        separator: &str,
    ) -> CommitHistory {
        let mut history = CommitHistory::new(
            std::mem::take(&mut self.events),
            self.typed_word.clone(),
            committed_word,
            separator,
        );
        if !commit_type.is_revertible() {
            history.deactivate();
        }
        self.reset();
        history
    }

    pub fn is_composing(&self) -> bool {
        self.code_point_size > 0
    }

    /// The word as typed, including pending combiner feedback.
    pub fn typed_word(&self) -> &str {
        &self.typed_word
    }

    /// Length in code points.
    pub fn size(&self) -> usize {
        self.code_point_size
    }

    /// Cursor position in code points.
    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    pub fn is_cursor_front_or_middle(&self) -> bool {
        self.cursor < self.code_point_size
    }

    pub fn is_only_first_char_capitalized(&self) -> bool {
        self.only_first_char_capitalized
    }

    pub fn has_pending_feedback(&self) -> bool {
        self.chain.has_pending_feedback()
    }

    /// Events applied so far.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
