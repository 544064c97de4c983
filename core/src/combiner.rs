//! Pluggable combining step applied to every event before it reaches the
//! composing word.
//!
//! A combiner may pass an event through untouched, rewrite it (a dead accent
//! followed by `e` becomes `ê`), consume it (the accent itself), or expand it
//! into several events. The chain keeps the resulting text and the feedback
//! each combiner wants displayed while it is mid-sequence.

use crate::event::{Event, EventKind, FunctionalKey};

/// One stage of event transformation.
pub trait Combiner: Send {
    /// Transform `event` given the events already applied to the word.
    fn process_event(&mut self, previous: &[Event], event: Event) -> Vec<Event>;

    /// Text to display for a partially entered sequence.
    fn combining_state_feedback(&self) -> &str;

    /// Drop any partial sequence.
    fn reset(&mut self);
}

/// Ordered list of combiners plus the text they have produced so far.
pub struct CombinerChain {
    combiners: Vec<Box<dyn Combiner>>,
    combined_text: String,
    state_feedback: String,
}

impl CombinerChain {
    /// Create a chain starting from `initial_text`.
    pub fn new(initial_text: &str, combiners: Vec<Box<dyn Combiner>>) -> Self {
        Self {
            combiners,
            combined_text: initial_text.to_string(),
            state_feedback: String::new(),
        }
    }

    /// Run `event` through every combiner in order.
    ///
    /// Each combiner sees every event produced by the previous one, so the
    /// output is a flat sequence.
    pub fn process_event(&mut self, previous: &[Event], event: Event) -> Vec<Event> {
        let mut events = vec![event];
        for combiner in self.combiners.iter_mut() {
            events = events
                .into_iter()
                .flat_map(|e| combiner.process_event(previous, e))
                .collect();
        }
        events
    }

    /// Apply a processed event to the combined text.
    pub fn apply_processed_event(&mut self, event: &Event) {
        match event.kind() {
            EventKind::Functional(FunctionalKey::Delete) => {
                self.combined_text.pop();
            }
            EventKind::Printable(ch) => self.combined_text.push(*ch),
            EventKind::Text(_) | EventKind::Consumed { .. } => {
                if let Some(text) = event.text_to_commit() {
                    self.combined_text.push_str(text);
                }
            }
            EventKind::Functional(_) | EventKind::CursorMoved(_) => {}
        }
        self.refresh_feedback();
    }

    fn refresh_feedback(&mut self) {
        self.state_feedback.clear();
        for combiner in self.combiners.iter().rev() {
            self.state_feedback.push_str(combiner.combining_state_feedback());
        }
    }

    /// Combined text followed by any pending combining feedback.
    pub fn composing_word_with_feedback(&self) -> String {
        let mut word = String::with_capacity(self.combined_text.len() + self.state_feedback.len());
        word.push_str(&self.combined_text);
        word.push_str(&self.state_feedback);
        word
    }

    /// Whether a combiner holds a partial sequence.
    pub fn has_pending_feedback(&self) -> bool {
        !self.state_feedback.is_empty()
    }

    /// Clear produced text and every combiner's partial state.
    pub fn reset(&mut self) {
        self.combined_text.clear();
        self.state_feedback.clear();
        for combiner in self.combiners.iter_mut() {
            combiner.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.combiners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combiners.is_empty()
    }
}

impl Default for CombinerChain {
    fn default() -> Self {
        Self::new("", Vec::new())
    }
}

impl std::fmt::Debug for CombinerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinerChain")
            .field("combiners", &self.combiners.len())
            .field("combined_text", &self.combined_text)
            .field("state_feedback", &self.state_feedback)
            .finish()
    }
}
