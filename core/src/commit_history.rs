//! Record of the most recent word commit, used to revert it on backspace.

use crate::event::Event;

/// How a word left the composing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
    /// The typed word, accepted as-is by a separator. Revertible.
    DecidedWord,
    /// A suggestion picked from the strip. Revertible.
    ManualPick,
    /// Committed without a separator (cursor moved, session ended, editor
    /// action). Never revertible.
    UserTypedWord,
}

impl CommitType {
    pub fn is_revertible(self) -> bool {
        matches!(self, CommitType::DecidedWord | CommitType::ManualPick)
    }
}

/// The last committed word.
///
/// Lives until the next commit replaces it, a revert consumes it, or any
/// event other than an immediate backspace deactivates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHistory {
    events: Vec<Event>,
    typed_word: String,
    committed_word: String,
    separator: String,
    active: bool,
}

impl CommitHistory {
    pub fn new<T, C, S>(events: Vec<Event>, typed_word: T, committed_word: C, separator: S) -> Self
    where
        T: Into<String>,
        C: Into<String>,
        S: Into<String>,
    {
        Self {
            events,
            typed_word: typed_word.into(),
            committed_word: committed_word.into(),
            separator: separator.into(),
            active: true,
        }
    }

    /// Placeholder meaning "nothing to revert".
    pub fn none() -> Self {
        let mut history = Self::new(Vec::new(), "", "", "");
        history.active = false;
        history
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a backspace now should undo this commit.
    pub fn can_revert_commit(&self) -> bool {
        self.active && !self.committed_word.is_empty()
    }

    pub fn typed_word(&self) -> &str {
        &self.typed_word
    }

    pub fn committed_word(&self) -> &str {
        &self.committed_word
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Events that produced the typed word.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl Default for CommitHistory {
    fn default() -> Self {
        Self::none()
    }
}
