//! Input events delivered by the keyboard to the engine.
//!
//! An `Event` is an immutable record of one user action. Printable input and
//! functional keys are separate variants of `EventKind`, so every dispatch
//! site matches exhaustively and a new functional key is a compile-time
//! checked addition.
//!
//! Hosts that speak integer key codes (negative sentinels for functional
//! keys, non-negative code points for printable input) decode them with
//! [`Event::from_key_code`].

use thiserror::Error;

/// Coordinate value used when an event did not originate from a touch.
pub const NOT_A_COORDINATE: i32 = -1;

/// Errors produced while decoding host key codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Negative code that does not name any functional key.
    #[error("unknown functional key code {0}")]
    UnknownKeyCode(i32),
    /// Non-negative code that is not a Unicode scalar value.
    #[error("invalid code point {0:#x}")]
    InvalidCodePoint(i32),
    /// The output-text code needs the text itself; use `Event::text`.
    #[error("output-text key code carries no text")]
    MissingText,
}

/// Functional (non-printing) keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionalKey {
    /// Backspace
    Delete,
    /// Shift (also drives recapitalization over a selection)
    Shift,
    /// Caps lock
    CapsLock,
    /// Switch between the alphabet and symbol layouts
    AlphaSymbolSwitch,
    /// Shift key on the symbol layout
    SymbolShift,
    /// Open the keyboard settings
    Settings,
    /// Switch to the shortcut input method
    Shortcut,
    /// Move focus to the next field
    ActionNext,
    /// Move focus to the previous field
    ActionPrevious,
    /// Switch to the next language
    LanguageSwitch,
    /// Shifted enter; behaves like a plain enter
    ShiftEnter,
}

impl FunctionalKey {
    /// Host integer code for this key.
    pub fn code(self) -> i32 {
        match self {
            FunctionalKey::Shift => -1,
            FunctionalKey::CapsLock => -2,
            FunctionalKey::AlphaSymbolSwitch => -3,
            FunctionalKey::Delete => -5,
            FunctionalKey::Settings => -6,
            FunctionalKey::Shortcut => -7,
            FunctionalKey::ActionNext => -8,
            FunctionalKey::ActionPrevious => -9,
            FunctionalKey::LanguageSwitch => -10,
            FunctionalKey::ShiftEnter => -11,
            FunctionalKey::SymbolShift => -12,
        }
    }

    /// Decode a negative host key code.
    pub fn from_code(code: i32) -> Option<Self> {
        let key = match code {
            -1 => FunctionalKey::Shift,
            -2 => FunctionalKey::CapsLock,
            -3 => FunctionalKey::AlphaSymbolSwitch,
            -5 => FunctionalKey::Delete,
            -6 => FunctionalKey::Settings,
            -7 => FunctionalKey::Shortcut,
            -8 => FunctionalKey::ActionNext,
            -9 => FunctionalKey::ActionPrevious,
            -10 => FunctionalKey::LanguageSwitch,
            -11 => FunctionalKey::ShiftEnter,
            -12 => FunctionalKey::SymbolShift,
            _ => return None,
        };
        Some(key)
    }

    /// Keys that leave the last commit revertible when pressed in between.
    pub fn preserves_commit_history(self) -> bool {
        matches!(
            self,
            FunctionalKey::Shift | FunctionalKey::CapsLock | FunctionalKey::AlphaSymbolSwitch
        )
    }
}

/// Host key code for multi-character text keys (".com", smileys).
pub const CODE_OUTPUT_TEXT: i32 = -4;

/// What an event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A single printable code point
    Printable(char),
    /// A functional key
    Functional(FunctionalKey),
    /// An atomic multi-character insertion
    Text(String),
    /// Already handled by a combiner; may still carry text to commit
    Consumed { text: Option<String> },
    /// The cursor moved to this code-point index inside the composing word
    CursorMoved(usize),
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    x: i32,
    y: i32,
    repeat: bool,
    dead: bool,
    from_suggestion_strip: bool,
}

impl Event {
    fn with_kind(kind: EventKind) -> Self {
        Self {
            kind,
            x: NOT_A_COORDINATE,
            y: NOT_A_COORDINATE,
            repeat: false,
            dead: false,
            from_suggestion_strip: false,
        }
    }

    /// A printable key press.
    pub fn printable(ch: char) -> Self {
        Self::with_kind(EventKind::Printable(ch))
    }

    /// A functional key press.
    pub fn functional(key: FunctionalKey) -> Self {
        Self::with_kind(EventKind::Functional(key))
    }

    /// A multi-character text key.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::with_kind(EventKind::Text(text.into()))
    }

    /// A suggestion picked from the strip, delivered as text input.
    pub fn suggestion_picked<S: Into<String>>(text: S) -> Self {
        let mut event = Self::text(text);
        event.from_suggestion_strip = true;
        event
    }

    /// A punctuation key pressed on the suggestion strip.
    pub fn suggestion_strip_press(ch: char) -> Self {
        let mut event = Self::printable(ch);
        event.from_suggestion_strip = true;
        event
    }

    /// A dead key (accent waiting for its base letter).
    pub fn dead_key(accent: char) -> Self {
        let mut event = Self::printable(accent);
        event.dead = true;
        event
    }

    /// Event a combiner returns once it has absorbed `source`.
    pub fn consumed(source: &Event, text: Option<String>) -> Self {
        let mut event = source.clone();
        event.kind = EventKind::Consumed { text };
        event.dead = false;
        event
    }

    /// Same origin as `source` but a different code point.
    pub fn combined(source: &Event, ch: char) -> Self {
        let mut event = source.clone();
        event.kind = EventKind::Printable(ch);
        event.dead = false;
        event
    }

    pub fn cursor_moved(index: usize) -> Self {
        Self::with_kind(EventKind::CursorMoved(index))
    }

    /// Decode a host integer key code.
    ///
    /// Non-negative codes are code points, negative codes are functional
    /// keys. `CODE_OUTPUT_TEXT` is rejected because the text travels
    /// separately.
    pub fn from_key_code(code: i32) -> Result<Self, EventError> {
        if code >= 0 {
            let ch = char::from_u32(code as u32).ok_or(EventError::InvalidCodePoint(code))?;
            return Ok(Self::printable(ch));
        }
        if code == CODE_OUTPUT_TEXT {
            return Err(EventError::MissingText);
        }
        FunctionalKey::from_code(code)
            .map(Self::functional)
            .ok_or(EventError::UnknownKeyCode(code))
    }

    /// Set touch coordinates.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Mark as generated by key repeat.
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn is_key_repeat(&self) -> bool {
        self.repeat
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_suggestion_strip_press(&self) -> bool {
        self.from_suggestion_strip
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self.kind, EventKind::Consumed { .. })
    }

    /// The printable code point, if any.
    pub fn code_point(&self) -> Option<char> {
        match self.kind {
            EventKind::Printable(ch) => Some(ch),
            _ => None,
        }
    }

    /// The functional key, if any.
    pub fn functional_key(&self) -> Option<FunctionalKey> {
        match self.kind {
            EventKind::Functional(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.functional_key() == Some(FunctionalKey::Delete)
    }

    /// Text this event would insert into a composing word.
    pub fn text_to_commit(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Text(text) => Some(text),
            EventKind::Consumed { text } => text.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_code_round_trips_functional_keys() {
        for code in [-1, -2, -3, -5, -6, -7, -8, -9, -10, -11, -12] {
            let event = Event::from_key_code(code).unwrap();
            assert_eq!(event.functional_key().unwrap().code(), code);
        }
    }

    #[test]
    fn test_from_key_code_rejects_unknown() {
        assert_eq!(
            Event::from_key_code(-99),
            Err(EventError::UnknownKeyCode(-99))
        );
        assert_eq!(
            Event::from_key_code(CODE_OUTPUT_TEXT),
            Err(EventError::MissingText)
        );
        assert_eq!(
            Event::from_key_code(0xD800),
            Err(EventError::InvalidCodePoint(0xD800))
        );
    }

    #[test]
    fn test_printable_code_point() {
        let event = Event::from_key_code('a' as i32).unwrap();
        assert_eq!(event.code_point(), Some('a'));
        assert!(!event.is_delete());
        assert!(Event::functional(FunctionalKey::Delete).is_delete());
    }

    #[test]
    fn test_consumed_keeps_origin() {
        let source = Event::dead_key('^').at(10, 20);
        let consumed = Event::consumed(&source, None);
        assert!(consumed.is_consumed());
        assert!(!consumed.is_dead());
        assert_eq!((consumed.x(), consumed.y()), (10, 20));
        assert_eq!(consumed.text_to_commit(), None);
    }

    #[test]
    fn test_preserves_commit_history() {
        assert!(FunctionalKey::Shift.preserves_commit_history());
        assert!(FunctionalKey::CapsLock.preserves_commit_history());
        assert!(!FunctionalKey::Delete.preserves_commit_history());
        assert!(!FunctionalKey::Settings.preserves_commit_history());
    }
}
