//! Dead-key combiner for diacritics.
//!
//! A dead key holds its accent until the next key. A base letter that takes
//! the accent becomes the precomposed letter (`^` then `e` gives `ê`);
//! anything else releases the accent as a character of its own, followed
//! by the key itself. While the accent is pending it is shown as combining
//! feedback at the end of the composing word.

use libkeyboard_core::utils;
use libkeyboard_core::{Combiner, Event, EventKind, FunctionalKey};
use phf::phf_map;
use tracing::debug;

/// Spacing accent on the key -> combining mark it applies.
static DEAD_KEY_MARKS: phf::Map<char, char> = phf_map! {
    '`' => '\u{0300}',
    '´' => '\u{0301}',
    '^' => '\u{0302}',
    '~' => '\u{0303}',
    '¯' => '\u{0304}',
    '˘' => '\u{0306}',
    '˙' => '\u{0307}',
    '¨' => '\u{0308}',
    '˚' => '\u{030A}',
    '˝' => '\u{030B}',
    'ˇ' => '\u{030C}',
    '¸' => '\u{0327}',
    '˛' => '\u{0328}',
};

/// Whether `accent` is a dead key this combiner understands.
pub fn is_dead_accent(accent: char) -> bool {
    DEAD_KEY_MARKS.contains_key(&accent)
}

#[derive(Debug, Default)]
pub struct DeadKeyCombiner {
    pending: Option<char>,
    feedback: String,
}

impl DeadKeyCombiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accent waiting for its base letter.
    pub fn pending(&self) -> Option<char> {
        self.pending
    }

    fn set_pending(&mut self, accent: Option<char>) {
        self.pending = accent;
        self.feedback.clear();
        if let Some(accent) = accent {
            self.feedback.push(accent);
        }
    }

    fn combine(&mut self, accent: char, event: Event) -> Vec<Event> {
        self.set_pending(None);
        let Some(ch) = event.code_point() else {
            // A functional key or text releases the accent before it
            return vec![Event::combined(&event, accent), event];
        };
        if ch == ' ' {
            return vec![Event::combined(&event, accent)];
        }
        let composed = DEAD_KEY_MARKS
            .get(&accent)
            .and_then(|&mark| utils::compose_with_mark(ch, mark));
        match composed {
            Some(composed) => vec![Event::combined(&event, composed)],
            None => {
                debug!(
                    target: "liblatin::dead_keys",
                    event = "no_composition",
                    accent = %accent,
                    base = %ch,
                    "accent does not combine with base letter"
                );
                vec![Event::combined(&event, accent), event]
            }
        }
    }
}

impl Combiner for DeadKeyCombiner {
    fn process_event(&mut self, _previous: &[Event], event: Event) -> Vec<Event> {
        let pending = self.pending;
        if event.is_dead() {
            let Some(accent) = event.code_point().filter(|&c| is_dead_accent(c)) else {
                // Unknown accent: type it as is
                return match event.code_point() {
                    Some(ch) => vec![Event::combined(&event, ch)],
                    None => vec![event],
                };
            };
            return match pending {
                None => {
                    self.set_pending(Some(accent));
                    vec![Event::consumed(&event, None)]
                }
                // The same accent twice types the accent itself
                Some(previous) if previous == accent => {
                    self.set_pending(None);
                    vec![Event::combined(&event, accent)]
                }
                Some(previous) => {
                    self.set_pending(Some(accent));
                    vec![Event::combined(&event, previous)]
                }
            };
        }
        let Some(accent) = pending else {
            return vec![event];
        };
        match event.kind() {
            EventKind::Functional(FunctionalKey::Delete) => {
                self.set_pending(None);
                vec![Event::consumed(&event, None)]
            }
            // Shift state changes keep the accent waiting
            EventKind::Functional(FunctionalKey::Shift | FunctionalKey::CapsLock)
            | EventKind::CursorMoved(_) => vec![event],
            _ => self.combine(accent, event),
        }
    }

    fn combining_state_feedback(&self) -> &str {
        &self.feedback
    }

    fn reset(&mut self) {
        self.set_pending(None);
    }
}
