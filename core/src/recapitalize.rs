//! Case rotation over a fixed selection (shift pressed with text selected).

use crate::utils;
use ahash::AHashSet;

/// Capitalization styles, in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapitalizationStyle {
    /// The text as it was when the cycle started
    Original,
    AllCaps,
    TitleCase,
    Lower,
}

const ROTATION: [CapitalizationStyle; 4] = [
    CapitalizationStyle::Original,
    CapitalizationStyle::AllCaps,
    CapitalizationStyle::TitleCase,
    CapitalizationStyle::Lower,
];

/// One recapitalization cycle bound to a selection range.
///
/// The cycle is only continued when invoked again on exactly the range it
/// last produced; anything else starts over from the original text.
#[derive(Debug, Clone, Default)]
pub struct RecapitalizeCycle {
    original: String,
    current: String,
    start: usize,
    end: usize,
    /// Index into `ROTATION`; `None` until the first rotation
    rotation: Option<usize>,
    separators: AHashSet<char>,
    started: bool,
    enabled: bool,
}

impl RecapitalizeCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle over `text` selected at `start..end`.
    ///
    /// The range is narrowed to the text without its surrounding
    /// whitespace; a blank selection starts nothing and returns false. The
    /// first `rotate` returns the original text.
    pub fn start(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
        separators: &AHashSet<char>,
    ) -> bool {
        let without_lead = text.trim_start();
        let trimmed = without_lead.trim_end();
        if trimmed.is_empty() {
            self.started = false;
            return false;
        }
        let lead = utils::utf16_len(text) - utils::utf16_len(without_lead);
        let trail = utils::utf16_len(without_lead) - utils::utf16_len(trimmed);
        self.original = trimmed.to_string();
        self.current = trimmed.to_string();
        self.start = start + lead;
        self.end = end.saturating_sub(trail).max(self.start);
        self.rotation = None;
        self.separators = separators.clone();
        self.started = true;
        true
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the cycle's current text occupies exactly `start..end`.
    pub fn is_set_at(&self, start: usize, end: usize) -> bool {
        self.start == start && self.end == end
    }

    /// Advance to the next style and return the resulting text.
    pub fn rotate(&mut self) -> &str {
        let next = self.rotation.map_or(0, |r| (r + 1) % ROTATION.len());
        self.rotation = Some(next);
        self.current = match ROTATION[next] {
            CapitalizationStyle::Original => self.original.clone(),
            CapitalizationStyle::AllCaps => self.original.to_uppercase(),
            CapitalizationStyle::TitleCase => {
                utils::capitalize_each_word(&self.original, &self.separators)
            }
            CapitalizationStyle::Lower => self.original.to_lowercase(),
        };
        self.end = self.start + utils::utf16_len(&self.current);
        &self.current
    }

    /// Style of the current text, if a cycle is running.
    pub fn current_style(&self) -> Option<CapitalizationStyle> {
        self.started.then(|| {
            self.rotation
                .map_or(CapitalizationStyle::Original, |r| ROTATION[r])
        })
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn current_text(&self) -> &str {
        &self.current
    }

    pub fn new_selection_start(&self) -> usize {
        self.start
    }

    pub fn new_selection_end(&self) -> usize {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separators() -> AHashSet<char> {
        [' ', '-', '.'].into_iter().collect()
    }

    #[test]
    fn test_rotation_visits_every_style_then_wraps() {
        let mut cycle = RecapitalizeCycle::new();
        cycle.start(0, 11, "Hello World", &separators());
        assert_eq!(cycle.rotate(), "Hello World");
        assert_eq!(cycle.current_style(), Some(CapitalizationStyle::Original));
        assert_eq!(cycle.rotate(), "HELLO WORLD");
        assert_eq!(cycle.rotate(), "Hello World");
        assert_eq!(cycle.current_style(), Some(CapitalizationStyle::TitleCase));
        assert_eq!(cycle.rotate(), "hello world");
        assert_eq!(cycle.rotate(), "Hello World");
        assert_eq!(cycle.current_style(), Some(CapitalizationStyle::Original));
    }

    #[test]
    fn test_bounds_follow_length_change() {
        let mut cycle = RecapitalizeCycle::new();
        // U+00DF upper-cases to "SS"
        cycle.start(4, 10, "straße", &separators());
        cycle.rotate();
        assert!(cycle.is_set_at(4, 10));
        cycle.rotate();
        assert_eq!(cycle.current_text(), "STRASSE");
        assert!(cycle.is_set_at(4, 11));
        assert_eq!(cycle.original_text(), "straße");
    }

    #[test]
    fn test_surrounding_whitespace_is_left_out() {
        let mut cycle = RecapitalizeCycle::new();
        assert!(cycle.start(3, 13, "  big dog ", &separators()));
        assert!(cycle.is_set_at(5, 12));
        assert_eq!(cycle.original_text(), "big dog");
        cycle.rotate();
        assert_eq!(cycle.rotate(), "BIG DOG");
        assert!(cycle.is_set_at(5, 12));

        assert!(!cycle.start(0, 3, " \n ", &separators()));
        assert!(!cycle.is_started());
    }

    #[test]
    fn test_stop_clears_style() {
        let mut cycle = RecapitalizeCycle::new();
        assert_eq!(cycle.current_style(), None);
        cycle.start(0, 2, "ab", &separators());
        assert!(cycle.is_started());
        cycle.stop();
        assert_eq!(cycle.current_style(), None);
    }
}
