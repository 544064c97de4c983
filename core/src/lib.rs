//! libkeyboard-core
//!
//! Input transaction engine shared by language-specific keyboard crates
//! (liblatin). Turns a stream of key events into text mutations on an editor
//! owned by another process, while keeping a local, eventually consistent
//! model of the editor contents.
//!
//! Public API:
//! - `InputLogic` - Orchestrator: one call per event, returns an `InputTransaction`
//! - `ComposingWord` - The word being typed, derived from events through a `CombinerChain`
//! - `EditorTextCache` - Local mirror of the editor text with stamped background reloads
//! - `CommitHistory` - Last commit, for revert on backspace
//! - `RecapitalizeCycle` - Case rotation over a fixed selection
//! - `RemoteEditor` / `MemoryEditor` - Editor handle and its in-process implementation
//! - `Config` / `SettingsValues` - Configuration and the per-session settings snapshot
use serde::{Deserialize, Serialize};

pub mod event;
pub use event::{Event, EventError, EventKind, FunctionalKey};

pub mod combiner;
pub use combiner::{Combiner, CombinerChain};

pub mod composing_word;
pub use composing_word::ComposingWord;

pub mod commit_history;
pub use commit_history::{CommitHistory, CommitType};

pub mod remote;
pub use remote::{
    EditorAction, EditorOp, MemoryEditor, RawKey, RemoteEditor, SelectionUpdate, SurroundingText,
};

pub mod reload;
pub use reload::{ReloadOutcome, ReloadRequest, ReloadWorker, SelectionStamp};

pub mod text_cache;
pub use text_cache::{ApplyResult, EditorTextCache, Selection, TextSnapshot};

pub mod recapitalize;
pub use recapitalize::{CapitalizationStyle, RecapitalizeCycle};

pub mod caps;
pub use caps::CapsMode;

pub mod settings;
pub use settings::{InputAttributes, InputPurpose, SettingsValues, SpacingAndPunctuations};

pub mod transaction;
pub use transaction::{HostAction, InputTransaction, KeyboardShiftMode, ShiftUpdate, SpaceState};

pub mod input_logic;
pub use input_logic::InputLogic;

/// Generic configuration for the input engine.
///
/// Only language-agnostic fields live here. Language crates wrap this in
/// their own config (see `LatinConfig` in liblatin) and fill the spacing
/// tables for their locale.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Capitalize automatically at sentence and field starts
    pub auto_cap: bool,
    /// Insert a space between a picked suggestion and the next word
    pub insert_spaces_automatically: bool,
    /// Keep typed words in a composing region (commit/revert as a unit).
    /// When false every letter is committed as it is typed.
    pub compose_words: bool,

    // Recapitalization
    /// Selections longer than this (UTF-16 units) are never recapitalized
    pub max_recapitalization_length: usize,

    // Backspace
    /// Repeat count after which each backspace deletes two characters
    pub delete_accelerate_at: usize,
    /// Gap (ms) between two backspaces that resets the repeat count
    pub long_press_timeout_ms: u64,

    // Editor connection
    /// Units read on each side of the cursor on every reload
    pub editor_cache_size: usize,
    /// A full surrounding-text reload slower than this (ms) is logged
    pub slow_full_reload_ms: u64,
    /// A partial read slower than this (ms) is logged
    pub slow_partial_read_ms: u64,
    /// Run reloads on the background worker; false reads inline
    pub reload_in_background: bool,

    // Locale and spacing tables
    /// Locale tag (e.g. "en", "fr")
    pub locale: String,
    /// Characters that end a word
    pub word_separators: String,
    /// Characters that join words without ending them (apostrophe, hyphen)
    pub word_connectors: String,
    /// Separators that take a space before them
    pub usually_preceded_by_space: String,
    /// Separators that take a space after them
    pub usually_followed_by_space: String,
    /// Characters that end a sentence
    pub sentence_terminators: String,
    /// Symbols that stick together without spaces (e.g. "?!")
    pub clustering_symbols: String,
    /// Marker that may end an abbreviation rather than a sentence
    pub abbreviation_marker: char,
    /// False for scripts written without inter-word spaces
    pub language_has_spaces: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_cap: true,
            insert_spaces_automatically: true,
            compose_words: true,
            // 100 KiB of UTF-16; anything larger is refused outright
            max_recapitalization_length: 102_400,
            delete_accelerate_at: 20,
            long_press_timeout_ms: 200,
            editor_cache_size: 1024,
            slow_full_reload_ms: 1000,
            slow_partial_read_ms: 200,
            reload_in_background: true,
            // English spacing rules
            locale: "en".to_string(),
            word_separators: " \n\t.,;:!?()[]{}<>*&\"/\\_+=|".to_string(),
            word_connectors: "'-".to_string(),
            usually_preceded_by_space: "([{&".to_string(),
            usually_followed_by_space: ".,;:!?)]}&".to_string(),
            sentence_terminators: ".?!".to_string(),
            clustering_symbols: String::new(),
            abbreviation_marker: '.',
            language_has_spaces: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Set the backspace acceleration threshold.
    pub fn set_delete_accelerate_at(&mut self, repeats: usize) {
        self.delete_accelerate_at = repeats;
    }
}

/// Utility helpers.
///
/// Editor positions are UTF-16 units while Rust strings are UTF-8, so most
/// of these convert between the two. Functions returning `Option` give
/// `None` when a position falls inside a code point or past the end.
pub mod utils {
    use ahash::AHashSet;
    use once_cell::sync::Lazy;
    use regex::Regex;

    /// Length of `s` in UTF-16 units.
    pub fn utf16_len(s: &str) -> usize {
        s.chars().map(char::len_utf16).sum()
    }

    /// Byte index of UTF-16 position `pos`.
    pub fn byte_index_utf16(s: &str, pos: usize) -> Option<usize> {
        let mut units = 0;
        for (byte, ch) in s.char_indices() {
            if units == pos {
                return Some(byte);
            }
            if units > pos {
                return None;
            }
            units += ch.len_utf16();
        }
        (units == pos).then_some(s.len())
    }

    /// Split `s` at UTF-16 position `pos`.
    pub fn split_at_utf16(s: &str, pos: usize) -> Option<(&str, &str)> {
        byte_index_utf16(s, pos).map(|byte| s.split_at(byte))
    }

    /// Largest code point boundary at or before `pos`, clamped to the end.
    pub fn floor_char_boundary_utf16(s: &str, pos: usize) -> usize {
        let mut units = 0;
        for ch in s.chars() {
            let next = units + ch.len_utf16();
            if next > pos {
                break;
            }
            units = next;
        }
        units
    }

    /// Smallest code point boundary at or after `pos`, clamped to the end.
    pub fn ceil_char_boundary_utf16(s: &str, pos: usize) -> usize {
        let mut units = 0;
        for ch in s.chars() {
            if units >= pos {
                break;
            }
            units += ch.len_utf16();
        }
        units
    }

    /// At most the last `n` UTF-16 units of `s`, without splitting a code point.
    pub fn suffix_utf16(s: &str, n: usize) -> &str {
        let len = utf16_len(s);
        let start = ceil_char_boundary_utf16(s, len.saturating_sub(n));
        match byte_index_utf16(s, start) {
            Some(byte) => &s[byte..],
            None => "",
        }
    }

    /// Remove the last `n` UTF-16 units, widening to whole code points.
    pub fn truncate_end_utf16(s: &mut String, n: usize) {
        let len = utf16_len(s);
        let keep = floor_char_boundary_utf16(s, len.saturating_sub(n));
        if let Some(byte) = byte_index_utf16(s, keep) {
            s.truncate(byte);
        }
    }

    /// Compose `base` with a combining mark into one precomposed character.
    pub fn compose_with_mark(base: char, mark: char) -> Option<char> {
        unicode_normalization::char::compose(base, mark)
    }

    /// Title-case: upper-case after every separator, lower-case elsewhere.
    pub fn capitalize_each_word(s: &str, separators: &AHashSet<char>) -> String {
        let mut out = String::with_capacity(s.len());
        let mut capitalize_next = true;
        for ch in s.chars() {
            if capitalize_next {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            capitalize_next = separators.contains(&ch);
        }
        out
    }

    // Trailing run of characters between '.' and 'z' in ASCII order: letters,
    // digits, '/', ':', '=', '?', '@', '_'.
    static URL_TAIL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[.-z]+$").expect("Invalid URL tail regex"));

    /// Whether the last run of `text` looks like part of a URL.
    ///
    /// True for "www." prefixes with a period, anything containing "//", a
    /// lone leading slash after whitespace or at the start, or a run with
    /// both a period and a slash.
    pub fn looks_like_url(text: &str) -> bool {
        let Some(tail) = URL_TAIL.find(text) else {
            return false;
        };
        let run = tail.as_str();
        if run.contains("//") {
            return true;
        }
        if run.starts_with("www") && run.contains('.') {
            return true;
        }
        let preceded_by_space_or_start = text[..tail.start()]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        if run.starts_with('/') && preceded_by_space_or_start {
            return true;
        }
        run.contains('.') && run.contains('/')
    }

    /// Whether the end of `text` sits inside an open double quote, or right
    /// after a digit.
    pub fn is_inside_double_quote_or_after_digit(text: &str) -> bool {
        let mut chars = text.chars().rev().peekable();
        match chars.peek() {
            None => return false,
            Some(ch) if ch.is_ascii_digit() => return true,
            Some(_) => {}
        }
        let mut next: Option<char> = None;
        let mut last = None;
        for ch in chars {
            if ch == '"' && next.is_some_and(char::is_whitespace) {
                // Quote followed by whitespace: it was a closing quote
                return false;
            }
            if ch.is_whitespace() && next == Some('"') {
                // Whitespace then quote: that quote opened
                return true;
            }
            next = Some(ch);
            last = Some(ch);
        }
        last == Some('"')
    }

    /// Approximation of the "other symbol" general category: emoji,
    /// dingbats, arrows, technical and box-drawing symbols.
    pub fn is_other_symbol(ch: char) -> bool {
        matches!(ch,
            '\u{00A6}' | '\u{00A9}' | '\u{00AE}' | '\u{00B0}'
            | '\u{2100}'..='\u{214F}'
            | '\u{2190}'..='\u{21FF}'
            | '\u{2300}'..='\u{23FF}'
            | '\u{2400}'..='\u{24FF}'
            | '\u{2500}'..='\u{27BF}'
            | '\u{2B00}'..='\u{2BFF}'
            | '\u{1F000}'..='\u{1FAFF}'
        )
    }

}
