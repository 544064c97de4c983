//! Per-session settings snapshot.
//!
//! `SettingsValues` is built once from a `Config` and the editor's
//! `InputAttributes`, then shared read-only through `Arc` with every
//! transaction. Changing settings means building a new snapshot.

use crate::caps::CapsMode;
use crate::remote::EditorAction;
use crate::Config;
use ahash::AHashSet;
use std::time::Duration;

/// Input purpose hint reported by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputPurpose {
    /// Free-form text input (default)
    #[default]
    FreeForm,
    /// Email address
    Email,
    /// URL
    Url,
    /// Password (no composing, every letter committed)
    Password,
    /// Number input
    Number,
    /// Phone number
    Phone,
    /// Terminal/command line
    Terminal,
}

impl InputPurpose {
    /// Whether typed words may be held in a composing region.
    pub fn allows_composing(self) -> bool {
        !matches!(
            self,
            InputPurpose::Password | InputPurpose::Number | InputPurpose::Phone
        )
    }

    /// Whether an automatic space may be inserted for a phantom space.
    pub fn allows_phantom_space(self) -> bool {
        !matches!(self, InputPurpose::Url | InputPurpose::Email)
    }
}

/// What the editor told us about itself at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAttributes {
    /// Action bound to the enter key
    pub editor_action: EditorAction,
    /// The editor has no text model; everything goes through raw key events
    pub type_null: bool,
    /// Capitalization modes the editor asks for
    pub caps_request: CapsMode,
    pub purpose: InputPurpose,
}

impl Default for InputAttributes {
    fn default() -> Self {
        Self {
            editor_action: EditorAction::None,
            type_null: false,
            caps_request: CapsMode::SENTENCES,
            purpose: InputPurpose::FreeForm,
        }
    }
}

impl InputAttributes {
    pub fn for_purpose(purpose: InputPurpose) -> Self {
        Self {
            purpose,
            ..Self::default()
        }
    }

    pub fn with_editor_action(mut self, action: EditorAction) -> Self {
        self.editor_action = action;
        self
    }

    pub fn with_caps_request(mut self, caps: CapsMode) -> Self {
        self.caps_request = caps;
        self
    }

    /// Attributes of an editor without a text model.
    pub fn type_null() -> Self {
        Self {
            type_null: true,
            caps_request: CapsMode::empty(),
            ..Self::default()
        }
    }
}

/// Spacing and punctuation tables for one locale.
#[derive(Debug, Clone)]
pub struct SpacingAndPunctuations {
    word_separators: AHashSet<char>,
    word_connectors: AHashSet<char>,
    usually_preceded_by_space: AHashSet<char>,
    usually_followed_by_space: AHashSet<char>,
    sentence_terminators: AHashSet<char>,
    clustering_symbols: AHashSet<char>,
    abbreviation_marker: char,
    language_has_spaces: bool,
}

impl SpacingAndPunctuations {
    pub fn from_config(config: &Config) -> Self {
        let set = |s: &str| s.chars().collect::<AHashSet<char>>();
        Self {
            word_separators: set(&config.word_separators),
            word_connectors: set(&config.word_connectors),
            usually_preceded_by_space: set(&config.usually_preceded_by_space),
            usually_followed_by_space: set(&config.usually_followed_by_space),
            sentence_terminators: set(&config.sentence_terminators),
            clustering_symbols: set(&config.clustering_symbols),
            abbreviation_marker: config.abbreviation_marker,
            language_has_spaces: config.language_has_spaces,
        }
    }

    pub fn is_word_separator(&self, ch: char) -> bool {
        self.word_separators.contains(&ch)
    }

    pub fn is_word_connector(&self, ch: char) -> bool {
        self.word_connectors.contains(&ch)
    }

    /// Letters and connectors, the characters that start or extend a word.
    pub fn is_word_code_point(&self, ch: char) -> bool {
        ch.is_alphabetic() || self.is_word_connector(ch)
    }

    pub fn is_usually_preceded_by_space(&self, ch: char) -> bool {
        self.usually_preceded_by_space.contains(&ch)
    }

    pub fn is_usually_followed_by_space(&self, ch: char) -> bool {
        self.usually_followed_by_space.contains(&ch)
    }

    pub fn is_sentence_terminator(&self, ch: char) -> bool {
        self.sentence_terminators.contains(&ch)
    }

    pub fn is_clustering_symbol(&self, ch: char) -> bool {
        self.clustering_symbols.contains(&ch)
    }

    pub fn is_abbreviation_marker(&self, ch: char) -> bool {
        ch == self.abbreviation_marker
    }

    pub fn abbreviation_marker(&self) -> char {
        self.abbreviation_marker
    }

    pub fn current_language_has_spaces(&self) -> bool {
        self.language_has_spaces
    }

    pub fn word_separators(&self) -> &AHashSet<char> {
        &self.word_separators
    }
}

/// Read-only settings for one editing session.
#[derive(Debug, Clone)]
pub struct SettingsValues {
    pub spacing: SpacingAndPunctuations,
    pub locale: String,
    pub auto_cap: bool,
    pub insert_spaces_automatically: bool,
    pub compose_words: bool,
    pub max_recapitalization_length: usize,
    pub delete_accelerate_at: usize,
    pub long_press_timeout: Duration,
    pub input_attributes: InputAttributes,
}

impl SettingsValues {
    pub fn new(config: &Config, input_attributes: InputAttributes) -> Self {
        Self {
            spacing: SpacingAndPunctuations::from_config(config),
            locale: config.locale.clone(),
            auto_cap: config.auto_cap,
            insert_spaces_automatically: config.insert_spaces_automatically,
            compose_words: config.compose_words,
            max_recapitalization_length: config.max_recapitalization_length,
            delete_accelerate_at: config.delete_accelerate_at,
            long_press_timeout: Duration::from_millis(config.long_press_timeout_ms),
            input_attributes,
        }
    }

    /// Same settings for another editor.
    pub fn with_attributes(&self, input_attributes: InputAttributes) -> Self {
        Self {
            input_attributes,
            ..self.clone()
        }
    }

    pub fn is_word_separator(&self, ch: char) -> bool {
        self.spacing.is_word_separator(ch)
    }

    pub fn is_word_connector(&self, ch: char) -> bool {
        self.spacing.is_word_connector(ch)
    }

    /// Words are composed unless disabled or the editor forbids it.
    pub fn is_composing_enabled(&self) -> bool {
        self.compose_words
            && !self.input_attributes.type_null
            && self.input_attributes.purpose.allows_composing()
    }

    /// Whether a phantom space may turn into a real one in this editor.
    pub fn should_insert_spaces_automatically(&self) -> bool {
        self.insert_spaces_automatically
            && !self.input_attributes.type_null
            && self.input_attributes.purpose.allows_phantom_space()
    }
}

impl Default for SettingsValues {
    fn default() -> Self {
        Self::new(&Config::default(), InputAttributes::default())
    }
}
