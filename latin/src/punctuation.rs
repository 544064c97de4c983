//! Spacing and punctuation tables for Latin-script languages.
//!
//! Each entry fills the locale fields of a core `Config`. Lookup is by
//! primary language subtag, so "fr-CA" and "fr_CH" both resolve to "fr".

use libkeyboard_core::Config;
use phf::phf_map;

/// Spacing rules of one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageTable {
    pub word_separators: &'static str,
    pub word_connectors: &'static str,
    pub usually_preceded_by_space: &'static str,
    pub usually_followed_by_space: &'static str,
    pub sentence_terminators: &'static str,
    pub clustering_symbols: &'static str,
    pub abbreviation_marker: char,
    pub has_spaces: bool,
}

const COMMON_SEPARATORS: &str = " \n\t.,;:!?()[]{}<>*&\"/\\_+=|";

static LANGUAGES: phf::Map<&'static str, LanguageTable> = phf_map! {
    "en" => LanguageTable {
        word_separators: COMMON_SEPARATORS,
        word_connectors: "'-",
        usually_preceded_by_space: "([{&",
        usually_followed_by_space: ".,;:!?)]}&",
        sentence_terminators: ".?!",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    // French sets high punctuation and guillemets apart with a space
    "fr" => LanguageTable {
        word_separators: " \n\t.,;:!?()[]{}<>*&\"/\\_+=|«»",
        word_connectors: "'-",
        usually_preceded_by_space: "([{&;:!?»",
        usually_followed_by_space: ".,;:!?)]}&«",
        sentence_terminators: ".?!",
        clustering_symbols: "!?",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    "de" => LanguageTable {
        word_separators: " \n\t.,;:!?()[]{}<>*&\"/\\_+=|„“",
        word_connectors: "'-",
        usually_preceded_by_space: "([{&„",
        usually_followed_by_space: ".,;:!?)]}&“",
        sentence_terminators: ".?!",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    // Inverted marks open a clause
    "es" => LanguageTable {
        word_separators: " \n\t.,;:!?()[]{}<>*&\"/\\_+=|¿¡«»",
        word_connectors: "'-",
        usually_preceded_by_space: "([{&¿¡«",
        usually_followed_by_space: ".,;:!?)]}&»",
        sentence_terminators: ".?!",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    "it" => LanguageTable {
        word_separators: " \n\t.,;:!?()[]{}<>*&\"/\\_+=|«»",
        word_connectors: "'-",
        usually_preceded_by_space: "([{&«",
        usually_followed_by_space: ".,;:!?)]}&»",
        sentence_terminators: ".?!",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    "pt" => LanguageTable {
        word_separators: " \n\t.,;:!?()[]{}<>*&\"/\\_+=|«»",
        word_connectors: "'-",
        usually_preceded_by_space: "([{&«",
        usually_followed_by_space: ".,;:!?)]}&»",
        sentence_terminators: ".?!",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    "nl" => LanguageTable {
        word_separators: COMMON_SEPARATORS,
        word_connectors: "'-",
        usually_preceded_by_space: "([{&",
        usually_followed_by_space: ".,;:!?)]}&",
        sentence_terminators: ".?!",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: true,
    },
    // Thai is written without spaces between words; space only confirms
    "th" => LanguageTable {
        word_separators: COMMON_SEPARATORS,
        word_connectors: "",
        usually_preceded_by_space: "",
        usually_followed_by_space: "",
        sentence_terminators: "",
        clustering_symbols: "",
        abbreviation_marker: '.',
        has_spaces: false,
    },
};

/// Primary subtag of a locale tag, lower-cased.
fn primary_subtag(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Table for `locale`, if the language is supported.
pub fn language_table(locale: &str) -> Option<&'static LanguageTable> {
    LANGUAGES.get(primary_subtag(locale).as_str())
}

/// Supported language codes, sorted.
pub fn supported_languages() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = LANGUAGES.keys().copied().collect();
    codes.sort_unstable();
    codes
}

impl LanguageTable {
    /// Copy these rules into `config`.
    pub fn apply_to(&self, config: &mut Config) {
        config.word_separators = self.word_separators.to_string();
        config.word_connectors = self.word_connectors.to_string();
        config.usually_preceded_by_space = self.usually_preceded_by_space.to_string();
        config.usually_followed_by_space = self.usually_followed_by_space.to_string();
        config.sentence_terminators = self.sentence_terminators.to_string();
        config.clustering_symbols = self.clustering_symbols.to_string();
        config.abbreviation_marker = self.abbreviation_marker;
        config.language_has_spaces = self.has_spaces;
    }
}
