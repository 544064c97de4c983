//! Auto-capitalization at the cursor.

use crate::settings::SpacingAndPunctuations;
use bitflags::bitflags;

bitflags! {
    /// Capitalization modes, with the host's bit values.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapsMode: u32 {
        /// Every character upper-case
        const CHARACTERS = 0x1000;
        /// First letter of each word
        const WORDS = 0x2000;
        /// First letter of each sentence
        const SENTENCES = 0x4000;
    }
}

fn is_opening_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '(' | '[' | '{' | '«' | '‹' | '¿' | '¡' | '“' | '‘' | '„' | '‚' | '「' | '『'
    )
}

fn is_closing_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | ')' | ']' | '}' | '»' | '›' | '”' | '’' | '」' | '』'
    )
}

/// Capitalization modes that apply after `text`, restricted to `requested`.
///
/// `has_space_before` behaves as if a space followed `text`.
///
/// Characters mode is on whenever requested. Words mode is on after
/// whitespace or at the start. Sentences mode is on at the start, and after
/// a sentence terminator followed by whitespace, unless the terminator is the
/// abbreviation marker closing something that looks like an abbreviation
/// ("e.g.").
pub fn caps_mode(
    text: &str,
    requested: CapsMode,
    spacing: &SpacingAndPunctuations,
    has_space_before: bool,
) -> CapsMode {
    if !requested.intersects(CapsMode::WORDS | CapsMode::SENTENCES) {
        return requested & CapsMode::CHARACTERS;
    }
    let mut chars: Vec<char> = text.chars().collect();
    if has_space_before {
        chars.push(' ');
    }
    let all = requested & CapsMode::all();
    let no_sentence = requested & (CapsMode::CHARACTERS | CapsMode::WORDS);

    // Skip opening punctuation right before the cursor.
    let mut i = chars.len();
    while i > 0 && is_opening_punctuation(chars[i - 1]) {
        i -= 1;
    }
    // Then the whitespace before it.
    let mut j = i;
    while j > 0 && chars[j - 1].is_whitespace() {
        j -= 1;
    }
    if j == 0 {
        return all;
    }
    if i == j {
        // Glued to a word
        return requested & CapsMode::CHARACTERS;
    }
    if !requested.contains(CapsMode::SENTENCES) {
        return no_sentence;
    }

    // Skip closing punctuation before the whitespace.
    j -= 1;
    let mut ch = chars[j];
    while j > 0 && is_closing_punctuation(ch) {
        j -= 1;
        ch = chars[j];
    }
    if spacing.is_sentence_terminator(ch) && !spacing.is_abbreviation_marker(ch) {
        return all;
    }
    if !spacing.is_abbreviation_marker(ch) || j == 0 {
        return no_sentence;
    }

    #[derive(PartialEq)]
    enum State {
        Start,
        Word,
        Period,
        Letter,
    }
    let mut state = State::Start;
    while j > 0 {
        j -= 1;
        let ch = chars[j];
        state = match state {
            State::Start if ch.is_alphabetic() => State::Word,
            State::Start if ch.is_whitespace() => return no_sentence,
            State::Start => return all,
            State::Word if ch.is_alphabetic() => State::Word,
            State::Word if spacing.is_abbreviation_marker(ch) => State::Period,
            State::Word => return all,
            State::Period if ch.is_alphabetic() => State::Letter,
            State::Period => return all,
            State::Letter if ch.is_alphabetic() => State::Letter,
            State::Letter if spacing.is_abbreviation_marker(ch) => State::Period,
            State::Letter => return no_sentence,
        };
    }
    // Start of text behaves like whitespace.
    if state == State::Start || state == State::Letter {
        no_sentence
    } else {
        all
    }
}
