//! Keystroke scripts for the simulator.
//!
//! A script line is a sequence of plain characters and `<...>` tokens:
//!
//! | token          | action                                   |
//! |----------------|------------------------------------------|
//! | `<del>`        | backspace                                |
//! | `<shift>`      | shift key (recapitalizes a selection)    |
//! | `<enter>`      | enter                                    |
//! | `<lt>`         | a literal `<`                            |
//! | `<text:...>`   | multi-character text key                 |
//! | `<pick:...>`   | suggestion picked from the strip         |
//! | `<dead:x>`     | dead key with accent `x`                 |
//! | `<select:a,b>` | user selects `a..b` in the editor        |
//! | `<cursor:n>`   | user taps at position `n`                |
//! | `<key:n>`      | raw host key code                        |
//!
//! A `<` without a closing `>` is typed as is.

use crate::config::LatinConfig;
use anyhow::{anyhow, bail, Context, Result};
use libkeyboard_core::{
    Event, FunctionalKey, HostAction, InputAttributes, InputLogic, KeyboardShiftMode,
    MemoryEditor, Selection,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Longest wait for a background reload between keystrokes.
const RELOAD_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Char(char),
    Delete,
    Shift,
    Enter,
    Text(String),
    Pick(String),
    Dead(char),
    Select(usize, usize),
    Cursor(usize),
    Key(i32),
}

fn parse_tag(tag: &str) -> Result<Token> {
    let (name, arg) = match tag.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (tag, None),
    };
    let token = match (name, arg) {
        ("del", None) => Token::Delete,
        ("shift", None) => Token::Shift,
        ("enter", None) => Token::Enter,
        ("lt", None) => Token::Char('<'),
        ("text", Some(text)) if !text.is_empty() => Token::Text(text.to_string()),
        ("pick", Some(word)) if !word.is_empty() => Token::Pick(word.to_string()),
        ("dead", Some(accent)) => {
            let mut chars = accent.chars();
            match (chars.next(), chars.next()) {
                (Some(accent), None) => Token::Dead(accent),
                _ => bail!("<dead:..> takes exactly one character, got '{accent}'"),
            }
        }
        ("select", Some(range)) => {
            let (start, end) = range
                .split_once(',')
                .ok_or_else(|| anyhow!("<select:..> takes 'start,end', got '{range}'"))?;
            Token::Select(
                start.trim().parse().context("selection start")?,
                end.trim().parse().context("selection end")?,
            )
        }
        ("cursor", Some(pos)) => Token::Cursor(pos.trim().parse().context("cursor position")?),
        ("key", Some(code)) => Token::Key(code.trim().parse().context("key code")?),
        _ => bail!("unknown token <{tag}>"),
    };
    Ok(token)
}

/// Parse one script line.
pub fn parse_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = line;
    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            if let Some(close) = rest.find('>') {
                tokens.push(parse_tag(&rest[1..close])?);
                rest = &rest[close + 1..];
                continue;
            }
        }
        tokens.push(Token::Char(ch));
        rest = &rest[ch.len_utf8()..];
    }
    Ok(tokens)
}

/// Editor state after a script line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LineReport {
    pub line: usize,
    pub text: String,
    pub rendered: String,
    pub selection: (usize, usize),
    pub composing: Option<(usize, usize)>,
    pub space_state: String,
}

/// An engine typing into an in-memory editor, with auto-shift applied to
/// letters the way an on-screen keyboard would.
pub struct Simulator {
    logic: InputLogic,
    editor: Arc<MemoryEditor>,
    host_actions: Vec<HostAction>,
    lines: usize,
}

impl Simulator {
    pub fn new(config: &LatinConfig) -> Self {
        Self::with_attributes(config, InputAttributes::default())
    }

    pub fn with_attributes(config: &LatinConfig, attributes: InputAttributes) -> Self {
        let mut logic = crate::create_engine(config);
        let editor = Arc::new(MemoryEditor::new());
        logic.start_session(attributes, editor.clone(), Some(Selection::caret(0)));
        logic.wait_for_editor(RELOAD_WAIT);
        Self {
            logic,
            editor,
            host_actions: Vec::new(),
            lines: 0,
        }
    }

    /// Type `ch` under the keyboard's auto-shift state.
    fn type_char(&mut self, ch: char) -> libkeyboard_core::InputTransaction {
        let mode = self.logic.get_actual_caps_mode(KeyboardShiftMode::AutoShifted);
        let ch = match mode {
            KeyboardShiftMode::AutoShifted | KeyboardShiftMode::AutoShiftLocked => {
                ch.to_uppercase().next().unwrap_or(ch)
            }
            _ => ch,
        };
        self.logic.on_code_input(Event::printable(ch), mode)
    }

    /// Run one token, then deliver the editor's selection update.
    pub fn run_token(&mut self, token: &Token) {
        let tx = match token {
            Token::Char(ch) => Some(self.type_char(*ch)),
            Token::Delete => Some(self.press(FunctionalKey::Delete)),
            Token::Shift => Some(self.press(FunctionalKey::Shift)),
            Token::Enter => Some(
                self.logic
                    .on_code_input(Event::printable('\n'), KeyboardShiftMode::Off),
            ),
            Token::Text(text) => Some(
                self.logic
                    .on_text_input(Event::text(text.as_str()), KeyboardShiftMode::Off),
            ),
            Token::Pick(word) => Some(
                self.logic
                    .on_text_input(Event::suggestion_picked(word.as_str()), KeyboardShiftMode::Off),
            ),
            Token::Dead(accent) => Some(
                self.logic
                    .on_code_input(Event::dead_key(*accent), KeyboardShiftMode::Off),
            ),
            Token::Select(start, end) => {
                self.move_selection(*start, *end);
                None
            }
            Token::Cursor(pos) => {
                self.move_selection(*pos, *pos);
                None
            }
            Token::Key(code) => match Event::from_key_code(*code) {
                Ok(event) => Some(self.logic.on_code_input(event, KeyboardShiftMode::Off)),
                Err(err) => {
                    warn!(
                        target: "liblatin::script",
                        event = "unknown_key_code",
                        code,
                        error = %err,
                        "ignoring key code"
                    );
                    None
                }
            },
        };
        if let Some(action) = tx.and_then(|tx| tx.host_action()) {
            info!(
                target: "liblatin::script",
                event = "host_action",
                action = ?action,
                "engine asked the host to act"
            );
            self.host_actions.push(action);
        }
        self.deliver_selection_update();
    }

    fn press(&mut self, key: FunctionalKey) -> libkeyboard_core::InputTransaction {
        self.logic.on_code_input(Event::functional(key), KeyboardShiftMode::Off)
    }

    fn move_selection(&mut self, start: usize, end: usize) {
        if !self.editor.move_selection(start, end) {
            warn!(
                target: "liblatin::script",
                event = "bad_selection",
                start,
                end,
                "selection outside the text or inside a character"
            );
        }
    }

    fn deliver_selection_update(&mut self) {
        if let Some(update) = self.editor.take_selection_update() {
            self.logic.on_update_selection(
                update.old_start,
                update.old_end,
                update.new_start,
                update.new_end,
            );
        }
        if !self.logic.wait_for_editor(RELOAD_WAIT) {
            warn!(
                target: "liblatin::script",
                event = "reload_timeout",
                "editor did not answer in time"
            );
        }
    }

    /// Parse and run one line.
    pub fn run_line(&mut self, line: &str) -> Result<LineReport> {
        let tokens = parse_line(line)?;
        for token in &tokens {
            self.run_token(token);
        }
        self.lines += 1;
        Ok(self.report())
    }

    pub fn report(&self) -> LineReport {
        LineReport {
            line: self.lines,
            text: self.editor.text(),
            rendered: self.editor.render(),
            selection: self.editor.selection(),
            composing: self.editor.composing_region(),
            space_state: format!("{:?}", self.logic.space_state()),
        }
    }

    pub fn editor(&self) -> &MemoryEditor {
        &self.editor
    }

    pub fn logic(&self) -> &InputLogic {
        &self.logic
    }

    pub fn host_actions(&self) -> &[HostAction] {
        &self.host_actions
    }
}
