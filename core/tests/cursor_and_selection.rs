//! Tests for cursor tracking and selection handling
//!
//! Covers:
//! - Cursor moves inside the composing word keep composing
//! - Moves that leave the word finish it
//! - Echoed selection updates are ignored
//! - Shift over a selection cycles its capitalization

use libkeyboard_core::{
    CapitalizationStyle, Config, EditorOp, Event, FunctionalKey, InputAttributes, InputLogic,
    KeyboardShiftMode, MemoryEditor, Selection,
};
use std::sync::Arc;

fn session_with(config: Config, text: &str, cursor: usize) -> (InputLogic, Arc<MemoryEditor>) {
    let mut logic = InputLogic::from_config(&config);
    let editor = Arc::new(MemoryEditor::with_text(text, cursor));
    logic.start_session(InputAttributes::default(), editor.clone(), Some(Selection::caret(cursor)));
    (logic, editor)
}

fn session(text: &str, cursor: usize) -> (InputLogic, Arc<MemoryEditor>) {
    let config = Config {
        reload_in_background: false,
        ..Config::default()
    };
    session_with(config, text, cursor)
}

fn type_text(logic: &mut InputLogic, text: &str) {
    for ch in text.chars() {
        logic.on_code_input(Event::printable(ch), KeyboardShiftMode::Off);
    }
}

/// Deliver the editor's pending selection change, as the host would.
fn deliver_selection_update(logic: &mut InputLogic, editor: &MemoryEditor) -> Option<bool> {
    let update = editor.take_selection_update()?;
    Some(logic.on_update_selection(
        update.old_start,
        update.old_end,
        update.new_start,
        update.new_end,
    ))
}

fn move_cursor(logic: &mut InputLogic, editor: &MemoryEditor, start: usize, end: usize) -> bool {
    assert!(editor.move_selection(start, end));
    deliver_selection_update(logic, editor).unwrap_or(false)
}

fn shift(logic: &mut InputLogic) {
    logic.on_code_input(Event::functional(FunctionalKey::Shift), KeyboardShiftMode::Off);
}

#[test]
fn test_own_changes_are_belated_updates() {
    let (mut logic, editor) = session("", 0);
    type_text(&mut logic, "hello");
    assert_eq!(deliver_selection_update(&mut logic, &editor), Some(false));
    assert!(logic.is_composing());
}

#[test]
fn test_cursor_moves_within_word_keep_composing() {
    let (mut logic, editor) = session("a ", 2);
    type_text(&mut logic, "hello");
    deliver_selection_update(&mut logic, &editor);

    assert!(move_cursor(&mut logic, &editor, 2, 2));
    assert!(logic.is_composing());
    assert_eq!(logic.composing_word().cursor_position(), 0);

    assert!(move_cursor(&mut logic, &editor, 7, 7));
    assert!(logic.is_composing());
    assert_eq!(logic.composing_word().cursor_position(), 5);
    assert_eq!(editor.composing_region(), Some((2, 7)));
}

#[test]
fn test_cursor_leaving_word_finishes_it() {
    let (mut logic, editor) = session("a ", 2);
    type_text(&mut logic, "hello");
    deliver_selection_update(&mut logic, &editor);

    assert!(move_cursor(&mut logic, &editor, 1, 1));
    assert!(!logic.is_composing());
    assert_eq!(editor.composing_region(), None);
    assert_eq!(editor.text(), "a hello");
    assert_eq!(logic.cache().expected_selection(), Some(Selection::caret(1)));
    assert_eq!(logic.cache().snapshot().before(), "a");
}

#[test]
fn test_typing_at_word_front_starts_fresh() {
    let (mut logic, editor) = session("a ", 2);
    type_text(&mut logic, "hello");
    deliver_selection_update(&mut logic, &editor);
    assert!(move_cursor(&mut logic, &editor, 2, 2));

    type_text(&mut logic, "x");
    assert_eq!(editor.text(), "a xhello");
    assert!(!logic.is_composing());
}

#[test]
fn test_shift_cycles_capitalization() {
    let (mut logic, editor) = session("Hello World", 11);
    assert!(move_cursor(&mut logic, &editor, 0, 11));
    assert_eq!(logic.current_recapitalize_state(), None);

    let expected = [
        ("Hello World", CapitalizationStyle::Original),
        ("HELLO WORLD", CapitalizationStyle::AllCaps),
        ("Hello World", CapitalizationStyle::TitleCase),
        ("hello world", CapitalizationStyle::Lower),
        ("Hello World", CapitalizationStyle::Original),
    ];
    for (text, style) in expected {
        shift(&mut logic);
        assert_eq!(editor.text(), text);
        assert_eq!(editor.selection(), (0, 11));
        assert_eq!(logic.current_recapitalize_state(), Some(style));
    }
}

#[test]
fn test_recapitalization_skips_surrounding_spaces() {
    let (mut logic, editor) = session(" hello world ", 13);
    assert!(move_cursor(&mut logic, &editor, 0, 13));

    shift(&mut logic);
    assert_eq!(editor.text(), " hello world ");
    assert_eq!(editor.selection(), (1, 12));
    shift(&mut logic);
    assert_eq!(editor.text(), " HELLO WORLD ");
    assert_eq!(editor.selection(), (1, 12));
    shift(&mut logic);
    assert_eq!(editor.text(), " Hello World ");
    assert_eq!(logic.current_recapitalize_state(), Some(CapitalizationStyle::TitleCase));
}

#[test]
fn test_blank_selection_is_not_recapitalized() {
    let (mut logic, editor) = session("a   b", 5);
    assert!(move_cursor(&mut logic, &editor, 1, 4));
    shift(&mut logic);
    assert_eq!(editor.text(), "a   b");
    assert_eq!(editor.selection(), (1, 4));
    assert_eq!(logic.current_recapitalize_state(), None);
}

#[test]
fn test_cursor_move_stops_recapitalization() {
    let (mut logic, editor) = session("Hello World", 11);
    move_cursor(&mut logic, &editor, 0, 11);
    shift(&mut logic);
    shift(&mut logic);
    assert_eq!(editor.text(), "HELLO WORLD");

    move_cursor(&mut logic, &editor, 0, 5);
    assert_eq!(logic.current_recapitalize_state(), None);
    // A new cycle over "HELLO": original, all caps, then title case
    shift(&mut logic);
    shift(&mut logic);
    assert_eq!(editor.text(), "HELLO WORLD");
    shift(&mut logic);
    assert_eq!(editor.text(), "Hello WORLD");
    assert_eq!(editor.selection(), (0, 5));
}

#[test]
fn test_recapitalization_needs_a_cursor_move_first() {
    let (mut logic, editor) = session("abc", 0);
    // Selection set by the host at session start, no update delivered yet
    logic.cache_mut().set_selection(0, 3);
    editor.clear_ops();
    shift(&mut logic);
    assert_eq!(editor.text(), "abc");
    assert!(!editor.ops().contains(&EditorOp::CommitText("ABC".to_string())));
}

#[test]
fn test_long_selection_is_not_recapitalized() {
    let config = Config {
        reload_in_background: false,
        max_recapitalization_length: 5,
        ..Config::default()
    };
    let (mut logic, editor) = session_with(config, "Hello World", 11);
    move_cursor(&mut logic, &editor, 0, 11);
    shift(&mut logic);
    shift(&mut logic);
    assert_eq!(editor.text(), "Hello World");
    assert_eq!(logic.current_recapitalize_state(), None);
}

#[test]
fn test_backspace_deletes_selection() {
    let (mut logic, editor) = session("Hello World", 11);
    move_cursor(&mut logic, &editor, 5, 11);
    logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
    assert_eq!(editor.render(), "Hello|");
}
