//! Tests for held backspace and background editor reloads
//!
//! Covers:
//! - Backspace acceleration past the configured repeat count
//! - Slow key repeats reset the count
//! - Raw key fallback for editors without a text model
//! - Reloads issued for an older selection are discarded
//! - Caps, word and URL queries while the cache only holds local text

use libkeyboard_core::{
    CapsMode, Config, EditorOp, Event, FunctionalKey, InputAttributes, InputLogic,
    KeyboardShiftMode, MemoryEditor, RawKey, Selection, ShiftUpdate,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn session_with(config: Config, text: &str, cursor: usize) -> (InputLogic, Arc<MemoryEditor>) {
    let mut logic = InputLogic::from_config(&config);
    let editor = Arc::new(MemoryEditor::with_text(text, cursor));
    logic.start_session(InputAttributes::default(), editor.clone(), Some(Selection::caret(cursor)));
    (logic, editor)
}

fn accelerate_at(repeats: usize) -> Config {
    let mut config = Config {
        reload_in_background: false,
        ..Config::default()
    };
    config.set_delete_accelerate_at(repeats);
    config
}

/// Hold backspace for `count` repeats spaced `gap` apart.
fn hold_backspace(logic: &mut InputLogic, count: usize, gap: Duration) {
    let start = Instant::now();
    for i in 0..count {
        let event = Event::functional(FunctionalKey::Delete).repeated();
        logic.on_code_input_at(event, KeyboardShiftMode::Off, start + gap * i as u32);
    }
}

#[test]
fn test_backspace_below_threshold_deletes_one_each() {
    let text = "a".repeat(100);
    let (mut logic, editor) = session_with(accelerate_at(20), &text, 100);
    hold_backspace(&mut logic, 20, Duration::from_millis(50));
    assert_eq!(editor.text().len(), 80);
}

#[test]
fn test_backspace_accelerates_after_threshold() {
    let text = "a".repeat(100);
    let (mut logic, editor) = session_with(accelerate_at(10), &text, 100);
    hold_backspace(&mut logic, 20, Duration::from_millis(50));
    // Ten plain deletes, then ten double deletes
    assert_eq!(editor.text().len(), 70);
    assert_eq!(logic.cache().expected_selection(), Some(Selection::caret(70)));
}

#[test]
fn test_slow_repeats_never_accelerate() {
    let text = "a".repeat(10);
    let (mut logic, editor) = session_with(accelerate_at(1), &text, 10);
    hold_backspace(&mut logic, 3, Duration::from_millis(500));
    assert_eq!(editor.text().len(), 7);
}

#[test]
fn test_repeated_backspace_defers_shift_update() {
    let (mut logic, _editor) = session_with(accelerate_at(20), "ab", 2);
    let event = Event::functional(FunctionalKey::Delete).repeated();
    let tx = logic.on_code_input(event, KeyboardShiftMode::Off);
    assert_eq!(tx.required_shift_update(), ShiftUpdate::UpdateLater);
    assert!(tx.did_affect_contents());

    let tx = logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
    assert_eq!(tx.required_shift_update(), ShiftUpdate::UpdateNow);
}

#[test]
fn test_backspace_deletes_whole_surrogate_pair() {
    let (mut logic, editor) = session_with(accelerate_at(20), "x\u{1F600}", 3);
    logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
    assert_eq!(editor.text(), "x");
}

#[test]
fn test_raw_editor_gets_key_events() {
    let mut logic = InputLogic::from_config(&accelerate_at(20));
    let editor = Arc::new(MemoryEditor::with_text("ab", 2));
    logic.start_session(InputAttributes::type_null(), editor.clone(), Some(Selection::caret(2)));

    logic.on_code_input(Event::printable('c'), KeyboardShiftMode::Off);
    assert!(!logic.is_composing());
    logic.on_code_input(Event::printable('\n'), KeyboardShiftMode::Off);
    logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);

    let ops = editor.ops();
    assert!(ops.contains(&EditorOp::SendKeyEvent(RawKey::Enter)));
    assert!(ops.contains(&EditorOp::SendKeyEvent(RawKey::Delete)));
    assert_eq!(editor.text(), "abc");
}

#[test]
fn test_stale_background_reload_is_discarded() {
    let config = Config::default();
    assert!(config.reload_in_background);
    let mut logic = InputLogic::from_config(&config);
    assert!(logic.cache().is_background());

    let editor = Arc::new(MemoryEditor::with_text("hello", 5));
    editor.set_read_delay(Duration::from_millis(200));
    // The attach-time read is stamped with the caret at 5
    logic.start_session(InputAttributes::default(), editor.clone(), Some(Selection::caret(5)));
    logic.on_text_input(Event::text(" world"), KeyboardShiftMode::Off);
    assert_eq!(logic.cache().expected_selection(), Some(Selection::caret(11)));

    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    // Only the local commit is known; the old read did not clobber it
    assert_eq!(logic.cache().snapshot().before(), " world");
    assert!(logic.cache().is_window_partial());

    assert!(logic.cache_mut().request_reload());
    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    assert_eq!(logic.cache().snapshot().before(), "hello world");
    assert!(!logic.cache().is_window_partial());
    assert_eq!(editor.text(), "hello world");
}

/// Session on the worker thread with every editor read taking 200 ms.
fn slow_background_session(text: &str, cursor: usize) -> (InputLogic, Arc<MemoryEditor>) {
    let mut logic = InputLogic::from_config(&Config::default());
    let editor = Arc::new(MemoryEditor::with_text(text, cursor));
    editor.set_read_delay(Duration::from_millis(200));
    logic.start_session(InputAttributes::default(), editor.clone(), Some(Selection::caret(cursor)));
    (logic, editor)
}

#[test]
fn test_no_auto_caps_until_resync_after_stale_reload() {
    let (mut logic, editor) = slow_background_session("hello", 5);
    logic.on_code_input(Event::printable(' '), KeyboardShiftMode::Off);
    let update = editor.take_selection_update().unwrap();
    assert!(!logic.on_update_selection(
        update.old_start,
        update.old_end,
        update.new_start,
        update.new_end
    ));
    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    assert_eq!(logic.cache().snapshot().before(), " ");

    // A lone space would read as the start of the text
    assert_eq!(logic.current_auto_caps_state(), CapsMode::empty());
    assert!(logic.cache().has_pending_reload());

    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    assert_eq!(logic.cache().snapshot().before(), "hello ");
    assert_eq!(logic.current_auto_caps_state(), CapsMode::empty());
}

#[test]
fn test_sentence_start_is_found_after_resync() {
    let (mut logic, editor) = slow_background_session("Done.", 5);
    logic.on_code_input(Event::printable(' '), KeyboardShiftMode::Off);
    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    assert_eq!(logic.current_auto_caps_state(), CapsMode::empty());

    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    assert!(!logic.current_auto_caps_state().is_empty());
    assert_eq!(editor.text(), "Done. ");
}

#[test]
fn test_letter_joins_word_the_cache_has_not_read_yet() {
    let (mut logic, editor) = slow_background_session("hello", 5);
    assert!(logic.cache().is_window_partial());
    assert!(logic
        .cache()
        .is_cursor_touching_word(&logic.settings().spacing));

    // Touching an existing word, so no new composing word starts
    logic.on_code_input(Event::printable('s'), KeyboardShiftMode::Off);
    assert!(!logic.is_composing());
    assert_eq!(editor.text(), "hellos");
}

#[test]
fn test_url_is_recognized_after_stale_reload() {
    let (mut logic, _editor) = slow_background_session("see www", 7);
    logic.on_code_input(Event::printable('.'), KeyboardShiftMode::Off);
    assert!(logic.wait_for_editor(Duration::from_secs(5)));
    assert_eq!(logic.cache().snapshot().before(), ".");
    assert!(logic.cache().is_window_partial());
    assert!(logic.cache().text_before_cursor_looks_like_url());
}

#[test]
fn test_disconnected_editor_loses_position() {
    let (mut logic, editor) = session_with(accelerate_at(20), "abc", 3);
    editor.set_connected(false);
    logic.on_update_selection(3, 3, 1, 1);
    assert!(!logic.cache().has_cursor_position());

    // Backspace with no known position falls back to a raw delete
    editor.set_connected(true);
    logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
    assert!(editor.ops().contains(&EditorOp::SendKeyEvent(RawKey::Delete)));
}
