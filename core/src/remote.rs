//! The remote text editor the keyboard types into.
//!
//! The editor lives in another process; every call on `RemoteEditor` is an
//! IPC round trip that may be slow or fail. Writes are fire-and-forget.
//! Reads return `None` when the editor cannot be asked, which is different
//! from an editor that answers with empty text.
//!
//! Positions are UTF-16 code units, the unit host editors count in.
//!
//! `MemoryEditor` is an in-process implementation with the same semantics,
//! used by the simulator and the tests.

use crate::utils;
use parking_lot::Mutex;
use std::time::Duration;

/// Editor action attached to the enter key of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditorAction {
    /// Plain enter inserts a newline
    #[default]
    None,
    Go,
    Search,
    Send,
    Next,
    Done,
    Previous,
    /// Application-defined action with a custom label
    Custom(i32),
}

/// Raw key events for editors that do not accept text commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKey {
    Delete,
    Enter,
    Char(char),
}

/// Text around the selection as reported by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurroundingText {
    /// Text window containing the selection
    pub text: String,
    /// Selection start relative to `text`
    pub selection_start: usize,
    /// Selection end relative to `text`
    pub selection_end: usize,
    /// Absolute position of the first unit of `text`
    pub offset: usize,
}

impl SurroundingText {
    /// Split into (before, selected, after). `None` if the reported
    /// selection does not fall on code point boundaries of `text`.
    pub fn split(&self) -> Option<(&str, &str, &str)> {
        let (before, rest) = utils::split_at_utf16(&self.text, self.selection_start)?;
        let selected_len = self.selection_end.checked_sub(self.selection_start)?;
        let (selected, after) = utils::split_at_utf16(rest, selected_len)?;
        Some((before, selected, after))
    }

    /// Absolute (start, end) of the selection.
    pub fn absolute_selection(&self) -> (usize, usize) {
        (
            self.offset + self.selection_start,
            self.offset + self.selection_end,
        )
    }
}

/// Handle on the text field currently attached to the keyboard.
pub trait RemoteEditor: Send + Sync {
    /// Whether calls will reach the editor at all.
    fn is_connected(&self) -> bool;

    fn begin_batch_edit(&self);

    fn end_batch_edit(&self);

    /// Replace the composing region (or the selection) with `text`.
    fn commit_text(&self, text: &str, new_cursor_position: i32);

    /// Replace the composing region (or the selection) with `text` and mark
    /// it as composing.
    fn set_composing_text(&self, text: &str, new_cursor_position: i32);

    /// Keep the composing text, drop the composing mark.
    fn finish_composing_text(&self);

    fn delete_surrounding_text(&self, before: usize, after: usize);

    /// Returns false if the editor refused the range.
    fn set_selection(&self, start: usize, end: usize) -> bool;

    fn send_key_event(&self, key: RawKey);

    /// Read up to `before` units before and `after` units after the selection.
    fn surrounding_text(&self, before: usize, after: usize) -> Option<SurroundingText>;

    fn text_before_cursor(&self, n: usize) -> Option<String>;

    fn selected_text(&self) -> Option<String>;

    fn perform_editor_action(&self, action: EditorAction);
}

/// One call received by a `MemoryEditor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOp {
    BeginBatchEdit,
    EndBatchEdit,
    CommitText(String),
    SetComposingText(String),
    FinishComposingText,
    DeleteSurroundingText(usize, usize),
    SetSelection(usize, usize),
    SendKeyEvent(RawKey),
    GetSurroundingText(usize, usize),
    GetTextBeforeCursor(usize),
    GetSelectedText,
    PerformEditorAction(EditorAction),
}

impl EditorOp {
    /// Whether this call reads editor state.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            EditorOp::GetSurroundingText(..) | EditorOp::GetTextBeforeCursor(_) | EditorOp::GetSelectedText
        )
    }
}

/// Selection change the editor reports back to the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionUpdate {
    pub old_start: usize,
    pub old_end: usize,
    pub new_start: usize,
    pub new_end: usize,
}

#[derive(Debug)]
struct MemoryState {
    text: String,
    selection: (usize, usize),
    composing: Option<(usize, usize)>,
    reported: (usize, usize),
    connected: bool,
    read_delay: Duration,
    ops: Vec<EditorOp>,
}

/// In-process editor with host-editor semantics.
#[derive(Debug)]
pub struct MemoryEditor {
    state: Mutex<MemoryState>,
}

impl MemoryEditor {
    /// Empty editor, cursor at 0.
    pub fn new() -> Self {
        Self::with_text("", 0)
    }

    /// Editor holding `text` with the cursor at `cursor` (clamped).
    pub fn with_text(text: &str, cursor: usize) -> Self {
        let cursor = utils::floor_char_boundary_utf16(text, cursor);
        Self {
            state: Mutex::new(MemoryState {
                text: text.to_string(),
                selection: (cursor, cursor),
                composing: None,
                reported: (cursor, cursor),
                connected: true,
                read_delay: Duration::ZERO,
                ops: Vec::new(),
            }),
        }
    }

    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    pub fn selection(&self) -> (usize, usize) {
        self.state.lock().selection
    }

    pub fn composing_region(&self) -> Option<(usize, usize)> {
        self.state.lock().composing
    }

    /// Every call received so far.
    pub fn ops(&self) -> Vec<EditorOp> {
        self.state.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().ops.clear();
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    /// Make every read sleep for `delay` first.
    pub fn set_read_delay(&self, delay: Duration) {
        self.state.lock().read_delay = delay;
    }

    /// Move the selection as the user would by tapping. Not logged.
    pub fn move_selection(&self, start: usize, end: usize) -> bool {
        let mut state = self.state.lock();
        if !state.valid_range(start, end) {
            return false;
        }
        state.selection = (start, end);
        true
    }

    /// Pending selection change, if the selection moved since the last call.
    pub fn take_selection_update(&self) -> Option<SelectionUpdate> {
        let mut state = self.state.lock();
        if state.selection == state.reported {
            return None;
        }
        let update = SelectionUpdate {
            old_start: state.reported.0,
            old_end: state.reported.1,
            new_start: state.selection.0,
            new_end: state.selection.1,
        };
        state.reported = state.selection;
        Some(update)
    }

    /// Text with `|` at the cursor, or `[...]` around a selection.
    pub fn render(&self) -> String {
        let state = self.state.lock();
        let (start, end) = state.selection;
        let (before, rest) = utils::split_at_utf16(&state.text, start).unwrap_or((&state.text, ""));
        let (selected, after) = utils::split_at_utf16(rest, end - start).unwrap_or((rest, ""));
        if selected.is_empty() {
            format!("{before}|{after}")
        } else {
            format!("{before}[{selected}]{after}")
        }
    }

    fn read_delay(&self) -> Duration {
        self.state.lock().read_delay
    }
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn len(&self) -> usize {
        utils::utf16_len(&self.text)
    }

    fn valid_range(&self, start: usize, end: usize) -> bool {
        start <= end
            && end <= self.len()
            && utils::byte_index_utf16(&self.text, start).is_some()
            && utils::byte_index_utf16(&self.text, end).is_some()
    }

    /// Replace [start, end) with `text`; returns the end of the insertion.
    fn replace(&mut self, start: usize, end: usize, text: &str) -> usize {
        let (Some(from), Some(to)) = (
            utils::byte_index_utf16(&self.text, start),
            utils::byte_index_utf16(&self.text, end),
        ) else {
            return start;
        };
        self.text.replace_range(from..to, text);
        start + utils::utf16_len(text)
    }

    fn target_range(&self) -> (usize, usize) {
        self.composing.unwrap_or(self.selection)
    }

    fn place_cursor(&mut self, start: usize, end: usize, new_cursor_position: i32) {
        let cursor = if new_cursor_position > 0 {
            end + (new_cursor_position - 1) as usize
        } else {
            start.saturating_sub(new_cursor_position.unsigned_abs() as usize)
        };
        let cursor = utils::floor_char_boundary_utf16(&self.text, cursor);
        self.selection = (cursor, cursor);
    }
}

impl RemoteEditor for MemoryEditor {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn begin_batch_edit(&self) {
        self.state.lock().ops.push(EditorOp::BeginBatchEdit);
    }

    fn end_batch_edit(&self) {
        self.state.lock().ops.push(EditorOp::EndBatchEdit);
    }

    fn commit_text(&self, text: &str, new_cursor_position: i32) {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::CommitText(text.to_string()));
        let (start, end) = state.target_range();
        let inserted_end = state.replace(start, end, text);
        state.composing = None;
        state.place_cursor(start, inserted_end, new_cursor_position);
    }

    fn set_composing_text(&self, text: &str, new_cursor_position: i32) {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::SetComposingText(text.to_string()));
        let (start, end) = state.target_range();
        let inserted_end = state.replace(start, end, text);
        state.composing = if text.is_empty() {
            None
        } else {
            Some((start, inserted_end))
        };
        state.place_cursor(start, inserted_end, new_cursor_position);
    }

    fn finish_composing_text(&self) {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::FinishComposingText);
        state.composing = None;
    }

    fn delete_surrounding_text(&self, before: usize, after: usize) {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::DeleteSurroundingText(before, after));
        let (start, end) = state.selection;
        let after_end = utils::floor_char_boundary_utf16(&state.text, end + after);
        state.replace(end, after_end, "");
        let before_start = utils::ceil_char_boundary_utf16(&state.text, start.saturating_sub(before));
        state.replace(before_start, start, "");
        let removed = start - before_start;
        state.selection = (start - removed, end - removed);
        if let Some((c_start, c_end)) = state.composing {
            state.composing = if c_start >= end {
                Some((c_start - removed, c_end - removed))
            } else if c_end <= before_start {
                Some((c_start, c_end))
            } else {
                None
            };
        }
    }

    fn set_selection(&self, start: usize, end: usize) -> bool {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::SetSelection(start, end));
        if !state.valid_range(start, end) {
            return false;
        }
        state.selection = (start, end);
        true
    }

    fn send_key_event(&self, key: RawKey) {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::SendKeyEvent(key));
        let (start, end) = state.selection;
        let cursor = match key {
            RawKey::Delete if start != end => state.replace(start, end, ""),
            RawKey::Delete => {
                let prev = state
                    .text
                    .get(..utils::byte_index_utf16(&state.text, start).unwrap_or(0))
                    .and_then(|s| s.chars().next_back())
                    .map_or(0, char::len_utf16);
                state.replace(start - prev, start, "")
            }
            RawKey::Enter => state.replace(start, end, "\n"),
            RawKey::Char(ch) => state.replace(start, end, ch.encode_utf8(&mut [0; 4])),
        };
        state.composing = None;
        state.selection = (cursor, cursor);
    }

    fn surrounding_text(&self, before: usize, after: usize) -> Option<SurroundingText> {
        let delay = self.read_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut state = self.state.lock();
        state.ops.push(EditorOp::GetSurroundingText(before, after));
        if !state.connected {
            return None;
        }
        let (start, end) = state.selection;
        let window_start = utils::ceil_char_boundary_utf16(&state.text, start.saturating_sub(before));
        let window_end = utils::floor_char_boundary_utf16(&state.text, end + after);
        let from = utils::byte_index_utf16(&state.text, window_start)?;
        let to = utils::byte_index_utf16(&state.text, window_end)?;
        Some(SurroundingText {
            text: state.text[from..to].to_string(),
            selection_start: start - window_start,
            selection_end: end - window_start,
            offset: window_start,
        })
    }

    fn text_before_cursor(&self, n: usize) -> Option<String> {
        let delay = self.read_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut state = self.state.lock();
        state.ops.push(EditorOp::GetTextBeforeCursor(n));
        if !state.connected {
            return None;
        }
        let start = state.selection.0;
        let before = utils::split_at_utf16(&state.text, start)?.0;
        Some(utils::suffix_utf16(before, n).to_string())
    }

    fn selected_text(&self) -> Option<String> {
        let mut state = self.state.lock();
        state.ops.push(EditorOp::GetSelectedText);
        if !state.connected {
            return None;
        }
        let (start, end) = state.selection;
        let from = utils::byte_index_utf16(&state.text, start)?;
        let to = utils::byte_index_utf16(&state.text, end)?;
        Some(state.text[from..to].to_string())
    }

    fn perform_editor_action(&self, action: EditorAction) {
        self.state.lock().ops.push(EditorOp::PerformEditorAction(action));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_replaces_composing_region() {
        let editor = MemoryEditor::new();
        editor.set_composing_text("hel", 1);
        assert_eq!(editor.composing_region(), Some((0, 3)));
        editor.set_composing_text("hello", 1);
        editor.commit_text("hello", 1);
        editor.commit_text(" ", 1);
        assert_eq!(editor.text(), "hello ");
        assert_eq!(editor.selection(), (6, 6));
        assert_eq!(editor.composing_region(), None);
    }

    #[test]
    fn test_delete_surrounding_text_stops_at_start() {
        let editor = MemoryEditor::with_text("ab", 2);
        editor.delete_surrounding_text(5, 0);
        assert_eq!(editor.text(), "");
        assert_eq!(editor.selection(), (0, 0));
    }

    #[test]
    fn test_delete_surrogate_pair_as_unit() {
        let editor = MemoryEditor::with_text("a\u{1F600}", 3);
        editor.send_key_event(RawKey::Delete);
        assert_eq!(editor.text(), "a");
        assert_eq!(editor.selection(), (1, 1));
    }

    #[test]
    fn test_surrounding_text_split() {
        let editor = MemoryEditor::with_text("hello world", 0);
        assert!(editor.set_selection(6, 11));
        let read = editor.surrounding_text(3, 10).unwrap();
        assert_eq!(read.split(), Some(("lo ", "world", "")));
        assert_eq!(read.absolute_selection(), (6, 11));
    }

    #[test]
    fn test_disconnected_reads_return_none() {
        let editor = MemoryEditor::with_text("abc", 3);
        editor.set_connected(false);
        assert!(editor.surrounding_text(10, 10).is_none());
        assert!(editor.text_before_cursor(2).is_none());
        assert!(editor.selected_text().is_none());
    }

    #[test]
    fn test_selection_updates_reported_once() {
        let editor = MemoryEditor::new();
        assert_eq!(editor.take_selection_update(), None);
        editor.commit_text("hi", 1);
        let update = editor.take_selection_update().unwrap();
        assert_eq!((update.old_start, update.new_start), (0, 2));
        assert_eq!(editor.take_selection_update(), None);
    }

    #[test]
    fn test_render() {
        let editor = MemoryEditor::with_text("abc", 1);
        assert_eq!(editor.render(), "a|bc");
        editor.set_selection(1, 3);
        assert_eq!(editor.render(), "a[bc]");
    }
}
