//! Local mirror of the text around the editor's selection.
//!
//! The cache holds three things:
//! - an immutable `TextSnapshot` of committed text before, inside and after
//!   the selection, replaced wholesale on every change;
//! - the composing text the keyboard has placed but not yet committed;
//! - the expected selection, which is the engine's authoritative idea of
//!   where the cursor is.
//!
//! Local mutations update the snapshot and the expected selection
//! synchronously and forward the call to the editor without waiting.
//! Reloads from the editor are stamped with the expected selection at
//! request time, and a reload whose stamp no longer matches is discarded.
//!
//! All positions are UTF-16 units.

use crate::caps::{self, CapsMode};
use crate::reload::{self, ReloadOutcome, ReloadRequest, ReloadWorker, SelectionStamp};
use crate::remote::{EditorAction, RawKey, RemoteEditor};
use crate::settings::SpacingAndPunctuations;
use crate::utils;
use crate::Config;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// A selection range; `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Build a selection, ordering the bounds.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }
}

/// Committed editor text around the selection. Never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSnapshot {
    before: String,
    selected: String,
    after: String,
}

impl TextSnapshot {
    pub fn new<B: Into<String>, S: Into<String>, A: Into<String>>(
        before: B,
        selected: S,
        after: A,
    ) -> Self {
        Self {
            before: before.into(),
            selected: selected.into(),
            after: after.into(),
        }
    }

    /// Committed text before the selection (or before the composing text).
    pub fn before(&self) -> &str {
        &self.before
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn after(&self) -> &str {
        &self.after
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.selected.is_empty() && self.after.is_empty()
    }
}

/// What happened to a finished reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// The snapshot was replaced
    Applied,
    /// The expected selection moved since the read was issued
    Stale,
    /// The editor could not be read; the position is now unknown
    Failed,
}

enum Reloader {
    Inline,
    Background(ReloadWorker),
}

/// Callback run with the text of every commit.
pub type CommitListener = Box<dyn FnMut(&str) + Send>;

/// The editor text cache for one editing session.
pub struct EditorTextCache {
    editor: Option<Arc<dyn RemoteEditor>>,
    snapshot: Arc<TextSnapshot>,
    composing: String,
    composing_start: Option<usize>,
    expected: Option<Selection>,
    /// Whether `snapshot` descends from a read that was applied. Text
    /// mirrored locally on top of an empty cache only covers the cursor
    /// end of the window.
    synced: bool,
    nest_level: usize,
    reloader: Reloader,
    next_request_id: u64,
    last_submitted: u64,
    last_received: u64,
    cache_size: usize,
    slow_full_reload: Duration,
    slow_partial_read: Duration,
    commit_listener: Option<CommitListener>,
}

impl EditorTextCache {
    /// Create a detached cache. Reloads run on a worker thread when
    /// `config.reload_in_background` is set and the thread can be spawned.
    pub fn new(config: &Config) -> Self {
        let reloader = if config.reload_in_background {
            match ReloadWorker::spawn() {
                Ok(worker) => Reloader::Background(worker),
                Err(err) => {
                    warn!(
                        target: "libkeyboard_core::text_cache",
                        event = "worker_spawn_failed",
                        error = %err,
                        "reading editor text inline"
                    );
                    Reloader::Inline
                }
            }
        } else {
            Reloader::Inline
        };
        Self {
            editor: None,
            snapshot: Arc::new(TextSnapshot::default()),
            composing: String::new(),
            composing_start: None,
            expected: None,
            synced: false,
            nest_level: 0,
            reloader,
            next_request_id: 0,
            last_submitted: 0,
            last_received: 0,
            cache_size: config.editor_cache_size,
            slow_full_reload: Duration::from_millis(config.slow_full_reload_ms),
            slow_partial_read: Duration::from_millis(config.slow_partial_read_ms),
            commit_listener: None,
        }
    }

    /// Whether reloads run on the worker thread.
    pub fn is_background(&self) -> bool {
        matches!(self.reloader, Reloader::Background(_))
    }

    // ========== Lifecycle ==========

    /// Attach to an editor and request the first reload.
    ///
    /// `initial` is the selection the host reported at attach time, if any.
    pub fn attach(&mut self, editor: Arc<dyn RemoteEditor>, initial: Option<Selection>) {
        self.editor = Some(editor);
        self.expected = initial;
        self.clear_local_text();
        self.nest_level = 0;
        self.request_reload();
    }

    /// Drop the editor handle and every cached byte.
    pub fn detach(&mut self) {
        self.editor = None;
        self.expected = None;
        self.clear_local_text();
        self.nest_level = 0;
    }

    pub fn is_connected(&self) -> bool {
        self.editor.as_ref().is_some_and(|e| e.is_connected())
    }

    fn connected_editor(&self) -> Option<&Arc<dyn RemoteEditor>> {
        self.editor.as_ref().filter(|e| e.is_connected())
    }

    /// Register a callback run with the text of every commit.
    pub fn set_commit_listener(&mut self, listener: CommitListener) {
        self.commit_listener = Some(listener);
    }

    fn clear_local_text(&mut self) {
        self.snapshot = Arc::new(TextSnapshot::default());
        self.composing.clear();
        self.composing_start = None;
        self.synced = false;
    }

    // ========== Batch edits ==========

    /// Open a batch edit. Only the outermost call reaches the editor, and it
    /// first applies any finished reloads.
    pub fn begin_batch_edit(&mut self) {
        self.nest_level += 1;
        if self.nest_level == 1 {
            self.poll_reloads();
            if let Some(editor) = self.connected_editor() {
                editor.begin_batch_edit();
            }
        }
    }

    /// Close a batch edit. An end without a begin is logged and ignored.
    pub fn end_batch_edit(&mut self) {
        if self.nest_level == 0 {
            error!(
                target: "libkeyboard_core::text_cache",
                event = "unbalanced_batch_end",
                "end_batch_edit called without a matching begin"
            );
            return;
        }
        self.nest_level -= 1;
        if self.nest_level == 0 {
            if let Some(editor) = self.connected_editor() {
                editor.end_batch_edit();
            }
        }
    }

    pub fn batch_nest_level(&self) -> usize {
        self.nest_level
    }

    // ========== Local mutations ==========

    /// Commit `text`, replacing the composing text (or the selection).
    pub fn commit_text(&mut self, text: &str, new_cursor_position: i32) {
        let start = self.composing_start.or(self.expected.map(|s| s.start));
        let mut before = String::with_capacity(self.snapshot.before.len() + text.len());
        before.push_str(&self.snapshot.before);
        before.push_str(text);
        self.replace_snapshot(before, String::new(), self.snapshot.after.clone());
        self.expected = start.map(|s| Selection::caret(s + utils::utf16_len(text)));
        self.composing.clear();
        self.composing_start = None;
        if let Some(editor) = self.connected_editor() {
            editor.commit_text(text, new_cursor_position);
        }
        if let Some(listener) = self.commit_listener.as_mut() {
            listener(text);
        }
    }

    /// Show `text` as the composing word.
    pub fn set_composing_text(&mut self, text: &str, new_cursor_position: i32) {
        let start = self.composing_start.or(self.expected.map(|s| s.start));
        if self.composing_start.is_none() && !self.snapshot.selected.is_empty() {
            // The selection is replaced by the composing text
            self.replace_snapshot(
                self.snapshot.before.clone(),
                String::new(),
                self.snapshot.after.clone(),
            );
        }
        self.composing = text.to_string();
        self.composing_start = if text.is_empty() { None } else { start };
        self.expected = start.map(|s| Selection::caret(s + utils::utf16_len(text)));
        if let Some(editor) = self.connected_editor() {
            editor.set_composing_text(text, new_cursor_position);
        }
    }

    /// Turn the composing text into committed text.
    pub fn finish_composing_text(&mut self) {
        self.fold_composing();
        if let Some(editor) = self.connected_editor() {
            editor.finish_composing_text();
        }
    }

    fn fold_composing(&mut self) {
        if self.composing.is_empty() {
            self.composing_start = None;
            return;
        }
        let cursor = self.composing_cursor();
        let (head, tail) =
            utils::split_at_utf16(&self.composing, cursor).unwrap_or((&self.composing, ""));
        let before = format!("{}{}", self.snapshot.before, head);
        let after = format!("{}{}", tail, self.snapshot.after);
        let selected = self.snapshot.selected.clone();
        self.composing.clear();
        self.composing_start = None;
        self.replace_snapshot(before, selected, after);
    }

    /// Cursor offset inside the composing text.
    fn composing_cursor(&self) -> usize {
        let len = utils::utf16_len(&self.composing);
        match (self.composing_start, self.expected) {
            (Some(start), Some(sel)) if sel.start >= start => (sel.start - start).min(len),
            _ => len,
        }
    }

    /// Delete `n` units before the cursor, composing text first.
    pub fn delete_text_before_cursor(&mut self, n: usize) {
        let composing_len = utils::utf16_len(&self.composing);
        if composing_len >= n {
            utils::truncate_end_utf16(&mut self.composing, n);
        } else {
            self.composing.clear();
            let mut before = self.snapshot.before.clone();
            utils::truncate_end_utf16(&mut before, n - composing_len);
            self.replace_snapshot(before, self.snapshot.selected.clone(), self.snapshot.after.clone());
        }
        if self.composing.is_empty() {
            self.composing_start = None;
        }
        if let Some(sel) = self.expected {
            self.expected = Some(if sel.start > n {
                Selection::new(sel.start - n, sel.end - n)
            } else {
                Selection::new(0, sel.end - sel.start)
            });
        }
        if let Some(editor) = self.connected_editor() {
            editor.delete_surrounding_text(n, 0);
        }
    }

    /// Move the selection. Identical selections cost nothing.
    ///
    /// Otherwise the expected selection changes now, the snapshot is
    /// re-sliced locally when the target lies inside the known text, and a
    /// reload is requested.
    pub fn set_selection(&mut self, start: usize, end: usize) -> bool {
        let target = Selection::new(start, end);
        if self.expected == Some(target) {
            return true;
        }
        let Some(editor) = self.connected_editor().cloned() else {
            return false;
        };
        self.fold_composing();
        if !editor.set_selection(target.start, target.end) {
            return false;
        }
        let resliced = self.reslice(target);
        if resliced.is_none() {
            self.synced = false;
        }
        self.expected = Some(target);
        self.snapshot = Arc::new(resliced.unwrap_or_default());
        self.request_reload();
        true
    }

    fn reslice(&self, target: Selection) -> Option<TextSnapshot> {
        let current = self.expected?;
        let snap = &self.snapshot;
        let window_start = current.start.checked_sub(utils::utf16_len(&snap.before))?;
        let window = format!("{}{}{}", snap.before, snap.selected, snap.after);
        let window_end = window_start + utils::utf16_len(&window);
        if target.start < window_start || target.end > window_end {
            return None;
        }
        let (before, rest) = utils::split_at_utf16(&window, target.start - window_start)?;
        let (selected, after) = utils::split_at_utf16(rest, target.len())?;
        Some(TextSnapshot::new(before, selected, after))
    }

    /// Send a raw key, mirroring its effect locally.
    pub fn send_key_event(&mut self, key: RawKey) {
        match key {
            RawKey::Delete => {
                let removed = if let Some(ch) = self.composing.pop() {
                    ch.len_utf16()
                } else if !self.snapshot.selected.is_empty() {
                    self.replace_snapshot(
                        self.snapshot.before.clone(),
                        String::new(),
                        self.snapshot.after.clone(),
                    );
                    0
                } else {
                    let mut before = self.snapshot.before.clone();
                    let removed = before.pop().map_or(1, char::len_utf16);
                    self.replace_snapshot(before, String::new(), self.snapshot.after.clone());
                    removed
                };
                if let Some(sel) = self.expected {
                    let start = if sel.is_caret() {
                        sel.start.saturating_sub(removed)
                    } else {
                        sel.start
                    };
                    self.expected = Some(Selection::caret(start));
                }
            }
            RawKey::Enter => self.append_local("\n"),
            RawKey::Char(ch) => self.append_local(ch.encode_utf8(&mut [0; 4])),
        }
        if self.composing.is_empty() {
            self.composing_start = None;
        }
        if let Some(editor) = self.connected_editor() {
            editor.send_key_event(key);
        }
    }

    fn append_local(&mut self, text: &str) {
        let before = format!("{}{}", self.snapshot.before, text);
        self.replace_snapshot(before, String::new(), self.snapshot.after.clone());
        if let Some(sel) = self.expected {
            self.expected = Some(Selection::caret(sel.start + utils::utf16_len(text)));
        }
    }

    pub fn perform_editor_action(&mut self, action: EditorAction) {
        if let Some(editor) = self.connected_editor() {
            editor.perform_editor_action(action);
        }
    }

    /// Delete one space right before the cursor, if there is one.
    pub fn remove_trailing_space(&mut self) {
        if self.code_point_before_cursor() == Some(' ') {
            self.delete_text_before_cursor(1);
        }
    }

    /// Turn ". " (a swapped punctuation and space) back into " .".
    pub fn revert_swap_punctuation(&mut self) -> bool {
        let Some(text) = self.text_before_cursor(2) else {
            return false;
        };
        let mut chars = text.chars();
        let (Some(punctuation), Some(' '), None) = (chars.next(), chars.next(), chars.next()) else {
            return false;
        };
        self.delete_text_before_cursor(2);
        let mut reverted = String::from(" ");
        reverted.push(punctuation);
        self.commit_text(&reverted, 1);
        true
    }

    fn replace_snapshot(&mut self, before: String, selected: String, after: String) {
        self.snapshot = Arc::new(TextSnapshot {
            before,
            selected,
            after,
        });
    }

    // ========== Reloads ==========

    /// Request a surrounding-text read stamped with the expected selection.
    ///
    /// Returns false when no editor is reachable; the position then becomes
    /// unknown.
    pub fn request_reload(&mut self) -> bool {
        let Some(editor) = self.connected_editor().cloned() else {
            self.expected = None;
            self.clear_local_text();
            warn!(
                target: "libkeyboard_core::text_cache",
                event = "reload_unavailable",
                "unable to connect to the editor to retrieve text"
            );
            return false;
        };
        self.next_request_id += 1;
        let request = ReloadRequest {
            id: self.next_request_id,
            stamp: self.expected,
            editor,
            before: self.cache_size,
            after: self.cache_size,
            slow_threshold: self.slow_full_reload,
        };
        self.last_submitted = request.id;
        let request = match &self.reloader {
            Reloader::Background(worker) => {
                if worker.submit(request.clone()) {
                    return true;
                }
                warn!(
                    target: "libkeyboard_core::text_cache",
                    event = "worker_gone",
                    "reload worker stopped, reading inline"
                );
                self.reloader = Reloader::Inline;
                request
            }
            Reloader::Inline => request,
        };
        self.apply_reload(reload::read_surrounding(request)) == ApplyResult::Applied
    }

    /// Apply a finished read if it is still current.
    pub fn apply_reload(&mut self, outcome: ReloadOutcome) -> ApplyResult {
        self.last_received = self.last_received.max(outcome.id);
        if !outcome.matches_exact(self.expected) {
            debug!(
                target: "libkeyboard_core::text_cache",
                event = "stale_reload",
                id = outcome.id,
                stamp = ?outcome.stamp,
                expected = ?self.expected,
                "discarding reload issued for an older selection"
            );
            return ApplyResult::Stale;
        }
        let Some(read) = outcome.text else {
            return self.fail_reload("editor returned no surrounding text");
        };
        let Some((before, selected, after)) = read.split() else {
            return self.fail_reload("editor returned a selection outside its text");
        };
        let (start, end) = read.absolute_selection();
        let reported = Selection::new(start, end);
        if let Some(expected) = self.expected {
            if expected != reported {
                debug!(
                    target: "libkeyboard_core::text_cache",
                    event = "stale_reload",
                    id = outcome.id,
                    reported = ?reported,
                    expected = ?expected,
                    "editor selection moved under the read"
                );
                return ApplyResult::Stale;
            }
        }
        let head = if self.composing.is_empty() {
            before
        } else {
            let typed = utils::split_at_utf16(&self.composing, self.composing_cursor())
                .map_or(self.composing.as_str(), |(head, _)| head);
            before.strip_suffix(typed).unwrap_or(before)
        };
        self.snapshot = Arc::new(TextSnapshot::new(head, selected, after));
        self.expected = Some(reported);
        self.synced = true;
        ApplyResult::Applied
    }

    fn fail_reload(&mut self, reason: &str) -> ApplyResult {
        warn!(
            target: "libkeyboard_core::text_cache",
            event = "reload_failed",
            reason,
            "cursor position is now unknown"
        );
        self.expected = None;
        self.clear_local_text();
        ApplyResult::Failed
    }

    /// Apply every finished background read. Returns how many were applied.
    pub fn poll_reloads(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let outcome = match &self.reloader {
                Reloader::Background(worker) => worker.try_recv(),
                Reloader::Inline => None,
            };
            let Some(outcome) = outcome else {
                break;
            };
            if self.apply_reload(outcome) == ApplyResult::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every submitted read has come back or `timeout` passes.
    pub fn wait_for_reloads(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.last_received < self.last_submitted {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let outcome = match &self.reloader {
                Reloader::Background(worker) => worker.recv_timeout(remaining),
                Reloader::Inline => return true,
            };
            match outcome {
                Some(outcome) => {
                    self.apply_reload(outcome);
                }
                None => return false,
            }
        }
        true
    }

    /// Whether a submitted read has not come back yet.
    pub fn has_pending_reload(&self) -> bool {
        self.last_received < self.last_submitted
    }

    /// Reset after a cursor move the engine did not cause.
    ///
    /// Composing text is forgotten locally; the editor is told to finish it
    /// when `finish_composition` is set.
    pub fn reset_caches_upon_cursor_move(
        &mut self,
        start: usize,
        end: usize,
        finish_composition: bool,
    ) -> bool {
        self.expected = Some(Selection::new(start, end));
        self.clear_local_text();
        if !self.request_reload() {
            return false;
        }
        if finish_composition {
            if let Some(editor) = self.connected_editor() {
                editor.finish_composing_text();
            }
        }
        true
    }

    /// Track a cursor move inside the composing text. Nothing is re-read.
    pub fn advance_expected_selection(&mut self, start: usize, end: usize) {
        self.expected = Some(Selection::new(start, end));
    }

    /// Whether an editor selection update only echoes our own change.
    pub fn is_belated_expected_update(
        &self,
        old_start: usize,
        new_start: usize,
        old_end: usize,
        new_end: usize,
    ) -> bool {
        let Some(expected) = self.expected else {
            return false;
        };
        if expected.start == new_start && expected.end == new_end {
            return true;
        }
        let moved = old_start != new_start || old_end != new_end;
        if expected.start == old_start && expected.end == old_end && moved {
            return false;
        }
        let signum = |a: usize, b: usize| (a as i64 - b as i64).signum();
        new_start == new_end
            && signum(new_start, old_start) * signum(expected.start, new_start) >= 0
            && signum(new_end, old_end) * signum(expected.end, new_end) >= 0
    }

    // ========== Queries ==========

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<TextSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn composing_text(&self) -> &str {
        &self.composing
    }

    pub fn expected_selection(&self) -> Option<Selection> {
        self.expected
    }

    pub fn expected_selection_start(&self) -> Option<usize> {
        self.expected.map(|s| s.start)
    }

    pub fn expected_selection_end(&self) -> Option<usize> {
        self.expected.map(|s| s.end)
    }

    pub fn has_selection(&self) -> bool {
        self.expected.is_some_and(|s| !s.is_caret())
    }

    /// False exactly when the position is unknown.
    pub fn has_cursor_position(&self) -> bool {
        self.expected.is_some()
    }

    pub fn can_delete_characters(&self) -> bool {
        self.expected.is_some_and(|s| s.start > 0)
    }

    fn cached_text_before_cursor(&self) -> String {
        let cursor = self.composing_cursor();
        let typed = utils::split_at_utf16(&self.composing, cursor)
            .map_or(self.composing.as_str(), |(head, _)| head);
        format!("{}{}", self.snapshot.before, typed)
    }

    /// Up to `n` units before the cursor; `None` if the editor cannot be read.
    pub fn text_before_cursor(&self, n: usize) -> Option<String> {
        let cached = self.cached_text_before_cursor();
        let cached_len = utils::utf16_len(&cached);
        let cache_is_whole = self.expected.is_some_and(|s| cached_len >= s.start);
        if cached_len >= n || cache_is_whole {
            return Some(utils::suffix_utf16(&cached, n).to_string());
        }
        let editor = self.connected_editor()?;
        let started = Instant::now();
        let text = editor.text_before_cursor(n);
        self.detect_laggy_read(started, "text_before_cursor");
        text
    }

    /// The selected text; `None` if the editor cannot be read.
    pub fn selected_text(&self) -> Option<String> {
        if let Some(sel) = self.expected {
            if utils::utf16_len(&self.snapshot.selected) == sel.len() && !sel.is_caret() {
                return Some(self.snapshot.selected.clone());
            }
        }
        let editor = self.connected_editor()?;
        let started = Instant::now();
        let text = editor.selected_text();
        self.detect_laggy_read(started, "selected_text");
        text
    }

    fn detect_laggy_read(&self, started: Instant, operation: &str) {
        let elapsed = started.elapsed();
        if elapsed >= self.slow_partial_read {
            warn!(
                target: "libkeyboard_core::text_cache",
                event = "slow_read",
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                "laggy editor connection"
            );
        }
    }

    /// Whether the cached text stops short of the start of text.
    ///
    /// This happens when local edits land on an empty cache and the read
    /// that would have filled it is discarded as stale.
    pub fn is_window_partial(&self) -> bool {
        if self.synced {
            return false;
        }
        let cursor = self.composing_start.or(self.expected.map(|s| s.start));
        cursor.is_some_and(|c| utils::utf16_len(&self.snapshot.before) < c)
    }

    /// Committed text before the cursor. A partial window is completed by
    /// asking the editor.
    fn committed_text_before_cursor(&self) -> Cow<'_, str> {
        let cached = Cow::Borrowed(self.snapshot.before.as_str());
        if !self.is_window_partial() {
            return cached;
        }
        let Some(editor) = self.connected_editor() else {
            return cached;
        };
        let typed = utils::split_at_utf16(&self.composing, self.composing_cursor())
            .map_or(self.composing.as_str(), |(head, _)| head);
        let started = Instant::now();
        let read = editor.text_before_cursor(self.cache_size + utils::utf16_len(typed));
        self.detect_laggy_read(started, "text_before_cursor");
        match read {
            Some(mut text) => {
                if text.ends_with(typed) {
                    text.truncate(text.len() - typed.len());
                }
                Cow::Owned(text)
            }
            None => cached,
        }
    }

    /// Code point right before the cursor. The cache answers unless it is
    /// empty while text is known to precede the cursor.
    pub fn code_point_before_cursor(&self) -> Option<char> {
        if let Some(ch) = self.cached_text_before_cursor().chars().next_back() {
            return Some(ch);
        }
        if !self.is_window_partial() {
            return None;
        }
        self.committed_text_before_cursor().chars().next_back()
    }

    /// Whether the text before the cursor ends with exactly `text`.
    pub fn same_as_text_before_cursor(&self, text: &str) -> bool {
        self.text_before_cursor(utils::utf16_len(text))
            .is_some_and(|before| before == text)
    }

    pub fn text_before_cursor_looks_like_url(&self) -> bool {
        utils::looks_like_url(&self.committed_text_before_cursor())
    }

    pub fn is_inside_double_quote_or_after_digit(&self) -> bool {
        utils::is_inside_double_quote_or_after_digit(&self.committed_text_before_cursor())
    }

    /// Whether a word character touches the cursor on either side.
    pub fn is_cursor_touching_word(&self, spacing: &SpacingAndPunctuations) -> bool {
        let is_word_char = |ch: char| {
            !ch.is_whitespace() && !spacing.is_word_separator(ch) && !spacing.is_word_connector(ch)
        };
        let after = self.snapshot.after.chars().next().is_some_and(is_word_char);
        let before = self.code_point_before_cursor().is_some_and(is_word_char);
        after || before
    }

    /// Capitalization modes at the cursor.
    ///
    /// `has_space_before` treats the cursor as if a space preceded it (a
    /// phantom space is pending).
    pub fn caps_mode(
        &mut self,
        requested: CapsMode,
        spacing: &SpacingAndPunctuations,
        has_space_before: bool,
    ) -> CapsMode {
        if !self.is_connected() {
            return CapsMode::empty();
        }
        if !self.composing.is_empty() {
            return if has_space_before {
                requested & (CapsMode::CHARACTERS | CapsMode::WORDS)
            } else {
                requested & CapsMode::CHARACTERS
            };
        }
        if self.is_window_partial() {
            if !self.has_pending_reload() {
                self.request_reload();
            }
            // No auto-caps until a read reaches back to the start of text
            if self.is_window_partial() {
                debug!(
                    target: "libkeyboard_core::text_cache",
                    event = "caps_unknown",
                    expected = ?self.expected,
                    "cached text does not reach the start of text"
                );
                return CapsMode::empty();
            }
        }
        caps::caps_mode(&self.snapshot.before, requested, spacing, has_space_before)
    }
}

impl std::fmt::Debug for EditorTextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorTextCache")
            .field("connected", &self.is_connected())
            .field("snapshot", &self.snapshot)
            .field("composing", &self.composing)
            .field("expected", &self.expected)
            .field("nest_level", &self.nest_level)
            .finish()
    }
}
