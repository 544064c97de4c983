//! The input transaction engine.
//!
//! `InputLogic` owns the composing word, the editor text cache, the last
//! commit and the recapitalization cycle for one keyboard. Each call to
//! `on_code_input`, `on_text_input` or `on_update_selection` runs to
//! completion before the next one; the only asynchronous part is the
//! cache's surrounding-text reload.

use crate::caps::CapsMode;
use crate::combiner::Combiner;
use crate::commit_history::{CommitHistory, CommitType};
use crate::composing_word::ComposingWord;
use crate::event::{Event, EventKind, FunctionalKey};
use crate::recapitalize::{CapitalizationStyle, RecapitalizeCycle};
use crate::remote::{EditorAction, RawKey, RemoteEditor};
use crate::settings::{InputAttributes, SettingsValues};
use crate::text_cache::{EditorTextCache, Selection};
use crate::transaction::{
    HostAction, InputTransaction, KeyboardShiftMode, ShiftUpdate, SpaceState,
};
use crate::utils;
use crate::Config;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct InputLogic {
    settings: Arc<SettingsValues>,
    cache: EditorTextCache,
    word: ComposingWord,
    history: CommitHistory,
    recapitalize: RecapitalizeCycle,
    space_state: SpaceState,
    /// Last multi-character text input, deleted whole by an immediate backspace
    entered_text: Option<String>,
    delete_count: usize,
    last_key_time: Option<Instant>,
}

impl InputLogic {
    pub fn new(settings: Arc<SettingsValues>, cache: EditorTextCache) -> Self {
        Self {
            settings,
            cache,
            word: ComposingWord::new(),
            history: CommitHistory::none(),
            recapitalize: RecapitalizeCycle::new(),
            space_state: SpaceState::None,
            entered_text: None,
            delete_count: 0,
            last_key_time: None,
        }
    }

    /// Engine with settings and cache built from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(SettingsValues::new(config, InputAttributes::default())),
            EditorTextCache::new(config),
        )
    }

    // ========== Session lifecycle ==========

    /// Attach to an editor. `initial` is the selection the host reported.
    ///
    /// Recapitalization stays disabled until the cursor moves once.
    pub fn start_session(
        &mut self,
        attributes: InputAttributes,
        editor: Arc<dyn RemoteEditor>,
        initial: Option<Selection>,
    ) {
        self.reset_session_state();
        self.settings = Arc::new(self.settings.with_attributes(attributes));
        self.cache.attach(editor, initial);
        debug!(
            target: "libkeyboard_core::input_logic",
            event = "session_started",
            purpose = ?self.settings.input_attributes.purpose,
            selection = ?self.cache.expected_selection(),
            "input session started"
        );
    }

    /// Finish any composition and detach from the editor.
    pub fn finish_session(&mut self) {
        if self.word.is_composing() {
            self.cache.finish_composing_text();
        }
        self.reset_session_state();
        self.cache.detach();
        debug!(
            target: "libkeyboard_core::input_logic",
            event = "session_finished",
            "input session finished"
        );
    }

    fn reset_session_state(&mut self) {
        self.word.reset();
        self.history = CommitHistory::none();
        self.recapitalize.stop();
        self.recapitalize.disable();
        self.space_state = SpaceState::None;
        self.entered_text = None;
        self.delete_count = 0;
        self.last_key_time = None;
    }

    /// Switch to new settings, keeping the current editor's attributes.
    pub fn set_settings(&mut self, config: &Config) {
        self.finish_composing_for_change();
        let attributes = self.settings.input_attributes.clone();
        self.settings = Arc::new(SettingsValues::new(config, attributes));
    }

    /// Replace the combiners (subtype change).
    pub fn set_combiners(&mut self, combiners: Vec<Box<dyn Combiner>>) {
        self.finish_composing_for_change();
        self.word.set_combiners(combiners);
    }

    fn finish_composing_for_change(&mut self) {
        if self.word.is_composing() {
            self.cache.begin_batch_edit();
            self.cache.finish_composing_text();
            self.cache.end_batch_edit();
        }
        self.word.reset();
        self.history = CommitHistory::none();
        self.space_state = SpaceState::None;
    }

    // ========== Entry points ==========

    /// Process one key event.
    pub fn on_code_input(&mut self, event: Event, shift_mode: KeyboardShiftMode) -> InputTransaction {
        self.on_code_input_at(event, shift_mode, Instant::now())
    }

    /// Process one key event that happened at `now`.
    pub fn on_code_input_at(
        &mut self,
        event: Event,
        shift_mode: KeyboardShiftMode,
        now: Instant,
    ) -> InputTransaction {
        let shift_state = self.get_actual_caps_mode(shift_mode);
        let processed = self.word.process_event(event.clone());
        let mut tx = InputTransaction::new(
            Arc::clone(&self.settings),
            event.clone(),
            now,
            self.space_state,
            shift_state,
        );

        let is_delete = event.is_delete();
        let is_rapid = self
            .last_key_time
            .is_some_and(|last| now.saturating_duration_since(last) <= self.settings.long_press_timeout);
        if !is_delete || !is_rapid {
            self.delete_count = 0;
        }
        self.last_key_time = Some(now);

        let keeps_history = event
            .functional_key()
            .is_some_and(|key| key == FunctionalKey::Delete || key.preserves_commit_history());
        if !keeps_history {
            self.history.deactivate();
        }

        self.cache.begin_batch_edit();
        for current in &processed {
            match current.kind() {
                EventKind::Consumed { .. } => self.handle_consumed_event(current, &mut tx),
                EventKind::Functional(key) => self.handle_functional_event(*key, current, &mut tx),
                EventKind::Printable(ch) => self.handle_non_functional_event(*ch, current, &mut tx),
                EventKind::Text(text) => {
                    let text = text.clone();
                    self.handle_text_input(&text, current, &mut tx);
                }
                EventKind::CursorMoved(_) => {}
            }
        }
        if !self.word.is_composing() {
            self.word.reset();
        }
        if !is_delete {
            self.entered_text = None;
        }
        self.cache.end_batch_edit();
        tx
    }

    /// Process a multi-character insertion or a picked suggestion.
    pub fn on_text_input(&mut self, event: Event, shift_mode: KeyboardShiftMode) -> InputTransaction {
        let shift_state = self.get_actual_caps_mode(shift_mode);
        let mut tx = InputTransaction::new(
            Arc::clone(&self.settings),
            event.clone(),
            Instant::now(),
            self.space_state,
            shift_state,
        );
        let text = event
            .text_to_commit()
            .map(str::to_owned)
            .or_else(|| event.code_point().map(String::from));
        let Some(text) = text else {
            warn!(
                target: "libkeyboard_core::input_logic",
                event = "text_input_without_text",
                kind = ?event.kind(),
                "ignoring text input event with nothing to insert"
            );
            return tx;
        };
        self.cache.begin_batch_edit();
        self.handle_text_input(&text, &event, &mut tx);
        self.cache.end_batch_edit();
        tx
    }

    /// React to a selection change reported by the editor.
    ///
    /// Returns false when the update only echoes the engine's own change.
    pub fn on_update_selection(
        &mut self,
        old_start: usize,
        old_end: usize,
        new_start: usize,
        new_end: usize,
    ) -> bool {
        self.cache.poll_reloads();
        if self
            .cache
            .is_belated_expected_update(old_start, new_start, old_end, new_end)
        {
            return false;
        }
        self.space_state = SpaceState::None;

        let selection_changed_or_safe_to_reset =
            old_start != new_start || old_end != new_end || !self.word.is_composing();
        let has_or_had_selection = old_start != old_end || new_start != new_end;
        let move_amount = new_start as isize - old_start as isize;
        if has_or_had_selection
            || (selection_changed_or_safe_to_reset
                && !self.word.move_cursor_within_word(move_amount))
        {
            self.reset_entire_input_state(Some(Selection::new(new_start, new_end)));
        } else {
            self.cache.advance_expected_selection(new_start, new_end);
        }

        self.recapitalize.enable();
        self.recapitalize.stop();
        true
    }

    // ========== Host queries ==========

    /// Auto-caps modes at the cursor; empty when unknown or disabled.
    pub fn current_auto_caps_state(&mut self) -> CapsMode {
        if !self.settings.auto_cap || !self.cache.has_cursor_position() {
            return CapsMode::empty();
        }
        let settings = Arc::clone(&self.settings);
        self.cache.caps_mode(
            settings.input_attributes.caps_request,
            &settings.spacing,
            self.space_state == SpaceState::Phantom,
        )
    }

    /// Recapitalization style in effect over the current selection, if any.
    pub fn current_recapitalize_state(&self) -> Option<CapitalizationStyle> {
        let sel = self.cache.expected_selection()?;
        if !self.recapitalize.is_set_at(sel.start, sel.end) {
            return None;
        }
        self.recapitalize.current_style()
    }

    /// Combine the keyboard's shift mode with auto-caps.
    pub fn get_actual_caps_mode(&mut self, shift_mode: KeyboardShiftMode) -> KeyboardShiftMode {
        if shift_mode != KeyboardShiftMode::AutoShifted {
            return shift_mode;
        }
        let auto = self.current_auto_caps_state();
        if auto.contains(CapsMode::CHARACTERS) {
            KeyboardShiftMode::AutoShiftLocked
        } else if !auto.is_empty() {
            KeyboardShiftMode::AutoShifted
        } else {
            KeyboardShiftMode::Off
        }
    }

    /// Apply finished background reloads.
    pub fn poll_editor(&mut self) -> usize {
        self.cache.poll_reloads()
    }

    /// Wait for outstanding reloads, up to `timeout`.
    pub fn wait_for_editor(&mut self, timeout: Duration) -> bool {
        self.cache.wait_for_reloads(timeout)
    }

    pub fn space_state(&self) -> SpaceState {
        self.space_state
    }

    pub fn is_composing(&self) -> bool {
        self.word.is_composing()
    }

    pub fn composing_word(&self) -> &ComposingWord {
        &self.word
    }

    pub fn commit_history(&self) -> &CommitHistory {
        &self.history
    }

    pub fn settings(&self) -> &Arc<SettingsValues> {
        &self.settings
    }

    pub fn cache(&self) -> &EditorTextCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut EditorTextCache {
        &mut self.cache
    }

    // ========== Event handlers ==========

    fn handle_consumed_event(&mut self, event: &Event, tx: &mut InputTransaction) {
        if let Some(text) = event.text_to_commit().filter(|t| !t.is_empty()) {
            self.cache.commit_text(text, 1);
            tx.set_did_affect_contents();
        }
        // Combiner feedback may have changed; the committed text is not part
        // of the word.
        self.word.apply_processed_event(&Event::consumed(event, None));
        if self.word.is_composing() {
            self.cache.set_composing_text(self.word.typed_word(), 1);
        } else if !self.cache.composing_text().is_empty() {
            self.cache.set_composing_text("", 1);
        }
    }

    fn handle_functional_event(
        &mut self,
        key: FunctionalKey,
        event: &Event,
        tx: &mut InputTransaction,
    ) {
        // Only Delete and Shift ask for a shift update; the other keys leave
        // the text before the cursor untouched.
        match key {
            FunctionalKey::Delete => self.handle_backspace_event(event, tx),
            FunctionalKey::Shift => {
                self.perform_recapitalization(tx);
                tx.require_shift_update(ShiftUpdate::UpdateNow);
            }
            // Layout changes are the keyboard's business
            FunctionalKey::CapsLock
            | FunctionalKey::SymbolShift
            | FunctionalKey::AlphaSymbolSwitch => {}
            FunctionalKey::Settings => tx.set_host_action(HostAction::ShowSettings),
            FunctionalKey::Shortcut => tx.set_host_action(HostAction::SwitchToShortcutIme),
            FunctionalKey::ActionNext => self.cache.perform_editor_action(EditorAction::Next),
            FunctionalKey::ActionPrevious => {
                self.cache.perform_editor_action(EditorAction::Previous)
            }
            FunctionalKey::LanguageSwitch => tx.set_host_action(HostAction::SwitchLanguage),
            FunctionalKey::ShiftEnter => {
                let enter = Event::combined(event, '\n');
                self.handle_non_special_character_event('\n', &enter, tx);
            }
        }
    }

    fn handle_non_functional_event(&mut self, ch: char, event: &Event, tx: &mut InputTransaction) {
        if ch == '\n' {
            let action = self.settings.input_attributes.editor_action;
            if action != EditorAction::None {
                self.cache.perform_editor_action(action);
                return;
            }
        }
        self.handle_non_special_character_event(ch, event, tx);
    }

    fn handle_non_special_character_event(
        &mut self,
        ch: char,
        event: &Event,
        tx: &mut InputTransaction,
    ) {
        self.space_state = SpaceState::None;
        if self.settings.is_word_separator(ch) || utils::is_other_symbol(ch) {
            self.handle_separator_event(ch, event, tx);
        } else {
            self.handle_non_separator_event(ch, event, tx);
        }
        tx.set_did_affect_contents();
    }

    fn handle_non_separator_event(&mut self, ch: char, event: &Event, tx: &mut InputTransaction) {
        let settings = Arc::clone(&self.settings);
        let mut is_composing = self.word.is_composing();
        if tx.space_state() == SpaceState::Phantom && !settings.is_word_connector(ch) {
            self.insert_automatic_space_if_allowed();
        }

        if self.word.is_cursor_front_or_middle() {
            self.reset_entire_input_state(self.cache.expected_selection());
            is_composing = false;
        }
        if !is_composing
            && settings.is_composing_enabled()
            && settings.spacing.is_word_code_point(ch)
            && !self.cache.is_cursor_touching_word(&settings.spacing)
        {
            self.word.reset();
            // A connector never starts a word
            is_composing = !settings.is_word_connector(ch);
        }

        if is_composing {
            self.word.apply_processed_event(event);
            self.cache.set_composing_text(self.word.typed_word(), 1);
        } else {
            let swap_weak_space = self.try_strip_space_and_return_whether_should_swap(ch, event, tx);
            if swap_weak_space && self.try_swap_swapper_and_space(ch, tx) {
                self.space_state = SpaceState::Weak;
            } else {
                self.send_key_code_point(ch);
            }
        }
    }

    fn handle_separator_event(&mut self, ch: char, event: &Event, tx: &mut InputTransaction) {
        let settings = Arc::clone(&self.settings);
        let spacing = &settings.spacing;
        let was_composing = self.word.is_composing();
        // Languages without spaces use space only to confirm the word.
        let avoid_sending_space =
            ch == ' ' && !spacing.current_language_has_spaces() && was_composing;

        if was_composing {
            if self.word.is_cursor_front_or_middle() {
                self.reset_entire_input_state(self.cache.expected_selection());
            } else {
                let separator = if avoid_sending_space {
                    String::new()
                } else {
                    ch.to_string()
                };
                self.commit_typed(&separator, CommitType::DecidedWord);
            }
        }

        let swap_weak_space = self.try_strip_space_and_return_whether_should_swap(ch, event, tx);
        let inside_quote_or_after_digit =
            ch == '"' && self.cache.is_inside_double_quote_or_after_digit();

        let needs_preceding_space = if tx.space_state() != SpaceState::Phantom {
            false
        } else if ch == '"' {
            !inside_quote_or_after_digit
        } else if spacing.is_clustering_symbol(ch)
            && self
                .cache
                .code_point_before_cursor()
                .is_some_and(|before| spacing.is_clustering_symbol(before))
        {
            false
        } else {
            spacing.is_usually_preceded_by_space(ch)
        };
        if needs_preceding_space {
            self.insert_automatic_space_if_allowed();
        }

        if swap_weak_space && self.try_swap_swapper_and_space(ch, tx) {
            self.space_state = SpaceState::SwapPunctuation;
        } else if ch == ' ' {
            self.space_state = SpaceState::Weak;
            if !avoid_sending_space {
                self.send_key_code_point(ch);
            }
        } else {
            if (tx.space_state() == SpaceState::Phantom && spacing.is_usually_followed_by_space(ch))
                || inside_quote_or_after_digit
            {
                // The owed space goes after this separator instead.
                self.space_state = SpaceState::Phantom;
            }
            self.send_key_code_point(ch);
        }

        tx.require_shift_update(ShiftUpdate::UpdateNow);
    }

    fn handle_backspace_event(&mut self, event: &Event, tx: &mut InputTransaction) {
        self.space_state = SpaceState::None;
        self.delete_count += 1;
        tx.set_did_affect_contents();

        // Key repeat defers the update to avoid flicker, except at the start
        // of the text where the cursor cannot move further.
        let update = if event.is_key_repeat()
            && self.cache.expected_selection_start().is_some_and(|s| s > 0)
        {
            ShiftUpdate::UpdateLater
        } else {
            ShiftUpdate::UpdateNow
        };
        tx.require_shift_update(update);

        if self.word.is_composing() {
            if self.word.is_cursor_front_or_middle() {
                self.reset_entire_input_state(self.cache.expected_selection());
            } else {
                self.word.apply_processed_event(event);
                if self.word.is_composing() {
                    self.cache.set_composing_text(self.word.typed_word(), 1);
                } else {
                    self.cache.commit_text("", 1);
                }
                return;
            }
        }

        if self.history.can_revert_commit() {
            self.revert_commit();
            return;
        }
        if let Some(entered) = self.entered_text.as_deref() {
            if self.cache.same_as_text_before_cursor(entered) {
                let len = utils::utf16_len(entered);
                self.cache.delete_text_before_cursor(len);
                self.entered_text = None;
                return;
            }
        }
        if tx.space_state() == SpaceState::SwapPunctuation && self.cache.revert_swap_punctuation() {
            return;
        }

        let accelerate = self.delete_count > self.settings.delete_accelerate_at;
        if let Some(sel) = self.cache.expected_selection().filter(|s| !s.is_caret()) {
            self.cache.set_selection(sel.end, sel.end);
            self.cache.delete_text_before_cursor(sel.len());
        } else if self.settings.input_attributes.type_null || !self.cache.has_cursor_position() {
            // No text model to edit; let the editor handle a raw key.
            self.cache.send_key_event(RawKey::Delete);
            if accelerate {
                self.cache.send_key_event(RawKey::Delete);
            }
        } else {
            let Some(before) = self.cache.code_point_before_cursor() else {
                // Nothing known before the cursor; some editors still expect a delete.
                self.cache.delete_text_before_cursor(1);
                return;
            };
            self.cache.delete_text_before_cursor(before.len_utf16());
            if accelerate {
                if let Some(again) = self.cache.code_point_before_cursor() {
                    self.cache.delete_text_before_cursor(again.len_utf16());
                }
            }
        }
    }

    fn handle_text_input(&mut self, text: &str, event: &Event, tx: &mut InputTransaction) {
        if event.is_suggestion_strip_press() {
            self.on_pick_suggestion(text, tx);
            return;
        }
        if self.word.is_composing() {
            self.commit_typed("", CommitType::UserTypedWord);
        }
        self.word.reset();
        self.history = CommitHistory::none();

        let text = self.perform_tld_processing(text);
        if self.space_state == SpaceState::Phantom {
            self.insert_automatic_space_if_allowed();
        }
        self.cache.commit_text(&text, 1);
        self.space_state = SpaceState::None;
        self.entered_text = Some(text);
        tx.set_did_affect_contents();
        tx.require_shift_update(ShiftUpdate::UpdateNow);
    }

    /// Commit a suggestion picked from the strip. The space after it is owed.
    fn on_pick_suggestion(&mut self, suggestion: &str, tx: &mut InputTransaction) {
        if tx.space_state() == SpaceState::Phantom && !self.word.is_composing() {
            if let Some(first) = suggestion.chars().next() {
                if !self.settings.is_word_separator(first)
                    || self.settings.spacing.is_usually_preceded_by_space(first)
                {
                    self.insert_automatic_space_if_allowed();
                }
            }
        }
        self.commit_chosen_word(suggestion, CommitType::ManualPick, "");
        self.space_state = SpaceState::Phantom;
        tx.set_did_affect_contents();
        tx.require_shift_update(ShiftUpdate::UpdateNow);
    }

    // ========== Helpers ==========

    fn perform_recapitalization(&mut self, tx: &mut InputTransaction) {
        let Some(mut sel) = self.cache.expected_selection() else {
            return;
        };
        if sel.is_caret() || !self.recapitalize.is_enabled() {
            return;
        }
        if sel.len() > self.settings.max_recapitalization_length {
            debug!(
                target: "libkeyboard_core::input_logic",
                event = "recapitalize_refused",
                len = sel.len(),
                "selection too long to recapitalize"
            );
            return;
        }
        if !self.recapitalize.is_started() || !self.recapitalize.is_set_at(sel.start, sel.end) {
            let Some(selected) = self.cache.selected_text().filter(|s| !s.is_empty()) else {
                // The editor moved on before we could read it
                return;
            };
            let settings = Arc::clone(&self.settings);
            if !self
                .recapitalize
                .start(sel.start, sel.end, &selected, settings.spacing.word_separators())
            {
                return;
            }
            // Surrounding whitespace drops out of the selection
            sel = Selection::new(
                self.recapitalize.new_selection_start(),
                self.recapitalize.new_selection_end(),
            );
        }
        self.cache.finish_composing_text();
        let text = self.recapitalize.rotate().to_string();
        self.cache.set_selection(sel.end, sel.end);
        self.cache.delete_text_before_cursor(sel.len());
        self.cache.commit_text(&text, 1);
        self.cache.set_selection(
            self.recapitalize.new_selection_start(),
            self.recapitalize.new_selection_end(),
        );
        tx.set_did_affect_contents();
    }

    /// Undo the last commit: drop the committed word and its separator and
    /// put back what was typed.
    fn revert_commit(&mut self) {
        let typed = self.history.typed_word().to_string();
        let committed_len = utils::utf16_len(self.history.committed_word());
        let separator = self.history.separator().to_string();
        let use_phantom_space = separator == " ";
        self.cache
            .delete_text_before_cursor(committed_len + utils::utf16_len(&separator));

        if self.settings.spacing.current_language_has_spaces() {
            if !typed.is_empty() {
                self.cache.commit_text(&typed, 1);
            }
            if use_phantom_space {
                self.space_state = SpaceState::Phantom;
            }
        } else {
            // The cursor is flush with the word; resume composing it.
            self.word.set_composing_word(&typed);
            self.cache.set_composing_text(self.word.typed_word(), 1);
        }
        debug!(
            target: "libkeyboard_core::input_logic",
            event = "commit_reverted",
            typed = %typed,
            "reverted last commit"
        );
        self.history = CommitHistory::none();
    }

    fn commit_typed(&mut self, separator: &str, commit_type: CommitType) {
        if !self.word.is_composing() {
            return;
        }
        let typed = self.word.typed_word().to_string();
        self.commit_chosen_word(&typed, commit_type, separator);
    }

    fn commit_chosen_word(&mut self, word: &str, commit_type: CommitType, separator: &str) {
        self.cache.commit_text(word, 1);
        self.history = self.word.commit(commit_type, word, separator);
    }

    fn reset_entire_input_state(&mut self, selection: Option<Selection>) {
        let finish_composition = self.word.is_composing();
        self.word.reset();
        self.history = CommitHistory::none();
        match selection {
            Some(sel) => {
                self.cache
                    .reset_caches_upon_cursor_move(sel.start, sel.end, finish_composition);
            }
            None => {
                if finish_composition {
                    self.cache.finish_composing_text();
                }
                self.cache.request_reload();
            }
        }
    }

    fn insert_automatic_space_if_allowed(&mut self) {
        if self.settings.should_insert_spaces_automatically()
            && self.settings.spacing.current_language_has_spaces()
            && !self.cache.text_before_cursor_looks_like_url()
        {
            self.send_key_code_point(' ');
        }
    }

    fn send_key_code_point(&mut self, ch: char) {
        if ch.is_ascii_digit() {
            self.cache.send_key_event(RawKey::Char(ch));
            return;
        }
        if ch == '\n' && self.settings.input_attributes.type_null {
            self.cache.send_key_event(RawKey::Enter);
            return;
        }
        let mut buf = [0u8; 4];
        self.cache.commit_text(ch.encode_utf8(&mut buf), 1);
    }

    /// Strip a trailing space where needed; returns whether the separator
    /// should swap with the space instead.
    fn try_strip_space_and_return_whether_should_swap(
        &mut self,
        ch: char,
        event: &Event,
        tx: &InputTransaction,
    ) -> bool {
        let space_state = tx.space_state();
        if ch == '\n' && space_state == SpaceState::SwapPunctuation {
            self.cache.remove_trailing_space();
            return false;
        }
        if matches!(space_state, SpaceState::Weak | SpaceState::SwapPunctuation)
            && event.is_suggestion_strip_press()
        {
            let spacing = &self.settings.spacing;
            if spacing.is_usually_preceded_by_space(ch) {
                return false;
            }
            if spacing.is_usually_followed_by_space(ch) {
                return true;
            }
            self.cache.remove_trailing_space();
        }
        false
    }

    /// Turn "word |" into "word. |" for a punctuation typed after a space.
    fn try_swap_swapper_and_space(&mut self, ch: char, tx: &mut InputTransaction) -> bool {
        if self.cache.code_point_before_cursor() != Some(' ') {
            return false;
        }
        self.cache.delete_text_before_cursor(1);
        let mut text = ch.to_string();
        text.push(' ');
        self.cache.commit_text(&text, 1);
        tx.require_shift_update(ShiftUpdate::UpdateNow);
        true
    }

    /// A text key starting with a period and a letter (".com") drops its
    /// period after an existing one and never takes a phantom space.
    fn perform_tld_processing(&mut self, text: &str) -> String {
        let mut chars = text.chars();
        let (Some('.'), Some(second)) = (chars.next(), chars.next()) else {
            return text.to_string();
        };
        if !second.is_alphabetic() {
            return text.to_string();
        }
        self.space_state = SpaceState::None;
        if self.cache.code_point_before_cursor() == Some('.') {
            return text[1..].to_string();
        }
        text.to_string()
    }
}

impl std::fmt::Debug for InputLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputLogic")
            .field("space_state", &self.space_state)
            .field("word", &self.word.typed_word())
            .field("history", &self.history)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryEditor;

    fn engine(text: &str, cursor: usize) -> (InputLogic, Arc<MemoryEditor>) {
        let config = Config {
            reload_in_background: false,
            ..Config::default()
        };
        let mut logic = InputLogic::from_config(&config);
        let editor = Arc::new(MemoryEditor::with_text(text, cursor));
        logic.start_session(
            InputAttributes::default(),
            editor.clone(),
            Some(Selection::caret(cursor)),
        );
        (logic, editor)
    }

    fn type_text(logic: &mut InputLogic, text: &str) {
        for ch in text.chars() {
            logic.on_code_input(Event::printable(ch), KeyboardShiftMode::Off);
        }
    }

    #[test]
    fn test_letters_compose_and_space_commits() {
        let (mut logic, editor) = engine("", 0);
        type_text(&mut logic, "hi");
        assert!(logic.is_composing());
        assert_eq!(editor.composing_region(), Some((0, 2)));
        type_text(&mut logic, " ");
        assert!(!logic.is_composing());
        assert_eq!(editor.render(), "hi |");
        assert_eq!(logic.space_state(), SpaceState::Weak);
        assert!(logic.commit_history().can_revert_commit());
    }

    #[test]
    fn test_commit_history_holds_the_typed_letters() {
        let (mut logic, _editor) = engine("", 0);
        type_text(&mut logic, "word ");
        let expected: Vec<Event> = "word".chars().map(Event::printable).collect();
        assert_eq!(logic.commit_history().events(), expected.as_slice());
        assert_eq!(logic.commit_history().typed_word(), "word");
    }

    #[test]
    fn test_functional_keys_shift_update() {
        let (mut logic, _editor) = engine("Hi", 2);
        let press = |logic: &mut InputLogic, key| {
            logic
                .on_code_input(Event::functional(key), KeyboardShiftMode::Off)
                .required_shift_update()
        };
        assert_eq!(press(&mut logic, FunctionalKey::Shift), ShiftUpdate::UpdateNow);
        assert_eq!(press(&mut logic, FunctionalKey::Delete), ShiftUpdate::UpdateNow);
        for key in [
            FunctionalKey::CapsLock,
            FunctionalKey::SymbolShift,
            FunctionalKey::AlphaSymbolSwitch,
            FunctionalKey::Settings,
            FunctionalKey::Shortcut,
            FunctionalKey::ActionNext,
            FunctionalKey::ActionPrevious,
            FunctionalKey::LanguageSwitch,
        ] {
            assert_eq!(press(&mut logic, key), ShiftUpdate::NoUpdate, "{key:?}");
        }
    }

    #[test]
    fn test_backspace_inside_composing_word() {
        let (mut logic, editor) = engine("", 0);
        type_text(&mut logic, "ab");
        logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "a");
        logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "");
        assert!(!logic.is_composing());
        assert_eq!(editor.composing_region(), None);
    }

    #[test]
    fn test_digits_go_as_raw_keys() {
        let (mut logic, editor) = engine("", 0);
        type_text(&mut logic, "42");
        assert_eq!(editor.text(), "42");
        assert!(!logic.is_composing());
        assert!(editor
            .ops()
            .contains(&crate::remote::EditorOp::SendKeyEvent(RawKey::Char('4'))));
    }

    #[test]
    fn test_text_input_is_deleted_whole() {
        let (mut logic, editor) = engine("www.example", 11);
        logic.on_text_input(Event::text(".com"), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "www.example.com");
        logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "www.example");
    }

    #[test]
    fn test_tld_drops_duplicate_period() {
        let (mut logic, editor) = engine("www.example.", 12);
        logic.on_text_input(Event::text(".com"), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "www.example.com");
    }

    #[test]
    fn test_enter_performs_editor_action() {
        let config = Config {
            reload_in_background: false,
            ..Config::default()
        };
        let mut logic = InputLogic::from_config(&config);
        let editor = Arc::new(MemoryEditor::new());
        logic.start_session(
            InputAttributes::default().with_editor_action(EditorAction::Send),
            editor.clone(),
            Some(Selection::caret(0)),
        );
        logic.on_code_input(Event::printable('\n'), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "");
        assert!(editor
            .ops()
            .contains(&crate::remote::EditorOp::PerformEditorAction(EditorAction::Send)));

        // Shift+enter always inserts a newline
        logic.on_code_input(Event::functional(FunctionalKey::ShiftEnter), KeyboardShiftMode::Off);
        assert_eq!(editor.text(), "\n");
    }

    #[test]
    fn test_host_actions_are_reported() {
        let (mut logic, _editor) = engine("", 0);
        let tx = logic.on_code_input(Event::functional(FunctionalKey::Settings), KeyboardShiftMode::Off);
        assert_eq!(tx.host_action(), Some(HostAction::ShowSettings));
        let tx = logic.on_code_input(
            Event::functional(FunctionalKey::LanguageSwitch),
            KeyboardShiftMode::Off,
        );
        assert_eq!(tx.host_action(), Some(HostAction::SwitchLanguage));
        assert!(!tx.did_affect_contents());
    }

    #[test]
    fn test_auto_caps_at_sentence_start() {
        let (mut logic, editor) = engine("", 0);
        assert_eq!(
            logic.get_actual_caps_mode(KeyboardShiftMode::AutoShifted),
            KeyboardShiftMode::AutoShifted
        );
        type_text(&mut logic, "ok ");
        assert_eq!(logic.current_auto_caps_state(), CapsMode::empty());
        type_text(&mut logic, "no. ");
        assert_eq!(editor.text(), "ok no. ");
        assert!(logic
            .current_auto_caps_state()
            .contains(CapsMode::SENTENCES));
        assert_eq!(
            logic.get_actual_caps_mode(KeyboardShiftMode::ManualShiftLocked),
            KeyboardShiftMode::ManualShiftLocked
        );
    }

    #[test]
    fn test_unknown_position_disables_auto_caps() {
        let (mut logic, editor) = engine("", 0);
        editor.set_connected(false);
        logic.cache_mut().request_reload();
        assert_eq!(logic.current_auto_caps_state(), CapsMode::empty());
        assert_eq!(
            logic.get_actual_caps_mode(KeyboardShiftMode::AutoShifted),
            KeyboardShiftMode::Off
        );
    }

    #[test]
    fn test_swap_punctuation_after_weak_space() {
        let (mut logic, editor) = engine("", 0);
        type_text(&mut logic, "word ");
        assert_eq!(logic.space_state(), SpaceState::Weak);
        logic.on_code_input(Event::suggestion_strip_press('.'), KeyboardShiftMode::Off);
        assert_eq!(editor.render(), "word. |");
        assert_eq!(logic.space_state(), SpaceState::SwapPunctuation);
        logic.on_code_input(Event::functional(FunctionalKey::Delete), KeyboardShiftMode::Off);
        assert_eq!(editor.render(), "word .|");
    }
}
