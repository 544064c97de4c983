//! Per-event transaction record and the small state enums around it.

use crate::event::Event;
use crate::settings::SettingsValues;
use std::sync::Arc;
use std::time::Instant;

/// Spacing state carried from one transaction to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpaceState {
    #[default]
    None,
    /// A space was just typed; some punctuation may swap with it
    Weak,
    /// A space is owed and materializes only if the next key warrants it
    Phantom,
    /// Punctuation was just swapped with the space before it
    SwapPunctuation,
}

/// Whether the host must refresh the keyboard shift state.
///
/// Ordered so that combining two requests keeps the stronger one; a deferred
/// update wins over an immediate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ShiftUpdate {
    #[default]
    NoUpdate,
    UpdateNow,
    UpdateLater,
}

/// Shift state of the keyboard as the host shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyboardShiftMode {
    #[default]
    Off,
    ManualShifted,
    ManualShiftLocked,
    AutoShifted,
    AutoShiftLocked,
}

/// Requests the engine hands back to the host instead of acting itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostAction {
    ShowSettings,
    SwitchLanguage,
    SwitchToShortcutIme,
}

/// One event and everything the engine decided while processing it.
#[derive(Debug, Clone)]
pub struct InputTransaction {
    settings: Arc<SettingsValues>,
    event: Event,
    timestamp: Instant,
    space_state: SpaceState,
    shift_state: KeyboardShiftMode,
    required_shift_update: ShiftUpdate,
    did_affect_contents: bool,
    host_action: Option<HostAction>,
}

impl InputTransaction {
    pub fn new(
        settings: Arc<SettingsValues>,
        event: Event,
        timestamp: Instant,
        space_state: SpaceState,
        shift_state: KeyboardShiftMode,
    ) -> Self {
        Self {
            settings,
            event,
            timestamp,
            space_state,
            shift_state,
            required_shift_update: ShiftUpdate::NoUpdate,
            did_affect_contents: false,
            host_action: None,
        }
    }

    /// Record a shift update request, keeping the strongest one.
    pub fn require_shift_update(&mut self, update: ShiftUpdate) {
        self.required_shift_update = self.required_shift_update.max(update);
    }

    pub fn required_shift_update(&self) -> ShiftUpdate {
        self.required_shift_update
    }

    /// Mark that the editor contents changed.
    pub fn set_did_affect_contents(&mut self) {
        self.did_affect_contents = true;
    }

    pub fn did_affect_contents(&self) -> bool {
        self.did_affect_contents
    }

    pub fn set_host_action(&mut self, action: HostAction) {
        self.host_action = Some(action);
    }

    pub fn host_action(&self) -> Option<HostAction> {
        self.host_action
    }

    pub fn settings(&self) -> &SettingsValues {
        &self.settings
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Space state observed when the transaction started.
    pub fn space_state(&self) -> SpaceState {
        self.space_state
    }

    pub fn shift_state(&self) -> KeyboardShiftMode {
        self.shift_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FunctionalKey;

    #[test]
    fn test_shift_update_keeps_strongest() {
        let mut tx = InputTransaction::new(
            Arc::new(SettingsValues::default()),
            Event::functional(FunctionalKey::Shift),
            Instant::now(),
            SpaceState::None,
            KeyboardShiftMode::Off,
        );
        assert_eq!(tx.required_shift_update(), ShiftUpdate::NoUpdate);
        tx.require_shift_update(ShiftUpdate::UpdateNow);
        assert_eq!(tx.required_shift_update(), ShiftUpdate::UpdateNow);
        tx.require_shift_update(ShiftUpdate::UpdateLater);
        tx.require_shift_update(ShiftUpdate::UpdateNow);
        assert_eq!(tx.required_shift_update(), ShiftUpdate::UpdateLater);
        assert!(!tx.did_affect_contents());
        assert_eq!(tx.host_action(), None);
    }
}
