//! liblatin crate root
//!
//! Latin-script layer over `libkeyboard-core`: per-language spacing and
//! punctuation tables, a dead-key combiner for diacritics, and a script
//! simulator that drives the engine against an in-memory editor.
//!
//! Public API exported here:
//! - `LatinConfig` from `config`
//! - `DeadKeyCombiner` from `dead_keys`
//! - `LanguageTable`, `language_table`, `supported_languages` from `punctuation`
//! - `Simulator`, `Token`, `parse_line`, `LineReport` from `script`
//! - `create_engine` to build an `InputLogic` for a `LatinConfig`

pub mod config;
pub mod dead_keys;
pub mod punctuation;
pub mod script;

// Re-export the engine types callers need alongside the latin ones.
pub use libkeyboard_core::{
    Event, FunctionalKey, HostAction, InputAttributes, InputLogic, InputPurpose,
    InputTransaction, KeyboardShiftMode, MemoryEditor, Selection, SpaceState,
};

pub use config::LatinConfig;
pub use dead_keys::{is_dead_accent, DeadKeyCombiner};
pub use punctuation::{language_table, supported_languages, LanguageTable};
pub use script::{parse_line, LineReport, Simulator, Token};

use libkeyboard_core::Combiner;

/// Build an engine for `config`, with the dead-key combiner installed when
/// enabled.
pub fn create_engine(config: &LatinConfig) -> InputLogic {
    let mut logic = InputLogic::from_config(config.base());
    let mut combiners: Vec<Box<dyn Combiner>> = Vec::new();
    if config.dead_keys {
        combiners.push(Box::new(DeadKeyCombiner::new()));
    }
    logic.set_combiners(combiners);
    logic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_engine_without_dead_keys() {
        let mut config = LatinConfig::default();
        config.dead_keys = false;
        config.base.reload_in_background = false;
        let mut sim = Simulator::new(&config);
        // Without a combiner the accent is typed like any other key
        sim.run_line("<dead:^>e").unwrap();
        assert_eq!(sim.editor().text().to_lowercase(), "^e");
    }
}
