//! Tests for the latin layer driving the engine end to end
//!
//! Covers:
//! - Dead keys composing inside and outside a word
//! - Delete cancelling a pending accent
//! - French spacing around high punctuation
//! - Languages written without spaces between words

use liblatin::{LatinConfig, Simulator, SpaceState};

fn simulator(language: &str) -> Simulator {
    let mut config = LatinConfig::for_language(language).unwrap();
    config.base_mut().reload_in_background = false;
    Simulator::new(&config)
}

#[test]
fn test_dead_key_composes_letter() {
    let mut sim = simulator("en");
    let report = sim.run_line("<dead:^>").unwrap();
    // The pending accent is shown in the composing region
    assert_eq!(report.text, "^");
    assert_eq!(report.composing, Some((0, 1)));

    let report = sim.run_line("e").unwrap();
    assert_eq!(report.text, "ê");
    assert_eq!(report.composing, Some((0, 1)));
}

#[test]
fn test_dead_key_inside_word() {
    let mut sim = simulator("fr");
    let report = sim.run_line("caf<dead:´>e ").unwrap();
    assert_eq!(report.text, "Café ");
    assert_eq!(report.composing, None);
}

#[test]
fn test_delete_cancels_pending_accent() {
    let mut sim = simulator("en");
    let report = sim.run_line("<dead:¨><del>").unwrap();
    assert_eq!(report.text, "");
    assert_eq!(report.composing, None);

    // The next letter is typed plainly
    let report = sim.run_line("u").unwrap();
    assert_eq!(report.text, "U");
}

#[test]
fn test_uncombinable_letter_keeps_accent() {
    let mut sim = simulator("en");
    let report = sim.run_line("<dead:^>q").unwrap();
    assert_eq!(report.text, "^q");
}

#[test]
fn test_french_space_before_high_punctuation() {
    let mut sim = simulator("fr");
    let report = sim.run_line("<pick:Bonjour>!").unwrap();
    assert_eq!(report.text, "Bonjour !");
    // The owed space moves after the mark
    assert_eq!(report.space_state, format!("{:?}", SpaceState::Phantom));
}

#[test]
fn test_french_clustering_marks_stay_together() {
    let mut sim = simulator("fr");
    let report = sim.run_line("<pick:Quoi>!?").unwrap();
    assert_eq!(report.text, "Quoi !?");
}

#[test]
fn test_english_punctuation_sticks_to_word() {
    let mut sim = simulator("en");
    let report = sim.run_line("<pick:Hello>!").unwrap();
    assert_eq!(report.text, "Hello!");
}

#[test]
fn test_language_without_spaces_confirms_on_space() {
    let mut sim = simulator("th");
    let report = sim.run_line("กขค ").unwrap();
    // Space only ends the word
    assert_eq!(report.text, "กขค");
    assert_eq!(report.composing, None);

    // Backspace resumes the word instead of deleting
    let report = sim.run_line("<del>").unwrap();
    assert_eq!(report.text, "กขค");
    assert_eq!(report.composing, Some((0, 3)));
}

#[test]
fn test_switching_language_replaces_tables() {
    let mut config = LatinConfig::for_language("fr").unwrap();
    assert!(config.base().usually_preceded_by_space.contains('!'));
    config.set_language("en-GB").unwrap();
    assert!(!config.base().usually_preceded_by_space.contains('!'));
    assert_eq!(config.base().locale, "en-GB");
    assert!(config.set_language("zz").is_err());
    // A failed switch leaves the previous language in place
    assert_eq!(config.language, "en-GB");
}
