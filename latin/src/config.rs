/// Latin-script configuration that extends the base `Config` from core.
///
/// This configuration includes:
/// - All generic options from `libkeyboard_core::Config` (flattened via serde)
/// - The language whose spacing tables fill the base config
/// - Whether dead keys combine with the following letter
///
/// # Example
///
/// ```rust
/// use liblatin::LatinConfig;
///
/// let config = LatinConfig::for_language("fr").unwrap();
/// let base_config = config.into_base();
/// assert_eq!(base_config.locale, "fr");
/// ```
use crate::punctuation;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LatinConfig {
    /// Base configuration fields (spacing tables, timings, caps)
    #[serde(flatten)]
    pub base: libkeyboard_core::Config,

    /// Language code the spacing tables come from
    pub language: String,

    /// Run key events through the dead-key combiner
    pub dead_keys: bool,
}

impl Default for LatinConfig {
    fn default() -> Self {
        Self {
            base: libkeyboard_core::Config::default(),
            language: "en".to_string(),
            dead_keys: true,
        }
    }
}

impl LatinConfig {
    /// Default configuration with the spacing tables of `language`.
    pub fn for_language(language: &str) -> Result<Self> {
        let mut config = Self::default();
        config.set_language(language)?;
        Ok(config)
    }

    /// Switch language, replacing the locale and every spacing table.
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        let Some(table) = punctuation::language_table(language) else {
            bail!(
                "unsupported language '{}' (supported: {})",
                language,
                punctuation::supported_languages().join(", ")
            );
        };
        table.apply_to(&mut self.base);
        self.base.locale = language.to_string();
        self.language = language.to_string();
        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Convert this latin config into the base config for the engine
    pub fn into_base(self) -> libkeyboard_core::Config {
        self.base
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &libkeyboard_core::Config {
        &self.base
    }

    /// Get a mutable reference to the base config
    pub fn base_mut(&mut self) -> &mut libkeyboard_core::Config {
        &mut self.base
    }
}
