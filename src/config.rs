use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Language used when a request does not name one
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Reject Gregorian dates that do not exist instead of converting them anyway
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Month names for one language, Meskerem through Pagume.
#[derive(Debug, Deserialize, Clone)]
pub struct LanguageConfig {
    pub code: String,
    pub months: [String; 13],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            default_language: default_language(),
            strict: false,
            languages: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for language in &self.languages {
            if language.code.trim().is_empty() {
                anyhow::bail!("language entry with an empty code");
            }
            if let Some(position) = language.months.iter().position(|m| m.trim().is_empty()) {
                anyhow::bail!(
                    "language '{}' has an empty name for month {}",
                    language.code,
                    position + 1
                );
            }
        }
        Ok(())
    }
}
