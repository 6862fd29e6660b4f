//! Configuration management for FocusMind

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sites blocked out of the box on first install
pub const DEFAULT_BLOCKED_SITES: &[&str] = &[
    "youtube.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "tiktok.com",
    "reddit.com",
    "netflix.com",
];

/// Global FocusMind configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum characters of page text sent for summarization
    #[serde(default = "default_summary_char_limit")]
    pub summary_char_limit: usize,

    /// Language used when a translate request names none
    #[serde(default = "default_target_language")]
    pub default_target_language: String,

    /// Tone used when a rewrite request names none
    #[serde(default = "default_tone")]
    pub default_tone: String,

    /// Sampling temperature handed to capability sessions (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Seed list written to storage on first install
    #[serde(default = "default_blocked_sites")]
    pub default_blocked_sites: Vec<String>,
}

fn default_summary_char_limit() -> usize {
    10_000
}

fn default_target_language() -> String {
    "English".to_string()
}

fn default_tone() -> String {
    "neutral".to_string()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_blocked_sites() -> Vec<String> {
    DEFAULT_BLOCKED_SITES.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            summary_char_limit: default_summary_char_limit(),
            default_target_language: default_target_language(),
            default_tone: default_tone(),
            temperature: default_temperature(),
            default_blocked_sites: default_blocked_sites(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.summary_char_limit, 10_000);
        assert_eq!(config.default_target_language, "English");
        assert_eq!(config.default_tone, "neutral");
        assert_eq!(config.default_blocked_sites.len(), 7);
        assert_eq!(config.default_blocked_sites[0], "youtube.com");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"summary_char_limit": 500}"#).unwrap();
        assert_eq!(config.summary_char_limit, 500);
        assert_eq!(config.default_tone, "neutral");
        assert!((config.temperature - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let path = env::temp_dir().join(format!("focusmind_missing_{}.json", std::process::id()));
        let config = Config::load(&path).unwrap();
        assert_eq!(config.summary_char_limit, 10_000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = env::temp_dir().join(format!("focusmind_config_{}", std::process::id()));
        let path = dir.join("config.json");

        let mut config = Config::default();
        config.default_target_language = "Spanish".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.default_target_language, "Spanish");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
