//! Configuration settings for Lectern.

use crate::provider::ProviderId;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub providers: ProvidersSettings,
    pub transcript: TranscriptSettings,
    pub chapters: ChapterSettings,
    pub quiz: QuizSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Which provider to try first, plus the two provider endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    /// Provider tried first when a request does not name one.
    pub default: ProviderId,
    /// Primary provider (Google Gemini).
    #[serde(deserialize_with = "gemini_table")]
    pub primary: ProviderSettings,
    /// Secondary provider (OpenRouter), also the quota fallback.
    #[serde(deserialize_with = "openrouter_table")]
    pub secondary: ProviderSettings,
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            default: ProviderId::Primary,
            primary: ProviderSettings::gemini(),
            secondary: ProviderSettings::openrouter(),
        }
    }
}

/// Connection settings for one AI provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    /// Model identifier sent to the provider.
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// HTTP referer sent with requests (OpenRouter attribution).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

impl ProviderSettings {
    /// Defaults for Google Gemini.
    pub fn gemini() -> Self {
        Self {
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 120,
            referer: None,
        }
    }

    /// Defaults for OpenRouter.
    pub fn openrouter() -> Self {
        Self {
            model: "anthropic/claude-3-haiku".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_seconds: 120,
            referer: Some("http://localhost:8000".to_string()),
        }
    }

    /// Read the API key from the environment.
    ///
    /// Empty values and `your_...` placeholders copied from sample env files
    /// count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .and_then(|key| normalize_api_key(&key))
    }
}

/// A provider table as written in the config file. Absent keys keep the
/// defaults of the provider's role.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderTable {
    model: Option<String>,
    base_url: Option<String>,
    api_key_env: Option<String>,
    timeout_seconds: Option<u64>,
    referer: Option<String>,
}

impl ProviderTable {
    fn apply_to(self, mut base: ProviderSettings) -> ProviderSettings {
        if let Some(model) = self.model {
            base.model = model;
        }
        if let Some(base_url) = self.base_url {
            base.base_url = base_url;
        }
        if let Some(api_key_env) = self.api_key_env {
            base.api_key_env = api_key_env;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            base.timeout_seconds = timeout_seconds;
        }
        if self.referer.is_some() {
            base.referer = self.referer;
        }
        base
    }
}

fn gemini_table<'de, D>(deserializer: D) -> Result<ProviderSettings, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ProviderTable::deserialize(deserializer)?.apply_to(ProviderSettings::gemini()))
}

fn openrouter_table<'de, D>(deserializer: D) -> Result<ProviderSettings, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ProviderTable::deserialize(deserializer)?.apply_to(ProviderSettings::openrouter()))
}

fn normalize_api_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() || key.to_lowercase().starts_with("your_") {
        None
    } else {
        Some(key.to_string())
    }
}

/// Transcript handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Languages tried, in order, after English when no preference is given.
    pub common_languages: Vec<String>,
    /// Transcript characters included in question-answering prompts.
    pub question_context_chars: usize,
    /// Transcript characters included in quiz prompts.
    pub quiz_context_chars: usize,
    /// yt-dlp executable used to discover caption tracks.
    pub ytdlp_path: String,
    /// Timeout for downloading a caption track, in seconds.
    pub fetch_timeout_seconds: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            common_languages: ["hi", "es", "fr", "de", "pt", "ru", "ja", "ko", "zh-Hans", "zh-Hant"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            question_context_chars: 10_000,
            quiz_context_chars: 8_000,
            ytdlp_path: "yt-dlp".to_string(),
            fetch_timeout_seconds: 30,
        }
    }
}

/// Chapter generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterSettings {
    pub min_chapters: u32,
    pub max_chapters: u32,
    /// Clamp returned chapter timestamps into the video duration.
    pub clamp_timestamps: bool,
}

impl Default for ChapterSettings {
    fn default() -> Self {
        Self {
            min_chapters: 5,
            max_chapters: 8,
            clamp_timestamps: true,
        }
    }
}

/// Quiz generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    /// Number of multiple-choice questions requested.
    pub question_count: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self { question_count: 5 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LecternError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lectern")
            .join("config.toml")
    }
}
