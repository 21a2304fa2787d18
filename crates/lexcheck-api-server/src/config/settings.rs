use anyhow::{bail, Result};
use config::{Config, Environment, File};
use lexcheck_core::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::GeminiModel;

/// Environment variables consulted, in order, when no Gemini key is configured.
pub const FALLBACK_API_KEY_VARS: [&str; 5] = [
    "VITE_GEMINI_FLASH_API_KEY",
    "VITE_GEMINI_FLASH_KEY",
    "GEMINI_FLASH_API_KEY",
    "GEMINI_API_KEY",
    "API_KEY",
];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub chunking: ChunkingConfig,
    pub layout: LayoutConfig,
    pub history: HistoryConfig,
    pub assistant: AssistantConfig,
    pub prompts: PromptsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-file upload limit.
    pub max_upload_mb: usize,
    /// Limit for a whole multipart request.
    pub max_body_mb: usize,
    /// Upper bound on text extraction for one upload.
    pub extraction_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_mb: 50,
            max_body_mb: 110,
            extraction_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeminiConfig {
    /// Server-side key used when the caller supplies none.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 2000,
            overlap: 200,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/history.json"),
            max_entries: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    pub model: GeminiModel,
    pub max_sessions: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: GeminiModel::Flash,
            max_sessions: 100,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PromptsConfig {
    pub analysis_system_prompt: String,
    /// Placeholders: `{form_name}`, `{related_law}`, `{query}`, `{template}`.
    pub form_guide_prompt: String,
    pub assistant_system_prompt: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            analysis_system_prompt: "You are an occupational safety and health law expert. \
                Analyse the incident strictly against the supplied regulation text and answer \
                in the requested JSON structure."
                .to_string(),
            form_guide_prompt: "Fill in the '{form_name}' form ({related_law}) for the incident \
                below. Keep every field of the template and add no commentary.\n\n\
                Incident:\n{query}\n\nTemplate:\n```\n{template}\n```"
                .to_string(),
            assistant_system_prompt: "You answer follow-up questions about an analysed \
                industrial accident report. Use the incident and regulations below."
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `pretty` or `json`.
    pub format: String,
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "pretty".to_string(),
            directory: "logs".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.gemini.api_key = resolve_api_key(settings.gemini.api_key.take(), |name| {
            std::env::var(name).ok()
        });
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 || self.chunking.overlap >= self.chunking.size {
            bail!(
                "chunking.overlap ({}) must be smaller than a non-zero chunking.size ({})",
                self.chunking.overlap,
                self.chunking.size
            );
        }
        if self.server.max_upload_mb == 0 {
            bail!("server.max_upload_mb must be greater than zero");
        }
        if self.history.max_entries == 0 {
            bail!("history.max_entries must be greater than zero");
        }
        if self.assistant.max_sessions == 0 {
            bail!("assistant.max_sessions must be greater than zero");
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb * 1024 * 1024
    }
}

/// The configured key if non-blank, else the first non-blank fallback variable.
pub fn resolve_api_key(
    configured: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    configured
        .into_iter()
        .chain(FALLBACK_API_KEY_VARS.iter().filter_map(|name| lookup(*name)))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
