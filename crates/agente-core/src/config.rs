use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{AgentError, Result};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const APP_DIR: &str = "agente-cirurgico";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub chat_model: String,
    pub tts_model: String,
    pub voice: String,
    pub temperature: f32,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file (defaults if it does not exist), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(&config_path)?;
            serde_json::from_str(&config_content)?
        } else {
            Self::new()
        };

        config.apply_env();
        Ok(config)
    }

    /// `GEMINI_API_KEY` wins over `API_KEY`, both win over the file.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_blank = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let key = non_blank("GEMINI_API_KEY").or_else(|| non_blank("API_KEY"));
        if key.is_some() {
            self.api_key = key;
        }

        if let Some(dir) = non_blank("AGENTE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Directory holding persisted user/chat records and the log file.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| AgentError::Config("Could not determine data directory".to_string()))?;

        Ok(data_dir.join(APP_DIR))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgentError::Config("Could not determine config directory".to_string()))?;

        Ok(config_dir.join(APP_DIR).join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.chat_model, "gemini-2.5-flash");
        assert_eq!(config.tts_model, "gemini-2.5-flash-preview-tts");
        assert_eq!(config.voice, "Kore");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_key":"abc"}"#).unwrap();
        assert_eq!(config.api_key(), Some("abc"));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_gemini_key_takes_precedence() {
        let mut config = Config::new();
        config.api_key = Some("from-file".to_string());
        config.apply_env_from(env(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]));
        assert_eq!(config.api_key(), Some("gemini"));
    }

    #[test]
    fn test_blank_env_key_keeps_file_key() {
        let mut config = Config::new();
        config.api_key = Some("from-file".to_string());
        config.apply_env_from(env(&[("GEMINI_API_KEY", "  ")]));
        assert_eq!(config.api_key(), Some("from-file"));
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = Config::new();
        config.apply_env_from(env(&[("AGENTE_DATA_DIR", "/tmp/agente")]));
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/tmp/agente"));
    }
}
