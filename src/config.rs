use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub server_url: Option<String>,
    pub default_action: Option<String>,
    /// External command producing one final transcript on stdout, e.g.
    /// "whisper-cli --once". Dictation is disabled when unset or when the
    /// binary cannot be found.
    pub dictation_command: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_url: Some("http://127.0.0.1:5000".to_string()),
            default_action: None,
            dictation_command: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::read_from(&Self::get_config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.write_to(&Self::get_config_path()?)
    }

    fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or("http://127.0.0.1:5000")
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("charla").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            server_url: Some("http://localhost:9999".into()),
            default_action: Some("summarize".into()),
            dictation_command: Some("whisper-cli --once".into()),
        };
        config.write_to(&path).unwrap();

        let back = Config::read_from(&path).unwrap();
        assert_eq!(back.server_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(back.default_action.as_deref(), Some("summarize"));
        assert_eq!(back.dictation_command.as_deref(), Some("whisper-cli --once"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.server_url(), "http://127.0.0.1:5000");
        assert!(config.dictation_command.is_none());
    }

    #[test]
    fn server_url_falls_back_to_default() {
        let config = Config {
            server_url: None,
            default_action: None,
            dictation_command: None,
        };
        assert_eq!(config.server_url(), "http://127.0.0.1:5000");
    }
}
