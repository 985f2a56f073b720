use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::DEFAULT_BACKEND_URL;
use crate::model::{Project, Scope};

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/opensync or ~/.config/opensync
    /// - macOS: ~/Library/Application Support/opensync
    /// - Windows: %APPDATA%\opensync
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            // Follow XDG Base Directory Specification
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("opensync"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("opensync"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join("opensync"))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join("opensync"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".opensync"))
        }
    }

    /// Get the settings file path (config.toml)
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the dispatch history file path
    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("sync-history.json"))
    }

    /// Get the latest sync report path
    pub fn report_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("last-sync-report.json"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("opensync.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Persisted client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the OpenSync backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Scope assumed when `--scope` is not passed.
    #[serde(default = "default_scope")]
    pub default_scope: Scope,

    /// Project assumed for project scope when `--project` is not passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project: Option<Project>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_scope() -> Scope {
    Scope::Global
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            backend_url: default_backend_url(),
            default_scope: default_scope(),
            active_project: None,
        }
    }
}

impl Settings {
    /// Load settings from file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let settings_path = ConfigManager::settings_path()?;

        if !settings_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&settings_path).with_context(|| {
            format!("Failed to read settings file: {}", settings_path.display())
        })?;

        let settings: Settings =
            toml::from_str(&content).context("Failed to parse settings file")?;

        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        let settings_path = ConfigManager::settings_path()?;

        if let Some(parent) = settings_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(&settings_path, content).with_context(|| {
            format!("Failed to write settings file: {}", settings_path.display())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("opensync"));

        let settings = ConfigManager::settings_path().unwrap();
        assert!(settings.to_string_lossy().contains("config.toml"));

        let history = ConfigManager::history_path().unwrap();
        assert!(history.to_string_lossy().contains("sync-history.json"));

        let report = ConfigManager::report_path().unwrap();
        assert!(report.to_string_lossy().contains("last-sync-report.json"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.to_string_lossy().contains("opensync.log"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_xdg_config_home_respected() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir
            .to_string_lossy()
            .contains("/tmp/test-xdg-config/opensync"));
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.default_scope, Scope::Global);
        assert!(settings.active_project.is_none());
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let settings = Settings {
            backend_url: "http://localhost:9000".to_string(),
            default_scope: Scope::Project,
            active_project: Some(Project {
                name: "demo".to_string(),
                path: "/home/me/demo".to_string(),
            }),
        };

        let serialized = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.backend_url, "http://localhost:9000");
        assert_eq!(parsed.default_scope, Scope::Project);
        assert_eq!(parsed.active_project.unwrap().name, "demo");
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let parsed: Settings = toml::from_str("backend_url = \"http://other:8000\"\n").unwrap();
        assert_eq!(parsed.backend_url, "http://other:8000");
        assert_eq!(parsed.default_scope, Scope::Global);
        assert!(parsed.active_project.is_none());
    }
}
