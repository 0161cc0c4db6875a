use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use dirsnap_core::{DEFAULT_EXTENSIONS, ExtensionFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User preferences persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Settings {
    /// Resolves the settings file, preferring an explicit override over the
    /// platform config directory.
    pub fn location(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        let dirs = ProjectDirs::from("", "", "dirsnap")
            .ok_or_else(|| anyhow!("Could not determine a config directory; use --config"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Missing files yield the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    pub fn filter(&self) -> ExtensionFilter {
        ExtensionFilter::from_list(&self.extensions)
    }

    pub fn set_filter(&mut self, filter: &ExtensionFilter) {
        self.extensions = filter.list();
    }
}
