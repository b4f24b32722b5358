use crate::error::{FomError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// Configuration for fom, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FomConfig {
    /// Directories searched for models, in order
    #[serde(default)]
    pub fom_path: Vec<PathBuf>,

    /// Root directories for `root:` prefixed patterns (e.g. "output" -> /data/out)
    #[serde(default)]
    pub roots: BTreeMap<String, PathBuf>,

    /// Formats tried first when completing paths (format names or extensions)
    #[serde(default)]
    pub preferred_formats: Vec<String>,
}

impl FomConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: FomConfig = serde_json::from_str(&content).map_err(|e| {
            FomError::Config(format!("{}: {}", config_path.display(), e))
        })?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// First preferred format, used when the caller names none
    pub fn preferred_format(&self) -> Option<&str> {
        self.preferred_formats.first().map(String::as_str)
    }

    /// Display value of a config key: `fom_path`, `preferred_formats` or
    /// `roots.<name>`
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "fom_path" => Some(
                self.fom_path
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            "preferred_formats" => Some(self.preferred_formats.join(",")),
            _ => {
                let name = key.strip_prefix("roots.")?;
                self.roots.get(name).map(|p| p.display().to_string())
            }
        }
    }

    /// Set a config key from its display form. List keys take comma-separated
    /// values; an empty value clears the key.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let items = || {
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match key {
            "fom_path" => self.fom_path = items().map(PathBuf::from).collect(),
            "preferred_formats" => self.preferred_formats = items().collect(),
            _ => match key.strip_prefix("roots.") {
                Some(name) if !name.is_empty() => {
                    if value.is_empty() {
                        self.roots.remove(name);
                    } else {
                        self.roots.insert(name.to_string(), PathBuf::from(value));
                    }
                }
                _ => return Err(format!("Unknown config key: {}", key)),
            },
        }
        Ok(())
    }
}
