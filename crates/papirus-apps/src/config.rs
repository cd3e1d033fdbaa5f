//! User configuration.
//!
//! Stored as JSON in `~/.config/papirus-audit/config.json`. Every field is
//! optional; a missing file means defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used below the XDG config dir.
pub const CONFIG_DIR_NAME: &str = "papirus-audit";

/// Settings for the audit run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Icon theme every launcher should use.
    pub target_theme: String,
    /// Sibling themes that count as the target (dark/light variants).
    pub theme_variants: Vec<String>,
    /// Nominal icon size passed to the lookup backend.
    pub icon_size: u32,
    /// Themes tried after the target when resolving across all themes.
    /// Inherited themes are appended automatically.
    pub fallback_themes: Vec<String>,
    /// Extra directories scanned for launchers (treated as system scope).
    pub extra_application_dirs: Vec<PathBuf>,
    /// Where overrides are written. Defaults to `$XDG_DATA_HOME/applications`.
    pub override_root: Option<PathBuf>,
    pub matcher: MatcherConfig,
    /// Extra generic icons per application kind, tried before the built-in ones.
    pub category_icons: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_theme: "Papirus".to_string(),
            theme_variants: vec![
                "Papirus-Dark".to_string(),
                "Papirus-Light".to_string(),
                "ePapirus".to_string(),
                "ePapirus-Dark".to_string(),
            ],
            icon_size: 48,
            fallback_themes: vec!["Adwaita".to_string(), "hicolor".to_string()],
            extra_application_dirs: Vec::new(),
            override_root: None,
            matcher: MatcherConfig::default(),
            category_icons: BTreeMap::new(),
        }
    }
}

/// Tuning knobs for the fuzzy tiers of the candidate matcher.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    /// Lowest Jaccard similarity accepted by the token tier.
    pub min_jaccard: f64,
    /// Shortest string allowed to count as contained in another.
    pub min_substring_len: usize,
    /// Lowest score accepted by the containment tier.
    pub min_containment_score: f64,
    /// Upper bound on returned candidates.
    pub max_candidates: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_jaccard: 0.3,
            min_substring_len: 3,
            min_containment_score: 0.2,
            max_candidates: 10,
        }
    }
}

impl Config {
    /// All theme directory names that count as the target theme.
    pub fn target_theme_names(&self) -> Vec<String> {
        let mut names = vec![self.target_theme.clone()];
        for variant in &self.theme_variants {
            if !names.contains(variant) {
                names.push(variant.clone());
            }
        }
        names
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }
}

/// Default config location, `$XDG_CONFIG_HOME/papirus-audit/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.json"))
}
