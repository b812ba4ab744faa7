//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pagegen/pagegen.toml`
//! 3. Local config: `<project_dir>/.pagegen.toml`
//! 4. Environment variables: `PAGEGEN_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::dictionary::DEFAULT_DICTIONARY_VAR;
use crate::domain::ids::DEFAULT_ID_PREFIX;
use crate::domain::page::DEFAULT_MAX_EXPANSION_PASSES;

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified, inherit from the layer below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output_dir: Option<PathBuf>,
    pub id_prefix: Option<String>,
    pub max_expansion_passes: Option<usize>,
    pub dictionary_var: Option<String>,
    pub debug_copy: Option<bool>,
    pub extension: Option<String>,
    pub text_extension: Option<String>,
}

/// Unified configuration for pagegen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root of the dated page archive (default: ~/.pagegen/pages)
    pub output_dir: PathBuf,
    /// Prefix of generated element ids
    pub id_prefix: String,
    /// Upper bound on expansion passes per page
    pub max_expansion_passes: usize,
    /// JavaScript variable the lookup dictionary is assigned to
    pub dictionary_var: String,
    /// Persist every render best-effort
    pub debug_copy: bool,
    /// File extension for persisted markup
    pub extension: String,
    /// File extension for persisted text renders
    pub text_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: dirs_default_output_dir(),
            id_prefix: DEFAULT_ID_PREFIX.into(),
            max_expansion_passes: DEFAULT_MAX_EXPANSION_PASSES,
            dictionary_var: DEFAULT_DICTIONARY_VAR.into(),
            debug_copy: false,
            extension: "html".into(),
            text_extension: "txt".into(),
        }
    }
}

/// Get the default output directory (~/.pagegen/pages).
fn dirs_default_output_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".pagegen").join("pages"))
        .unwrap_or_else(|| PathBuf::from("~/.pagegen/pages"))
}

/// Get the XDG config directory for pagegen.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pagegen").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pagegen.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".pagegen.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.output_dir.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.output_dir = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            id_prefix: overlay
                .id_prefix
                .clone()
                .unwrap_or_else(|| self.id_prefix.clone()),
            max_expansion_passes: overlay
                .max_expansion_passes
                .unwrap_or(self.max_expansion_passes),
            dictionary_var: overlay
                .dictionary_var
                .clone()
                .unwrap_or_else(|| self.dictionary_var.clone()),
            debug_copy: overlay.debug_copy.unwrap_or(self.debug_copy),
            extension: overlay
                .extension
                .clone()
                .unwrap_or_else(|| self.extension.clone()),
            text_extension: overlay
                .text_extension
                .clone()
                .unwrap_or_else(|| self.text_extension.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let local = project_dir
            .map(local_config_path)
            .filter(|p| p.exists());
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Layer explicit config files over the defaults, then the environment.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        for path in [global, local].into_iter().flatten() {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply PAGEGEN_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("PAGEGEN").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("id_prefix") {
            settings.id_prefix = val;
        }
        if let Ok(val) = config.get_string("max_expansion_passes") {
            settings.max_expansion_passes = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("PAGEGEN_MAX_EXPANSION_PASSES={val}: {e}"),
            })?;
        }
        if let Ok(val) = config.get_string("dictionary_var") {
            settings.dictionary_var = val;
        }
        if let Ok(val) = config.get_bool("debug_copy") {
            settings.debug_copy = val;
        }
        if let Ok(val) = config.get_string("extension") {
            settings.extension = val;
        }
        if let Ok(val) = config.get_string("text_extension") {
            settings.text_extension = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.max_expansion_passes == 0 {
            return Err(ApplicationError::Config {
                message: "max_expansion_passes must be at least 1".into(),
            });
        }
        if self.id_prefix.is_empty() || self.id_prefix.contains(char::is_whitespace) {
            return Err(ApplicationError::Config {
                message: format!("invalid id_prefix {:?}", self.id_prefix),
            });
        }
        if self.dictionary_var.is_empty() {
            return Err(ApplicationError::Config {
                message: "dictionary_var must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pagegen configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pagegen/pagegen.toml
#   Local:  <project_dir>/.pagegen.toml
#   Env:    PAGEGEN_* environment variables

# Root of the dated page archive (render --persist, debug copies)
# output_dir = "~/.pagegen/pages"

# Prefix of generated element ids (n1, n2, ...)
# id_prefix = "n"

# Give up expanding a page after this many passes
# max_expansion_passes = 32

# JavaScript variable receiving the lookup dictionary
# dictionary_var = "lookupDictionary"

# Persist every render best-effort
# debug_copy = false

# File extensions of persisted pages
# extension = "html"
# text_extension = "txt"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
