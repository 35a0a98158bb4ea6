use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reelscope_common::config::SystemConfig;
use reelscope_common::types::Facet;
use reelscope_common::ReelscopeError;

use super::validation;

/// Complete engine configuration loaded from the config directory.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parsed system.toml.
    pub system: SystemConfig,
    /// Facet instruction overrides keyed by facet.
    pub prompts: HashMap<Facet, String>,
    /// Directory the configuration was read from.
    pub config_dir: PathBuf,
}

impl EngineConfig {
    /// Wrap an in-memory system config with no prompt overrides.
    pub fn from_system(system: SystemConfig) -> Self {
        Self {
            system,
            prompts: HashMap::new(),
            config_dir: PathBuf::new(),
        }
    }
}

/// Load all configuration from the given config directory.
///
/// Fails with every problem listed if anything is misconfigured. No service
/// is built from invalid configuration.
pub fn load_config(config_dir: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::info!(config_dir = %config_dir.display(), "Loading configuration");

    let system = load_system_config(&config_dir.join("system.toml"))?;
    let prompts = load_prompts(&config_dir.join("prompts"))?;

    let config = EngineConfig {
        system,
        prompts,
        config_dir: config_dir.to_path_buf(),
    };

    validation::validate(&config)?;

    tracing::info!(
        provider = config.system.model.provider.as_str(),
        model = config.system.model.model.as_str(),
        prompt_overrides = config.prompts.len(),
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn load_system_config(path: &Path) -> Result<SystemConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Read `prompts/*.md|*.txt`. The file stem names the facet; files that match
/// no facet are skipped with a warning.
fn load_prompts(prompts_dir: &Path) -> Result<HashMap<Facet, String>, ConfigError> {
    let mut prompts = HashMap::new();

    if !prompts_dir.exists() {
        tracing::debug!(
            path = %prompts_dir.display(),
            "Prompts directory does not exist, using built-in instructions"
        );
        return Ok(prompts);
    }

    let entries = std::fs::read_dir(prompts_dir).map_err(|e| ConfigError::FileRead {
        path: prompts_dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::FileRead {
            path: prompts_dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path
            .extension()
            .is_some_and(|ext| ext == "md" || ext == "txt")
        {
            continue;
        }

        let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or("");
        let Some(facet) = Facet::from_key(stem) else {
            tracing::warn!(path = %path.display(), "Prompt file matches no facet, ignoring");
            continue;
        };

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(facet = %facet, "Loaded prompt override");
        prompts.insert(facet, content.trim().to_string());
    }

    Ok(prompts)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for ReelscopeError {
    fn from(e: ConfigError) -> Self {
        ReelscopeError::Config(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
