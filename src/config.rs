use crate::error::RangelogError;
use crate::session_stats::filter::{
    DayNightFilter, DistanceFilter, EffortFilter, FilterConfig, SortOrder,
};
use anyhow::{Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_DIR: &str = "RANGELOG_CONFIG_DIR";
pub const APP_NAME: &str = "rangelog";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_LIMIT: usize = 200;

fn validate_path_str(path_str: &str) -> std::result::Result<(), String> {
    if path_str.trim().is_empty() {
        return Err("Path cannot be empty or contain only whitespace".to_string());
    }
    Ok(())
}

/// Resolution order: CLI flag, then `RANGELOG_CONFIG_DIR`, then the platform config dir.
pub fn resolve_config_dir_with(
    cli_override: Option<&Path>,
    env_override: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = cli_override {
        validate_path_str(&path.to_string_lossy())
            .map_err(|e| anyhow!(t!("errors.invalid_config_dir", error = e)))?;
        return Ok(path.to_path_buf());
    }

    if let Some(env_config_dir) = env_override {
        validate_path_str(env_config_dir)
            .map_err(|e| anyhow!(t!("errors.invalid_config_dir_env", error = e)))?;
        return Ok(PathBuf::from(env_config_dir));
    }

    let project_dirs = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow!(t!("errors.not_find_config_dir")))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Defaults applied to `rangelog stats` when the matching flag is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatsDefaults {
    pub day_night: DayNightFilter,
    pub effort: EffortFilter,
    pub distance: DistanceFilter,
    pub participated: bool,
    pub sort: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl StatsDefaults {
    pub fn filter(&self) -> FilterConfig {
        FilterConfig {
            day_night: self.day_night,
            effort: self.effort,
            distance: self.distance,
            participated: self.participated,
            sort_order: self.sort,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `tracing` filter directive, e.g. `info` or `rangelog=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// The current user, used by `--participated`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub defaults: StatsDefaults,
}

impl Config {
    /// Loads `config.toml` from `config_dir`; a missing file yields defaults.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Self::parse(&raw).map_err(|e| {
            RangelogError::Config {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        })
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            RangelogError::Config {
                message: e.to_string(),
            }
            .into()
        })
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE)
}

pub fn sample_config() -> &'static str {
    r#"# rangelog configuration

# tracing filter directive; RANGELOG_LOG overrides it.
# log_level = "info"

# Your user id, used by `rangelog stats --participated`.
# user_id = "00000000-0000-0000-0000-000000000000"

[defaults]
day_night = "all"      # all | day | night
effort = "all"         # all | true | false
distance = "all"       # all | 0-300 | 300-600 | 600-900 | 900+
participated = false
sort = "recent"        # recent | best
limit = 200
"#
}

/// Writes the sample config unless one is already present. Returns the path
/// when a file was written.
pub fn ensure_sample_config(config_dir: &Path) -> Result<Option<PathBuf>> {
    let path = config_file_path(config_dir);
    if path.exists() {
        return Ok(None);
    }
    fs::create_dir_all(config_dir)?;
    fs::write(&path, sample_config())?;
    tracing::info!(path = %path.display(), "wrote sample config");
    Ok(Some(path))
}
