//! Layered configuration.
//!
//! Values are resolved from, lowest priority first:
//!
//! 1. built-in defaults;
//! 2. a config file (`toml`, `yaml`/`yml` or `json`, picked by extension);
//! 3. `TRELLIS_`-prefixed environment variables, with `__` between nested
//!    keys (`TRELLIS_HIERARCHY__MAX_DEPTH=4`).
//!
//! Without an explicit path, `config.toml` in the platform config directory
//! is used if it exists.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use trellis_cache::CleanupPolicy;
use trellis_hierarchy::{BuildOptions, CycleKey};

const ENV_PREFIX: &str = "TRELLIS_";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "trellis")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = match project_dirs() {
            Some(dirs) => dirs.cache_dir().join("cache.sqlite"),
            None => PathBuf::from("trellis-cache.sqlite"),
        };
        Self { path }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub max_depth: u32,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub cycle_key: CycleKey,
    /// Empty (the default) disables section grouping.
    pub section_delimiter: String,
}
impl Default for HierarchyConfig {
    fn default() -> Self {
        let options = BuildOptions::default();
        Self {
            max_depth: options.max_depth,
            concurrency: options.concurrency,
            timeout_secs: 30,
            cycle_key: options.cycle_key,
            section_delimiter: options.section_delimiter.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub max_age_days: u32,
    pub low_usage_threshold: u32,
    pub low_usage_age_days: u32,
}
impl Default for CleanupConfig {
    fn default() -> Self {
        let policy = CleanupPolicy::default();
        Self {
            max_age_days: policy.max_age_days,
            low_usage_threshold: policy.low_usage_threshold,
            low_usage_age_days: policy.low_usage_age_days,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub hierarchy: HierarchyConfig,
    pub cleanup: CleanupConfig,
}

impl Config {
    /// The file read when no path is given, if the platform has a config
    /// directory.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load and validate the configuration.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_file().filter(|path| path.is_file()),
        };
        let config = Self::figment(file.as_deref())?;
        let config: Self = config.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(file = ?file, database = %config.database.path.display(), "Loaded configuration");
        Ok(config)
    }

    fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file_exact(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                Some("json") => figment.merge(Json::file_exact(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.hierarchy.max_depth == 0 {
            exn::bail!(ErrorKind::Invalid("hierarchy.max_depth"));
        }
        if self.hierarchy.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("hierarchy.concurrency"));
        }
        if self.hierarchy.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("hierarchy.timeout_secs"));
        }
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        let delimiter = &self.hierarchy.section_delimiter;
        BuildOptions {
            max_depth: self.hierarchy.max_depth,
            concurrency: self.hierarchy.concurrency,
            cycle_key: self.hierarchy.cycle_key,
            section_delimiter: (!delimiter.is_empty()).then(|| delimiter.clone()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.hierarchy.timeout_secs)
    }

    pub fn policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            max_age_days: self.cleanup.max_age_days,
            low_usage_threshold: self.cleanup.low_usage_threshold,
            low_usage_age_days: self.cleanup.low_usage_age_days,
        }
    }
}
