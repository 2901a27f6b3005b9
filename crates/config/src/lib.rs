//! Configuration for curate.
//!
//! A [`Config`] is an immutable value loaded once at the start of a sync pass
//! and handed down explicitly; nothing keeps a global copy. Sources are merged
//! with [`figment`] in increasing priority:
//!
//! 1. Built-in defaults.
//! 2. A configuration file. TOML by default, YAML (`.yaml`/`.yml`) or JSON
//!    (`.json`) by extension.
//! 3. Environment variables prefixed with `CURATE_`, nested keys separated by
//!    `__` (e.g. `CURATE_SYNC__DRY_RUN=true`).
//!
//! ```toml
//! [sync]
//! remove_empty = true
//!
//! [[title_rules]]
//! match = "Avengers"
//! collection = "Marvel Universe"
//!
//! [[expression_rules]]
//! collection = "Marvel Universe"
//! expression = 'STUDIO "Marvel" AND GENRE "Action"'
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use curate_rules::RuleSet;
use curate_sync::SyncOptions;
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "CURATE_";

/// Everything a sync pass needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `title_rules` and `expression_rules` live at the top level.
    #[serde(flatten)]
    pub rules: RuleSet,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub host: HostSettings,
}

/// How a sync pass behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Compute and report changes without applying them.
    pub dry_run: bool,
    /// Delete collections that a pass left without any members.
    pub remove_empty: bool,
    /// Maximum number of collections reconciled at the same time.
    pub concurrency: usize,
}
impl Default for SyncSettings {
    fn default() -> Self {
        let SyncOptions { dry_run, remove_empty, concurrency } = SyncOptions::default();
        Self { dry_run, remove_empty, concurrency }
    }
}
impl SyncSettings {
    /// Options for one pass. `dry_run` forces a dry run on top of the
    /// configured setting; it can never turn a configured dry run off.
    pub fn options(&self, dry_run: bool) -> SyncOptions {
        SyncOptions { dry_run: dry_run || self.dry_run, remove_empty: self.remove_empty, concurrency: self.concurrency }
    }
}

/// Where the JSON host backends keep their data. Relative paths are resolved
/// against the directory of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub catalog: PathBuf,
    pub collections: PathBuf,
}
impl Default for HostSettings {
    fn default() -> Self {
        Self { catalog: PathBuf::from("catalog.json"), collections: PathBuf::from("collections.json") }
    }
}
impl HostSettings {
    fn resolve(mut self, base: &Path) -> Self {
        if self.catalog.is_relative() {
            self.catalog = base.join(&self.catalog);
        }
        if self.collections.is_relative() {
            self.collections = base.join(&self.collections);
        }
        self
    }
}

/// Default configuration file location, e.g. `~/.config/curate/config.toml`.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "curate").ok_or_raise(|| ErrorKind::NoConfigDir)?;
    Ok(dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load configuration from `path`, or from [`default_path`] when `None`.
    ///
    /// An explicit path must exist; a missing default file just means "use
    /// the defaults".
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => default_path()?,
        };
        if !path.exists() {
            tracing::info!(path = %path.display(), "No configuration file found; using defaults");
        }
        let config = Self::from_figment(Self::figment(&path))?;
        let base = path.parent().unwrap_or(Path::new("."));
        tracing::debug!(path = %path.display(), rules = config.rules.len(), "Loaded configuration");
        Ok(Self { host: config.host.resolve(base), ..config })
    }

    /// Layered providers for the configuration file at `path`.
    pub fn figment(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sync.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("sync.concurrency must be at least 1"));
        }
        Ok(())
    }
}
