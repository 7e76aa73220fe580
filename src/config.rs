use std::sync::OnceLock;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{bug_msg, ConfigError};

pub type SharedConfig = RwLock<Config>;

// this will be initialized by the app itself
pub static CONFIG: OnceLock<SharedConfig> = OnceLock::new();

/// The name of the config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "tabinator.toml";

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Path to the app's data directory. The database lives here.
    pub data_dir: Utf8PathBuf,

    /// Caps on user input. Anything past these is refused at the door.
    #[serde(default)]
    pub limits: Limits,

    /// Information for automatically reporting bugs.
    pub bug_report_info: BugReportInfo,
}

impl Config {
    pub fn new(data_dir: Utf8PathBuf, limits: Limits, bug_report_info: BugReportInfo) -> Self {
        Self {
            data_dir,
            limits,
            bug_report_info,
        }
    }

    /// Attempts to read a previous `Config` from disk.
    ///
    /// Note that this may fail across versions, requiring new configs.
    pub async fn from_disk(data_dir: &Utf8Path) -> Result<Self, ConfigError> {
        // read the config from disk
        let s = tokio::fs::read_to_string(data_dir.join(CONFIG_FILE_NAME))
            .await
            .map_err(ConfigError::ReadFailed)?;

        // parse with `toml` crate
        let s: Self = toml::from_str(s.as_str()).map_err(ConfigError::ParseFailed)?;

        // ensure paths are equal
        if s.data_dir.as_path() != data_dir {
            tracing::error!(
                "loaded config from disk, but it had some weird paths. {}",
                bug_msg().await
            );
            return Err(ConfigError::PathMismatch);
        }

        Ok(s)
    }

    /// Use this EXACTLY ONCE to initialize the config.
    ///
    /// The app should be the only one calling this.
    pub async fn init_config(conf: Config) {
        if CONFIG.get().is_none() {
            if CONFIG.set(RwLock::new(conf)).is_err() {
                tracing::warn!("another task initialized the config first. ignoring this one.");
            }
        } else {
            tracing::error!(
                "attempted to init the config, but the config is already running. {}",
                bug_msg().await
            )
        }
    }

    /// Grabs the config for reading.
    ///
    /// Note that while you're reading the config, others cannot write to it.
    /// DO NOT HOLD ONTO IT FOR A LONG TIME.
    pub async fn read() -> Result<RwLockReadGuard<'static, Config>, ConfigError> {
        Ok(CONFIG.get().ok_or(ConfigError::Uninitialized)?.read().await)
    }

    pub async fn write() -> Result<RwLockWriteGuard<'static, Config>, ConfigError> {
        Ok(CONFIG.get().ok_or(ConfigError::Uninitialized)?.write().await)
    }
}

/// Upper bounds on what users can store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Limits {
    /// How many tags a single link may carry.
    pub max_tags_per_link: usize,

    /// Longest allowed tag, in characters.
    pub max_tag_length: usize,

    /// Longest allowed link or group name, in characters.
    pub max_name_length: usize,

    /// Total flat rules (across all blocks) a group may have.
    pub max_rules_per_group: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_tags_per_link: 50,
            max_tag_length: 100,
            max_name_length: 1000,
            max_rules_per_group: 1000,
        }
    }
}

/// Some info to help with bug reporting.
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct BugReportInfo {
    pub app_name: String,
    pub app_version: String,

    pub target_triple: String,
    pub build_time: String,

    pub commit: String,
    pub repo: String,
}
