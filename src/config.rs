//! Support for configuration options

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Part of the ProdID string that describes the organization (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static ORG_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("Weekly Calendar".to_string())));

/// Part of the ProdID string that describes the product name (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("weekly-calendar".to_string())));

/// Environment variable that overrides the path of the settings file
pub const CONFIG_ENV_VAR: &str = "WEEKLY_CALENDAR_CONFIG";

const APP_DIR: &str = "weekly-calendar";

/// Which backend stores the calendars
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// A local JSON file, see [`Cache`](crate::cache::Cache)
    Local { path: PathBuf },
    /// A CalDAV server, see [`Client`](crate::client::Client)
    Caldav { url: String, username: String, password: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub backend: BackendConfig,
    /// How long to wait for a backend before giving up. No limit by default
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Local { path: default_data_file() },
            connect_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| Error::Config(format!("Unable to open file {:?}: {}", path, err)))?;
        let settings = serde_json::from_reader(file)
            .map_err(|err| Error::Config(format!("Invalid settings in {:?}: {}", path, err)))?;
        Ok(settings)
    }

    /// Load the settings.
    ///
    /// An explicit `path` must exist. Otherwise the default settings file is used if it exists,
    /// and the default settings (a local backend) are used if it does not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_path = default_config_file();
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            log::debug!("No settings file at {:?}, using the defaults", default_path);
            Ok(Self::default())
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

/// The settings file: `$WEEKLY_CALENDAR_CONFIG`, or `weekly-calendar/config.json` in the user's config folder
pub fn default_config_file() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

/// Where the local backend stores its data by default
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("calendar.json")
}
