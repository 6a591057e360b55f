//! Configuration loading and root folder resolution
//!
//! Everything lives in one TOML file; every key is optional.
//!
//! ```toml
//! root_folder = "/srv/licensing"
//! host = "0.0.0.0"
//! port = 5780
//! storage = "sqlite"            # or "json"
//!
//! [dashboard]
//! due_soon_days = 90
//! urgent_window_days = 30
//! default_account = "jdoe"
//! company_name = "Acme Plumbing"
//! high_priority_states = ["TX", "CA", "FL", "NY"]
//! training_roadmap_id = "master_plumber_southwest"
//!
//! [auth]
//! require_pin = true
//! director_pin = "9999"
//! session_ttl_hours = 12
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `LRM_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML file
//! 4. OS-dependent default (fallback)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{Error, Result};

pub const ROOT_FOLDER_ENV: &str = "LRM_ROOT_FOLDER";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_DATABASE_FILE: &str = "licensing.db";

/// Which [`crate::store::LicenseStore`] backs the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Data directory (JSON documents, content, database)
    pub root_folder: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    /// Relative paths resolve against the root folder
    pub database_path: Option<PathBuf>,
    pub dashboard: DashboardSettings,
    pub auth: AuthSettings,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            storage: StorageBackend::default(),
            database_path: None,
            dashboard: DashboardSettings::default(),
            auth: AuthSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Thresholds and defaults for the dashboard pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Licensed records expiring within this many days show as due soon
    pub due_soon_days: i64,
    /// Expirations within this many days appear as urgent items on the home page
    pub urgent_window_days: i64,
    /// Account shown when a request names none
    pub default_account: String,
    pub company_name: String,
    /// States reported as coverage gaps when no holder is licensed there
    pub high_priority_states: Vec<String>,
    pub training_roadmap_id: String,
}

/// States checked for coverage gaps when none are configured
pub const DEFAULT_HIGH_PRIORITY_STATES: [&str; 10] =
    ["TX", "CA", "FL", "NY", "IL", "PA", "OH", "GA", "NC", "MI"];

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            due_soon_days: crate::status::DUE_SOON_DAYS,
            urgent_window_days: crate::rollup::URGENT_WINDOW_DAYS,
            default_account: crate::models::DIRECTOR_ACCOUNT.to_string(),
            company_name: "Licensing Roadmap".to_string(),
            high_priority_states: DEFAULT_HIGH_PRIORITY_STATES
                .into_iter()
                .map(String::from)
                .collect(),
            training_roadmap_id: "master_plumber_southwest".to_string(),
        }
    }
}

/// Hours a PIN session stays valid
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Require a PIN session for every page and API
    pub require_pin: bool,
    /// PIN that opens the director view
    pub director_pin: Option<String>,
    pub session_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            require_pin: false,
            director_pin: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Fix the root folder by priority (CLI, environment, file, OS default)
    pub fn resolve_root_folder(mut self, cli_arg: Option<&Path>) -> Self {
        let root = resolve_root_folder(cli_arg, ROOT_FOLDER_ENV, self.root_folder.as_deref());
        self.root_folder = Some(root);
        self
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root_folder
            .clone()
            .unwrap_or_else(default_root_folder)
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir().join(path),
            None => self.data_dir().join(DEFAULT_DATABASE_FILE),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dashboard.due_soon_days < 0 || self.dashboard.urgent_window_days < 0 {
            return Err(Error::Config(
                "due_soon_days and urgent_window_days must not be negative".to_string(),
            ));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(Error::Config("session_ttl_hours must be positive".to_string()));
        }
        if self.auth.require_pin && self.auth.director_pin.as_deref().map_or(true, str::is_empty) {
            warn!("require_pin is on but no director_pin is set; the director view is unreachable");
        }
        Ok(())
    }
}

/// Load the config file
///
/// An explicit path must exist. Without one, the per-user file is tried and
/// its absence means built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                warn!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let text = std::fs::read_to_string(&path)?;
    let config = TomlConfig::parse(&text)?;
    config.validate()?;
    Ok(config)
}

/// Root folder resolution by priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config value
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    default_root_folder()
}

/// `~/.config/lrm/config.toml` on Linux, the platform equivalent elsewhere
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lrm").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lrm
        dirs::data_local_dir()
            .map(|d| d.join("lrm"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lrm"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lrm
        dirs::data_dir()
            .map(|d| d.join("lrm"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lrm"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lrm
        dirs::data_local_dir()
            .map(|d| d.join("lrm"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lrm"))
    } else {
        PathBuf::from("./lrm_data")
    }
}
