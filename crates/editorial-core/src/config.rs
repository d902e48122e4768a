//! Configuration loading
//!
//! # Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Global config: `<config dir>/editorial/config.toml`
//! 3. Project config: `.editorial/config.toml`
//! 4. Environment variables: `EDITORIAL_*`
//! 5. CLI flags (applied by the binary)
//!
//! # Example Config
//!
//! ```toml
//! editorial_dir = "content/editorial"
//!
//! [claims]
//! ttl_minutes = 90
//! exclusive = true
//!
//! [status]
//! recent_hours = 24
//!
//! [audit]
//! git_commit = false
//! ```

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    coordinator::DEFAULT_RECENT_HOURS,
    expiry::{ExpiryPolicy, DEFAULT_LEASE_TTL_MINUTES},
    Error, Result,
};

const DEFAULT_EDITORIAL_DIR: &str = "editorial";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub editorial_dir: PathBuf,
    pub claims: ClaimsConfig,
    pub status: StatusConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClaimsConfig {
    pub ttl_minutes: i64,
    /// Serialize acquires through a lock file
    pub exclusive: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StatusConfig {
    pub recent_hours: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    /// Commit the editorial directory to git after each mutation
    pub git_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editorial_dir: PathBuf::from(DEFAULT_EDITORIAL_DIR),
            claims: ClaimsConfig::default(),
            status: StatusConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_LEASE_TTL_MINUTES,
            exclusive: false,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            recent_hours: DEFAULT_RECENT_HOURS,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { git_commit: true }
    }
}

/// Load configuration from all file and environment sources
///
/// # Errors
///
/// Returns error if:
/// - A config file is unreadable or malformed TOML
/// - An `EDITORIAL_*` variable has an invalid value
/// - The resulting values fail validation
pub fn load_config() -> Result<Config> {
    let global = global_config_path();
    let project = project_config_path()?;
    Config::load(
        global.as_deref(),
        Some(project.as_path()),
        |name| std::env::var(name).ok(),
    )
}

/// Path to the global config file
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "editorial")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path to the project config file
fn project_config_path() -> Result<PathBuf> {
    std::env::current_dir()
        .map(|dir| dir.join(".editorial/config.toml"))
        .map_err(|e| Error::storage("Failed to get current directory", e))
}

/// One config file. Only keys present in the file are `Some`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigLayer {
    editorial_dir: Option<PathBuf>,
    claims: ClaimsLayer,
    status: StatusLayer,
    audit: AuditLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClaimsLayer {
    ttl_minutes: Option<i64>,
    exclusive: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StatusLayer {
    recent_hours: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AuditLayer {
    git_commit: Option<bool>,
}

fn load_toml_file(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::storage(format!("Failed to read config file {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config {}: {e}", path.display()))
    })
}

impl Config {
    /// Layer defaults, optional files and environment overrides.
    ///
    /// Missing files are skipped. `env` looks up a variable by name.
    ///
    /// # Errors
    ///
    /// Returns error on unreadable or malformed files, bad environment
    /// values, or failed validation.
    pub fn load(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                config.merge(load_toml_file(path)?);
            }
        }

        config.apply_env_vars(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply every key set in `layer`, whatever its value
    fn merge(&mut self, layer: ConfigLayer) {
        if let Some(dir) = layer.editorial_dir {
            self.editorial_dir = dir;
        }
        if let Some(ttl) = layer.claims.ttl_minutes {
            self.claims.ttl_minutes = ttl;
        }
        if let Some(exclusive) = layer.claims.exclusive {
            self.claims.exclusive = exclusive;
        }
        if let Some(hours) = layer.status.recent_hours {
            self.status.recent_hours = hours;
        }
        if let Some(git_commit) = layer.audit.git_commit {
            self.audit.git_commit = git_commit;
        }
    }

    fn apply_env_vars(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = env("EDITORIAL_DIR").filter(|v| !v.is_empty()) {
            self.editorial_dir = PathBuf::from(value);
        }
        if let Some(value) = env("EDITORIAL_CLAIM_TTL_MINUTES") {
            self.claims.ttl_minutes = parse_int("EDITORIAL_CLAIM_TTL_MINUTES", &value)?;
        }
        if let Some(value) = env("EDITORIAL_EXCLUSIVE_CLAIMS") {
            self.claims.exclusive = parse_bool("EDITORIAL_EXCLUSIVE_CLAIMS", &value)?;
        }
        if let Some(value) = env("EDITORIAL_RECENT_HOURS") {
            self.status.recent_hours = parse_int("EDITORIAL_RECENT_HOURS", &value)?;
        }
        if let Some(value) = env("EDITORIAL_GIT_AUDIT") {
            self.audit.git_commit = parse_bool("EDITORIAL_GIT_AUDIT", &value)?;
        }
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty directory or non-positive durations.
    pub fn validate(&self) -> Result<()> {
        if self.editorial_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "editorial_dir cannot be empty".to_string(),
            ));
        }
        self.expiry_policy()?;
        self.recent_window()?;
        Ok(())
    }

    /// Lease expiry policy from `claims.ttl_minutes`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the TTL is not positive.
    pub fn expiry_policy(&self) -> Result<ExpiryPolicy> {
        ExpiryPolicy::new(Duration::minutes(self.claims.ttl_minutes))
    }

    /// Status report window from `status.recent_hours`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the window is not positive.
    pub fn recent_window(&self) -> Result<Duration> {
        if self.status.recent_hours <= 0 {
            return Err(Error::InvalidConfig(format!(
                "status.recent_hours must be positive, got {}",
                self.status.recent_hours
            )));
        }
        Ok(Duration::hours(self.status.recent_hours))
    }
}

fn parse_int(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{name} must be an integer, got '{value}'")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}
