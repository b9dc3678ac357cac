//! Client configuration, parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use crate::app::AppSettings;
use anyhow::{Context, Result};
use btcwill_form::{StepLayout, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// General client settings
    #[serde(default)]
    pub client: ClientSection,

    /// Backend connection
    #[serde(default)]
    pub api: ApiSection,

    /// Local state
    #[serde(default)]
    pub storage: StorageSection,

    /// Will wizard behaviour
    #[serde(default)]
    pub wizard: WizardSection,
}

/// General client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout; unset means wait indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

/// Local state settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory holding the saved session
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Will wizard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSection {
    /// 4 (implicit review) or 5 (explicit review step)
    #[serde(default = "default_steps")]
    pub steps: usize,

    /// Primary beneficiary percentages must total 100
    #[serde(default = "default_true")]
    pub enforce_primary_total: bool,

    /// Generate the PDF without storing the will server-side
    #[serde(default)]
    pub session_only: bool,
}

impl Default for WizardSection {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            enforce_primary_total: true,
            session_only: false,
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".btcwill"),
        None => PathBuf::from(".btcwill"),
    }
}

fn default_steps() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Config file looked up when `--config` is not given
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ClientConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `BTCWILL_API_URL`
    /// - `BTCWILL_TIMEOUT_SECS`
    /// - `BTCWILL_DATA_DIR`
    /// - `BTCWILL_LOG_LEVEL`
    /// - `BTCWILL_WIZARD_STEPS`
    /// - `BTCWILL_SESSION_ONLY`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BTCWILL_API_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = std::env::var("BTCWILL_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse::<u64>() {
                self.api.timeout_secs = Some(secs);
            }
        }
        if let Ok(v) = std::env::var("BTCWILL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("BTCWILL_LOG_LEVEL") {
            self.client.log_level = v;
        }
        if let Ok(v) = std::env::var("BTCWILL_WIZARD_STEPS") {
            if let Ok(steps) = v.parse::<usize>() {
                self.wizard.steps = steps;
            }
        }
        if let Ok(v) = std::env::var("BTCWILL_SESSION_ONLY") {
            self.wizard.session_only = matches!(v.as_str(), "1" | "true" | "yes");
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }

    pub fn layout(&self) -> StepLayout {
        StepLayout::from_step_count(self.wizard.steps).unwrap_or(StepLayout::FourPanel)
    }

    /// Wizard and submission settings for [`crate::App`]
    pub fn settings(&self) -> AppSettings {
        AppSettings {
            layout: self.layout(),
            policy: ValidationPolicy {
                enforce_primary_total: self.wizard.enforce_primary_total,
            },
            session_only: self.wizard.session_only,
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let url = &self.api.base_url;
        anyhow::ensure!(
            url.starts_with("http://") || url.starts_with("https://"),
            "api.base_url must start with http:// or https://"
        );

        if let Some(secs) = self.api.timeout_secs {
            anyhow::ensure!(secs > 0, "api.timeout_secs must be > 0");
        }

        anyhow::ensure!(
            StepLayout::from_step_count(self.wizard.steps).is_some(),
            "wizard.steps must be 4 or 5"
        );

        anyhow::ensure!(
            !self.storage.data_dir.as_os_str().is_empty(),
            "storage.data_dir must not be empty"
        );

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
