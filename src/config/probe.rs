//! Probe configuration types
//!
//! Defines the structure of `probe.yaml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Server root (e.g., "http://localhost:8080")
    pub base_url: String,
}

/// Username/password pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Account used for registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub username: String,

    /// Defaults to `<username>@example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub password: String,

    pub invite_code: String,

    /// Append a timestamp to the username so repeated runs register fresh users
    #[serde(default)]
    pub unique_username: bool,
}

impl AccountConfig {
    /// Username for this run, suffixed with unix seconds when `unique_username` is set
    pub fn username_for_run(&self) -> String {
        if self.unique_username {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            format!("{}_{secs}", self.username)
        } else {
            self.username.clone()
        }
    }

    pub fn email_for(&self, username: &str) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{username}@example.com"))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Upload and material-update parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Workflow to attach uploads to
    #[serde(default = "default_workflow_id")]
    pub workflow_id: Option<u64>,

    /// Upload this file instead of the generated fixture (quick scenario)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// New `original_filename` sent by the update step
    #[serde(default = "default_updated_filename")]
    pub updated_filename: String,

    #[serde(default = "default_true")]
    pub starred: bool,

    #[serde(default)]
    pub public: bool,
}

fn default_workflow_id() -> Option<u64> {
    Some(1)
}

fn default_updated_filename() -> String {
    "renamed_by_probe.txt".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            workflow_id: default_workflow_id(),
            file: None,
            updated_filename: default_updated_filename(),
            starred: true,
            public: false,
        }
    }
}

/// Captcha flow parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Where the decoded captcha is written, relative to the working directory
    #[serde(default = "default_image_path")]
    pub image_path: PathBuf,

    /// Pre-supplied prompt answers (prompt key -> answers in order)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub answers: HashMap<String, Vec<String>>,
}

fn default_image_path() -> PathBuf {
    PathBuf::from("captcha.png")
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            image_path: default_image_path(),
            answers: HashMap::new(),
        }
    }
}

/// Per-scenario switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub target: TargetConfig,

    pub account: AccountConfig,

    /// Login used when registration fails; defaults to the account credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_login: Option<Credentials>,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Scenario switches (scenario name -> config)
    #[serde(default)]
    pub scenarios: HashMap<String, ScenarioConfig>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = url::Url::parse(&self.target.base_url).map_err(|e| {
            ConfigError::Invalid(format!("target.base_url {:?}: {e}", self.target.base_url))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "target.base_url {:?} must start with http:// or https://",
                self.target.base_url
            )));
        }
        if self.account.username.trim().is_empty() {
            return Err(ConfigError::Invalid("account.username is empty".into()));
        }
        if self.account.password.is_empty() {
            return Err(ConfigError::Invalid("account.password is empty".into()));
        }
        Ok(())
    }

    /// Point the probe at another server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.target.base_url = base_url.into();
        self
    }

    /// Credentials for the login fallback after a failed registration
    pub fn fallback_credentials(&self) -> Credentials {
        self.fallback_login
            .clone()
            .unwrap_or_else(|| self.account.credentials())
    }

    /// Whether a scenario runs when none is named on the command line
    pub fn is_scenario_enabled(&self, name: &str, default: bool) -> bool {
        self.scenarios.get(name).map(|s| s.enabled).unwrap_or(default)
    }

    /// Generate a default configuration
    pub fn default_config() -> Self {
        Config {
            target: TargetConfig {
                base_url: "http://localhost:8080".to_string(),
            },
            account: AccountConfig {
                username: "probe_user".to_string(),
                email: None,
                password: "probe-password".to_string(),
                invite_code: "CHANGE_ME".to_string(),
                unique_username: true,
            },
            fallback_login: None,
            upload: UploadConfig::default(),
            captcha: CaptchaConfig::default(),
            scenarios: {
                let mut scenarios = HashMap::new();
                scenarios.insert("quick".to_string(), ScenarioConfig::default());
                scenarios.insert("full".to_string(), ScenarioConfig::default());
                scenarios.insert("captcha".to_string(), ScenarioConfig { enabled: false });
                scenarios
            },
        }
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
