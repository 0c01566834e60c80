//! Configuration parsing
//!
//! Handles parsing of the probe configuration file.
//!
//! ## Configuration Format
//!
//! ```yaml
//! target:
//!   base_url: http://localhost:8080
//!
//! account:
//!   username: probe_user
//!   password: probe-password
//!   invite_code: CHANGE_ME
//!   unique_username: true
//!
//! fallback_login:
//!   username: admin
//!   password: admin-password
//!
//! upload:
//!   workflow_id: 1
//!   updated_filename: renamed_by_probe.txt
//!
//! captcha:
//!   image_path: captcha.png
//!   answers:
//!     username: [probe_user, probe_user2]
//!
//! scenarios:
//!   captcha:
//!     enabled: false
//! ```

mod probe;

pub use probe::{
    AccountConfig, CaptchaConfig, Config, ConfigError, Credentials, ScenarioConfig, TargetConfig,
    UploadConfig,
};
