//! mediaprobe - smoke probe for the media cloud HTTP API
//!
//! Drives short, strictly sequential request chains against a running media
//! server (registration, login, captcha verification, material upload and
//! update) and narrates what happened to the console.
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the media API
//! - [`probe`] - Scenarios, steps, narration and operator input
//! - [`config`] - `probe.yaml` parsing
//! - [`session`] - Bearer token carried between steps
//! - [`fixtures`] - Temporary upload files
//! - [`captcha`] - Captcha image decoding

pub mod captcha;
pub mod client;
pub mod config;
pub mod fixtures;
pub mod probe;
pub mod session;
