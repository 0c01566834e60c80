//! mediaprobe Test Kit
//!
//! Test infrastructure for the media API probe.
//!
//! This crate provides:
//! - A scriptable mock media server built on `wiremock`
//! - Valid captcha image payloads
//!
//! # Example
//!
//! ```rust,no_run
//! use mediaprobe_testkit::MockMediaApi;
//!
//! # async fn example() {
//! let api = MockMediaApi::start().await;
//! api.health(200).await;
//! api.register_created("token-1", 7).await;
//!
//! // point the probe at api.uri()
//! # }
//! ```

pub mod mock;

pub use mock::{MockMediaApi, NoAuthorization, png_bytes, png_data_uri};
