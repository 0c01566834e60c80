//! Media API Client
//!
//! Hand-written client for the media cloud HTTP API.

mod media;
mod types;

pub use media::{API_PREFIX, MediaClient, MediaError, MediaResult, Reply};
pub use types::*;
