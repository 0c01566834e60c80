//! Probe scenarios for the media cloud API
//!
//! This module provides the `Scenario` trait, the individual probe steps and
//! the three built-in scenarios.
//!
//! ## Scenarios
//!
//! - **quick**: health, register or login, one upload and update
//! - **full**: adds negative auth checks and a second upload
//! - **captcha**: interactive captcha verification feeding login and register
//!
//! ## Adding New Scenarios
//!
//! 1. Create a new file in `src/probe/` chaining functions from `steps`
//! 2. Implement the `Scenario` trait
//! 3. Register in `registry.rs`

mod captcha_flow;
mod full;
pub mod input;
pub mod narrate;
mod quick;
pub mod registry;
pub mod steps;
mod traits;

pub use captcha_flow::CaptchaScenario;
pub use full::{FullScenario, IMAGE_FIXTURE, TEXT_FIXTURE};
pub use input::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use narrate::{ConsoleNarrator, Narrator, Transcript};
pub use quick::{QuickScenario, UPLOAD_FIXTURE};
pub use registry::SCENARIOS;
pub use traits::*;
