//! Scenario trait and supporting types
//!
//! A `Scenario` drives a fixed chain of steps against the media API through a
//! `ProbeContext`. Steps record a `StepOutcome` each; the scenario folds them into
//! a `ScenarioResult` when it finishes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::input::Prompter;
use super::narrate::Narrator;
use crate::captcha::CaptchaError;
use crate::client::{MediaClient, MediaError};
use crate::config::Config;

/// Errors that abort a scenario
///
/// Unexpected HTTP statuses are not errors; they become failed `StepOutcome`s.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Cannot reach server: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("Client error: {0}")]
    Client(MediaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Captcha error: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("No answer for prompt {0:?}")]
    Prompt(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<MediaError> for ProbeError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Request(e) if e.is_connect() => ProbeError::Connection(e),
            other => ProbeError::Client(other),
        }
    }
}

/// How a single step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
    /// Failed, but a fallback step recovered
    Tolerated,
}

/// Result of one probe step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub verdict: Verdict,
    /// HTTP status observed, if a request was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl StepOutcome {
    pub fn passed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            verdict: Verdict::Passed,
            status: None,
            message: message.into(),
        }
    }

    pub fn failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            verdict: Verdict::Failed,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: reqwest::StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    pub fn is_passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.verdict == Verdict::Failed
    }
}

/// Overall result of a scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub passed: bool,
    pub outcomes: Vec<StepOutcome>,
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScenarioResult {
    /// A scenario passes when it ran at least one step and none failed
    pub fn new(scenario: impl Into<String>, outcomes: Vec<StepOutcome>, duration: Duration) -> Self {
        let passed = !outcomes.is_empty() && !outcomes.iter().any(StepOutcome::is_failed);
        Self {
            scenario: scenario.into(),
            passed,
            outcomes,
            duration,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step == step)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

/// Everything a scenario needs to run
pub struct ProbeContext {
    pub client: MediaClient,
    pub config: Config,
    pub narrator: Box<dyn Narrator>,
    pub prompter: Box<dyn Prompter>,
    /// Fixtures and the captcha image are written here
    workdir: PathBuf,
    outcomes: Vec<StepOutcome>,
}

impl ProbeContext {
    pub fn new(
        config: Config,
        narrator: Box<dyn Narrator>,
        prompter: Box<dyn Prompter>,
    ) -> Result<Self, ProbeError> {
        let client = MediaClient::new(&config.target.base_url)
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        Ok(Self {
            client,
            config,
            narrator,
            prompter,
            workdir: PathBuf::from("."),
            outcomes: Vec::new(),
        })
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Start a run: forget outcomes left by an earlier scenario
    pub fn begin(&mut self) -> Instant {
        self.outcomes.clear();
        Instant::now()
    }

    /// Record a step outcome and narrate it
    pub fn record(&mut self, outcome: StepOutcome) -> bool {
        let passed = outcome.is_passed();
        if passed {
            tracing::info!(step = %outcome.step, status = ?outcome.status, "Step passed");
            self.narrator.pass(&outcome.message);
        } else {
            tracing::warn!(step = %outcome.step, status = ?outcome.status, message = %outcome.message, "Step failed");
            self.narrator.fail(&outcome.message);
        }
        self.outcomes.push(outcome);
        passed
    }

    /// Downgrade the latest failure of `step` once a fallback recovered it
    pub fn tolerate(&mut self, step: &str) {
        if let Some(outcome) = self
            .outcomes
            .iter_mut()
            .rev()
            .find(|o| o.step == step && o.is_failed())
        {
            outcome.verdict = Verdict::Tolerated;
        }
    }

    /// Close the run: drain recorded outcomes into a result
    pub fn finish(&mut self, scenario: &str, started: Instant) -> ScenarioResult {
        let outcomes = std::mem::take(&mut self.outcomes);
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.is_passed()).count();
        ScenarioResult::new(scenario, outcomes, started.elapsed())
            .with_message(format!("{passed}/{total} steps passed"))
    }
}

/// A named, fixed chain of probe steps
///
/// ## Example Implementation
///
/// ```ignore
/// use async_trait::async_trait;
/// use mediaprobe::probe::{ProbeContext, ProbeError, Scenario, ScenarioResult};
///
/// pub struct PingScenario;
///
/// #[async_trait]
/// impl Scenario for PingScenario {
///     fn name(&self) -> &'static str { "ping" }
///     fn description(&self) -> &'static str { "Only hit the root endpoint" }
///
///     async fn run(&self, ctx: &mut ProbeContext) -> Result<ScenarioResult, ProbeError> {
///         let started = ctx.begin();
///         mediaprobe::probe::steps::health_check(ctx).await?;
///         Ok(ctx.finish(self.name(), started))
///     }
/// }
/// ```
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Unique name (used in CLI and config)
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Whether the scenario runs when the config does not mention it
    fn enabled_by_default(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<ScenarioResult, ProbeError>;
}
