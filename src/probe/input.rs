//! Operator input
//!
//! The captcha flow needs a person to read the saved image and type the code,
//! plus credentials. Those answers come through a `Prompter` so runs can also be
//! scripted.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use super::traits::ProbeError;

/// Prompt keys used by the scenarios
pub mod keys {
    pub const CAPTCHA_CODE: &str = "captcha_code";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const EMAIL: &str = "email";
    pub const INVITE_CODE: &str = "invite_code";
}

#[async_trait]
pub trait Prompter: Send {
    /// Return the trimmed answer for `key`, showing `label` to a human if there is one
    async fn ask(&mut self, key: &str, label: &str) -> Result<String, ProbeError>;
}

/// Reads answers line by line from stdin
pub struct TerminalPrompter {
    reader: BufReader<Stdin>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&mut self, key: &str, label: &str) -> Result<String, ProbeError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("   {label}: ").as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            // stdin closed
            return Err(ProbeError::Prompt(key.to_string()));
        }
        Ok(line.trim().to_string())
    }
}

/// Answers from a fixed script, optionally deferring to another prompter
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: HashMap<String, VecDeque<String>>,
    fallback: Option<Box<dyn Prompter>>,
}

impl ScriptedPrompter {
    pub fn new(answers: HashMap<String, Vec<String>>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            fallback: None,
        }
    }

    /// Queue one more answer for `key`
    pub fn answer(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers
            .entry(key.into())
            .or_default()
            .push_back(value.into());
        self
    }

    /// Ask `fallback` once the script runs out
    pub fn with_fallback(mut self, fallback: impl Prompter + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn remaining(&self, key: &str) -> usize {
        self.answers.get(key).map(VecDeque::len).unwrap_or(0)
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&mut self, key: &str, label: &str) -> Result<String, ProbeError> {
        if let Some(answer) = self.answers.get_mut(key).and_then(VecDeque::pop_front) {
            tracing::debug!(key, "Answered prompt from script");
            return Ok(answer.trim().to_string());
        }
        match self.fallback.as_mut() {
            Some(fallback) => fallback.ask(key, label).await,
            None => Err(ProbeError::Prompt(key.to_string())),
        }
    }
}
