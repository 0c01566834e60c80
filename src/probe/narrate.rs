//! Console narration
//!
//! Probe results are meant to be read by a person. `ConsoleNarrator` prints
//! them to stdout; `Transcript` keeps them in memory for tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::Reply;

const RULE_WIDTH: usize = 50;

/// Receiver of human-readable progress
pub trait Narrator: Send {
    fn section(&mut self, title: &str);
    fn pass(&mut self, message: &str);
    fn fail(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    fn info(&mut self, message: &str);
    /// Full dump of one HTTP exchange
    fn exchange(&mut self, title: &str, reply: &Reply);
}

/// Render a reply as status, headers and pretty body
pub fn render_exchange(title: &str, reply: &Reply) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("{rule}\nrequest: {title}\nstatus: {}\n", reply.status());
    out.push_str("headers:\n");
    for (name, value) in reply.headers() {
        out.push_str(&format!(
            "  {name}: {}\n",
            value.to_str().unwrap_or("<binary>")
        ));
    }
    let body = reply
        .value()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| reply.text().to_string());
    out.push_str(&format!("body: {body}\n{rule}"));
    out
}

/// Prints to stdout
#[derive(Debug, Default)]
pub struct ConsoleNarrator {
    verbose: bool,
}

impl ConsoleNarrator {
    /// `verbose` also dumps every HTTP exchange
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Narrator for ConsoleNarrator {
    fn section(&mut self, title: &str) {
        println!("\n{title}");
    }

    fn pass(&mut self, message: &str) {
        println!("✅ {message}");
    }

    fn fail(&mut self, message: &str) {
        println!("❌ {message}");
    }

    fn warn(&mut self, message: &str) {
        println!("⚠️  {message}");
    }

    fn info(&mut self, message: &str) {
        println!("   {message}");
    }

    fn exchange(&mut self, title: &str, reply: &Reply) {
        if self.verbose {
            println!("{}", render_exchange(title, reply));
        } else {
            println!("   {title}: {}", reply.status());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Section,
    Pass,
    Fail,
    Warn,
    Info,
    Exchange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

/// In-memory narrator; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<Line>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, kind: LineKind, text: impl Into<String>) {
        self.lines.lock().push(Line {
            kind,
            text: text.into(),
        });
    }

    pub fn lines(&self) -> Vec<Line> {
        self.lines.lock().clone()
    }

    pub fn of_kind(&self, kind: LineKind) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.text.clone())
            .collect()
    }

    pub fn passes(&self) -> Vec<String> {
        self.of_kind(LineKind::Pass)
    }

    pub fn failures(&self) -> Vec<String> {
        self.of_kind(LineKind::Fail)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.text.contains(needle))
    }
}

impl Narrator for Transcript {
    fn section(&mut self, title: &str) {
        self.push(LineKind::Section, title);
    }

    fn pass(&mut self, message: &str) {
        self.push(LineKind::Pass, message);
    }

    fn fail(&mut self, message: &str) {
        self.push(LineKind::Fail, message);
    }

    fn warn(&mut self, message: &str) {
        self.push(LineKind::Warn, message);
    }

    fn info(&mut self, message: &str) {
        self.push(LineKind::Info, message);
    }

    fn exchange(&mut self, title: &str, reply: &Reply) {
        self.push(LineKind::Exchange, format!("{title}: {}", reply.status().as_u16()));
    }
}
