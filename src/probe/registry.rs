//! Scenario registry
//!
//! Central table of runnable scenarios, kept in the order they run when no
//! scenario is named on the command line.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

use super::traits::Scenario;
use super::{CaptchaScenario, FullScenario, QuickScenario};

/// Global registry of all available scenarios
pub static SCENARIOS: Lazy<IndexMap<&'static str, Arc<dyn Scenario>>> = Lazy::new(|| {
    let mut m: IndexMap<&'static str, Arc<dyn Scenario>> = IndexMap::new();

    m.insert("quick", Arc::new(QuickScenario));
    m.insert("full", Arc::new(FullScenario));
    // interactive; only runs when enabled or named explicitly
    m.insert("captcha", Arc::new(CaptchaScenario));

    m
});

/// Get a scenario by name
pub fn get_scenario(name: &str) -> Option<Arc<dyn Scenario>> {
    SCENARIOS.get(name).cloned()
}

/// List all scenario names in run order
pub fn list_scenarios() -> Vec<&'static str> {
    SCENARIOS.keys().copied().collect()
}
