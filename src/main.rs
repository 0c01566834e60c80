//! mediaprobe CLI - smoke probe for the media cloud API
//!
//! Run scripted request chains against a media server and report what passed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mediaprobe::config::Config;
use mediaprobe::probe::registry::{SCENARIOS, get_scenario};
use mediaprobe::probe::{
    ConsoleNarrator, ProbeContext, ProbeError, Scenario, ScriptedPrompter, TerminalPrompter,
};

/// mediaprobe - poke a media cloud server and see what answers
#[derive(Debug, Parser)]
#[command(name = "mediaprobe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging and full response dumps
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run scenarios against a server
    Run {
        /// Path to probe configuration file
        #[arg(short, long, default_value = "probe.yaml")]
        config: String,

        /// Scenario to run (default: every enabled scenario)
        #[arg(short, long)]
        scenario: Option<String>,

        /// Override target.base_url from the config
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Generate a default configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "probe.yaml")]
        output: String,
    },

    /// List available scenarios
    List,

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "probe.yaml")]
        config: String,
    },
}

fn setup_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // narration owns stdout
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json);

    match cli.command {
        Commands::Run {
            config: config_path,
            scenario,
            base_url,
        } => run_scenarios(&config_path, scenario.as_deref(), base_url, cli.verbose).await,

        Commands::Init { output } => init_config(&output),

        Commands::List => {
            list_scenarios();
            Ok(())
        }

        Commands::Validate {
            config: config_path,
        } => validate_config(&config_path),
    }
}

/// Run one named scenario, or every enabled one in registry order
async fn run_scenarios(
    config_path: &str,
    scenario: Option<&str>,
    base_url: Option<String>,
    verbose: bool,
) -> Result<()> {
    tracing::info!(config = %config_path, "Loading configuration");

    let mut config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    if let Some(url) = base_url {
        config = config.with_base_url(url);
        config.validate().context("Invalid --base-url")?;
    }

    let scenarios: Vec<Arc<dyn Scenario>> = match scenario {
        Some(name) => vec![get_scenario(name).with_context(|| {
            format!("Unknown scenario {name:?}, see `mediaprobe list`")
        })?],
        None => SCENARIOS
            .values()
            .filter(|s| config.is_scenario_enabled(s.name(), s.enabled_by_default()))
            .cloned()
            .collect(),
    };

    if scenarios.is_empty() {
        tracing::warn!("No scenarios to run");
        return Ok(());
    }

    let prompter = ScriptedPrompter::new(config.captcha.answers.clone())
        .with_fallback(TerminalPrompter::new());
    let mut ctx = ProbeContext::new(
        config,
        Box::new(ConsoleNarrator::new(verbose)),
        Box::new(prompter),
    )
    .context("Failed to create probe context")?;

    println!("🚀 mediaprobe against {}", ctx.client.base_url());
    println!("{}", "=".repeat(60));

    let mut all_passed = true;
    for scenario in scenarios {
        println!("\n▶ {} - {}", scenario.name(), scenario.description());
        match scenario.run(&mut ctx).await {
            Ok(result) => {
                if result.passed {
                    tracing::info!(
                        scenario = %result.scenario,
                        duration_ms = result.duration.as_millis(),
                        message = ?result.message,
                        "Scenario PASSED"
                    );
                } else {
                    tracing::error!(
                        scenario = %result.scenario,
                        duration_ms = result.duration.as_millis(),
                        message = ?result.message,
                        failed_steps = ?result.failed_steps().map(|o| o.step.as_str()).collect::<Vec<_>>(),
                        "Scenario FAILED"
                    );
                    all_passed = false;
                }
                println!(
                    "\n{} {}: {}",
                    if result.passed { "🎉" } else { "💥" },
                    result.scenario,
                    result.message.as_deref().unwrap_or_default()
                );
            }
            Err(ProbeError::Connection(e)) => {
                tracing::error!(scenario = scenario.name(), error = %e, "Server unreachable");
                anyhow::bail!("Server unreachable: {e}");
            }
            Err(e) => {
                tracing::error!(scenario = scenario.name(), error = %e, "Scenario error");
                all_passed = false;
            }
        }
    }

    println!("{}", "=".repeat(60));
    if all_passed {
        tracing::info!("All scenarios PASSED");
        Ok(())
    } else {
        anyhow::bail!("Some scenarios FAILED")
    }
}

/// Generate a default configuration file
fn init_config(output: &str) -> Result<()> {
    let config = Config::default_config();
    let yaml = config.to_yaml().context("Failed to serialize config")?;

    std::fs::write(output, &yaml).with_context(|| format!("Failed to write config to {output}"))?;

    tracing::info!(path = %output, "Configuration file created");
    println!("Created {output}");
    println!();
    println!("Set target.base_url and account.invite_code, then run:");
    println!("  mediaprobe run --config {output}");

    Ok(())
}

/// List available scenarios
fn list_scenarios() {
    println!("Available scenarios:");
    println!();

    for (name, scenario) in SCENARIOS.iter() {
        let note = if scenario.enabled_by_default() {
            ""
        } else {
            " (off unless enabled)"
        };
        println!("  {name:10} - {}{note}", scenario.description());
    }

    println!();
    println!("Run a specific scenario with:");
    println!("  mediaprobe run --scenario quick");
}

/// Validate a configuration file
fn validate_config(config_path: &str) -> Result<()> {
    tracing::info!(config = %config_path, "Validating configuration");

    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    println!("Configuration is valid!");
    println!();
    println!("Target: {}", config.target.base_url);
    println!(
        "Account: {} (unique per run: {})",
        config.account.username, config.account.unique_username
    );
    println!("Fallback login: {}", config.fallback_credentials().username);
    match config.upload.workflow_id {
        Some(id) => println!("Upload workflow: {id}"),
        None => println!("Upload workflow: none"),
    }
    println!("Captcha image: {}", config.captcha.image_path.display());

    println!();
    println!("Scenarios:");
    for (name, scenario) in SCENARIOS.iter() {
        let status = if config.is_scenario_enabled(name, scenario.enabled_by_default()) {
            "enabled"
        } else {
            "disabled"
        };
        println!("  - {name}: {status}");
    }

    Ok(())
}
