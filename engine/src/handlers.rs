//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: Route a task through the agent pipeline and optionally save the
//!   approved code
//! - ask: Send prompts to a single agent and optionally save extracted code
//! - doctor: Validate configuration and agent construction
//! - config: Show the configuration location or contents

use anyhow::{Context, Result};
use sdk::agent::TaskAgent;
use sdk::errors::QuorumErrorExt;
use sdk::types::Generation;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::agent::Agent;
use crate::code::extract_code;
use crate::config::{AgentRole, Config};
use crate::orchestrator::{Orchestrator, RouteOutcome};
use crate::secrets::CredentialStore;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build the full pipeline from configuration.
///
/// Router, developer and verifier are required; the executor is built only
/// when configured.
pub fn build_orchestrator(config: &Config, credentials: &CredentialStore) -> Result<Orchestrator> {
    let router = Agent::from_config(AgentRole::Router, config, credentials)
        .context("Failed to build Router agent")?;
    let developer = Agent::from_config(AgentRole::Developer, config, credentials)
        .context("Failed to build Developer agent")?;
    let verifier = Agent::from_config(AgentRole::Verifier, config, credentials)
        .context("Failed to build Verifier agent")?;

    let executor = match config.agents.executor {
        Some(_) => Some(Box::new(
            Agent::from_config(AgentRole::Executor, config, credentials)
                .context("Failed to build Executor agent")?,
        ) as Box<dyn TaskAgent>),
        None => None,
    };

    Ok(Orchestrator::new(
        Box::new(router),
        Box::new(developer),
        Box::new(verifier),
        executor,
    ))
}

/// Route a task through the pipeline, print the outcome and optionally
/// write the first `lang` block of the approved code to `output`
pub async fn handle_run(
    task: String,
    lang: String,
    output: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let credentials = CredentialStore::from_env();
    let mut orchestrator = build_orchestrator(config, &credentials)?;

    if let OutputFormat::Text = format {
        println!("Routing task: {}", task);
        println!();
    }

    let outcome = orchestrator.route_task(&task).await;
    let saved = save_approved_code(&outcome, &lang, output.as_deref())?;

    match format {
        OutputFormat::Text => {
            let marker = if outcome.is_success() { "✓" } else { "✗" };
            println!("{} {}", marker, outcome);
            if let RouteOutcome::CodeExecuted { result, .. } = &outcome {
                println!();
                println!("{}", result);
            }
            if let (Some(path), Some(_)) = (&output, outcome.approved_code()) {
                println!();
                match &saved {
                    Some(_) => println!("✓ Code written to {}", path.display()),
                    None => println!("⚠ No ```{} block found; nothing written", lang),
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "task": task,
                "success": outcome.is_success(),
                "message": outcome.to_string(),
                "result": outcome,
                "saved_to": saved.map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    ensure_completed(&outcome)
}

/// Save the approved code of `outcome` when an output path was given
fn save_approved_code(
    outcome: &RouteOutcome,
    lang: &str,
    output: Option<&Path>,
) -> Result<Option<PathBuf>> {
    match (output, outcome.approved_code()) {
        (Some(path), Some(code)) => save_first_block(code, lang, path),
        _ => Ok(None),
    }
}

/// Error for a pass that ended because a backend call failed
fn ensure_completed(outcome: &RouteOutcome) -> Result<()> {
    if let RouteOutcome::BackendFailure { stage, message } = outcome {
        anyhow::bail!("{} stage failed: {}", stage, message);
    }
    Ok(())
}

/// Send prompts to one agent in order, print the last reply and optionally
/// write the first extracted code block to `output`
pub async fn handle_ask(
    role: AgentRole,
    prompts: Vec<String>,
    lang: String,
    output: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let credentials = CredentialStore::from_env();
    let mut agent = Agent::from_config(role, config, &credentials)
        .with_context(|| format!("Failed to build {} agent", role))?;

    let mut last = Generation::Empty(String::new());
    for prompt in &prompts {
        last = agent.run(prompt).await;
        if last.is_failure() {
            break;
        }
    }

    let saved = match (&output, last.is_failure()) {
        (Some(path), false) => save_first_block(last.text(), &lang, path)?,
        _ => None,
    };

    match format {
        OutputFormat::Text => {
            println!("{}", last);
            if let Some(path) = &output {
                println!();
                match &saved {
                    Some(_) => println!("✓ Code written to {}", path.display()),
                    None => println!("⚠ No ```{} block found; nothing written", lang),
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "agent": agent.name(),
                "generation": last,
                "saved_to": saved.map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if last.is_failure() {
        anyhow::bail!("{} request failed", role);
    }
    Ok(())
}

/// Write the first `lang` block of `text` to `path`; `None` when there is
/// no such block
fn save_first_block(text: &str, lang: &str, path: &Path) -> Result<Option<PathBuf>> {
    let Some(code) = extract_code(text, lang).into_iter().next() else {
        return Ok(None);
    };

    std::fs::write(path, code)
        .with_context(|| format!("Failed to write code to {}", path.display()))?;
    Ok(Some(path.to_path_buf()))
}

/// Validate configuration and try to construct every configured agent
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let credentials = CredentialStore::from_env();
    let mut checks: Vec<(String, String)> = Vec::new();
    let mut issues = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration".to_string(), "Valid".to_string()));

    for role in AgentRole::ALL {
        let Some(agent_config) = config.agents.get(role) else {
            checks.push((role.to_string(), "Not configured (optional)".to_string()));
            continue;
        };

        let label = format!("{} ({})", role, agent_config.backend);
        match Agent::from_config(role, config, &credentials) {
            Ok(agent) => {
                checks.push((
                    label,
                    format!(
                        "OK, model {}, key from {}",
                        agent.adapter().config().model,
                        credentials.describe_source(agent_config)
                    ),
                ));
            }
            Err(e) => {
                checks.push((label, "Error".to_string()));
                issues.push(format!("{}: {} ({})", role, e, e.user_hint()));
            }
        }
    }

    match format {
        OutputFormat::Text => {
            println!("Quorum Diagnostics");
            println!("==================");
            println!();

            println!("Agents:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the configuration file location
pub fn handle_config_path(path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "path": path.display().to_string() }))?
            );
        }
    }
    Ok(())
}

/// Print the effective configuration. Inline credentials are masked.
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    let mut masked = config.clone();
    for role in AgentRole::ALL {
        let agent = match role {
            AgentRole::Router => Some(&mut masked.agents.router),
            AgentRole::Developer => Some(&mut masked.agents.developer),
            AgentRole::Verifier => Some(&mut masked.agents.verifier),
            AgentRole::Executor => masked.agents.executor.as_mut(),
        };
        if let Some(agent) = agent {
            if agent.api_key.is_some() {
                agent.api_key = Some("[REDACTED]".to_string());
            }
        }
    }

    match format {
        OutputFormat::Text => {
            let toml_string =
                toml::to_string_pretty(&masked).context("Failed to serialize config")?;
            print!("{}", toml_string);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&masked)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Stage;

    #[test]
    fn test_save_first_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        let text = "```python\nprint('a')\n```\n```python\nprint('b')\n```";

        let saved = save_first_block(text, "python", &path).unwrap();
        assert_eq!(saved, Some(path.clone()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print('a')");
    }

    #[test]
    fn test_save_first_block_without_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");

        let saved = save_first_block("no code here", "python", &path).unwrap();
        assert!(saved.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_save_approved_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        let outcome = RouteOutcome::CodeExecuted {
            code: "Here you go:\n```python\nprint('ok')\n```".to_string(),
            result: "Saved".to_string(),
        };

        let saved = save_approved_code(&outcome, "python", Some(&path)).unwrap();
        assert_eq!(saved, Some(path.clone()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print('ok')");
    }

    #[test]
    fn test_save_approved_code_without_executor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        let outcome = RouteOutcome::NoExecutor {
            stage: Stage::Coding,
            code: Some("```python\nx = 1\n```".to_string()),
        };

        save_approved_code(&outcome, "python", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x = 1");
    }

    #[test]
    fn test_rejected_code_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        let outcome = RouteOutcome::Rejected {
            review: "```python\nx = 1\n```".to_string(),
        };

        assert!(save_approved_code(&outcome, "python", Some(&path))
            .unwrap()
            .is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_backend_failure_is_an_error() {
        let failed = RouteOutcome::BackendFailure {
            stage: Stage::Routing,
            message: "Error: Timeout".to_string(),
        };
        let err = ensure_completed(&failed).unwrap_err();
        assert_eq!(err.to_string(), "Routing stage failed: Error: Timeout");

        assert!(ensure_completed(&RouteOutcome::Unroutable).is_ok());
        assert!(ensure_completed(&RouteOutcome::Rejected {
            review: "REJECTED".to_string()
        })
        .is_ok());
    }

    #[test]
    fn test_build_orchestrator_reports_missing_credential() {
        let mut config = Config::default_config();
        config.agents.router.api_key_env = Some("QUORUM_TEST_UNSET_VARIABLE".to_string());
        let credentials = CredentialStore::new("quorum-test").without_keychain();

        let err = build_orchestrator(&config, &credentials).unwrap_err();
        assert!(err.to_string().contains("Router"));
    }

    #[test]
    fn test_build_orchestrator_with_inline_keys() {
        let mut config = Config::default_config();
        config.agents.router.api_key = Some("sk-router".to_string());
        config.agents.developer.api_key = Some("dev".to_string());
        config.agents.verifier.api_key = Some("sk-verifier".to_string());
        let credentials = CredentialStore::new("quorum-test").without_keychain();

        let orchestrator = build_orchestrator(&config, &credentials).unwrap();
        assert!(!orchestrator.has_executor());
    }
}
