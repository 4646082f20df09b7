//! Integration tests for configuration loading
//!
//! These tests write real files with `tempfile` and load them through the
//! public `Config` API.

use std::io::Write;

use quorum_engine::agent::Agent;
use quorum_engine::config::{AgentRole, Config};
use quorum_engine::llm::BackendKind;
use quorum_engine::secrets::CredentialStore;
use sdk::errors::EngineError;

const FULL_CONFIG: &str = r#"
[core]
log_level = "debug"

[memory]
max_history = 6

[http]
timeout_secs = 5

[agents.router]
backend = "openai"
model = "gpt-4"
api_key = "sk-router-inline"
temperature = 0.2

[agents.developer]
backend = "deepseek"
base_url = "http://localhost:11434/v1/chat/completions"
api_key = "my-deepseek-key"
system_prompt = "Only respond with code."

[agents.verifier]
backend = "ollama"
model = "qwen2.5-coder"
base_url = "http://localhost:11434"
api_key = "ollama"

[agents.executor]
backend = "openai"
api_key_env = "QUORUM_TEST_EXECUTOR_KEY_UNSET"
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config_from_file() {
    let file = write_config(FULL_CONFIG);
    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.memory.max_history, 6);
    assert_eq!(config.http.timeout_secs, 5);
    assert_eq!(config.agents.verifier.backend, BackendKind::Ollama);
    assert_eq!(config.agents.router.temperature, Some(0.2));
    assert!(config.agents.get(AgentRole::Executor).is_some());
}

#[test]
fn test_agents_build_from_file() {
    let file = write_config(FULL_CONFIG);
    let config = Config::load_from_path(file.path()).unwrap();
    let credentials = CredentialStore::new("quorum-test").without_keychain();

    let developer = Agent::from_config(AgentRole::Developer, &config, &credentials).unwrap();
    assert_eq!(developer.adapter().config().model, "deepseek-coder");
    assert_eq!(developer.adapter().memory().len(), 1);

    let verifier = Agent::from_config(AgentRole::Verifier, &config, &credentials).unwrap();
    assert_eq!(
        verifier.adapter().config().endpoint,
        "http://localhost:11434/api/chat"
    );
    assert_eq!(
        verifier.adapter().config().timeout,
        std::time::Duration::from_secs(5)
    );

    // No inline key, unset variable, keychain skipped
    let err = Agent::from_config(AgentRole::Executor, &config, &credentials).unwrap_err();
    assert!(matches!(err, EngineError::MissingCredential(agent) if agent == "Executor"));
}

#[test]
fn test_unsupported_model_fails_agent_construction() {
    let toml = FULL_CONFIG.replace("model = \"gpt-4\"", "model = \"claude-3-opus\"");
    let file = write_config(&toml);
    let config = Config::load_from_path(file.path()).unwrap();
    let credentials = CredentialStore::new("quorum-test").without_keychain();

    let err = Agent::from_config(AgentRole::Router, &config, &credentials).unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedModel { .. }));
}

#[test]
fn test_missing_endpoint_fails_agent_construction() {
    let toml = FULL_CONFIG.replace(
        "base_url = \"http://localhost:11434/v1/chat/completions\"\n",
        "",
    );
    let file = write_config(&toml);
    let config = Config::load_from_path(file.path()).unwrap();
    let credentials = CredentialStore::new("quorum-test").without_keychain();

    let err = Agent::from_config(AgentRole::Developer, &config, &credentials).unwrap_err();
    assert!(matches!(err, EngineError::MissingEndpoint { .. }));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let file = write_config(&FULL_CONFIG.replace("max_history = 6", "max_history = 0"));
    assert!(Config::load_from_path(file.path()).is_err());

    let file = write_config(&FULL_CONFIG.replace("log_level = \"debug\"", "log_level = \"chatty\""));
    assert!(Config::load_from_path(file.path()).is_err());

    let file = write_config("this is not toml [");
    let err = Config::load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, EngineError::Config(msg) if msg.contains("parse")));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}
