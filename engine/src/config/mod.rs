//! Configuration management
//!
//! This module handles loading, validation, and management of the Quorum
//! configuration. Configuration is stored in TOML format at
//! ~/.quorum/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: log level
//! - **memory**: per-agent conversation bound
//! - **http**: backend request timeout
//! - **agents**: one table per pipeline role (router, developer, verifier,
//!   and the optional executor), each naming a backend, model, endpoint and
//!   where to find its credential
//!
//! Credentials are never required in this file: `api_key_env` names an
//! environment variable and the OS keychain is consulted last (see
//! [`crate::secrets::CredentialStore`]).
//!
//! # Examples
//!
//! ```no_run
//! use quorum_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Router backend: {}", config.agents.router.backend);
//! println!("History bound: {}", config.memory.max_history);
//! # Ok(())
//! # }
//! ```

use clap::ValueEnum;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::memory::DEFAULT_MAX_HISTORY;
use crate::llm::{deepseek, openai, BackendKind};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Backend transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-role agent definitions
    pub agents: AgentsConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum number of messages each agent keeps
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

/// Backend transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Agent definitions for each pipeline role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub router: AgentConfig,
    pub developer: AgentConfig,
    pub verifier: AgentConfig,

    /// Optional; without it approved code is reported but never executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<AgentConfig>,
}

impl AgentsConfig {
    /// Look up the agent configured for `role`
    pub fn get(&self, role: AgentRole) -> Option<&AgentConfig> {
        match role {
            AgentRole::Router => Some(&self.router),
            AgentRole::Developer => Some(&self.developer),
            AgentRole::Verifier => Some(&self.verifier),
            AgentRole::Executor => self.executor.as_ref(),
        }
    }
}

/// One agent's backend binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Backend family (openai, deepseek, ollama)
    pub backend: BackendKind,

    /// Model identifier; the backend default applies when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Backend endpoint; mandatory for deepseek and ollama
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Inline credential (prefer `api_key_env` or the keychain)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Output-length limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// System prompt; the role's built-in prompt applies when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl AgentConfig {
    /// Minimal definition for `backend` with every optional field unset
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            model: None,
            base_url: None,
            api_key: None,
            api_key_env: None,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
        }
    }

    fn normalize(&mut self) {
        for field in [
            &mut self.model,
            &mut self.base_url,
            &mut self.api_key,
            &mut self.api_key_env,
            &mut self.system_prompt,
        ] {
            *field = field
                .take()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }
    }
}

/// Pipeline roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Router,
    Developer,
    Verifier,
    Executor,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Router,
        AgentRole::Developer,
        AgentRole::Verifier,
        AgentRole::Executor,
    ];

    /// Agent display name
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Router => "Router",
            AgentRole::Developer => "Developer",
            AgentRole::Verifier => "Verifier",
            AgentRole::Executor => "Executor",
        }
    }

    /// Built-in system prompt for the role
    pub fn default_prompt(&self) -> &'static str {
        match self {
            AgentRole::Router => {
                "You are a routing agent. Based on the input, decide whether it needs coding, verification, or execution."
            }
            AgentRole::Developer => {
                "You are a developer. Given a task, write clean and functional Python code."
            }
            AgentRole::Verifier => {
                "You are a code reviewer. Review the code and return 'APPROVED' or 'REJECTED' with reasons."
            }
            AgentRole::Executor => {
                "You are an executor. If the code is approved, save it and confirm."
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.quorum/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// A leading `~` in `path` is expanded to the home directory.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let path = expand_path(path)?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;
        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path (~/.quorum/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".quorum").join("config.toml"))
    }

    /// Default configuration: OpenAI router and verifier, a local DeepSeek
    /// developer, no executor
    pub fn default_config() -> Self {
        let mut router = AgentConfig::new(BackendKind::OpenAI);
        router.model = Some(openai::DEFAULT_MODEL.to_string());
        router.api_key_env = Some("OPENAI_API_KEY".to_string());

        let mut developer = AgentConfig::new(BackendKind::DeepSeek);
        developer.model = Some(deepseek::DEFAULT_MODEL.to_string());
        developer.base_url = Some("http://localhost:11434/v1/chat/completions".to_string());
        developer.api_key_env = Some("DEEPSEEK_API_KEY".to_string());

        let mut verifier = AgentConfig::new(BackendKind::OpenAI);
        verifier.model = Some(openai::DEFAULT_MODEL.to_string());
        verifier.api_key_env = Some("OPENAI_API_KEY".to_string());

        Self {
            core: CoreConfig::default(),
            memory: MemoryConfig::default(),
            http: HttpConfig::default(),
            agents: AgentsConfig {
                router,
                developer,
                verifier,
                executor: None,
            },
        }
    }

    /// Validate configuration values and normalize agent tables
    ///
    /// Optional text fields are trimmed and blank ones dropped, so
    /// `base_url = ""` reads the same as an absent key. Backend-specific
    /// rules (model prefixes, endpoints, credentials) are checked when agents
    /// are built, not here.
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        self.agents.router.normalize();
        self.agents.developer.normalize();
        self.agents.verifier.normalize();
        if let Some(executor) = self.agents.executor.as_mut() {
            executor.normalize();
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.memory.max_history == 0 {
            return Err(EngineError::Config(
                "memory.max_history must be greater than 0".to_string(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(EngineError::Config(
                "http.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
