pub mod string;

pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use std::sync::OnceLock;

use crate::config::AgentConfig;

/// Keychain service name under which backend credentials are stored
pub const KEYCHAIN_SERVICE: &str = "quorum";

/// CredentialStore resolves the credential each agent hands to its adapter.
///
/// Lookup order for one agent:
/// 1. inline `api_key` from the agent's config table
/// 2. the environment variable named by `api_key_env` (a `.env` file in the
///    working directory is loaded first)
/// 3. the OS keychain entry `<backend>_api_key` under the store's service
///
/// Secrets live in:
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service (libsecret)
///
/// Nothing here prompts. A credential missing everywhere resolves to `None`
/// and adapter construction reports it.
pub struct CredentialStore {
    service_name: String,
    use_keychain: bool,
}

/// Regex patterns for detecting common secret formats.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns match:
/// - OpenAI style keys: sk-[a-zA-Z0-9-_]{20,}
/// - GitHub tokens: ghp_[a-zA-Z0-9]{36}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            // Covers sk-proj-, sk-test- and similar variants
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"ghp_[a-zA-Z0-9]{36}",
            r"Bearer\s+[^\s]{20,}",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Replace API-key shaped substrings with `[REDACTED]`.
///
/// Applied to every backend error before it is logged or returned as a
/// failed generation.
///
/// # Examples
/// ```
/// use quorum_engine::secrets::scrub_secrets;
///
/// let scrubbed = scrub_secrets("My API key is sk-1234567890abcdefghij");
/// assert_eq!(scrubbed, "My API key is [REDACTED]");
/// ```
pub fn scrub_secrets(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in get_secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}

impl CredentialStore {
    /// Creates a store that consults the keychain under `service_name`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            use_keychain: true,
        }
    }

    /// Store for the CLI: loads `.env` if present, then uses the default
    /// keychain service.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::new(KEYCHAIN_SERVICE)
    }

    /// Skip the keychain (headless machines, tests)
    pub fn without_keychain(mut self) -> Self {
        self.use_keychain = false;
        self
    }

    /// Resolve `agent`'s credential from config, process environment, then
    /// keychain.
    pub fn resolve(&self, agent: &AgentConfig) -> Option<SecretString> {
        self.resolve_with_env(agent, |name| std::env::var(name).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an explicit environment lookup.
    pub fn resolve_with_env(
        &self,
        agent: &AgentConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<SecretString> {
        if let Some(key) = non_blank(agent.api_key.clone()) {
            tracing::debug!("Using inline credential for {}", agent.backend);
            return Some(SecretString::new(key));
        }

        if let Some(var) = agent.api_key_env.as_deref() {
            if let Some(key) = non_blank(env(var)) {
                tracing::debug!("Using credential from ${} for {}", var, agent.backend);
                return Some(SecretString::new(key));
            }
        }

        if self.use_keychain {
            let key = keychain_key(agent);
            if let Some(secret) = self.get_secret(&key) {
                tracing::debug!("Using keychain credential '{}'", key);
                return Some(SecretString::new(secret));
            }
        }

        None
    }

    /// Where a credential would come from, without revealing it
    pub fn describe_source(&self, agent: &AgentConfig) -> String {
        if non_blank(agent.api_key.clone()).is_some() {
            return "inline api_key".to_string();
        }
        if let Some(var) = agent.api_key_env.as_deref() {
            if non_blank(std::env::var(var).ok()).is_some() {
                return format!("${}", var);
            }
        }
        let key = keychain_key(agent);
        if self.use_keychain && self.get_secret(&key).is_some() {
            return format!("keychain ({}/{})", self.service_name, key);
        }
        "not found".to_string()
    }

    /// Non-interactive keychain lookup. Missing entries and keychain
    /// failures both read as absent.
    fn get_secret(&self, key: &str) -> Option<String> {
        let entry = match Entry::new(&self.service_name, key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Keychain unavailable: {}", e);
                return None;
            }
        };

        match entry.get_password() {
            Ok(secret) => non_blank(Some(secret)),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Failed to read keychain entry '{}': {}", key, e);
                None
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(KEYCHAIN_SERVICE)
    }
}

/// Keychain user name for an agent's backend
fn keychain_key(agent: &AgentConfig) -> String {
    format!("{}_api_key", agent.backend)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
