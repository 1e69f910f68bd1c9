//! Configuration management for PipeWrench.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - The workspace config file (`.pipewrench/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! A missing model API key is not a configuration failure. The answer pipeline
//! runs in demo mode instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default cap on document context characters sent to the model.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 100_000;

/// Default cap on generated answer tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default Claude model identifier.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Model used for Ollama when config.yaml names none.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Environment variable consulted for the Claude API key when no provider
/// config names another one.
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const KNOWN_PROVIDERS: [&str; 2] = ["claude", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .pipewrench/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active model provider ("claude" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Explicit API key (PIPEWRENCH_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Answer compliance settings
    pub compliance: ComplianceSettings,
}

/// LLM section of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Claude {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        #[serde(rename = "apiVersion")]
        api_version: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Claude { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Claude { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Settings that shape prompt composition and whitelist loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSettings {
    /// JSON file with whitelist entries merged over the built-in list
    #[serde(rename = "whitelistOverride", default)]
    pub whitelist_override: Option<PathBuf>,

    /// Document context budget in characters
    #[serde(rename = "maxContextChars", default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Maximum tokens requested from the model
    #[serde(rename = "maxTokens", default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            whitelist_override: None,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    compliance: Option<ComplianceFileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComplianceFileConfig {
    #[serde(rename = "whitelistOverride")]
    whitelist_override: Option<PathBuf>,
    #[serde(rename = "maxContextChars")]
    max_context_chars: Option<usize>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var).ok().map(PathBuf::from)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "claude".to_string(),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            compliance: ComplianceSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `PIPEWRENCH_WORKSPACE`: Override workspace path
    /// - `PIPEWRENCH_CONFIG`: Path to config file
    /// - `PIPEWRENCH_PROVIDER`: Model provider
    /// - `PIPEWRENCH_MODEL`: Model identifier
    /// - `PIPEWRENCH_API_KEY`: API key (takes precedence over the provider's key variable)
    /// - `PIPEWRENCH_WHITELIST`: Whitelist override JSON file
    /// - `PIPEWRENCH_MAX_CONTEXT_CHARS`: Document context budget
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use pipewrench_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Provider: {}", config.provider);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `PIPEWRENCH_WORKSPACE` / `PIPEWRENCH_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("PIPEWRENCH_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("PIPEWRENCH_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.pipewrench_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(provider) = std::env::var("PIPEWRENCH_PROVIDER") {
            config.switch_provider(provider);
        }

        if let Ok(model) = std::env::var("PIPEWRENCH_MODEL") {
            config.model = model;
        }

        if let Ok(path) = std::env::var("PIPEWRENCH_WHITELIST") {
            config.compliance.whitelist_override = Some(PathBuf::from(path));
        }

        if let Ok(raw) = std::env::var("PIPEWRENCH_MAX_CONTEXT_CHARS") {
            config.compliance.max_context_chars = raw.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "PIPEWRENCH_MAX_CONTEXT_CHARS must be a positive integer, got '{}'",
                    raw
                ))
            })?;
        }

        config.api_key = std::env::var("PIPEWRENCH_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(compliance) = config_file.compliance {
            if let Some(path) = compliance.whitelist_override {
                // Relative override paths are anchored at the workspace
                result.compliance.whitelist_override = Some(if path.is_relative() {
                    result.workspace.join(path)
                } else {
                    path
                });
            }
            if let Some(max_chars) = compliance.max_context_chars {
                result.compliance.max_context_chars = max_chars;
            }
            if let Some(max_tokens) = compliance.max_tokens {
                result.compliance.max_tokens = max_tokens;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.switch_provider(provider);
        }

        // An explicit model always wins over the provider's default
        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Model to use for `provider` when none is given explicitly.
    pub fn default_model_for(&self, provider: &str) -> String {
        match self.get_provider_config(provider) {
            Some(provider_config) => provider_config.model().to_string(),
            None if provider.eq_ignore_ascii_case("ollama") => DEFAULT_OLLAMA_MODEL.to_string(),
            None => DEFAULT_CLAUDE_MODEL.to_string(),
        }
    }

    /// Make `provider` active. A different provider also brings its own model.
    fn switch_provider(&mut self, provider: String) {
        if !provider.eq_ignore_ascii_case(&self.provider) {
            self.model = self.default_model_for(&provider);
        }
        self.provider = provider;
    }

    /// Get the path to the .pipewrench directory.
    pub fn pipewrench_dir(&self) -> PathBuf {
        self.workspace.join(".pipewrench")
    }

    /// Get the configuration of a named provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// API version header override for the active provider.
    pub fn provider_api_version(&self) -> Option<String> {
        match self.get_provider_config(&self.provider) {
            Some(ProviderConfig::Claude { api_version, .. }) => api_version.clone(),
            _ => None,
        }
    }

    /// Request timeout for the active provider, if configured.
    pub fn provider_timeout(&self) -> Option<Duration> {
        match self.get_provider_config(&self.provider) {
            Some(ProviderConfig::Ollama {
                timeout: Some(secs),
                ..
            }) => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Resolve the API key for a provider.
    ///
    /// `PIPEWRENCH_API_KEY` wins; otherwise the provider's `apiKeyEnv`
    /// variable is read, falling back to `ANTHROPIC_API_KEY` for Claude.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Claude { api_key_env, .. }) => Some(api_key_env.as_str()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider.eq_ignore_ascii_case("claude") => Some(DEFAULT_API_KEY_ENV),
            None => None,
        };

        env_var
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration.
    ///
    /// Missing API keys are deliberately not checked here.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.compliance.max_context_chars == 0 {
            return Err(AppError::Config(
                "maxContextChars must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
