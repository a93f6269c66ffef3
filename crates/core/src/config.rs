//! Configuration management for the Compliance Assistant.
//!
//! Configuration is merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.compliance/config.yaml` or `COMPLIANCE_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with session state stored in `.compliance/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Environment variable holding the GigaChat authorization key by default.
pub const DEFAULT_GIGACHAT_KEY_ENV: &str = "GIGACHAT_AUTH_KEY";

/// Providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gigachat", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .compliance/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat provider ("gigachat", "ollama")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// `model` came from `COMPLIANCE_MODEL` or `--model` and beats
    /// provider-specific variables
    #[serde(default)]
    pub model_pinned: bool,

    /// Explicit credential override (`COMPLIANCE_API_KEY`)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
    GigaChat {
        model: String,
        #[serde(rename = "authKeyEnv")]
        auth_key_env: Option<String>,
        scope: Option<String>,
        #[serde(rename = "verifyTls")]
        verify_tls: Option<bool>,
        #[serde(rename = "authUrl")]
        auth_url: Option<String>,
        #[serde(rename = "chatUrl")]
        chat_url: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Ollama { model, .. } | Self::GigaChat { model, .. } => model,
        }
    }

    /// Request timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::Ollama { timeout, .. } | Self::GigaChat { timeout, .. } => *timeout,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gigachat".to_string(),
            model: "GigaChat-Pro".to_string(),
            model_pinned: false,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `COMPLIANCE_WORKSPACE`: Override workspace path
    /// - `COMPLIANCE_CONFIG`: Path to config file
    /// - `COMPLIANCE_PROVIDER`: Chat provider
    /// - `COMPLIANCE_MODEL`: Model identifier
    /// - `COMPLIANCE_API_KEY`: Credential override
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("COMPLIANCE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("COMPLIANCE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.compliance_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(provider) = std::env::var("COMPLIANCE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("COMPLIANCE_MODEL") {
            config.model = model;
            config.model_pinned = true;
        }

        config.api_key = std::env::var("COMPLIANCE_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
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

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
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
    /// CLI flags take precedence over environment variables and the config file.
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
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
            self.model_pinned = true;
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

    /// Get the path to the .compliance directory.
    pub fn compliance_dir(&self) -> PathBuf {
        self.workspace.join(".compliance")
    }

    /// Ensure the .compliance directory exists.
    pub fn ensure_compliance_dir(&self) -> AppResult<()> {
        let dir = self.compliance_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .compliance directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get a provider's configuration block, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Resolve the credential for a provider.
    ///
    /// `COMPLIANCE_API_KEY` wins; otherwise GigaChat reads the environment
    /// variable named by `authKeyEnv` (default `GIGACHAT_AUTH_KEY`).
    /// Blank values count as missing.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }

        if provider != "gigachat" {
            return None;
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::GigaChat {
                auth_key_env: Some(env),
                ..
            }) => env,
            _ => DEFAULT_GIGACHAT_KEY_ENV.to_string(),
        };

        std::env::var(&env_var)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Validate configuration for the active provider.
    ///
    /// Runs before any network call so a missing credential stops the
    /// pipeline up front.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "gigachat" && self.resolve_api_key(provider).is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::GigaChat {
                    auth_key_env: Some(env),
                    ..
                }) => env,
                _ => DEFAULT_GIGACHAT_KEY_ENV.to_string(),
            };
            return Err(AppError::Config(format!(
                "{} is missing: GigaChat needs an authorization key",
                env_var
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gigachat");
        assert_eq!(config.model, "GigaChat-Pro");
        assert!(!config.model_pinned);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_compliance_dir() {
        let config = AppConfig::default();
        assert!(config.compliance_dir().ends_with(".compliance"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.model_pinned);
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_key_resolves_for_gigachat() {
        let mut config = AppConfig::default();
        config.api_key = Some("  c2VjcmV0  ".to_string());
        assert_eq!(
            config.resolve_api_key("gigachat"),
            Some("c2VjcmV0".to_string())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_custom_key_env_is_config_error() {
        let mut config = AppConfig::default();
        let mut providers = HashMap::new();
        providers.insert(
            "gigachat".to_string(),
            ProviderConfig::GigaChat {
                model: "GigaChat".to_string(),
                auth_key_env: Some("COMPLIANCE_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
                scope: None,
                verify_tls: None,
                auth_url: None,
                chat_url: None,
                timeout: None,
            },
        );
        config.llm = Some(LlmConfig {
            active_provider: "gigachat".to_string(),
            providers,
        });

        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err
            .to_string()
            .contains("COMPLIANCE_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_merge_yaml_selects_active_provider() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: qwen2.5
    gigachat:
      model: GigaChat-Max
      scope: GIGACHAT_API_CORP
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "qwen2.5");
        assert!(!merged.model_pinned);
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert!(merged.no_color);
        assert!(matches!(
            merged.get_provider_config("gigachat"),
            Some(ProviderConfig::GigaChat { .. })
        ));
    }
}
