//! Configuration management for the hybrid RAG tool.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.hybrid-rag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Configuration is loaded once at startup and then handed to the clients
//! that need it; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Directory (relative to the workspace) holding config and prompt files.
pub const CONFIG_DIR_NAME: &str = ".hybrid-rag";

/// LLM providers understood by the client factory.
pub const KNOWN_PROVIDERS: [&str; 3] = ["groq", "openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .hybrid-rag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Search backend settings
    pub search: SearchSettings,

    /// LLM provider settings
    pub llm: LlmSettings,

    /// Prompt template overrides
    pub prompts: PromptSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Search backend (Elasticsearch) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Elastic Cloud deployment ID
    #[serde(rename = "cloudId")]
    pub cloud_id: Option<String>,

    /// Direct cluster URL, used when no cloud ID is configured
    pub url: Option<String>,

    /// API key sent as `Authorization: ApiKey <key>`
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,

    /// Index queried by every request
    pub index: String,

    /// Request timeout in seconds
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,

    /// Result-count limit
    #[serde(rename = "maxResults")]
    pub max_results: usize,

    /// Main text field, target of the keyword sub-query
    #[serde(rename = "textField")]
    pub text_field: String,

    /// Vector field, target of the semantic sub-query
    #[serde(rename = "semanticField")]
    pub semantic_field: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cloud_id: None,
            url: None,
            api_key: None,
            api_key_env: None,
            index: "documentos".to_string(),
            timeout_secs: 30,
            max_results: 5,
            text_field: "texto".to_string(),
            semantic_field: "semantic_text".to_string(),
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider name ("groq", "openai", "ollama")
    pub provider: String,

    /// API key for the provider
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Custom endpoint (base URL) for the provider
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            api_key: None,
            api_key_env: None,
            model: "llama3-70b-8192".to_string(),
            temperature: 0.3,
            endpoint: None,
            timeout_secs: 60,
        }
    }
}

impl LlmSettings {
    /// Environment variable conventionally holding the key for a provider.
    pub fn default_api_key_env(provider: &str) -> Option<&'static str> {
        match provider.to_lowercase().as_str() {
            "groq" => Some("GROQ_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    /// Whether the configured provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        Self::default_api_key_env(&self.provider).is_some()
    }
}

/// Prompt template overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory holding `<id>.yml` prompt definitions
    pub dir: Option<PathBuf>,

    /// Inline override for the query-preparation template
    #[serde(rename = "queryTemplate")]
    pub query_template: Option<String>,

    /// Inline override for the answer-generation template
    #[serde(rename = "answerTemplate")]
    pub answer_template: Option<String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    search: Option<SearchSettings>,
    llm: Option<LlmSettings>,
    prompts: Option<PromptSettings>,
    logging: Option<LoggingConfig>,
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
            search: SearchSettings::default(),
            llm: LlmSettings::default(),
            prompts: PromptSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `HYBRID_RAG_WORKSPACE`, `HYBRID_RAG_CONFIG`
    /// - `ES_CLOUD_ID`, `ES_URL`, `ES_API_KEY`, `ES_INDEX`, `ES_TIMEOUT`,
    ///   `ES_MAX_RESULTS`, `ES_TEXT_FIELD`, `ES_SEMANTIC_FIELD`
    /// - `LLM_PROVIDER`, `LLM_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY`,
    ///   `LLM_MODEL`, `LLM_TEMPERATURE`, `LLM_ENDPOINT`
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use hybrid_rag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {}", config.search.index);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to read environment variables.
    pub fn load_with<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(workspace) = lookup("HYBRID_RAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = lookup("HYBRID_RAG_CONFIG") {
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
            .unwrap_or_else(|| config.config_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        config.apply_env(lookup)?;

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

        if let Some(search) = config_file.search {
            result.search = search;
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        if let Some(prompts) = config_file.prompts {
            result.prompts = prompts;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply environment variable overrides and resolve API keys.
    fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Search backend
        if let Some(cloud_id) = lookup("ES_CLOUD_ID") {
            self.search.cloud_id = Some(cloud_id);
        }
        if let Some(url) = lookup("ES_URL") {
            self.search.url = Some(url);
        }
        if let Some(api_key) = lookup("ES_API_KEY") {
            self.search.api_key = Some(api_key);
        }
        if let Some(index) = lookup("ES_INDEX") {
            self.search.index = index;
        }
        if let Some(timeout) = lookup("ES_TIMEOUT") {
            self.search.timeout_secs = parse_env("ES_TIMEOUT", &timeout)?;
        }
        if let Some(max_results) = lookup("ES_MAX_RESULTS") {
            self.search.max_results = parse_env("ES_MAX_RESULTS", &max_results)?;
        }
        if let Some(text_field) = lookup("ES_TEXT_FIELD") {
            self.search.text_field = text_field;
        }
        if let Some(semantic_field) = lookup("ES_SEMANTIC_FIELD") {
            self.search.semantic_field = semantic_field;
        }
        if self.search.api_key.is_none() {
            if let Some(ref env_var) = self.search.api_key_env {
                self.search.api_key = lookup(env_var);
            }
        }

        // LLM provider
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(temperature) = lookup("LLM_TEMPERATURE") {
            self.llm.temperature = parse_env("LLM_TEMPERATURE", &temperature)?;
        }
        if let Some(endpoint) = lookup("LLM_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Some(api_key) = lookup("LLM_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if self.llm.api_key.is_none() {
            let env_var = self
                .llm
                .api_key_env
                .clone()
                .or_else(|| LlmSettings::default_api_key_env(&self.llm.provider).map(String::from));
            if let Some(env_var) = env_var {
                self.llm.api_key = lookup(&env_var);
            }
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        index: Option<String>,
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
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(index) = index {
            self.search.index = index;
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

    /// Get the path to the .hybrid-rag directory.
    pub fn config_dir(&self) -> PathBuf {
        self.workspace.join(CONFIG_DIR_NAME)
    }

    /// Directory searched for prompt definition files.
    pub fn prompts_dir(&self) -> PathBuf {
        self.prompts
            .dir
            .clone()
            .unwrap_or_else(|| self.config_dir().join("prompts"))
    }

    /// Validate the search backend settings.
    pub fn validate_search(&self) -> AppResult<()> {
        let search = &self.search;

        if search.cloud_id.is_none() && search.url.is_none() {
            return Err(AppError::Config(
                "Search backend not configured: set ES_CLOUD_ID or ES_URL".to_string(),
            ));
        }

        if search.cloud_id.is_some() && search.api_key.is_none() {
            return Err(AppError::Config(
                "ES_API_KEY is required when connecting with ES_CLOUD_ID".to_string(),
            ));
        }

        if search.index.trim().is_empty() {
            return Err(AppError::Config("Search index name cannot be empty".to_string()));
        }

        if search.max_results == 0 {
            return Err(AppError::Config(
                "ES_MAX_RESULTS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the LLM provider settings.
    pub fn validate_llm(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.llm.requires_api_key() && self.llm.api_key.is_none() {
            let env_var = self
                .llm
                .api_key_env
                .as_deref()
                .or_else(|| LlmSettings::default_api_key_env(&provider))
                .unwrap_or("LLM_API_KEY");
            return Err(AppError::Config(format!(
                "API key not found for provider '{}': set {}",
                self.llm.provider, env_var
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        Ok(())
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> AppResult<()> {
        self.validate_search()?;
        self.validate_llm()
    }
}

fn parse_env<T>(name: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        AppError::Config(format!("Invalid value for {}: '{}' ({})", name, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.index, "documentos");
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.search.timeout_secs, 30);
        assert_eq!(config.search.text_field, "texto");
        assert_eq!(config.search.semantic_field, "semantic_text");
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.model, "llama3-70b-8192");
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert!(!config.verbose);
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_from(&[
            ("HYBRID_RAG_WORKSPACE", workspace.as_str()),
            ("ES_CLOUD_ID", "deploy:abc"),
            ("ES_API_KEY", "es-key"),
            ("ES_INDEX", "podcasts"),
            ("ES_MAX_RESULTS", "8"),
            ("ES_TEXT_FIELD", "body"),
            ("GROQ_API_KEY", "groq-key"),
            ("LLM_TEMPERATURE", "0.7"),
        ]))
        .unwrap();

        assert_eq!(config.search.cloud_id.as_deref(), Some("deploy:abc"));
        assert_eq!(config.search.api_key.as_deref(), Some("es-key"));
        assert_eq!(config.search.index, "podcasts");
        assert_eq!(config.search.max_results, 8);
        assert_eq!(config.search.text_field, "body");
        assert_eq!(config.llm.api_key.as_deref(), Some("groq-key"));
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_from(&[
            ("HYBRID_RAG_WORKSPACE", workspace.as_str()),
            ("ES_CLOUD_ID", ""),
        ]))
        .unwrap();

        assert!(config.search.cloud_id.is_none());
    }

    #[test]
    fn test_invalid_numeric_env_is_config_error() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let result = AppConfig::load_with(env_from(&[
            ("HYBRID_RAG_WORKSPACE", workspace.as_str()),
            ("ES_TIMEOUT", "thirty"),
        ]));

        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("ES_TIMEOUT")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_yaml_config_then_env() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            r#"
search:
  url: "http://localhost:9200"
  index: "noticias"
  textField: "conteudo"
llm:
  provider: "openai"
  apiKeyEnv: "MY_OPENAI_KEY"
  model: "gpt-4o-mini"
logging:
  level: "warn"
  color: false
"#,
        )
        .unwrap();

        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_from(&[
            ("HYBRID_RAG_WORKSPACE", workspace.as_str()),
            ("MY_OPENAI_KEY", "sk-test"),
            ("ES_INDEX", "override"),
        ]))
        .unwrap();

        assert_eq!(config.search.url.as_deref(), Some("http://localhost:9200"));
        assert_eq!(config.search.index, "override");
        assert_eq!(config.search.text_field, "conteudo");
        // Unspecified fields keep their defaults
        assert_eq!(config.search.semantic_field, "semantic_text");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(config.no_color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let missing = temp.path().join("nope.yaml").to_string_lossy().to_string();
        let result = AppConfig::load_with(env_from(&[
            ("HYBRID_RAG_WORKSPACE", workspace.as_str()),
            ("HYBRID_RAG_CONFIG", missing.as_str()),
        ]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            Some("artigos".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "ollama");
        assert_eq!(overridden.llm.model, "llama3.2");
        assert_eq!(overridden.search.index, "artigos");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_search_requires_endpoint() {
        let config = AppConfig::default();
        match config.validate_search() {
            Err(AppError::Config(msg)) => assert!(msg.contains("ES_CLOUD_ID")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_search_cloud_requires_key() {
        let mut config = AppConfig::default();
        config.search.cloud_id = Some("deploy:abc".to_string());
        assert!(config.validate_search().is_err());

        config.search.api_key = Some("key".to_string());
        assert!(config.validate_search().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate_llm().is_err());
    }

    #[test]
    fn test_validate_groq_requires_key() {
        let mut config = AppConfig::default();
        match config.validate_llm() {
            Err(AppError::Config(msg)) => assert!(msg.contains("GROQ_API_KEY")),
            other => panic!("Expected config error, got {:?}", other),
        }

        config.llm.api_key = Some("key".to_string());
        assert!(config.validate_llm().is_ok());
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        assert!(config.validate_llm().is_ok());
    }

    #[test]
    fn test_prompts_dir_default() {
        let config = AppConfig::default();
        assert!(config.prompts_dir().ends_with(".hybrid-rag/prompts"));
    }
}
