use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Read(String, #[source] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Default provider '{0}' is not configured")]
    UnknownDefaultProvider(String),
    #[error("Default provider '{0}' is disabled")]
    DisabledDefaultProvider(String),
    #[error("Provider '{0}' has vector_size 0, expected a positive dimension")]
    InvalidVectorSize(String),
    #[error("search.max_results must be positive")]
    InvalidMaxResults,
    #[error("search.similarity_threshold must be within 0.0..=1.0, got {0}")]
    InvalidSimilarityThreshold(f32),
    #[error("indexing.batch_size must be positive")]
    InvalidBatchSize,
}

/// Application configuration, loaded from a YAML file.
///
/// String values of the form `${NAME}` are replaced with the value of the
/// environment variable `NAME` before deserialization, so secrets such as
/// API keys never have to live in the file itself.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    #[serde(default)]
    pub mongodb: MongoDbConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    pub host: String,
    /// gRPC port of the Qdrant instance.
    pub port: u16,
    pub collection_name: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6334,
            collection_name: "documents".to_string(),
        }
    }
}

impl VectorDbConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<OpenAiConfig>,
    pub gemini: Option<GeminiConfig>,
}

impl ProvidersConfig {
    /// Whether the named provider is configured, and if so whether it is
    /// enabled. `None` means the name is unknown or absent from the file.
    pub fn enabled(&self, name: &str) -> Option<bool> {
        match name {
            "ollama" => self.ollama.as_ref().map(|c| c.enabled),
            "openai" => self.openai.as_ref().map(|c| c.enabled),
            "gemini" => self.gemini.as_ref().map(|c| c.enabled),
            _ => None,
        }
    }

    pub fn vector_size(&self, name: &str) -> Option<usize> {
        match name {
            "ollama" => self.ollama.as_ref().map(|c| c.vector_size),
            "openai" => self.openai.as_ref().map(|c| c.vector_size),
            "gemini" => self.gemini.as_ref().map(|c| c.vector_size),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_ollama_model")]
    pub embedding_model: String,
    #[serde(default = "default_ollama_vector_size")]
    pub vector_size: usize,
    /// Local models can take a while on first load.
    #[serde(default = "default_ollama_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub embedding_model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_vector_size")]
    pub vector_size: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub embedding_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_vector_size")]
    pub vector_size: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub default_provider: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub similarity_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_ollama_vector_size() -> usize {
    768
}

fn default_ollama_timeout_secs() -> u64 {
    120
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_vector_size() -> usize {
    1536
}

fn default_gemini_model() -> String {
    "embedding-001".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_vector_size() -> usize {
    768
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> usize {
    10
}

impl AppConfig {
    /// Loads configuration from the path in `CONFIG_PATH`, falling back to
    /// `config.yaml` in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::from_file(&path)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_string(), e))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(raw)?;
        interpolate_env(&mut value);
        let config: AppConfig = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let default = &self.search.default_provider;
        match self.providers.enabled(default) {
            None => return Err(ConfigError::UnknownDefaultProvider(default.clone())),
            Some(false) => {
                return Err(ConfigError::DisabledDefaultProvider(default.clone()))
            }
            Some(true) => {}
        }
        if let Some(c) = &self.providers.ollama {
            if c.vector_size == 0 {
                return Err(ConfigError::InvalidVectorSize("ollama".to_string()));
            }
        }
        if let Some(c) = &self.providers.openai {
            if c.vector_size == 0 {
                return Err(ConfigError::InvalidVectorSize("openai".to_string()));
            }
        }
        if let Some(c) = &self.providers.gemini {
            if c.vector_size == 0 {
                return Err(ConfigError::InvalidVectorSize("gemini".to_string()));
            }
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::InvalidMaxResults);
        }
        if !(0.0..=1.0).contains(&self.search.similarity_threshold) {
            return Err(ConfigError::InvalidSimilarityThreshold(
                self.search.similarity_threshold,
            ));
        }
        if self.indexing.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }

    /// Dimension the vector store collection must use, taken from the
    /// default provider. Validation guarantees the provider exists.
    pub fn vector_size(&self) -> Result<usize, ConfigError> {
        self.providers
            .vector_size(&self.search.default_provider)
            .ok_or_else(|| {
                ConfigError::UnknownDefaultProvider(self.search.default_provider.clone())
            })
    }
}

/// Replaces `${NAME}` strings with the value of the environment variable
/// `NAME`. Unset variables leave the placeholder untouched so the failure
/// surfaces later as an explicit validation or auth error.
fn interpolate_env(value: &mut serde_yaml::Value) {
    match value {
        serde_yaml::Value::String(s) => {
            if let Some(name) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
                if let Ok(resolved) = std::env::var(name) {
                    *s = resolved;
                }
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                interpolate_env(item);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                interpolate_env(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
server:
  host: 127.0.0.1
  port: 9000
  allowed_origins:
    - http://localhost:3000
vector_db:
  host: qdrant.internal
  port: 6334
  collection_name: articles
mongodb:
  uri: mongodb://mongo.internal:27017
  database: catalog
providers:
  ollama:
    enabled: true
    url: http://ollama.internal:11434
    embedding_model: nomic-embed-text
    vector_size: 768
  openai:
    enabled: false
    api_key: sk-test
    vector_size: 1536
search:
  default_provider: ollama
  max_results: 5
  similarity_threshold: 0.3
indexing:
  batch_size: 250
"#;

    #[test]
    fn parses_full_config() {
        let config = AppConfig::from_yaml(FULL_YAML).unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.vector_db.url(), "http://qdrant.internal:6334");
        assert_eq!(config.vector_db.collection_name, "articles");
        assert_eq!(config.mongodb.database, "catalog");
        assert_eq!(config.search.default_provider, "ollama");
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.indexing.batch_size, 250);
        assert_eq!(config.vector_size().unwrap(), 768);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let yaml = r#"
providers:
  ollama:
    enabled: true
search:
  default_provider: ollama
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.vector_db.url(), "http://localhost:6334");
        assert_eq!(config.mongodb.uri, "mongodb://localhost:27017");
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.similarity_threshold, 0.0);
        assert_eq!(config.indexing.batch_size, 1000);
        assert_eq!(config.vector_size().unwrap(), 768);
    }

    #[test]
    fn interpolates_environment_variables() {
        std::env::set_var("CONFIG_TEST_OPENAI_KEY", "sk-from-env");
        let yaml = r#"
providers:
  openai:
    enabled: true
    api_key: ${CONFIG_TEST_OPENAI_KEY}
search:
  default_provider: openai
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        let openai = config.providers.openai.unwrap();
        assert_eq!(openai.api_key, "sk-from-env");
    }

    #[test]
    fn unset_variable_is_left_verbatim() {
        let yaml = r#"
providers:
  openai:
    enabled: true
    api_key: ${CONFIG_TEST_UNSET_VARIABLE}
search:
  default_provider: openai
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        let openai = config.providers.openai.unwrap();
        assert_eq!(openai.api_key, "${CONFIG_TEST_UNSET_VARIABLE}");
    }

    #[test]
    fn rejects_unknown_default_provider() {
        let yaml = r#"
providers:
  ollama:
    enabled: true
search:
  default_provider: cohere
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDefaultProvider(name) if name == "cohere"));
    }

    #[test]
    fn rejects_disabled_default_provider() {
        let yaml = r#"
providers:
  ollama:
    enabled: false
search:
  default_provider: ollama
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DisabledDefaultProvider(name) if name == "ollama"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let yaml = r#"
providers:
  ollama:
    enabled: true
search:
  default_provider: ollama
  similarity_threshold: 1.5
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSimilarityThreshold(_)));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let yaml = r#"
providers:
  ollama:
    enabled: true
search:
  default_provider: ollama
indexing:
  batch_size: 0
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBatchSize));
    }
}
