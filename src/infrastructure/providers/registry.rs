use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::domain::ports::EmbeddingProvider;
use crate::domain::{DomainError, Result};
use crate::infrastructure::config::AppConfig;

use super::{GeminiProvider, OllamaProvider, OpenAiProvider};

/// Registry of enabled embedding providers, keyed by name.
///
/// Providers that appear in the configuration with `enabled: false` are
/// remembered so a request naming one can be rejected with a clearer
/// error than "unknown provider".
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn EmbeddingProvider>>,
    disabled: HashSet<String>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            disabled: HashSet::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new(config.search.default_provider.clone());
        if let Some(c) = &config.providers.ollama {
            if c.enabled {
                registry.register(Arc::new(OllamaProvider::new(c)?));
            } else {
                registry.mark_disabled("ollama");
            }
        }
        if let Some(c) = &config.providers.openai {
            if c.enabled {
                registry.register(Arc::new(OpenAiProvider::new(c)?));
            } else {
                registry.mark_disabled("openai");
            }
        }
        if let Some(c) = &config.providers.gemini {
            if c.enabled {
                registry.register(Arc::new(GeminiProvider::new(c)?));
            } else {
                registry.mark_disabled("gemini");
            }
        }
        if !registry.providers.contains_key(&registry.default_provider) {
            return Err(DomainError::config(format!(
                "Default provider '{}' is not enabled",
                registry.default_provider
            )));
        }
        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn EmbeddingProvider>) {
        let name = provider.name().to_string();
        self.disabled.remove(&name);
        self.providers.insert(name, provider);
    }

    pub fn mark_disabled(&mut self, name: impl Into<String>) {
        self.disabled.insert(name.into());
    }

    /// Resolves a provider by name. `None` or a blank name selects the
    /// configured default.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn EmbeddingProvider>> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => &self.default_provider,
        };
        if let Some(provider) = self.providers.get(name) {
            return Ok(Arc::clone(provider));
        }
        if self.disabled.contains(name) {
            return Err(DomainError::ProviderDisabled(name.to_string()));
        }
        Err(DomainError::UnknownProvider(name.to_string()))
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Embedding;
    use async_trait::async_trait;

    struct FakeProvider {
        name: &'static str,
        dimension: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, _text: &str) -> Result<Embedding> {
            Ok(Embedding::new(vec![0.0; self.dimension]))
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new("ollama");
        registry.register(Arc::new(FakeProvider {
            name: "ollama",
            dimension: 768,
        }));
        registry.register(Arc::new(FakeProvider {
            name: "openai",
            dimension: 1536,
        }));
        registry.mark_disabled("gemini");
        registry
    }

    #[test]
    fn resolves_by_name() {
        let provider = registry().resolve(Some("openai")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.dimension(), 1536);
    }

    #[test]
    fn falls_back_to_default() {
        let registry = registry();
        assert_eq!(registry.resolve(None).unwrap().name(), "ollama");
        assert_eq!(registry.resolve(Some("")).unwrap().name(), "ollama");
        assert_eq!(registry.resolve(Some("  ")).unwrap().name(), "ollama");
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = registry().resolve(Some("cohere")).unwrap_err();
        assert!(matches!(err, DomainError::UnknownProvider(name) if name == "cohere"));
    }

    #[test]
    fn disabled_provider_is_distinguished_from_unknown() {
        let err = registry().resolve(Some("gemini")).unwrap_err();
        assert!(matches!(err, DomainError::ProviderDisabled(name) if name == "gemini"));
    }

    #[test]
    fn names_are_sorted() {
        assert_eq!(registry().names(), vec!["ollama", "openai"]);
    }

    #[test]
    fn builds_from_config() {
        let yaml = r#"
providers:
  ollama:
    enabled: true
    vector_size: 768
  openai:
    enabled: false
search:
  default_provider: ollama
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.default_provider(), "ollama");
        assert_eq!(registry.names(), vec!["ollama"]);
        let err = registry.resolve(Some("openai")).unwrap_err();
        assert!(matches!(err, DomainError::ProviderDisabled(_)));
    }
}
