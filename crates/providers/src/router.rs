//! Provider router: builds LLM providers from configuration.

use std::collections::HashMap;
use std::sync::Arc;
use lifechat_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::RetryProvider;

/// Named providers plus the one the config selects.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// The configured provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build every configured provider, each wrapped in the retry policy.
pub fn build_from_config(config: &lifechat_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(name.clone(), with_retry(config, OpenAiCompatProvider::new(name, base_url, api_key)));
    }

    // The selected provider exists even when it has no [providers.*] section
    if router.get(&config.provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.provider);
        router.register(
            config.provider.clone(),
            with_retry(config, OpenAiCompatProvider::new(&config.provider, base_url, api_key)),
        );
    }

    router
}

fn with_retry(config: &lifechat_config::AppConfig, provider: OpenAiCompatProvider) -> Arc<dyn Provider> {
    Arc::new(RetryProvider::from_config(Arc::new(provider), &config.retry))
}

fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "mistral" => "https://api.mistral.ai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
