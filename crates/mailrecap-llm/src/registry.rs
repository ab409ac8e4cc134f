use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::gemini::GeminiClient;
use crate::openai::OpenAIClient;
use crate::traits::Summarizer;

/// Credentials and model names for the providers the registry can build.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

/// String-keyed lookup of summarization capabilities, constructed once at
/// process start and passed by reference into the pipeline.
///
/// Construction is strict: naming a provider without its credentials, or an
/// unknown provider, is a configuration error raised here rather than
/// swallowed mid-pipeline.
#[derive(Default)]
pub struct SummarizerRegistry {
    services: HashMap<String, Arc<dyn Summarizer>>,
}

impl std::fmt::Debug for SummarizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerRegistry")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SummarizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, one entry per enabled provider.
    pub fn build(enabled: &[String], settings: &ProviderSettings) -> Result<Self> {
        let mut registry = Self::new();

        for provider in enabled {
            match provider.as_str() {
                "gemini" => {
                    let Some(key) = settings.gemini_api_key.as_deref() else {
                        bail!("provider 'gemini' is enabled but GEMINI_API_KEY is missing");
                    };
                    let client = GeminiClient::new(key, settings.gemini_model.clone())?;
                    registry.register("gemini", Arc::new(client));
                }
                "openai" => {
                    let Some(key) = settings.openai_api_key.as_deref() else {
                        bail!("provider 'openai' is enabled but OPENAI_API_KEY is missing");
                    };
                    let client = OpenAIClient::new(key, settings.openai_model.clone())?;
                    registry.register("openai", Arc::new(client));
                }
                other => bail!("Unknown AI provider: {other}"),
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, service: Arc<dyn Summarizer>) {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Summarizer>> {
        self.services.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
