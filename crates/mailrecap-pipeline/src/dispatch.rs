use std::sync::Arc;

use mailrecap_llm::SummarizerRegistry;

/// Routes a composed prompt to the user's chosen provider.
///
/// Failures never cross this boundary: a provider error (auth, network,
/// quota, malformed response) or an unregistered provider name produces a
/// sentinel string naming the provider, which the orchestrator persists as
/// the summary verbatim. A failed AI call is still a completed pipeline run.
pub struct SummarizeDispatcher {
    registry: Arc<SummarizerRegistry>,
}

impl SummarizeDispatcher {
    pub fn new(registry: Arc<SummarizerRegistry>) -> Self {
        Self { registry }
    }

    pub async fn summarize(&self, provider: &str, prompt: &str) -> String {
        let Some(service) = self.registry.get(provider) else {
            tracing::error!(provider, "no summarizer registered for provider");
            return format!("[{provider} error]: provider not registered");
        };

        match service.summarize(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(provider, error = %e, "summarization failed");
                format!("[{provider} error]: {e:#}")
            }
        }
    }
}
