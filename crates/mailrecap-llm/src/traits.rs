use anyhow::Result;
use async_trait::async_trait;

/// Hard cap on prompt length sent to any provider, in characters.
pub const MAX_CONTENT_CHARS: usize = 8000;

/// A single-capability AI provider: turn a prompt into summary text.
///
/// Implementations own their credential and model configuration and must
/// truncate oversized input before sending (see [`truncate_chars`]).
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Provider name, used in logs and failure sentinels.
    fn name(&self) -> &str;

    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Truncate to at most `max` characters, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
