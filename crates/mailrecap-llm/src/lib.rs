pub mod gemini;
pub mod openai;
pub mod registry;
pub mod traits;

pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAIClient, DEFAULT_OPENAI_MODEL};
pub use registry::{ProviderSettings, SummarizerRegistry};
pub use traits::{truncate_chars, Summarizer, MAX_CONTENT_CHARS};
