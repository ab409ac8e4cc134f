/// Safe default used when no template is configured or the configured one is
/// malformed.
pub const DEFAULT_TEMPLATE: &str = "You are a helpful assistant.\n\n\
PREVIOUS CONTEXT:\n{context}\n\n\
NEW EMAIL:\n{email_content}\n\n\
TASK:\nSummarize the new email. If it refers to the context, explain the connection.";

const EMPTY_CONTEXT_PHRASE: &str = "No previous conversation history.";

/// Merges assembled context and new message content into the final prompt.
///
/// The template names two placeholders, `{context}` and `{email_content}`.
/// A template referencing anything else falls back to [`DEFAULT_TEMPLATE`]
/// instead of failing: summarization must always receive a well-formed
/// prompt.
pub struct PromptCompositor {
    template: String,
}

impl PromptCompositor {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn compose(&self, context: &str, email_content: &str) -> String {
        let context = if context.trim().is_empty() {
            EMPTY_CONTEXT_PHRASE
        } else {
            context
        };

        match render(&self.template, context, email_content) {
            Ok(prompt) => prompt,
            Err(placeholder) => {
                tracing::warn!(
                    placeholder,
                    "prompt template references unknown placeholder, using default template"
                );
                render(DEFAULT_TEMPLATE, context, email_content).unwrap_or_else(|_| {
                    format!("CONTEXT:\n{context}\n\nNEW EMAIL:\n{email_content}")
                })
            }
        }
    }
}

impl Default for PromptCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Substitute the two known placeholders. An unknown `{token}` returns its
/// name as the error; an unclosed brace is treated as literal text.
fn render(
    template: &str,
    context: &str,
    email_content: &str,
) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len() + context.len() + email_content.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            None => {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
            Some(end) => {
                match &after[..end] {
                    "context" => out.push_str(context),
                    "email_content" => out.push_str(email_content),
                    unknown => return Err(unknown.to_string()),
                }
                rest = &after[end + 1..];
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}
