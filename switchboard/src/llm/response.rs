use std::fmt::Display;
use std::time::{Duration, SystemTime};
use serde_json::Value;

/// Token accounting reported by the backend. Every field is best-effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Prompt tokens.
    pub input_tokens: Option<u64>,
    /// Generated tokens.
    pub output_tokens: Option<u64>,
    /// Prompt plus generated tokens.
    pub total_tokens: Option<u64>,
    /// Tokens spent on hidden reasoning, when the model reports them.
    pub reasoning_tokens: Option<u64>,
}

impl Usage {
    /// True when the backend reported no counts at all.
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none() && self.output_tokens.is_none() && self.total_tokens.is_none()
    }
}

impl Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("Tokens: N/A");
        }
        write!(
            f,
            "In: {} | Out: {} | Total: {}",
            self.input_tokens.unwrap_or(0),
            self.output_tokens.unwrap_or(0),
            self.total_tokens.unwrap_or(0),
        )?;
        if let Some(n) = self.reasoning_tokens.filter(|n| *n > 0) {
            write!(f, " | Reasoning: {n}")?;
        }
        Ok(())
    }
}

/// Response of one non-streaming call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,
    /// Parsed token usage.
    pub usage: Usage,
    /// Response body as returned by the backend.
    pub raw: Value,
}

/// Result of [`LLMProvider::invoke_with_metadata`](super::LLMProvider::invoke_with_metadata).
#[derive(Debug, Clone)]
pub struct InvokeOutput {
    /// Generated text.
    pub content: String,
    /// Full backend response.
    pub response: ChatResponse,
    /// Wall-clock time the request was issued.
    pub started_at: SystemTime,
    /// Wall-clock time the response was parsed.
    pub finished_at: SystemTime,
}

impl InvokeOutput {
    /// Time spent in the call.
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }

    /// Token usage of the call.
    pub fn usage(&self) -> Usage {
        self.response.usage
    }
}
