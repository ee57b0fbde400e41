use thiserror::Error as ThisError;

/// Library errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Provider selector is not one of the supported backends.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Invalid or inconsistent configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No API key was given and the environment does not provide one.
    #[error("API key is not set, pass it explicitly or set {0}")]
    MissingApiKey(&'static str),

    /// LLM call error.
    #[error("Failed to call LLM: {0}")]
    LLMCallError(#[from] reqwest::Error),

    /// Reading a streamed response failed.
    #[error("Failed to read LLM stream: {0}")]
    StreamReadError(#[from] std::io::Error),

    /// Backend answered with a non-success status and no readable error body.
    #[error("LLM provider responded with HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// LLM call error.
    #[error("Failed to process LLM call: {0}")]
    LLMJsonError(#[from] serde_json::Error),

    /// LLM call error.
    #[error("Failed to parse LLM response: {0}")]
    LLMResponseError(&'static str),

    /// LLM response error message.
    #[error("LLM provider responded with error: {0}")]
    LLMErrorMessage(String),

    /// Query and stored embeddings differ in length.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the stored embeddings.
        expected: usize,
        /// Dimension of the offending embedding.
        actual: usize,
    },

    /// Embedding backend failure.
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Embedding with candle error.
    #[error("Candle core error: {0}")]
    CandleError(#[from] candle_core::Error),

    /// Hf API error.
    #[error("Huggingface hub API call: {0}")]
    HfHubError(#[from] hf_hub::api::sync::ApiError),
}
