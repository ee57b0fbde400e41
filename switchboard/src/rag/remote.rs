use std::sync::Arc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use crate::config::{Config, ModelProvider};
use crate::error::Error;
use crate::llm::check_for_error;
use crate::request::Client;
use super::Embedding;

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAIEmbedResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiEmbedResponse {
    embeddings: Vec<GeminiValues>,
}

/// Embeddings served by one of the chat backends.
///
/// `config.model` names the embedding model, e.g. `nomic-embed-text`,
/// `text-embedding-3-small` or `text-embedding-004`.
pub struct RemoteEmbedding {
    config: Config,
    client: Arc<dyn Client>,
}

impl RemoteEmbedding {

    /// Create an embedder. Fails if the configuration is invalid.
    pub fn new(config: Config, client: Arc<dyn Client>) -> Result<Self, Error> {
        config.validate()?;
        Ok(RemoteEmbedding { config, client })
    }

    /// Backend parameters.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(provider = %self.config.provider, model = %self.config.model, texts = texts.len(), "embedding request");

        let embeddings = match self.config.provider {
            ModelProvider::Ollama => self.embed_ollama(texts)?,
            ModelProvider::OpenAI => self.embed_openai(texts)?,
            ModelProvider::Gemini => self.embed_gemini(texts)?,
        };

        if embeddings.len() != texts.len() {
            return Err(Error::EmbeddingError(format!(
                "backend returned {} embeddings for {} texts", embeddings.len(), texts.len()
            )));
        }

        Ok(embeddings)
    }

    fn embed_ollama(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        let url = format!("{}/api/embed", self.config.endpoint());
        let payload = json!({
            "model": self.config.model,
            "input": texts,
        });

        let response = self.client.make_json_request(&url, payload, &[], &[])?;
        check_for_error(&response)?;

        let parsed: OllamaEmbedResponse = serde_json::from_value(response)?;
        Ok(parsed.embeddings)
    }

    fn embed_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        let url = format!("{}/embeddings", self.config.endpoint());
        let payload = json!({
            "model": self.config.model,
            "input": texts,
        });

        let token = format!("Bearer {}", self.config.resolve_api_key()?);
        let headers = &[("Authorization", token.as_ref())];

        let response = self.client.make_json_request(&url, payload, headers, &[])?;
        check_for_error(&response)?;

        let mut parsed: OpenAIEmbedResponse = serde_json::from_value(response)?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn embed_gemini(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        let model = format!("models/{}", self.config.model);
        let url = format!("{}/{}:batchEmbedContents", self.config.endpoint(), model);

        let requests: Vec<Value> = texts
            .iter()
            .map(|t| json!({
                "model": model,
                "content": { "parts": [{ "text": t }] }
            }))
            .collect();

        let api_key = self.config.resolve_api_key()?;
        let params = &[("key", api_key.as_ref())];

        let response = self.client.make_json_request(&url, json!({ "requests": requests }), &[], params)?;
        check_for_error(&response)?;

        let parsed: GeminiEmbedResponse = serde_json::from_value(response)?;
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

impl Embedding for RemoteEmbedding {

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        self.embed(texts)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, Error> {
        self.embed(&[text.to_owned()])?
            .pop()
            .ok_or(Error::LLMResponseError("no embedding in the response."))
    }
}
