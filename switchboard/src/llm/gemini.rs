use std::sync::Arc;
use crate::llm::util::{check_for_error, role_to_llm, sse_data};
use crate::config::Config;
use crate::error::Error;
use serde_json::{json, Value};
use tracing::{debug, warn};
use crate::request::Client;
use super::chat::ChatModel;
use super::stream::StreamChunk;
use super::util;
use super::{ChatResponse, Message, Role, TextStream, Usage};

/// Client for the Gemini `generateContent` API.
pub struct GeminiChat {
    config: Config,
    client: Arc<dyn Client>,
}

impl GeminiChat {

    fn url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.endpoint(), self.config.model, method)
    }

    fn prep_payload(&self, messages: &[Message]) -> Value {

        let mut payload = json!({});

        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        if !system.is_empty() {
            payload["systemInstruction"] = json!({
                "parts": [{ "text": system.join("\n\n") }]
            });
        }

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({
                "role": role_to_llm(self.config.provider, m.role),
                "parts": [{"text": m.content}]
            }))
            .collect();

        payload["contents"] = Value::Array(contents);

        payload["generationConfig"] = json!({});

        util::set_f64_param(&mut payload["generationConfig"], "temperature", self.config.temperature);
        util::set_f64_param(&mut payload["generationConfig"], "topP", self.config.top_p);
        util::set_i64_param(&mut payload["generationConfig"], "maxOutputTokens", &self.config.max_tokens);

        payload
    }

    /// Concatenated text parts of the first candidate.
    fn candidate_text(response: &Value) -> String {
        response["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn process_response(&self, response: Value) -> Result<ChatResponse, Error> {

        check_for_error(&response)?;

        if !response["candidates"].is_array() {
            return Err(Error::LLMResponseError("can't enumerate candidates in the response."));
        }

        let content = Self::candidate_text(&response);

        let usage = Self::usage(&response);
        if usage.is_empty() {
            warn!(provider = "gemini", "response carries no usage data");
        }

        Ok(ChatResponse { content, usage, raw: response })
    }

    fn usage(response: &Value) -> Usage {
        let usage = &response["usageMetadata"];
        Usage {
            input_tokens: usage["promptTokenCount"].as_u64(),
            output_tokens: usage["candidatesTokenCount"].as_u64(),
            total_tokens: usage["totalTokenCount"].as_u64(),
            reasoning_tokens: usage["thoughtsTokenCount"].as_u64(),
        }
    }

    fn parse_stream_line(line: &str) -> Result<Option<StreamChunk>, Error> {
        let Some(data) = sse_data(line) else {
            return Ok(None);
        };
        if data.is_empty() {
            return Ok(None);
        }

        let event: Value = serde_json::from_str(data)?;
        check_for_error(&event)?;

        Ok(Some(StreamChunk::delta(Self::candidate_text(&event))))
    }
}

impl ChatModel for GeminiChat {

    fn from_config(config: Config, client: Arc<dyn Client>) -> Result<Self, Error> {
        config.validate()?;
        Ok(GeminiChat { config, client })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn generate(&self, messages: &[Message]) -> Result<ChatResponse, Error> {

        let payload = self.prep_payload(messages);

        let api_key = self.config.resolve_api_key()?;
        let params = &[("key", api_key.as_ref())];

        debug!(provider = "gemini", model = %self.config.model, messages = messages.len(), "chat request");
        let response = self.client.make_json_request(&self.url("generateContent"), payload, &[], params)?;

        self.process_response(response)
    }

    fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, Error> {

        let payload = self.prep_payload(messages);

        let api_key = self.config.resolve_api_key()?;
        let params = &[("alt", "sse"), ("key", api_key.as_ref())];

        debug!(provider = "gemini", model = %self.config.model, messages = messages.len(), "streaming chat request");
        let lines = self.client.make_stream_request(&self.url("streamGenerateContent"), payload, &[], params)?;

        Ok(TextStream::new(lines, Self::parse_stream_line))
    }
}
