use std::sync::Arc;
use crate::llm::util::{check_for_error, role_to_llm};
use crate::config::Config;
use crate::error::Error;
use crate::val_as_str;
use serde_json::{json, Value};
use tracing::{debug, warn};
use crate::request::Client;
use super::chat::ChatModel;
use super::stream::StreamChunk;
use super::util;
use super::{ChatResponse, Message, TextStream, Usage};

/// Client for a local Ollama server (`/api/chat`).
pub struct OllamaChat {
    config: Config,
    client: Arc<dyn Client>,
}

impl OllamaChat {

    fn url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint())
    }

    fn prep_payload(&self, messages: &[Message], stream: bool) -> Value {

        let history: Vec<Value> = messages
            .iter()
            .map(|m| json!({
                "role": role_to_llm(self.config.provider, m.role),
                "content": m.content
            }))
            .collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": history,
            "stream": stream,
            "options": {},
        });

        util::set_f64_param(&mut payload["options"], "temperature", self.config.temperature);
        util::set_f64_param(&mut payload["options"], "top_p", self.config.top_p);
        util::set_i64_param(&mut payload["options"], "num_predict", &self.config.max_tokens);

        payload
    }

    fn process_response(&self, response: Value) -> Result<ChatResponse, Error> {

        check_for_error(&response)?;

        let content = val_as_str!(response["message"]["content"], "message content").to_owned();

        let usage = Self::usage(&response);
        if usage.is_empty() {
            warn!(provider = "ollama", "response carries no usage data");
        }

        Ok(ChatResponse { content, usage, raw: response })
    }

    fn usage(response: &Value) -> Usage {
        let input_tokens = response["prompt_eval_count"].as_u64();
        let output_tokens = response["eval_count"].as_u64();
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(i), Some(o)) => Some(i + o),
            _ => None,
        };
        Usage { input_tokens, output_tokens, total_tokens, reasoning_tokens: None }
    }

    fn parse_stream_line(line: &str) -> Result<Option<StreamChunk>, Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let event: Value = serde_json::from_str(line)?;
        check_for_error(&event)?;

        let text = event["message"]["content"].as_str().unwrap_or_default();
        let done = event["done"].as_bool().unwrap_or(false);

        Ok(Some(StreamChunk { text: text.to_owned(), done }))
    }
}

impl ChatModel for OllamaChat {

    fn from_config(config: Config, client: Arc<dyn Client>) -> Result<Self, Error> {
        config.validate()?;
        Ok(OllamaChat { config, client })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn generate(&self, messages: &[Message]) -> Result<ChatResponse, Error> {
        let payload = self.prep_payload(messages, false);

        debug!(provider = "ollama", model = %self.config.model, messages = messages.len(), "chat request");
        let response = self.client.make_json_request(&self.url(), payload, &[], &[])?;

        self.process_response(response)
    }

    fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, Error> {
        let payload = self.prep_payload(messages, true);

        debug!(provider = "ollama", model = %self.config.model, messages = messages.len(), "streaming chat request");
        let lines = self.client.make_stream_request(&self.url(), payload, &[], &[])?;

        Ok(TextStream::new(lines, Self::parse_stream_line))
    }
}
