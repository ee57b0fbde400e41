use std::sync::Arc;
use crate::llm::util::{check_for_error, role_to_llm, sse_data};
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

/// Chat-completions client for OpenAI and OpenAI-compatible servers.
pub struct OpenAIChat {
    config: Config,
    client: Arc<dyn Client>,
}

impl OpenAIChat {

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint())
    }

    fn prep_payload(&self, messages: &[Message], stream: bool) -> Value {

        let mut payload = json!({
            "model": self.config.model
        });

        let mut history = Vec::with_capacity(messages.len());
        for message in messages {
            let mut msg = json!({
                "role": role_to_llm(self.config.provider, message.role),
                "content": message.content
            });
            if let Some(call_id) = &message.tool_call_id {
                msg["tool_call_id"] = Value::String(call_id.clone());
            }
            history.push(msg);
        }

        payload["messages"] = Value::Array(history);

        util::set_f64_param(&mut payload, "temperature", self.config.temperature);
        util::set_f64_param(&mut payload, "top_p", self.config.top_p);
        util::set_i64_param(&mut payload, "max_tokens", &self.config.max_tokens);

        if stream {
            payload["stream"] = Value::Bool(true);
        }

        payload
    }

    fn process_response(&self, response: Value) -> Result<ChatResponse, Error> {

        check_for_error(&response)?;

        let msg = &response["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or(Error::LLMResponseError("unexpected answer format, response has no choices."))?
            ["message"];

        let content = if !msg["content"].is_null() {
            val_as_str!(msg["content"], "message content").to_owned()
        } else if !msg["refusal"].is_null() {
            val_as_str!(msg["refusal"], "refusal content").to_owned()
        } else {
            String::new()
        };

        let usage = Self::usage(&response);
        if usage.is_empty() {
            warn!(provider = "openai", "response carries no usage data");
        }

        Ok(ChatResponse { content, usage, raw: response })
    }

    fn usage(response: &Value) -> Usage {
        let usage = &response["usage"];
        Usage {
            input_tokens: usage["prompt_tokens"].as_u64(),
            output_tokens: usage["completion_tokens"].as_u64(),
            total_tokens: usage["total_tokens"].as_u64(),
            reasoning_tokens: usage["completion_tokens_details"]["reasoning_tokens"].as_u64(),
        }
    }

    fn parse_stream_line(line: &str) -> Result<Option<StreamChunk>, Error> {
        let Some(data) = sse_data(line) else {
            return Ok(None);
        };
        if data.is_empty() {
            return Ok(None);
        }
        if data == "[DONE]" {
            return Ok(Some(StreamChunk::end()));
        }

        let event: Value = serde_json::from_str(data)?;
        check_for_error(&event)?;

        let text = event["choices"][0]["delta"]["content"].as_str().unwrap_or_default();
        Ok(Some(StreamChunk::delta(text)))
    }
}

impl ChatModel for OpenAIChat {

    fn from_config(config: Config, client: Arc<dyn Client>) -> Result<Self, Error> {
        config.validate()?;
        Ok(OpenAIChat { config, client })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn generate(&self, messages: &[Message]) -> Result<ChatResponse, Error> {
        let payload = self.prep_payload(messages, false);

        let token = format!("Bearer {}", self.config.resolve_api_key()?);
        let headers = &[("Authorization", token.as_ref())];

        debug!(provider = "openai", model = %self.config.model, messages = messages.len(), "chat request");
        let response = self.client.make_json_request(&self.url(), payload, headers, &[])?;

        self.process_response(response)
    }

    fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, Error> {
        let payload = self.prep_payload(messages, true);

        let token = format!("Bearer {}", self.config.resolve_api_key()?);
        let headers = &[("Authorization", token.as_ref())];

        debug!(provider = "openai", model = %self.config.model, messages = messages.len(), "streaming chat request");
        let lines = self.client.make_stream_request(&self.url(), payload, headers, &[])?;

        Ok(TextStream::new(lines, Self::parse_stream_line))
    }
}
