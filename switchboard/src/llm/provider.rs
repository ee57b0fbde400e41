use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;
use crate::config::{Config, ModelProvider, ParamOverrides};
use crate::error::Error;
use crate::request::Client;
use super::chat::ChatModel;
use super::gemini::GeminiChat;
use super::ollama::OllamaChat;
use super::openai::OpenAIChat;
use super::{InvokeOutput, Message, Prompt, TextStream};

/// One interface over every supported backend.
pub trait LLMProvider: Send + Sync {

    /// Send the prompt and return the answer text.
    /// Bare text is sent as a single human message.
    fn invoke(&self, prompt: Prompt) -> Result<String, Error>;

    /// Like [`invoke`](Self::invoke), also returning the backend response,
    /// token usage and wall-clock timing.
    fn invoke_with_metadata(&self, prompt: Prompt) -> Result<InvokeOutput, Error>;

    /// Answer as a lazy sequence of non-empty text fragments.
    fn stream(&self, prompt: Prompt) -> Result<TextStream, Error>;

    /// Answer every prompt independently. Results keep the input order.
    fn batch(&self, prompts: &[String]) -> Result<Vec<String>, Error>;

    /// Underlying chat-model client.
    fn get_model(&self) -> &dyn ChatModel;

    /// Parameters of this adapter.
    fn config(&self) -> &Config;

    /// New adapter with the given sampling parameters replaced.
    /// `self` is left untouched.
    fn update_parameters(&self, overrides: ParamOverrides) -> Result<Box<dyn LLMProvider>, Error>;
}

/// Adapter owning exactly one chat-model client.
pub struct Provider<M: ChatModel> {
    model: M,
    client: Arc<dyn Client>,
}

/// Adapter for a local Ollama server.
pub type OllamaProvider = Provider<OllamaChat>;
/// Adapter for OpenAI and OpenAI-compatible APIs.
pub type OpenAIProvider = Provider<OpenAIChat>;
/// Adapter for Google Gemini.
pub type GeminiProvider = Provider<GeminiChat>;

impl<M: ChatModel> Provider<M> {

    /// Create the adapter and its chat-model client.
    pub fn new(config: Config, client: Arc<dyn Client>) -> Result<Self, Error> {
        let model = M::from_config(config, client.clone())?;
        Ok(Provider { model, client })
    }
}

impl<M: ChatModel + 'static> LLMProvider for Provider<M> {

    fn invoke(&self, prompt: Prompt) -> Result<String, Error> {
        let messages = prompt.into_messages();
        Ok(self.model.generate(&messages)?.content)
    }

    fn invoke_with_metadata(&self, prompt: Prompt) -> Result<InvokeOutput, Error> {
        let messages = prompt.into_messages();

        let started_at = SystemTime::now();
        let response = self.model.generate(&messages)?;
        let finished_at = SystemTime::now();

        Ok(InvokeOutput {
            content: response.content.clone(),
            response,
            started_at,
            finished_at,
        })
    }

    fn stream(&self, prompt: Prompt) -> Result<TextStream, Error> {
        let messages = prompt.into_messages();
        self.model.generate_stream(&messages)
    }

    fn batch(&self, prompts: &[String]) -> Result<Vec<String>, Error> {
        let conversations: Vec<Vec<Message>> = prompts
            .iter()
            .map(|p| vec![Message::human(p.as_str())])
            .collect();

        Ok(self.model
            .generate_batch(&conversations)?
            .into_iter()
            .map(|r| r.content)
            .collect())
    }

    fn get_model(&self) -> &dyn ChatModel {
        &self.model
    }

    fn config(&self) -> &Config {
        self.model.config()
    }

    fn update_parameters(&self, overrides: ParamOverrides) -> Result<Box<dyn LLMProvider>, Error> {
        let config = self.config().with_overrides(&overrides);
        Ok(Box::new(Provider::<M>::new(config, self.client.clone())?))
    }
}

/// Create the adapter matching `config.provider`.
pub fn get_llm_provider(config: Config, client: Arc<dyn Client>) -> Result<Box<dyn LLMProvider>, Error> {
    info!(provider = %config.provider, model = %config.model, "creating llm provider");

    Ok(match config.provider {
        ModelProvider::Ollama => Box::new(OllamaProvider::new(config, client)?),
        ModelProvider::OpenAI => Box::new(OpenAIProvider::new(config, client)?),
        ModelProvider::Gemini => Box::new(GeminiProvider::new(config, client)?),
    })
}
