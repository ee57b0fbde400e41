use std::sync::Arc;
use crate::config::Config;
use crate::error::Error;
use crate::request::Client;
use super::{ChatResponse, Message, TextStream};

/// Stateless chat-model client for one backend.
///
/// This is the handle [`LLMProvider::get_model`](super::LLMProvider::get_model)
/// exposes. Every call is independent; no history is kept between calls.
pub trait ChatModel: Send + Sync {

    /// Build the client. Fails when the config misses a mandatory field.
    fn from_config(config: Config, client: Arc<dyn Client>) -> Result<Self, Error> where Self: Sized;

    /// Parameters the client was built with.
    fn config(&self) -> &Config;

    /// Send the conversation and wait for the whole answer.
    fn generate(&self, messages: &[Message]) -> Result<ChatResponse, Error>;

    /// Send the conversation and return the answer as it is produced.
    fn generate_stream(&self, messages: &[Message]) -> Result<TextStream, Error>;

    /// Answer several independent conversations, in order.
    /// The first failure aborts the batch.
    fn generate_batch(&self, conversations: &[Vec<Message>]) -> Result<Vec<ChatResponse>, Error> {
        conversations
            .iter()
            .map(|messages| self.generate(messages))
            .collect()
    }
}
