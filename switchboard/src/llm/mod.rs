//! LLM interface
mod chat;
mod provider;
mod ollama;
mod openai;
mod gemini;
mod util;
mod messages;
mod response;
mod stream;

pub use chat::ChatModel;
pub use provider::LLMProvider;
pub use provider::Provider;
pub use provider::OllamaProvider;
pub use provider::OpenAIProvider;
pub use provider::GeminiProvider;
pub use provider::get_llm_provider;
pub use ollama::OllamaChat;
pub use openai::OpenAIChat;
pub use gemini::GeminiChat;
pub use messages::Message;
pub use messages::Prompt;
pub use messages::Role;
pub use response::ChatResponse;
pub use response::InvokeOutput;
pub use response::Usage;
pub use stream::StreamChunk;
pub use stream::TextStream;
pub(crate) use util::check_for_error;
