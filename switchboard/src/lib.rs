//! Switchboard puts local and hosted chat models behind one interface.
//!
//! ### Features
//!
//!  - invoke, stream and batch with the same call on every backend
//!  - rebinding of sampling parameters without touching the original adapter
//!  - provider selection from a TOML file, a `.env` file and environment variables
//!  - brute-force cosine retriever for small corpora
//!
//! ### Providers
//!
//! - Ollama (local models)
//! - OpenAI and OpenAI-compatible servers
//! - Google Gemini
//!
//! ### Examples
//!
//! ```rust no_run
//! use switchboard::llm::get_llm_provider;
//! use switchboard::request::get_reqwest_client;
//! use switchboard::{Config, ModelProvider, ParamOverrides};
//!
//! let config = Config::new(ModelProvider::OpenAI, "gpt-4o-mini").with_api_key("<api-key>");
//!
//! let client = get_reqwest_client().expect("transport created");
//!
//! let llm = get_llm_provider(config, client).expect("provider created");
//!
//! let answer = llm.invoke("Why is the sky blue?".into()).expect("LLM response");
//!
//! let creative = llm.update_parameters(ParamOverrides::new().temperature(1.2)).expect("provider created");
//!
//! for fragment in creative.stream("Write a haiku about rust.".into()).expect("stream opened") {
//!     print!("{}", fragment.expect("fragment"));
//! }
//! ```
//!
//! Selecting the provider from the environment:
//!
//! ```rust no_run
//! use switchboard::Settings;
//!
//! let llm = Settings::from_env().and_then(|s| s.create_provider()).expect("provider created");
//! let output = llm.invoke_with_metadata("Hello!".into()).expect("LLM response");
//! println!("{} ({})", output.content, output.usage());
//! ```

#![deny(missing_docs)]
#![deny(clippy::suspicious)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::collapsible_if)]

mod error;
mod config;
mod settings;
pub mod llm;
pub mod rag;
pub mod request;

pub use error::Error;
pub use config::Config;
pub use config::ModelProvider;
pub use config::ParamOverrides;
pub use settings::Settings;
pub use settings::{GeminiSettings, OllamaSettings, OpenAISettings, DOTENV_FILE};
pub use settings::get_llm;
