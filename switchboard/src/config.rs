use std::fmt::Display;
use crate::error::Error;

/// Model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    /// Locally hosted Ollama server.
    Ollama,
    /// Open AI (or any OpenAI-compatible endpoint).
    OpenAI,
    /// Google Gemini.
    Gemini,
}

impl ModelProvider {
    /// Selector value used in settings.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelProvider::Ollama => "ollama",
            ModelProvider::OpenAI => "openai",
            ModelProvider::Gemini => "gemini",
        }
    }

    /// Default model name.
    pub fn default_model(self) -> &'static str {
        match self {
            ModelProvider::Ollama => "deepseek-r1-32b:latest",
            ModelProvider::OpenAI => "gpt-3.5-turbo",
            ModelProvider::Gemini => "gemini-2.5-flash",
        }
    }

    /// Default API base URL.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ModelProvider::Ollama => "http://localhost:11434",
            ModelProvider::OpenAI => "https://api.openai.com/v1",
            ModelProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Default sampling temperature.
    pub fn default_temperature(self) -> f64 {
        0.7
    }

    /// Default top-p.
    pub fn default_top_p(self) -> f64 {
        match self {
            ModelProvider::Ollama => 0.9,
            ModelProvider::OpenAI => 1.0,
            ModelProvider::Gemini => 0.95,
        }
    }

    /// Environment variable the backend reads its API key from, if it needs one.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            ModelProvider::Ollama => None,
            ModelProvider::OpenAI => Some("OPENAI_API_KEY"),
            ModelProvider::Gemini => Some("GOOGLE_API_KEY"),
        }
    }
}

impl Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ModelProvider {
    type Error = Error;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        match val.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ModelProvider::Ollama),
            "openai" => Ok(ModelProvider::OpenAI),
            "gemini" => Ok(ModelProvider::Gemini),
            _ => Err(Error::UnknownProvider(val.to_owned())),
        }
    }
}

/// Model parameters of one adapter.
///
/// A `Config` is a plain value: changing sampling parameters yields a new
/// one through [`Config::with_overrides`].
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Backend.
    pub provider: ModelProvider,
    /// Model name.
    pub model: String,
    /// API base URL, provider default when absent.
    pub base_url: Option<String>,
    /// API key. When absent the backend falls back to its environment variable on first use.
    pub api_key: Option<String>,
    /// Level of randomization when choosing tokens.
    pub temperature: f64,
    /// Only the tokens comprising the top_p probability mass will be considered.
    pub top_p: f64,
    /// Maximum number of tokens that will be generated.
    pub max_tokens: Option<i64>,
}

impl Config {

    /// Create config with the provider's default sampling parameters.
    pub fn new(provider: ModelProvider, model: impl Into<String>) -> Self {
        Config {
            provider,
            model: model.into(),
            base_url: None,
            api_key: None,
            temperature: provider.default_temperature(),
            top_p: provider.default_top_p(),
            max_tokens: None,
        }
    }

    /// Config with the provider's default model.
    pub fn default_for(provider: ModelProvider) -> Self {
        Self::new(provider, provider.default_model())
    }

    /// Set base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set top-p.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set max output tokens.
    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Copy of this config with the given parameters replaced.
    pub fn with_overrides(&self, overrides: &ParamOverrides) -> Self {
        Config {
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_p: overrides.top_p.unwrap_or(self.top_p),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            ..self.clone()
        }
    }

    /// Base URL without trailing slash.
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Check the fields a backend cannot work without.
    pub fn validate(&self) -> Result<(), Error> {
        if self.model.trim().is_empty() {
            return Err(Error::Config(format!("{} model name is empty", self.provider)));
        }
        if let Some(url) = &self.base_url {
            if url.trim().is_empty() {
                return Err(Error::Config(format!("{} base url is empty", self.provider)));
            }
        }
        if !self.temperature.is_finite() {
            return Err(Error::Config("temperature must be a finite number".into()));
        }
        if !self.top_p.is_finite() {
            return Err(Error::Config("top_p must be a finite number".into()));
        }
        if let Some(n) = self.max_tokens {
            if n <= 0 {
                return Err(Error::Config("max tokens must be greater than zero".into()));
            }
        }
        Ok(())
    }

    /// Key to authenticate with: explicit value first, then the provider's environment variable.
    pub(crate) fn resolve_api_key(&self) -> Result<String, Error> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        let Some(var) = self.provider.api_key_env() else {
            return Ok(String::new());
        };
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::MissingApiKey(var)),
        }
    }
}

/// Sampling parameters to replace when rebinding an adapter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamOverrides {
    /// New temperature.
    pub temperature: Option<f64>,
    /// New top-p.
    pub top_p: Option<f64>,
    /// New max output tokens.
    pub max_tokens: Option<i64>,
}

impl ParamOverrides {
    /// Nothing overridden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override temperature.
    pub fn temperature(mut self, val: f64) -> Self {
        self.temperature = Some(val);
        self
    }

    /// Override top-p.
    pub fn top_p(mut self, val: f64) -> Self {
        self.top_p = Some(val);
        self
    }

    /// Override max output tokens.
    pub fn max_tokens(mut self, val: i64) -> Self {
        self.max_tokens = Some(val);
        self
    }
}
