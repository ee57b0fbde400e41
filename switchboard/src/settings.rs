//! Configuration resolver.
//!
//! Settings are layered from typed defaults, an optional TOML file, a `.env`
//! file and the environment (highest priority), then turned into the adapter
//! for the selected provider.
//!
//! The TOML file carries `provider` at the top level and one table per
//! backend. Environment variables use flat upper-case names, e.g.
//! `OLLAMA_MODEL` for `[ollama] model`.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::{debug, info};
use crate::config::{Config, ModelProvider};
use crate::error::Error;
use crate::llm::{get_llm_provider, LLMProvider};
use crate::request::{get_reqwest_client, Client};

/// Environment variables read by the resolver.
const ENV_KEYS: [&str; 18] = [
    "provider",
    "ollama_model",
    "ollama_base_url",
    "ollama_temperature",
    "ollama_top_p",
    "ollama_num_predict",
    "openai_model",
    "openai_api_key",
    "openai_base_url",
    "openai_temperature",
    "openai_top_p",
    "openai_max_tokens",
    "gemini_model",
    "gemini_api_key",
    "gemini_temperature",
    "gemini_top_p",
    "gemini_max_output_tokens",
    "google_api_key",
];

const SECTIONS: [&str; 3] = ["ollama", "openai", "gemini"];

/// `.env` file looked up in the working directory.
pub const DOTENV_FILE: &str = ".env";

/// Ollama settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    /// Model name.
    pub model: String,
    /// Server URL.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling.
    pub top_p: f64,
    /// Max tokens to generate.
    pub num_predict: Option<i64>,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        let p = ModelProvider::Ollama;
        OllamaSettings {
            model: p.default_model().to_owned(),
            base_url: p.default_base_url().to_owned(),
            temperature: p.default_temperature(),
            top_p: p.default_top_p(),
            num_predict: None,
        }
    }
}

/// OpenAI settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// Model name.
    pub model: String,
    /// API key.
    pub api_key: Option<String>,
    /// Custom base URL for OpenAI-compatible APIs.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling.
    pub top_p: f64,
    /// Max tokens to generate.
    pub max_tokens: Option<i64>,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        let p = ModelProvider::OpenAI;
        OpenAISettings {
            model: p.default_model().to_owned(),
            api_key: None,
            base_url: None,
            temperature: p.default_temperature(),
            top_p: p.default_top_p(),
            max_tokens: None,
        }
    }
}

/// Gemini settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Model name.
    pub model: String,
    /// API key.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling.
    pub top_p: f64,
    /// Max tokens to generate.
    pub max_output_tokens: Option<i64>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        let p = ModelProvider::Gemini;
        GeminiSettings {
            model: p.default_model().to_owned(),
            api_key: None,
            temperature: p.default_temperature(),
            top_p: p.default_top_p(),
            max_output_tokens: None,
        }
    }
}

/// Provider selector and per-provider settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider selector: `ollama`, `openai` or `gemini`.
    pub provider: String,
    /// Ollama settings.
    pub ollama: OllamaSettings,
    /// OpenAI settings.
    pub openai: OpenAISettings,
    /// Gemini settings.
    pub gemini: GeminiSettings,

    // GOOGLE_API_KEY, fallback for the Gemini key.
    google_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            provider: ModelProvider::Ollama.as_str().to_owned(),
            ollama: OllamaSettings::default(),
            openai: OpenAISettings::default(),
            gemini: GeminiSettings::default(),
            google_api_key: None,
        }
    }
}

static SHARED: OnceLock<Settings> = OnceLock::new();

/// `OLLAMA_BASE_URL` -> `ollama.base_url`.
fn nest_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(field) = key.strip_prefix(section).and_then(|rest| rest.strip_prefix('_')) {
            return format!("{section}.{field}");
        }
    }
    key
}

fn is_known_key(key: &str) -> bool {
    ENV_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Integer, float or string, the way the environment provider types values.
fn typed_value(val: &str) -> Value {
    let val = val.trim();
    if let Ok(i) = val.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = val.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(val.to_owned())
}

/// Provider over explicit variables. Names match case-insensitively; empty values are ignored.
fn vars_provider<I, K, V>(vars: I) -> Serialized<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut root = Map::new();

    for (key, val) in vars {
        let (key, val) = (key.as_ref(), val.as_ref());
        if val.trim().is_empty() || !is_known_key(key) {
            continue;
        }

        let key = nest_key(key);
        match key.split_once('.') {
            Some((section, field)) => {
                let table = root
                    .entry(section.to_owned())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(table) = table {
                    table.insert(field.to_owned(), typed_value(val));
                }
            }
            None => {
                root.insert(key, typed_value(val));
            }
        }
    }

    Serialized::defaults(Value::Object(root))
}

/// Provider over the process environment.
fn env_provider() -> Env {
    Env::raw()
        .only(&ENV_KEYS)
        .filter(|key| std::env::var_os(key.as_str()).is_some_and(|v| !v.is_empty()))
        .map(|key| nest_key(key.as_str()).into())
}

/// Variables of a `.env` file. A missing file gives none.
fn dotenv_vars(path: &Path) -> Result<Vec<(String, String)>, Error> {
    if !path.exists() {
        return Ok(vec![]);
    }

    let vars = dotenvy::from_path_iter(path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|err| Error::Config(format!("Error loading {}: {err}", path.display())))?;

    debug!(path = %path.display(), vars = vars.len(), "dotenv file read");
    Ok(vars)
}

impl Settings {

    /// Defaults, then `.env` in the working directory, then the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::load(None)
    }

    /// Defaults overridden by the given variables instead of the process environment.
    /// Names match case-insensitively; empty values are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::load_with_vars(None, vars)
    }

    /// Defaults overridden by a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        Self::extract(Figment::new().merge(Toml::string(content)))
    }

    /// Defaults, then the settings file if given, then `.env` in the working
    /// directory, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let dotenv = dotenv_vars(Path::new(DOTENV_FILE))?;
        Self::extract(
            Self::file_figment(path)?
                .merge(vars_provider(dotenv))
                .merge(env_provider())
        )
    }

    /// Same as [`Settings::load`] with an explicit environment and no `.env` file.
    pub fn load_with_vars<I, K, V>(path: Option<&Path>, vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::extract(Self::file_figment(path)?.merge(vars_provider(vars)))
    }

    /// Same as [`Settings::load`] with an explicit `.env` path and environment.
    /// A missing `.env` file is skipped.
    pub fn load_with_dotenv<I, K, V>(path: Option<&Path>, dotenv: &Path, vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::extract(
            Self::file_figment(path)?
                .merge(vars_provider(dotenv_vars(dotenv)?))
                .merge(vars_provider(vars))
        )
    }

    /// Process-wide settings, read by [`Settings::from_env`] on first use.
    ///
    /// Opt-in: nothing in this crate reads the shared instance on its own.
    pub fn shared() -> Result<&'static Settings, Error> {
        if let Some(settings) = SHARED.get() {
            return Ok(settings);
        }
        let settings = Settings::from_env()?;
        Ok(SHARED.get_or_init(|| settings))
    }

    fn file_figment(path: Option<&Path>) -> Result<Figment, Error> {
        let figment = Figment::new();
        match path {
            None => Ok(figment),
            Some(p) if p.is_file() => {
                debug!(path = %p.display(), "settings file used");
                Ok(figment.merge(Toml::file(p)))
            }
            Some(p) => Err(Error::Config(format!("settings file {} not found", p.display()))),
        }
    }

    fn extract(figment: Figment) -> Result<Self, Error> {
        let settings: Settings = figment
            .extract()
            .map_err(|err| Error::Config(err.to_string()))?;

        info!(provider = %settings.provider, "settings resolved");
        Ok(settings)
    }

    /// Ollama adapter parameters.
    pub fn ollama_config(&self) -> Config {
        let s = &self.ollama;
        Config {
            provider: ModelProvider::Ollama,
            model: s.model.clone(),
            base_url: Some(s.base_url.clone()),
            api_key: None,
            temperature: s.temperature,
            top_p: s.top_p,
            max_tokens: s.num_predict,
        }
    }

    /// OpenAI adapter parameters. `OPENAI_API_KEY` sets the key directly.
    pub fn openai_config(&self) -> Config {
        let s = &self.openai;
        Config {
            provider: ModelProvider::OpenAI,
            model: s.model.clone(),
            base_url: s.base_url.clone(),
            api_key: s.api_key.clone(),
            temperature: s.temperature,
            top_p: s.top_p,
            max_tokens: s.max_tokens,
        }
    }

    /// Gemini adapter parameters. Key: setting, then `GOOGLE_API_KEY`.
    pub fn gemini_config(&self) -> Config {
        let s = &self.gemini;
        Config {
            provider: ModelProvider::Gemini,
            model: s.model.clone(),
            base_url: None,
            api_key: s.api_key.clone().or_else(|| self.google_api_key.clone()),
            temperature: s.temperature,
            top_p: s.top_p,
            max_tokens: s.max_output_tokens,
        }
    }

    /// Parameters of the selected provider.
    pub fn provider_config(&self) -> Result<Config, Error> {
        let provider = ModelProvider::try_from(self.provider.as_str())?;
        Ok(match provider {
            ModelProvider::Ollama => self.ollama_config(),
            ModelProvider::OpenAI => self.openai_config(),
            ModelProvider::Gemini => self.gemini_config(),
        })
    }

    /// Adapter for the selected provider over HTTP.
    pub fn create_provider(&self) -> Result<Box<dyn LLMProvider>, Error> {
        let config = self.provider_config()?;
        get_llm_provider(config, get_reqwest_client()?)
    }

    /// Adapter for the selected provider over the given transport.
    pub fn create_provider_with_client(&self, client: Arc<dyn Client>) -> Result<Box<dyn LLMProvider>, Error> {
        let config = self.provider_config()?;
        get_llm_provider(config, client)
    }
}

/// Adapter built from the process-wide settings.
pub fn get_llm() -> Result<Box<dyn LLMProvider>, Error> {
    Settings::shared()?.create_provider()
}


#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;
    use crate::request::stub::StubClient;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn no_vars() -> Vec<(String, String)> {
        vec![]
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(no_vars()).expect("settings");

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.provider, "ollama");
        assert_eq!(settings.ollama.model, "deepseek-r1-32b:latest");
        assert_eq!(settings.ollama.base_url, "http://localhost:11434");
        assert_eq!(settings.ollama.top_p, 0.9);
        assert_eq!(settings.openai.model, "gpt-3.5-turbo");
        assert_eq!(settings.openai.top_p, 1.0);
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert_eq!(settings.gemini.top_p, 0.95);
        assert_eq!(settings.gemini.max_output_tokens, None);

        let config = settings.provider_config().expect("config");
        assert_eq!(config.provider, ModelProvider::Ollama);
        assert_eq!(config.endpoint(), "http://localhost:11434");
    }

    #[test]
    fn test_env_keys() {
        assert_eq!(nest_key("OLLAMA_BASE_URL"), "ollama.base_url");
        assert_eq!(nest_key("gemini_max_output_tokens"), "gemini.max_output_tokens");
        assert_eq!(nest_key("PROVIDER"), "provider");
        assert_eq!(nest_key("GOOGLE_API_KEY"), "google_api_key");

        assert_eq!(typed_value("512"), Value::from(512));
        assert_eq!(typed_value(" 0.25 "), Value::from(0.25));
        assert_eq!(typed_value("gpt-4o"), Value::from("gpt-4o"));
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_vars(vars(&[
            ("PROVIDER", "openai"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("openai_temperature", "0.2"),
            ("OPENAI_MAX_TOKENS", "512"),
            ("OPENAI_BASE_URL", ""),
            ("UNRELATED", "x"),
            ("OLLAMA", "1"),
        ])).expect("settings");

        let config = settings.provider_config().expect("config");
        assert_eq!(config.provider, ModelProvider::OpenAI);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 1.0);
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_malformed_numbers() {
        assert!(matches!(
            Settings::from_vars(vars(&[("OLLAMA_TEMPERATURE", "warm")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Settings::from_vars(vars(&[("GEMINI_MAX_OUTPUT_TOKENS", "1.5")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_api_key_precedence() {
        let settings = Settings::from_vars(vars(&[
            ("GEMINI_API_KEY", "explicit"),
            ("GOOGLE_API_KEY", "fallback"),
        ])).expect("settings");
        assert_eq!(settings.gemini_config().api_key.as_deref(), Some("explicit"));

        let settings = Settings::from_vars(vars(&[("GOOGLE_API_KEY", "fallback")])).expect("settings");
        assert_eq!(settings.gemini_config().api_key.as_deref(), Some("fallback"));

        let settings = Settings::from_vars(vars(&[("OPENAI_API_KEY", "sk-env")])).expect("settings");
        assert_eq!(settings.openai_config().api_key.as_deref(), Some("sk-env"));

        let settings = Settings::from_vars(no_vars()).expect("settings");
        assert_eq!(settings.openai_config().api_key, None);
        assert_eq!(settings.gemini_config().api_key, None);
    }

    #[test]
    fn test_unknown_provider_fails_before_any_request() {
        let settings = Settings::from_vars(vars(&[("PROVIDER", "unknown_value")])).expect("settings");

        let client = Arc::new(StubClient::new());
        match settings.create_provider_with_client(client.clone()) {
            Err(Error::UnknownProvider(val)) => assert_eq!(val, "unknown_value"),
            _ => panic!("unknown provider must be rejected"),
        }
        assert!(client.requests().is_empty());

        assert!(matches!(settings.create_provider(), Err(Error::UnknownProvider(_))));
    }

    #[test]
    fn test_create_provider_with_client() {
        let settings = Settings::from_vars(vars(&[
            ("PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_TEMPERATURE", "0"),
        ])).expect("settings");

        let provider = settings.create_provider_with_client(Arc::new(StubClient::new())).expect("provider");
        assert_eq!(provider.config().provider, ModelProvider::Gemini);
        assert_eq!(provider.config().temperature, 0.0);
        assert_eq!(provider.config().api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn test_toml() {
        let settings = Settings::from_toml(r#"
            provider = "ollama"

            [ollama]
            model = "llama3.2"
            base_url = "http://gpu-box:11434"
            temperature = 1
            num_predict = 256

            [gemini]
            top_p = 0.5
        "#).expect("settings");

        assert_eq!(settings.ollama.model, "llama3.2");
        assert_eq!(settings.ollama.base_url, "http://gpu-box:11434");
        assert_eq!(settings.ollama.temperature, 1.0);
        assert_eq!(settings.ollama.num_predict, Some(256));
        assert_eq!(settings.gemini.top_p, 0.5);
        assert_eq!(settings.gemini.temperature, 0.7);
        assert_eq!(settings.openai.model, "gpt-3.5-turbo");

        assert!(matches!(Settings::from_toml("provider = 3"), Err(Error::Config(_))));
        assert!(matches!(Settings::from_toml("ollama = \"x\""), Err(Error::Config(_))));
        assert!(matches!(Settings::from_toml("[openai]\nmax_tokens = \"many\""), Err(Error::Config(_))));
        assert!(matches!(Settings::from_toml("provider = "), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "provider = \"openai\"\n[openai]\nmodel = \"from-file\"\ntemperature = 0.1").expect("write settings");

        let settings = Settings::load_with_vars(Some(file.path()), vars(&[
            ("OPENAI_TEMPERATURE", "0.9"),
        ])).expect("settings");

        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.openai.model, "from-file");
        assert_eq!(settings.openai.temperature, 0.9);

        let missing = Path::new("/nonexistent/switchboard.toml");
        assert!(matches!(Settings::load_with_vars(Some(missing), no_vars()), Err(Error::Config(_))));
    }

    #[test]
    fn test_dotenv_between_file_and_env() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[gemini]\nmodel = \"from-file\"\ntop_p = 0.1").expect("write settings");

        let mut dotenv = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(dotenv, "# local secrets\nPROVIDER=gemini\nGEMINI_MODEL=from-dotenv\nGOOGLE_API_KEY=\"g-dotenv\"\nGEMINI_TEMPERATURE=0.3")
            .expect("write dotenv");

        let settings = Settings::load_with_dotenv(Some(file.path()), dotenv.path(), vars(&[
            ("GEMINI_TEMPERATURE", "0.6"),
        ])).expect("settings");

        assert_eq!(settings.provider, "gemini");
        assert_eq!(settings.gemini.model, "from-dotenv");
        assert_eq!(settings.gemini.top_p, 0.1);
        assert_eq!(settings.gemini.temperature, 0.6);
        assert_eq!(settings.gemini_config().api_key.as_deref(), Some("g-dotenv"));
    }

    #[test]
    fn test_missing_dotenv_is_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = Settings::load_with_dotenv(None, &dir.path().join(".env"), no_vars())
            .expect("settings");

        assert_eq!(settings, Settings::default());
    }
}
