use serde_json::{Number, Value};
use crate::{config::ModelProvider, error::Error};
use super::Role;

/// Get model-specific role for the provider.
pub fn role_to_llm(provider: ModelProvider, role: Role) -> &'static str {
    const ROLES_FOR_OLLAMA: [&str; 4] = ["system", "user", "assistant", "tool"];
    const ROLES_FOR_OPENAI: [&str; 4] = ["system", "user", "assistant", "tool"];
    // Gemini has no system or tool turns in `contents`.
    const ROLES_FOR_GEMINI: [&str; 4] = ["user", "user", "model", "user"];

    match provider {
        ModelProvider::Ollama => ROLES_FOR_OLLAMA[role as usize],
        ModelProvider::OpenAI => ROLES_FOR_OPENAI[role as usize],
        ModelProvider::Gemini => ROLES_FOR_GEMINI[role as usize],
    }
}

/// Interpret value as str
#[macro_export(local_inner_macros)]
macro_rules! val_as_str {
    ($val:expr, $element:literal) => {
        $val
            .as_str()
            .ok_or(Error::LLMResponseError(std::concat!("can't extract ", $element, " from LLM API response.")))?
    }
}

pub fn set_i64_param(payload: &mut Value, key: &str, val: &Option<i64>) {
    if let Some(v) = val {
        payload[key] = Value::Number(Number::from(*v));
    }
}

pub fn set_f64_param(payload: &mut Value, key: &str, val: f64) {
    if let Some(n) = Number::from_f64(val) {
        payload[key] = Value::Number(n);
    }
}

/// Turn an error body into an error. Ollama sends `{"error": "..."}`,
/// the hosted APIs send `{"error": {"message": "..."}}`.
pub fn check_for_error(response: &Value) -> Result<(), Error> {
    match response.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(msg)) => Err(Error::LLMErrorMessage(msg.clone())),
        Some(error) => {
            let errmes = error["message"]
                .as_str()
                .map(str::to_owned)
                .unwrap_or_else(|| error.to_string());
            Err(Error::LLMErrorMessage(errmes))
        }
    }
}

/// Payload of a server-sent-events `data:` line.
/// `None` for blank lines, comments and other fields.
pub fn sse_data(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix("data:").map(str::trim)
}
