use std::fmt::Display;


/// Logical roles (provider-independent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// System.
    System = 0,
    /// Human (user) turn.
    Human = 1,
    /// Model turn.
    Assistant = 2,
    /// Tool output fed back to the model.
    Tool = 3,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            Role::System => "system",
            Role::Human => "human",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(role)
    }
}

/// Chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Role.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Call id a tool message answers.
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message { role, content: content.into(), tool_call_id: None }
    }

    /// System message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Human message.
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tool result message.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message { role: Role::Tool, content: content.into(), tool_call_id: Some(call_id.into()) }
    }
}

/// Input of a single call: bare text or a whole conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// Bare text, sent as one human message.
    Text(String),
    /// Ordered role-tagged messages.
    Messages(Vec<Message>),
}

impl Prompt {
    /// Messages to send to the backend.
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Prompt::Text(text) => vec![Message::human(text)],
            Prompt::Messages(messages) => messages,
        }
    }
}

impl From<&str> for Prompt {
    fn from(val: &str) -> Self {
        Prompt::Text(val.to_owned())
    }
}

impl From<String> for Prompt {
    fn from(val: String) -> Self {
        Prompt::Text(val)
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(val: Vec<Message>) -> Self {
        Prompt::Messages(val)
    }
}

impl From<&[Message]> for Prompt {
    fn from(val: &[Message]) -> Self {
        Prompt::Messages(val.to_vec())
    }
}

impl From<Message> for Prompt {
    fn from(val: Message) -> Self {
        Prompt::Messages(vec![val])
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_is_one_human_message() {
        let prompt: Prompt = "What is LangGraph?".into();
        assert_eq!(prompt.into_messages(), vec![Message::human("What is LangGraph?")]);

        let prompt: Prompt = vec![Message::system("Be brief."), Message::human("Hi")].into();
        let messages = prompt.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
    }

    #[test]
    fn test_tool_message() {
        let msg = Message::tool("call_1", "42");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.role.to_string(), "tool");
    }
}
