use serde::{Deserialize, Serialize};

/// Body of the `POST /streaming-chat` request. Field names are fixed by the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub formatted_context: String,
    /// Already-encoded history, forwarded untouched.
    pub chat_history: String,
}

impl ChatRequest {
    pub fn new(
        prompt: impl Into<String>,
        formatted_context: impl Into<String>,
        chat_history: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            formatted_context: formatted_context.into(),
            chat_history: chat_history.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Conversation so far, in the shape the server decodes from
/// `chat_history`: `{"chat_history": [{"role": ..., "content": ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    chat_history: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.chat_history.push(ChatTurn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.chat_history.push(ChatTurn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.chat_history
    }

    pub fn len(&self) -> usize {
        self.chat_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chat_history.is_empty()
    }

    pub fn clear(&mut self) {
        self.chat_history.clear();
    }

    /// Encode for the `chat_history` request field.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_wire(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
