//! Persisted chat data types
//!
//! These are the shapes written to and read from the state key. Field names
//! are camelCase on disk.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "New chat";
pub const GREETING: &str = "Hi! I'm a mock assistant. Ask me anything to get started.";
pub const PLACEHOLDER: &str = "Thinking…";
pub const TITLE_MAX_CHARS: usize = 60;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_id")]
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Set while this is a placeholder waiting for its reply
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::User,
            content: content.into(),
            pending: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::Assistant,
            content: content.into(),
            pending: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            pending: true,
            ..Self::assistant(PLACEHOLDER)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Milliseconds since the Unix epoch; 0 when a stored chat lacks one
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Chat {
    /// A fresh chat seeded with the assistant greeting
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: new_id(),
            title: default_title(),
            messages: vec![Message::assistant(GREETING)],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Title from the first user message, if there is one yet.
    pub fn refresh_title(&mut self) {
        let Some(first) = self.messages.iter().find(|m| m.role == Role::User) else {
            return;
        };
        let title: String = first.content.trim().chars().take(TITLE_MAX_CHARS).collect();
        self.title = if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            &self.title
        }
    }

    pub fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything stored under the state key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    pub chats: Vec<Chat>,
    pub active_chat_id: Option<String>,
}

impl ChatState {
    /// Lenient parse: a non-array `chats` means no chats, a non-string
    /// `activeChatId` means none is active. Chats that don't match the
    /// schema are skipped individually.
    pub fn from_json(value: serde_json::Value) -> Self {
        let chats = match value.get("chats") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| match serde_json::from_value::<Chat>(item.clone()) {
                    Ok(chat) => Some(chat),
                    Err(err) => {
                        tracing::warn!("skipping malformed chat: {}", err);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };
        let active_chat_id = value
            .get("activeChatId")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Self {
            chats,
            active_chat_id,
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
