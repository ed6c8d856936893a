//! Conversation history management
//!
//! An ordered, append-only list of messages with a stable id. Conversations
//! convert to the backend `{role, content}` format and round-trip through a
//! durable JSON record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{BackendMessage, Message, Result};

/// A conversation with a model backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Globally unique id, also the storage key
    id: String,
    /// Message history, append-only
    messages: Vec<Message>,
}

/// Durable form of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with a freshly generated id
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Create an empty conversation with a known id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a system message
    pub fn add_system(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages as the ordered `{role, content}` array sent to a backend
    pub fn to_backend_format(&self) -> Vec<BackendMessage> {
        self.messages.iter().map(BackendMessage::from).collect()
    }

    pub fn to_record(&self) -> ConversationRecord {
        ConversationRecord {
            id: self.id.clone(),
            messages: self.messages.clone(),
        }
    }

    pub fn from_record(record: ConversationRecord) -> Self {
        Self {
            id: record.id,
            messages: record.messages,
        }
    }

    /// Serialize to the durable JSON form
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Restore from the durable JSON form
    pub fn deserialize(data: &str) -> Result<Self> {
        let record: ConversationRecord = serde_json::from_str(data)?;
        Ok(Self::from_record(record))
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
