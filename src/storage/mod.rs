//! Conversation storage
//!
//! Durable key-value persistence of conversations keyed by id. Saves
//! overwrite the whole record.

pub mod file;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::agent::conversation::Conversation;
use crate::core::{ForemanError, Result};

pub use file::FileConversationStore;

/// Storage backend for conversations
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Whether a conversation with this id has been saved
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Write the full conversation, replacing any previous record
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// Read a conversation; `ConversationNotFound` if absent
    async fn load(&self, id: &str) -> Result<Conversation>;
}

/// In-process store holding serialized records
///
/// ```
/// use foreman::{Conversation, ConversationStore, MemoryConversationStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryConversationStore::new();
/// let mut conversation = Conversation::with_id("thread-1");
/// conversation.add_user("hello");
/// store.save(&conversation).await.unwrap();
///
/// assert!(store.exists("thread-1").await.unwrap());
/// assert_eq!(store.load("thread-1").await.unwrap().len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    records: Mutex<HashMap<String, String>>,
    saves: AtomicUsize,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> ForemanError {
        ForemanError::Other("conversation store lock poisoned".to_string())
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        let records = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(records.contains_key(id))
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let data = conversation.serialize()?;

        self.records
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(conversation.id().to_string(), data);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Conversation> {
        let data = {
            let records = self.records.lock().map_err(|_| Self::poisoned())?;
            records
                .get(id)
                .cloned()
                .ok_or_else(|| ForemanError::ConversationNotFound(id.to_string()))?
        };
        Conversation::deserialize(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryConversationStore::new();
        let mut conv = Conversation::new();
        conv.add_user("hello");

        assert!(!store.exists(conv.id()).await.unwrap());
        store.save(&conv).await.unwrap();
        assert!(store.exists(conv.id()).await.unwrap());

        let loaded = store.load(conv.id()).await.unwrap();
        assert_eq!(loaded, conv);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_missing_id() {
        let store = MemoryConversationStore::new();
        let err = store.load("nope").await.unwrap_err();
        assert!(matches!(err, ForemanError::ConversationNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryConversationStore::new();
        let mut first = Conversation::with_id("same");
        first.add_user("one");
        let mut second = Conversation::with_id("same");
        second.add_user("two");
        second.add_assistant("three");

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.load("same").await.unwrap().len(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_saves_are_counted() {
        let store = std::sync::Arc::new(MemoryConversationStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut conv = Conversation::with_id(format!("thread-{}", i));
                    conv.add_user("hi");
                    store.save(&conv).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.save_count(), 8);
        assert_eq!(store.len(), 8);
    }
}
