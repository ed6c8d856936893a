//! File-backed conversation store
//!
//! One JSON document per conversation under `<data_dir>/conversations/`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::agent::conversation::Conversation;
use crate::core::{ForemanError, Result};
use crate::storage::ConversationStore;

/// Stores each conversation as `<root>/<id>.json`
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    root: PathBuf,
}

impl FileConversationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `<data_dir>/conversations`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("conversations"))
    }

    /// Create the storage directory if needed
    pub async fn init(&self) -> Result<()> {
        if fs::try_exists(&self.root).await? {
            return Ok(());
        }

        tracing::info!(path = %self.root.display(), "Initializing conversation storage");
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Ids become file names, so only a conservative character set is allowed
    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= 128
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        Self::is_valid_id(id).then(|| self.root.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        match self.path_for(id) {
            Some(path) => Ok(fs::try_exists(path).await?),
            None => Ok(false),
        }
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let path = self.path_for(conversation.id()).ok_or_else(|| {
            ForemanError::Other(format!(
                "Conversation id '{}' cannot be used as a file name",
                conversation.id()
            ))
        })?;

        // Write a sibling temp file and rename so readers never see a torn record
        let tmp = self
            .root
            .join(format!(".{}.{}.tmp", conversation.id(), Uuid::new_v4()));
        fs::write(&tmp, conversation.serialize()?)
            .await
            .map_err(|e| ForemanError::with_context("writing conversation", e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| ForemanError::with_context("replacing conversation", e))?;

        tracing::debug!(
            conversation_id = conversation.id(),
            messages = conversation.len(),
            "Saved conversation"
        );
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Conversation> {
        let path = self
            .path_for(id)
            .ok_or_else(|| ForemanError::ConversationNotFound(id.to_string()))?;

        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForemanError::ConversationNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Conversation::deserialize(&data)
    }
}
