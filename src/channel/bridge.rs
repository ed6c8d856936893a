//! Glue between a channel and the assistant
//!
//! Each inbound message is resolved to a conversation, run as one turn and
//! answered through the channel's outbound sink.

use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::orchestrator::Assistant;
use crate::agent::sink::ResponseSink;
use crate::app::AppContext;
use crate::channel::OutboundSink;
use crate::core::Result;

/// File name used when a reply is too long to send inline
pub const RESPONSE_FILE_NAME: &str = "response.md";

/// Send `text` inline when it fits `inline_limit` characters, otherwise as a
/// markdown attachment.
pub async fn deliver(
    sink: &dyn OutboundSink,
    session_id: &str,
    text: &str,
    inline_limit: usize,
) -> Result<()> {
    if text.chars().count() <= inline_limit {
        sink.send_text(session_id, text).await
    } else {
        tracing::debug!(
            session_id,
            chars = text.chars().count(),
            inline_limit,
            "Reply exceeds inline limit, sending as file"
        );
        sink.send_file(session_id, text.as_bytes().to_vec(), RESPONSE_FILE_NAME)
            .await
    }
}

/// Response sink bound to one session of a channel
pub struct ChannelResponder {
    outbound: Arc<dyn OutboundSink>,
    session_id: String,
    inline_limit: usize,
}

impl ChannelResponder {
    pub fn new(
        outbound: Arc<dyn OutboundSink>,
        session_id: impl Into<String>,
        inline_limit: usize,
    ) -> Self {
        Self {
            outbound,
            session_id: session_id.into(),
            inline_limit,
        }
    }
}

#[async_trait]
impl ResponseSink for ChannelResponder {
    async fn send(&self, text: &str) {
        if let Err(e) = deliver(
            self.outbound.as_ref(),
            &self.session_id,
            text,
            self.inline_limit,
        )
        .await
        {
            tracing::error!(session_id = %self.session_id, error = %e, "Failed to deliver reply");
        }
    }
}

/// Routes channel input into assistant turns
#[derive(Clone)]
pub struct SessionBridge {
    ctx: AppContext,
    outbound: Arc<dyn OutboundSink>,
}

impl SessionBridge {
    pub fn new(ctx: AppContext, outbound: Arc<dyn OutboundSink>) -> Self {
        Self { ctx, outbound }
    }

    /// Handle one inbound message and return the conversation id it landed in.
    ///
    /// A session naming a stored conversation continues it; anything else
    /// starts a new conversation.
    pub async fn on_inbound_text(&self, session: Option<&str>, text: &str) -> Result<String> {
        let mut assistant = Assistant::new(self.ctx.clone());

        let existing = match session {
            Some(id) => self.ctx.store.exists(id).await?.then_some(id),
            None => None,
        };

        let conversation_id = match existing {
            Some(id) => assistant.attach(id).await?.id().to_string(),
            None => {
                if let Some(id) = session {
                    tracing::debug!(session_id = id, "Unknown session, starting a new conversation");
                }
                assistant.create_conversation().await?.id().to_string()
            }
        };

        assistant.on_response(Arc::new(ChannelResponder::new(
            self.outbound.clone(),
            conversation_id.clone(),
            self.ctx.config.channels.inline_limit,
        )));
        assistant.add_user_message(text);
        assistant.run().await?;

        Ok(conversation_id)
    }
}
