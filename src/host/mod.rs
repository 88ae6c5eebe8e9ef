//! Host Boundary
//!
//! Types and traits for the chat client hosting the responder. The host owns
//! connections, channel membership and the wire protocol; the responder only
//! consumes inbound messages and hands finished text back to the send
//! primitive.

use async_trait::async_trait;
use std::sync::Arc;

/// Result type for host send operations
pub type SendResult = Result<(), SendError>;

/// Errors the host's send primitive can report
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("not connected to {0}")]
    NotConnected(String),

    #[error("send failed: {0}")]
    Failed(String),
}

/// Opaque destination identifier understood by the host's send primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// One entry in a network's channel/query directory.
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    /// Display name, e.g. `#rust`, or a nickname for direct messages
    pub name: String,
    /// Opaque id handed back to [`ChatHost::send`]
    pub target: TargetId,
}

impl ChannelEntry {
    pub fn new(name: impl Into<String>, target: TargetId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// Incoming message delivered by the host, one per received chat line.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Network identifier, e.g. "libera"
    pub server: String,
    /// Channel or query the message arrived on
    pub origin_channel: String,
    /// Nickname of the sender
    pub sender_nick: String,
    /// Raw message text
    pub text: String,
    /// Arrival timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl InboundMessage {
    pub fn new(
        server: impl Into<String>,
        origin_channel: impl Into<String>,
        sender_nick: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            origin_channel: origin_channel.into(),
            sender_nick: sender_nick.into(),
            text: text.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Interface the responder uses to talk back to the hosting chat client.
#[async_trait]
pub trait ChatHost: Send + Sync {
    /// Current nickname on the given network, if connected.
    fn current_nick(&self, server: &str) -> Option<String>;

    /// Known channels and query targets on the given network.
    fn channel_directory(&self, server: &str) -> Vec<ChannelEntry>;

    /// Send `text` to a previously resolved destination.
    async fn send(&self, target: &TargetId, text: &str) -> SendResult;
}

/// Type-erased host handle shared with spawned send tasks.
pub type DynChatHost = Arc<dyn ChatHost>;
