//! riposte auto-responder library
//!
//! Matches incoming chat messages against a user-editable rule file and
//! emits at most one response per message, with per-rule cooldowns, optional
//! send delay, hot reload of rules and settings, and a gated remote rule
//! import. The hosting chat client supplies connections, channel membership
//! and the send primitive through the [`host::ChatHost`] trait.

pub mod engine;
pub mod host;
pub mod logging;
pub mod remote;
pub mod rules;
pub mod settings;
pub mod watch;

pub use engine::Responder;
pub use host::{ChannelEntry, ChatHost, InboundMessage, TargetId};
pub use rules::{Rule, RuleStore};
pub use settings::{Settings, SettingsStore};
