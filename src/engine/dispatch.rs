//! Response Dispatcher
//!
//! Resolves the destination for a firing rule, fills in the response
//! template, and sends the result now or after the rule's delay.

use crate::host::{ChannelEntry, DynChatHost, TargetId};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Placeholder in response templates replaced with the triggering user's
/// nickname.
pub const SENDER_PLACEHOLDER: &str = "{{sender}}";

static GROUP_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("static pattern compiles"));

/// Resolve `name` against a network's channel directory, matching the
/// display name case-insensitively. `None` means the destination is unknown
/// to the host; the caller must not fall back to another target.
pub fn resolve_destination(directory: &[ChannelEntry], name: &str) -> Option<TargetId> {
    let wanted = name.to_lowercase();
    directory
        .iter()
        .find(|entry| entry.name.to_lowercase() == wanted)
        .map(|entry| entry.target.clone())
}

/// Fill the response template: `{{sender}}` first, then `$N` group
/// references. A reference to a group that is absent or did not participate
/// stays literal; an unmatched group usually means a rule-authoring
/// mistake, and the visible placeholder points the operator at it.
pub fn render_response(template: &str, sender: &str, groups: &[Option<String>]) -> String {
    let with_sender = template.replace(SENDER_PLACEHOLDER, sender);
    GROUP_REF
        .replace_all(&with_sender, |caps: &regex::Captures| {
            let n: usize = caps[1].parse().unwrap_or(usize::MAX);
            match groups.get(n).and_then(|g| g.as_deref()) {
                Some(text) => text.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Send `text` to `target`. With no delay the send completes before this
/// returns; with a delay the send is scheduled on its own task and this
/// returns immediately. A scheduled send captures only the destination and
/// final text, and is never cancelled: it fires even if the rule set is
/// reloaded in the meantime.
pub async fn send_response(host: DynChatHost, delay_seconds: f64, target: TargetId, text: String) {
    if delay_seconds <= 0.0 {
        if let Err(err) = host.send(&target, &text).await {
            tracing::error!(error = %err, "failed to send response");
        }
        return;
    }

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs_f64(delay_seconds)).await;
        if let Err(err) = host.send(&target, &text).await {
            tracing::error!(error = %err, "failed to send delayed response");
        }
    });
}
