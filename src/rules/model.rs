//! Rule Schema
//!
//! The unit of configuration: a trigger/response pair scoped to a network
//! and channel.

use serde::{Deserialize, Serialize};

/// A configured trigger/response pair.
///
/// The trigger is always a regular expression; a literal substring is valid
/// regex syntax, so plain-text triggers need no separate mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Network identifier this rule applies to (exact match, case-sensitive)
    pub server: String,
    /// Channel or query to watch (compared case-insensitively)
    pub listen_channel: String,
    /// Regex pattern tested against incoming messages; may contain `{{me}}`
    pub trigger_text: String,
    /// Regex flag letters applied at compile time, e.g. `"i"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_flags: Option<String>,
    /// Response template; may contain `{{sender}}` and `$1`, `$2`, ...
    pub response_text: String,
    /// Destination override; the origin channel when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_channel: Option<String>,
    /// Minimum interval between successive firings of this rule
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: f64,
    /// Delay between the rule firing and the response being sent
    #[serde(default)]
    pub delay_seconds: f64,
}

fn default_cooldown() -> f64 {
    5.0
}

/// Identity triple used for merge/dedup. Two rules sharing it are the same
/// logical rule regardless of other field differences. The channel is
/// lowercased so identity agrees with the case-insensitive channel compare
/// used during matching.
pub type RuleIdentity = (String, String, String);

impl Rule {
    pub fn identity(&self) -> RuleIdentity {
        (
            self.server.clone(),
            self.listen_channel.to_lowercase(),
            self.trigger_text.clone(),
        )
    }

    /// Whether this rule watches the given network and channel.
    pub fn applies_to(&self, server: &str, channel: &str) -> bool {
        self.server == server && self.listen_channel.to_lowercase() == channel.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(server: &str, channel: &str, trigger: &str) -> Rule {
        Rule {
            server: server.to_string(),
            listen_channel: channel.to_string(),
            trigger_text: trigger.to_string(),
            trigger_flags: None,
            response_text: "hi".to_string(),
            response_channel: None,
            cooldown_seconds: 5.0,
            delay_seconds: 0.0,
        }
    }

    #[test]
    fn test_applies_to_exact_server() {
        let r = rule("libera", "#rust", "ping");
        assert!(r.applies_to("libera", "#rust"));
        assert!(!r.applies_to("Libera", "#rust"));
        assert!(!r.applies_to("oftc", "#rust"));
    }

    #[test]
    fn test_applies_to_channel_case_insensitive() {
        let r = rule("libera", "#Rust", "ping");
        assert!(r.applies_to("libera", "#rust"));
        assert!(r.applies_to("libera", "#RUST"));
    }

    #[test]
    fn test_identity_ignores_response_fields() {
        let mut a = rule("libera", "#rust", "ping");
        let mut b = rule("libera", "#Rust", "ping");
        a.response_text = "pong1".to_string();
        b.response_text = "pong2".to_string();
        b.cooldown_seconds = 60.0;
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_distinguishes_trigger() {
        let a = rule("libera", "#rust", "ping");
        let b = rule("libera", "#rust", "pong");
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_serde_defaults() {
        let r: Rule = serde_json::from_str(
            r##"{"server":"n","listen_channel":"#a","trigger_text":"t","response_text":"r"}"##,
        )
        .unwrap();
        assert_eq!(r.cooldown_seconds, 5.0);
        assert_eq!(r.delay_seconds, 0.0);
        assert!(r.trigger_flags.is_none());
        assert!(r.response_channel.is_none());
    }
}
