//! Pattern Matcher
//!
//! Compiles a rule's trigger into a regular expression after `{{me}}`
//! substitution and tests an incoming message against it. Every trigger is
//! treated uniformly as a regex: a literal substring is valid regex syntax,
//! so there is no separate plain-text mode to diverge from.

use crate::rules::Rule;
use regex::Regex;

/// Placeholder in trigger patterns replaced with the bot's current nickname
/// on the message's network before compilation.
pub const ME_PLACEHOLDER: &str = "{{me}}";

/// Successful match: the full matched text plus capture groups in order.
/// `groups[0]` is the full match; a group that did not participate is
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerMatch {
    pub matched: String,
    pub groups: Vec<Option<String>>,
}

/// Build the regex for a rule's trigger. The nickname is regex-escaped
/// before insertion: IRC-style nicks may contain `[]\^{|}`, which must stay
/// literal. Flags are applied as an inline `(?flags)` group.
pub fn compile_trigger(rule: &Rule, nick: &str) -> Result<Regex, regex::Error> {
    let pattern = rule
        .trigger_text
        .replace(ME_PLACEHOLDER, &regex::escape(nick));
    match rule.trigger_flags.as_deref().filter(|f| !f.is_empty()) {
        Some(flags) => Regex::new(&format!("(?{}){}", flags, pattern)),
        None => Regex::new(&pattern),
    }
}

/// Test `text` against a rule's trigger. A match exists iff the compiled
/// regex matches anywhere in the text. `Err` means the pattern does not
/// compile; the caller skips the rule and keeps going.
pub fn match_trigger(
    rule: &Rule,
    nick: &str,
    text: &str,
) -> Result<Option<TriggerMatch>, regex::Error> {
    let regex = compile_trigger(rule, nick)?;
    Ok(regex.captures(text).map(|caps| TriggerMatch {
        matched: caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        groups: caps
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect(),
    }))
}
